use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;

const SUBCOMMAND: &str = "curve";

#[test]
fn help() -> Result<()> {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;
    let assert = cmd.arg(SUBCOMMAND).arg("--help").assert();

    assert
        .success()
        .stderr(predicate::str::is_empty())
        .stdout(predicate::str::contains("hdr_coef_tool curve [OPTIONS]"));
    Ok(())
}

#[test]
fn tone_map_breakpoints() -> Result<()> {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;

    let assert = cmd
        .arg(SUBCOMMAND)
        .args(["--source", "1000", "--target", "500", "--points", "16"])
        .assert();

    assert.success().stderr(predicate::str::is_empty()).stdout(
        predicate::str::contains("16 breakpoints")
            .and(predicate::str::contains("x,y\n0,"))
            .and(predicate::str::contains("\n65536,65536\n")),
    );

    Ok(())
}

#[test]
fn configured_eotf() -> Result<()> {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;

    let assert = cmd
        .arg(SUBCOMMAND)
        .args(["--kind", "eotf", "--transfer", "hlg"])
        .args(["--config", "assets/tests/config"])
        .assert();

    assert
        .success()
        .stderr(predicate::str::is_empty())
        .stdout(predicate::str::contains("8 breakpoints").and(predicate::str::contains("\n4096,")));

    Ok(())
}

#[test]
fn invalid_target() -> Result<()> {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;

    let assert = cmd.arg(SUBCOMMAND).args(["--target", "0"]).assert();

    assert
        .failure()
        .stderr(predicate::str::contains("Error: Invalid target luminance 0"));

    Ok(())
}

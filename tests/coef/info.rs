use std::path::Path;

use anyhow::Result;
use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;

const SUBCOMMAND: &str = "info";

#[test]
fn help() -> Result<()> {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;
    let assert = cmd.arg(SUBCOMMAND).arg("--help").assert();

    assert
        .success()
        .stderr(predicate::str::is_empty())
        .stdout(predicate::str::contains(
            "hdr_coef_tool info [OPTIONS] [input_pos]",
        ));
    Ok(())
}

#[test]
fn built_buffer() -> Result<()> {
    let temp = assert_fs::TempDir::new().unwrap();

    Command::cargo_bin(env!("CARGO_PKG_NAME"))?
        .arg("build")
        .arg("assets/tests/job.json")
        .arg("--config")
        .arg("assets/tests/config")
        .arg("--output")
        .arg(temp.path())
        .assert()
        .success();

    let buffer = temp.child("layer_0.bin");

    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;
    let assert = cmd.arg(SUBCOMMAND).arg(buffer.as_ref()).assert();

    assert.success().stderr(predicate::str::is_empty()).stdout(
        predicate::str::contains("\"mandatory_count\": 11")
            .and(predicate::str::contains("\"layer_index\": 0"))
            .and(predicate::str::contains("\"words\"")),
    );

    Ok(())
}

#[test]
fn truncated_buffer() -> Result<()> {
    let temp = assert_fs::TempDir::new().unwrap();
    let buffer = temp.child("truncated.bin");
    buffer.write_binary(&[0x40, 0, 0, 0, 0])?;

    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;
    let assert = cmd.arg(SUBCOMMAND).arg(buffer.as_ref()).assert();

    assert.failure().stderr(predicate::str::starts_with("Error:"));

    Ok(())
}

#[test]
fn capabilities() -> Result<()> {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;
    let config = Path::new("assets/tests/config");

    let assert = cmd.arg(SUBCOMMAND).arg("--config").arg(config).assert();

    assert.success().stderr(predicate::str::is_empty()).stdout(
        predicate::str::contains("\"hw\": \"DPU\"")
            .and(predicate::str::contains("\"coefficient_buffer_size\""))
            .and(predicate::str::contains("\"tm_x\"")),
    );

    Ok(())
}

use std::path::Path;

use anyhow::Result;
use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;

const SUBCOMMAND: &str = "build";

#[test]
fn help() -> Result<()> {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;
    let assert = cmd.arg(SUBCOMMAND).arg("--help").assert();

    assert
        .success()
        .stderr(predicate::str::is_empty())
        .stdout(predicate::str::contains("hdr_coef_tool build [OPTIONS]"));
    Ok(())
}

#[test]
fn build_job() -> Result<()> {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;
    let temp = assert_fs::TempDir::new().unwrap();

    let input_job = Path::new("assets/tests/job.json");
    let config = Path::new("assets/tests/config");

    let assert = cmd
        .arg(SUBCOMMAND)
        .arg(input_job)
        .arg("--config")
        .arg(config)
        .arg("--output")
        .arg(temp.path())
        .assert();

    assert.success().stderr(predicate::str::is_empty()).stdout(
        predicate::str::contains("Layer 0: Hdr10, 11 mandatory")
            .and(predicate::str::contains(
                "Layer 1: None, 0 mandatory and 2 optional entries",
            ))
            .and(predicate::str::contains("Layer 2: None"))
            .and(predicate::str::contains("Done.")),
    );

    for layer in 0..3 {
        temp.child(format!("layer_{layer}.bin"))
            .assert(predicate::path::is_file());
    }

    Ok(())
}

#[test]
fn build_hdr10plus_job() -> Result<()> {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;
    let temp = assert_fs::TempDir::new().unwrap();

    let assert = cmd
        .arg(SUBCOMMAND)
        .arg("-i")
        .arg("assets/tests/job_hdr10plus.json")
        .arg("-c")
        .arg("assets/tests/config")
        .arg("--hdr10plus-json")
        .arg("assets/tests/hdr10plus.json")
        .arg("-o")
        .arg(temp.path())
        .assert();

    assert
        .success()
        .stderr(predicate::str::is_empty())
        .stdout(predicate::str::contains("Layer 1: Hdr10Plus"));

    temp.child("layer_1.bin").assert(predicate::path::is_file());
    temp.child("layer_0.bin").assert(predicate::path::missing());

    Ok(())
}

#[test]
fn hdr10plus_layer_without_metadata() -> Result<()> {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;
    let temp = assert_fs::TempDir::new().unwrap();

    let assert = cmd
        .arg(SUBCOMMAND)
        .arg("assets/tests/job_hdr10plus.json")
        .arg("--config")
        .arg("assets/tests/config")
        .arg("--output")
        .arg(temp.path())
        .assert();

    assert.failure().stderr(predicate::str::contains(
        "Error: Layer 1 requires HDR10+ metadata, see --hdr10plus-json",
    ));

    Ok(())
}

#[test]
fn missing_config() -> Result<()> {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME"))?;
    let temp = assert_fs::TempDir::new().unwrap();

    let assert = cmd
        .arg(SUBCOMMAND)
        .arg("assets/tests/job.json")
        .arg("--config")
        .arg(temp.path())
        .assert();

    assert
        .failure()
        .stderr(predicate::str::contains("document not found"));

    Ok(())
}

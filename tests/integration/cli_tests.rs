use anyhow::Result;
use std::process::Command;
use tempfile::tempdir;

use crate::helpers::test_utils::{write_file, write_scenario};

fn gosymbols() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gosymbols"));
    // Keep the working directory free of stray config files
    cmd.current_dir(std::env::temp_dir());
    cmd
}

#[test]
fn test_missing_root_prints_usage() -> Result<()> {
    let output = gosymbols().output()?;

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));

    Ok(())
}

#[test]
fn test_prints_json_array() -> Result<()> {
    let dir = tempdir()?;
    write_scenario(dir.path());

    let output = gosymbols().arg(dir.path()).arg("WID").output()?;

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let symbols = value.as_array().unwrap();
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0]["name"], "Widget");
    assert_eq!(symbols[0]["kind"], "interface");

    Ok(())
}

#[test]
fn test_unreadable_root_exits_non_zero() -> Result<()> {
    let dir = tempdir()?;

    let output = gosymbols().arg(dir.path().join("missing")).output()?;

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    Ok(())
}

#[test]
fn test_malformed_workspace_config_fails() -> Result<()> {
    let workspace = tempdir()?;
    let dir = tempdir()?;
    write_scenario(dir.path());
    write_file(workspace.path(), ".gosymbols/config.toml", "[crawler\n");

    let output = gosymbols()
        .current_dir(workspace.path())
        .arg(dir.path())
        .output()?;

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to parse config"));

    Ok(())
}

#[test]
fn test_progress_reaches_stderr_by_default() -> Result<()> {
    let dir = tempdir()?;
    write_scenario(dir.path());

    let output = gosymbols().env_remove("RUST_LOG").arg(dir.path()).output()?;

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Progress: 1/"));
    assert!(stderr.contains("Progress: 2/2"));
    // stdout stays pure JSON
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value.as_array().unwrap().len(), 3);

    Ok(())
}

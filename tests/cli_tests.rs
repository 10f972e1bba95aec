use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// The binary run inside `workdir`, storing assets in a file under it
fn dispatch_cmd(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("asset-dispatch").unwrap();
    cmd.current_dir(workdir)
        .env("ASSET_DISPATCH_STORE__BACKEND", "file")
        .env("ASSET_DISPATCH_STORE__PATH", workdir.join("assets.json"))
        .env_remove("RUST_LOG");
    cmd
}

fn add_asset(workdir: &Path, serial: &str) -> String {
    let output = dispatch_cmd(workdir)
        .args(["add", "--description", "Pallet jack", "--serial", serial, "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let asset: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    asset["id"].as_str().unwrap().to_string()
}

#[test]
fn test_no_subcommand_shows_getting_started() {
    let temp = TempDir::new().unwrap();
    dispatch_cmd(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("To get started:"))
        .stdout(predicate::str::contains("asset-dispatch add"));
}

#[test]
fn test_help_command() {
    let temp = TempDir::new().unwrap();
    dispatch_cmd(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("allocate"))
        .stdout(predicate::str::contains("transition"));
}

#[test]
fn test_add_then_allocate_json() {
    let temp = TempDir::new().unwrap();
    dispatch_cmd(temp.path())
        .args(["add", "--description", "Pallet jack", "--serial", "PJ-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Asset registered"))
        .stdout(predicate::str::contains("PJ-1"));

    dispatch_cmd(temp.path())
        .args(["allocate", "1", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"batch\""))
        .stdout(predicate::str::contains("\"allocated\": 1"));

    dispatch_cmd(temp.path())
        .args(["list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"in_stock\": 0"))
        .stdout(predicate::str::contains("\"out_stock\": 1"));
}

#[test]
fn test_transition_moves_allocated_asset() {
    let temp = TempDir::new().unwrap();
    let id = add_asset(temp.path(), "PJ-2");
    dispatch_cmd(temp.path())
        .args(["allocate", "1"])
        .assert()
        .success();

    dispatch_cmd(temp.path())
        .args(["transition", &id, "pick", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"Picked\""));
}

#[test]
fn test_insufficient_stock_exits_with_conflict_code() {
    let temp = TempDir::new().unwrap();
    add_asset(temp.path(), "PJ-3");

    dispatch_cmd(temp.path())
        .args(["allocate", "5"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("❌"));

    dispatch_cmd(temp.path())
        .args(["allocate", "5", "--json"])
        .assert()
        .code(4)
        .stdout(predicate::str::contains("\"kind\": \"InsufficientStock\""));

    // nothing was claimed by the failed requests
    dispatch_cmd(temp.path())
        .args(["stats", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"in_stock\": 1"));
}

#[test]
fn test_unknown_asset_exits_with_not_found_code() {
    let temp = TempDir::new().unwrap();
    dispatch_cmd(temp.path())
        .args(["transition", "not-a-uuid", "pick"])
        .assert()
        .code(3);

    dispatch_cmd(temp.path())
        .args(["show", "not-a-uuid", "--json"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("\"kind\": \"AssetNotFound\""));
}

#[test]
fn test_invalid_quantity_exits_with_validation_code() {
    let temp = TempDir::new().unwrap();
    dispatch_cmd(temp.path())
        .args(["allocate", "0"])
        .assert()
        .code(2);

    dispatch_cmd(temp.path())
        .args(["allocate", "-3", "--json"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"kind\": \"ValidationError\""));
}

#[test]
fn test_unreadable_store_exits_with_unavailable_code() {
    let temp = TempDir::new().unwrap();
    // a directory where the asset file should be cannot be read as a document
    let blocked = temp.path().join("blocked");
    std::fs::create_dir(&blocked).unwrap();

    dispatch_cmd(temp.path())
        .env("ASSET_DISPATCH_STORE__PATH", &blocked)
        .args(["list", "--json"])
        .assert()
        .code(5)
        .stdout(predicate::str::contains("\"kind\": \"StoreUnavailable\""));
}

#[test]
fn test_missing_config_file_is_a_general_failure() {
    let temp = TempDir::new().unwrap();
    dispatch_cmd(temp.path())
        .args(["--config", "missing.toml", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration file not found"));
}

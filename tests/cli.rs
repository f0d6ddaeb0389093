mod common;

use assert_cmd::Command;
use common::*;
use mockito::Server;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn fdsync(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("fdsync").unwrap();
    cmd.env("FDSYNC_HOME", home.path())
        .env_remove("FDSYNC_SYNC__CONCURRENCY");
    cmd
}

fn add_repo(home: &TempDir, name: &str, address: &str, fingerprint: Option<&str>) {
    let mut cmd = fdsync(home);
    cmd.args(["repo", "add", name, address]);
    if let Some(fingerprint) = fingerprint {
        cmd.args(["--fingerprint", fingerprint]);
    }
    cmd.assert().success();
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("fdsync")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("repo"))
        .stdout(predicate::str::contains("fingerprint"));
}

#[test]
fn test_fingerprint_command() {
    let home = TempDir::new().unwrap();
    fdsync(&home)
        .arg("fingerprint")
        .arg(fixture_path("first/entry.jar"))
        .assert()
        .success()
        .stdout(predicate::str::contains(FINGERPRINT_A));

    fdsync(&home)
        .arg("fingerprint")
        .arg(fixture_path("legacy/index-v1.jar"))
        .arg("--formatted")
        .assert()
        .success()
        .stdout(predicate::str::contains("C3 A1 21 B8"));
}

#[test]
fn test_fingerprint_command_rejects_unsigned() {
    let home = TempDir::new().unwrap();
    fdsync(&home)
        .arg("fingerprint")
        .arg(fixture_path("unsigned.jar"))
        .assert()
        .failure()
        .code(31)
        .stderr(predicate::str::contains("not signed"));
}

#[test]
fn test_repo_add_list_remove() {
    let home = TempDir::new().unwrap();

    fdsync(&home)
        .args(["repo", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No repositories configured"));

    add_repo(&home, "main", "https://example.org/repo/", Some("c3:a1:21:b8:52:ea:e6:2f:27:f8:b9:6e:cc:e0:34:26:f5:75:17:94:8b:bb:ca:b2:f9:d3:18:16:bb:84:ae:79"));

    fdsync(&home)
        .args(["repo", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("main"))
        .stdout(predicate::str::contains("https://example.org/repo"))
        .stdout(predicate::str::contains("never"));

    fdsync(&home)
        .args(["repo", "add", "main", "https://other.example.org/repo"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("already exists"));

    fdsync(&home)
        .args(["repo", "remove", "main"])
        .assert()
        .success();

    fdsync(&home)
        .args(["repo", "remove", "main"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("not configured"));
}

#[test]
fn test_repo_add_rejects_invalid_fingerprint() {
    let home = TempDir::new().unwrap();
    fdsync(&home)
        .args(["repo", "add", "main", "https://example.org/repo", "--fingerprint", "abc"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Invalid fingerprint"));
    assert!(!home.path().join("config.toml").exists());
}

#[test]
fn test_repo_add_probes_address() {
    let mut server = Server::new();
    let _root = server.mock("HEAD", "/entry.jar").with_status(404).create();
    let _root_legacy = server.mock("HEAD", "/index-v1.jar").with_status(404).create();
    let _found = server
        .mock("HEAD", "/fdroid/repo/entry.jar")
        .with_status(200)
        .create();

    let home = TempDir::new().unwrap();
    fdsync(&home)
        .args(["repo", "add", "probed", &server.url(), "--probe"])
        .assert()
        .success();

    let config = fs::read_to_string(home.path().join("config.toml")).unwrap();
    assert!(config.contains(&format!("{}/fdroid/repo", server.url())));
}

#[test]
fn test_sync_without_repositories() {
    let home = TempDir::new().unwrap();
    fdsync(&home)
        .args(["sync", "--no-progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No repositories configured"));
}

#[test]
fn test_sync_unknown_repository() {
    let home = TempDir::new().unwrap();
    fdsync(&home)
        .args(["sync", "--no-progress", "missing"])
        .assert()
        .failure()
        .code(3);
}

#[test]
fn test_sync_pins_signer_on_first_use() {
    let mut server = Server::new();
    let _entry = serve(&mut server, "entry.jar", "first/entry.jar");
    let _index = serve(&mut server, "index-v2.json", "first/index-v2.json");

    let home = TempDir::new().unwrap();
    add_repo(&home, "main", &format!("{}/repo", server.url()), None);

    fdsync(&home)
        .args(["sync", "--no-progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("main: updated to 100 (1 packages)"))
        .stdout(predicate::str::contains("1 of 1 repositories synced"));

    let config = fs::read_to_string(home.path().join("config.toml")).unwrap();
    assert!(config.contains(FINGERPRINT_A));

    let state = fs::read_to_string(home.path().join("repos/main/state.json")).unwrap();
    assert!(state.contains(FINGERPRINT_A));
    assert!(home.path().join("repos/main/index-v2.json").exists());
}

#[test]
fn test_sync_rejects_rotated_signer() {
    let mut server = Server::new();
    let _entry = serve(&mut server, "entry.jar", "first/entry-other.jar");
    let index = serve(&mut server, "index-v2.json", "first/index-v2.json").expect(0);

    let home = TempDir::new().unwrap();
    add_repo(&home, "main", &format!("{}/repo", server.url()), Some(FINGERPRINT_A));

    fdsync(&home)
        .args(["sync", "--no-progress"])
        .assert()
        .failure()
        .code(30)
        .stderr(predicate::str::contains("does not match the pinned fingerprint"));

    index.assert();
    assert!(!home.path().join("repos/main").exists());
    let config = fs::read_to_string(home.path().join("config.toml")).unwrap();
    assert!(config.contains(FINGERPRINT_A));
    assert!(!config.contains(FINGERPRINT_B));
}

#[test]
fn test_second_sync_is_up_to_date() {
    let mut server = Server::new();
    let _entry = serve(&mut server, "entry.jar", "first/entry.jar");
    let index = serve(&mut server, "index-v2.json", "first/index-v2.json").expect(1);

    let home = TempDir::new().unwrap();
    add_repo(&home, "main", &format!("{}/repo", server.url()), Some(FINGERPRINT_A));

    for _ in 0..2 {
        fdsync(&home).args(["sync", "--no-progress"]).assert().success();
    }

    index.assert();
    fdsync(&home)
        .args(["sync", "--no-progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("main: up to date"));
}

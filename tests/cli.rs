//! CLI integration tests for campus admin commands.
//!
//! Each test uses an isolated temp directory for the database, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::Path;

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use campus::store::{SqliteStore, Store};
use predicates::prelude::*;
use serde_json::Value;

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn data_dir_str(&self) -> String {
        self.data_dir().to_string_lossy().to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("campus").expect("failed to find binary");
        cmd.env("NO_COLOR", "1");
        cmd
    }

    fn admin(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        let data_dir = self.data_dir_str();
        self.cmd()
            .arg("admin")
            .args(args)
            .args(["--data-dir", &data_dir])
            .assert()
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.admin(&["init"])
    }

    fn seed(&self) -> assert_cmd::assert::Assert {
        self.admin(&["seed"])
    }

    fn info_json(&self) -> Value {
        let output = self
            .cmd()
            .args(["admin", "info", "--data-dir", &self.data_dir_str(), "--json"])
            .output()
            .expect("failed to run command");
        assert!(output.status.success(), "info failed");

        serde_json::from_slice(&output.stdout).expect("failed to parse JSON")
    }

    fn store(&self) -> SqliteStore {
        SqliteStore::new(self.data_dir().join("campus.db")).expect("failed to open store")
    }
}

#[test]
fn test_init_creates_database() {
    let ctx = TestContext::new();

    ctx.init()
        .success()
        .stdout(predicate::str::contains("Database ready"));

    ctx.temp_dir.child("campus.db").assert(predicate::path::exists());

    let info = ctx.info_json();
    assert_eq!(info["users"], 0);
    assert_eq!(info["permissions"], 14);
}

#[test]
fn test_init_twice_keeps_data() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.seed().success();

    ctx.init().success();

    let info = ctx.info_json();
    assert_eq!(info["users"], 5);
}

#[test]
fn test_init_keeps_edited_baselines() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.store()
        .set_role_permissions("teacher", &["courses:read".to_string()])
        .unwrap();

    ctx.init().success();

    let baseline = ctx.store().list_role_permissions("teacher").unwrap();
    assert_eq!(baseline, vec!["courses:read".to_string()]);
}

#[test]
fn test_seed_requires_init() {
    let ctx = TestContext::new();

    ctx.seed()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Database not found"));
}

#[test]
fn test_seed_is_idempotent() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.seed()
        .success()
        .stdout(predicate::str::contains("admin@demo.com"))
        .stdout(predicate::str::contains("Course 'Journey' created: 4 books"));

    let admin_before = ctx
        .store()
        .get_user_by_email("admin@demo.com")
        .unwrap()
        .expect("admin missing");

    ctx.seed()
        .success()
        .stdout(predicate::str::contains("Course 'Journey' already exists"));

    let admin_after = ctx
        .store()
        .get_user_by_email("admin@demo.com")
        .unwrap()
        .expect("admin missing");
    assert_eq!(admin_before.id, admin_after.id);
    assert!(admin_after.updated_at >= admin_before.updated_at);

    let info = ctx.info_json();
    assert_eq!(info["users"], 5);
    assert_eq!(info["units"], 1);
    assert_eq!(info["staff"], 3);
    assert_eq!(info["students"], 1);
    assert_eq!(info["classes"], 1);
    let courses = info["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["name"], "Journey");
    assert_eq!(courses[0]["books"], 4);
}

#[test]
fn test_seed_rejects_short_password() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.admin(&["seed", "--password", "abc"])
        .failure()
        .code(1)
        .stderr(predicate::str::contains("at least 6 characters"));
}

#[test]
fn test_reset_clears_data() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.seed().success();

    ctx.admin(&["init", "--reset", "--yes"]).success();

    let info = ctx.info_json();
    assert_eq!(info["users"], 0);
    assert!(info["courses"].as_array().unwrap().is_empty());
    assert_eq!(info["permissions"], 14);
}

#[test]
fn test_delete_drops_tables() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.seed().success();

    ctx.admin(&["init", "--delete", "--yes"])
        .success()
        .stdout(predicate::str::contains("Dropped all tables"));

    ctx.admin(&["info"]).failure().code(1);

    ctx.init().success();
    assert_eq!(ctx.info_json()["users"], 0);
}

#[test]
fn test_delete_requires_database() {
    let ctx = TestContext::new();

    ctx.admin(&["init", "--delete", "--yes"])
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Database not found"));
}

#[test]
fn test_reset_and_delete_conflict() {
    let ctx = TestContext::new();

    ctx.admin(&["init", "--reset", "--delete", "--yes"])
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

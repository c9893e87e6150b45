//! CLI integration tests for server management commands.
//!
//! Each test uses an isolated temp directory for the database, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::Path;

use assert_cmd::Command;
use assert_fs::TempDir;
use chrono::Utc;
use predicates::prelude::*;
use tagnest::store::{SqliteStore, Store};
use tagnest::types::{Tag, User};
use uuid::Uuid;

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

    fn init(&self) -> assert_cmd::assert::Assert {
        Command::cargo_bin("tagnest")
            .expect("failed to find binary")
            .args(["init", "--data-dir", &self.data_dir_str()])
            .assert()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("tagnest").expect("failed to find binary");
        cmd.env("NO_COLOR", "1");
        cmd
    }

    fn open_store(&self) -> SqliteStore {
        SqliteStore::new(self.data_dir().join("tagnest.db")).expect("open store")
    }
}

#[test]
fn init_creates_database() {
    let ctx = TestContext::new();

    ctx.init()
        .success()
        .stdout(predicate::str::contains("Database created"));

    assert!(ctx.data_dir().join("tagnest.db").exists());
}

#[test]
fn init_refuses_to_overwrite_existing_database() {
    let ctx = TestContext::new();

    ctx.init().success();
    ctx.init()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn serve_requires_initialization() {
    let ctx = TestContext::new();

    ctx.cmd()
        .args(["serve", "--data-dir", &ctx.data_dir_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn initialized_store_accepts_tags() {
    let ctx = TestContext::new();
    ctx.init().success();

    let store = ctx.open_store();
    let now = Utc::now();

    // Tags reference their owner, so the account row has to exist first.
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: "owner@example.com".to_string(),
        display_name: "user_owner".to_string(),
        password_hash: "$argon2id$fake".to_string(),
        created_at: now,
        updated_at: now,
    };
    store.create_user(&user).expect("create user");

    let id = store
        .create_tag(&Tag {
            id: 0,
            user_id: user.id.clone(),
            name: "work".to_string(),
            parent_id: None,
            created_at: now,
            updated_at: now,
        })
        .expect("create tag");

    let tag = store
        .get_tag(&user.id, id)
        .expect("get tag")
        .expect("tag exists");
    assert_eq!(tag.name, "work");
    assert!(tag.parent_id.is_none());
}

#[test]
fn tag_commands_refuse_non_interactive_without_required_args() {
    let ctx = TestContext::new();

    ctx.cmd()
        .args(["tag", "remove", "--non-interactive"])
        .assert()
        .failure();
}

#[test]
fn help_lists_subcommands() {
    let ctx = TestContext::new();

    ctx.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("tag"))
        .stdout(predicate::str::contains("register"));
}

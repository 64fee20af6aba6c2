use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// A scratch marketplace: one database, one session file per user.
struct Market {
    dir: TempDir,
}

impl Market {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn db(&self) -> PathBuf {
        self.dir.path().join("market.db")
    }

    fn session(&self, user: &str) -> PathBuf {
        self.dir.path().join(format!("{user}.session"))
    }

    fn as_user(&self, user: &str) -> Command {
        cmd(&self.db(), &self.session(user))
    }

    fn sign_up(&self, user: &str) {
        self.as_user(user)
            .args(["register", "--username", user, "--email"])
            .arg(format!("{user}@swap.test"))
            .arg("--password-stdin")
            .write_stdin("open sesame\n")
            .assert()
            .success();
        self.as_user(user)
            .args(["login", "--username", user, "--password-stdin"])
            .write_stdin("open sesame\n")
            .assert()
            .success();
    }
}

fn cmd(db: &Path, session: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("skill-swap");
    cmd.env_remove("SKILLSWAP_DB_PATH")
        .env_remove("SKILLSWAP_SESSION_FILE")
        .env_remove("RUST_LOG")
        .arg("--db")
        .arg(db)
        .arg("--session-file")
        .arg(session);
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = cargo_bin_cmd!("skill-swap");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("register"))
        .stdout(predicate::str::contains("request"))
        .stdout(predicate::str::contains("review"))
        .stdout(predicate::str::contains("db"));
}

#[test]
fn test_cli_review_list_requires_a_target() {
    let market = Market::new();
    market
        .as_user("nobody")
        .args(["review", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--reviewer"));
}

#[test]
fn test_db_migrate_reports_version() {
    let market = Market::new();
    market
        .as_user("admin")
        .args(["--output", "json", "db", "migrate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"schema_version\": 2"));
}

#[test]
fn test_db_seed_is_idempotent() {
    let market = Market::new();
    market
        .as_user("admin")
        .args(["db", "seed"])
        .assert()
        .success();
    market
        .as_user("admin")
        .args(["--output", "json", "db", "seed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"skills_added\": 0"));
}

#[test]
fn test_commands_require_login() {
    let market = Market::new();
    market.sign_up("alice");

    let commands: [&[&str]; 6] = [
        &["skill", "mine"],
        &["user", "list"],
        &["user", "view", "1"],
        &["skill", "list"],
        &["skill", "browse", "1"],
        &["review", "list", "--reviewee", "1"],
    ];
    for args in commands {
        market
            .as_user("ghost")
            .args(args)
            .assert()
            .code(4)
            .stderr(predicate::str::contains("must be logged in"));
    }

    market.as_user("alice").args(["user", "list"]).assert().success();
}

#[test]
fn test_wrong_password_is_rejected() {
    let market = Market::new();
    market.sign_up("alice");
    market
        .as_user("alice")
        .args(["login", "--username", "alice", "--password-stdin"])
        .write_stdin("guessing\n")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("invalid username or password"));
}

#[test]
fn test_duplicate_registration_is_a_conflict() {
    let market = Market::new();
    market.sign_up("alice");
    market
        .as_user("alice")
        .args(["register", "--username", "alice", "--email", "other@swap.test", "--password-stdin"])
        .write_stdin("open sesame\n")
        .assert()
        .code(5);
}

#[test]
fn test_request_lifecycle_end_to_end() {
    let market = Market::new();
    market.sign_up("alice");
    market.sign_up("bob");

    market
        .as_user("bob")
        .args(["skill", "add", "Rust"])
        .assert()
        .success();

    market
        .as_user("alice")
        .args([
            "request", "create", "--provider", "2", "--skill", "1", "--time", "2099-05-01T14:30",
            "--duration", "60", "--credit", "10",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("pending"));

    // Reviews wait until the service is done.
    market
        .as_user("alice")
        .args(["review", "add", "--request", "1", "--rating", "5", "--comments", "great"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("only completed requests can be reviewed"));

    market
        .as_user("alice")
        .args(["request", "update", "1", "--status", "accepted"])
        .assert()
        .code(4);

    market
        .as_user("bob")
        .args(["request", "update", "1", "--status", "accepted"])
        .assert()
        .success()
        .stdout(predicate::str::contains("accepted"));

    market
        .as_user("alice")
        .args(["request", "update", "1", "--status", "pending"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("invalid status transition"));

    market
        .as_user("bob")
        .args(["request", "update", "1", "--status", "completed"])
        .assert()
        .success();

    market
        .as_user("alice")
        .args(["review", "add", "--request", "1", "--rating", "4", "--comments", "patient and clear"])
        .assert()
        .success();

    market
        .as_user("alice")
        .args(["--output", "json", "review", "list", "--reviewee", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"average_rating\": 4.0"))
        .stdout(predicate::str::contains("patient and clear"));

    market
        .as_user("bob")
        .args(["--output", "json", "review", "list", "--request", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("patient and clear"));

    // Only the two parties can read a request's reviews.
    market.sign_up("carol");
    market
        .as_user("carol")
        .args(["review", "list", "--request", "1"])
        .assert()
        .code(4);
}

#[test]
fn test_validation_errors_exit_with_two() {
    let market = Market::new();
    market.sign_up("alice");
    market.sign_up("bob");
    market.as_user("bob").args(["skill", "add", "Chess"]).assert().success();

    market
        .as_user("alice")
        .args(["review", "add", "--request", "42", "--rating", "9", "--comments", "x"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("rating must be between 1 and 5"));

    market
        .as_user("alice")
        .args([
            "request", "create", "--provider", "1", "--skill", "1", "--time", "2099-05-01T14:30",
            "--duration", "60", "--credit", "1",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("yourself"));

    market
        .as_user("alice")
        .args([
            "request", "create", "--provider", "2", "--skill", "1", "--time", "yesterday",
            "--duration", "60", "--credit", "1",
        ])
        .assert()
        .code(2);
}

#[test]
fn test_unknown_ids_exit_with_three() {
    let market = Market::new();
    market.sign_up("alice");
    market
        .as_user("alice")
        .args(["user", "view", "99"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("user with ID 99 not found"));
    market
        .as_user("alice")
        .args(["skill", "browse", "7"])
        .assert()
        .code(3);
}

#[test]
fn test_logout_forgets_the_session() {
    let market = Market::new();
    market.sign_up("alice");
    assert!(market.session("alice").exists());

    market
        .as_user("alice")
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Goodbye, alice!"));
    assert!(!market.session("alice").exists());

    market
        .as_user("alice")
        .args(["skill", "mine"])
        .assert()
        .code(4);
}

#[test]
fn test_deleted_account_disappears() {
    let market = Market::new();
    market.sign_up("alice");
    market.sign_up("bob");

    market
        .as_user("bob")
        .args(["user", "delete", "--yes"])
        .assert()
        .success();

    market
        .as_user("alice")
        .args(["--output", "json", "user", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("bob").not());

    market
        .as_user("bob")
        .args(["login", "--username", "bob", "--password-stdin"])
        .write_stdin("open sesame\n")
        .assert()
        .code(4);
}

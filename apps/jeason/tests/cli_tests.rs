//! Integration tests for Jeason CLI commands.
//!
//! Uses tempfile for testing file-based operations.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use clap::Parser;
use jeason::cli::{Cli, CliError, Commands, cmd_create_admin, cmd_init, cmd_status};
use jeason_core::{CoreError, Role};
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create a temporary directory for tests.
fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn initialized_db(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("jeason.redb");
    cmd_init(&path, false).unwrap();
    path
}

// =============================================================================
// INIT COMMAND TESTS
// =============================================================================

#[test]
fn test_init_creates_database() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("data").join("site.redb");

    let result = cmd_init(&db_path, false);
    assert!(result.is_ok());
    assert!(db_path.exists());
}

#[test]
fn test_init_fails_if_exists_without_force() {
    let temp = create_temp_dir();
    let db_path = initialized_db(&temp);

    let result = cmd_init(&db_path, false);
    assert!(matches!(result, Err(CliError::AlreadyExists(_))));
}

#[test]
fn test_init_with_force_starts_empty() {
    let temp = create_temp_dir();
    let db_path = initialized_db(&temp);
    cmd_create_admin(&db_path, "admin@jeasonsteel.com", Some("rebar-2024")).unwrap();

    cmd_init(&db_path, true).unwrap();

    let report: Value = serde_json::from_str(&cmd_status(&db_path, true).unwrap()).unwrap();
    assert_eq!(report["tables"]["accounts"], 0);
}

// =============================================================================
// CREATE-ADMIN COMMAND TESTS
// =============================================================================

#[test]
fn test_create_admin() {
    let temp = create_temp_dir();
    let db_path = initialized_db(&temp);

    let account =
        cmd_create_admin(&db_path, " Admin@JeasonSteel.com ", Some("rebar-2024")).unwrap();
    assert_eq!(account.email, "admin@jeasonsteel.com");
    assert_eq!(account.role, Role::Admin);
}

#[test]
fn test_create_admin_twice_conflicts() {
    let temp = create_temp_dir();
    let db_path = initialized_db(&temp);
    cmd_create_admin(&db_path, "admin@jeasonsteel.com", Some("rebar-2024")).unwrap();

    let result = cmd_create_admin(&db_path, "admin@jeasonsteel.com", Some("other-pass"));
    assert!(matches!(result, Err(CliError::Core(CoreError::Conflict(_)))));
}

#[test]
fn test_create_admin_rejects_short_password() {
    let temp = create_temp_dir();
    let db_path = initialized_db(&temp);

    let result = cmd_create_admin(&db_path, "admin@jeasonsteel.com", Some("abc"));
    assert!(matches!(result, Err(CliError::Core(CoreError::Validation(_)))));
}

#[test]
fn test_create_admin_requires_database() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("missing.redb");

    let result = cmd_create_admin(&db_path, "admin@jeasonsteel.com", Some("rebar-2024"));
    assert!(matches!(result, Err(CliError::MissingDatabase(_))));
    assert!(!db_path.exists());
}

// =============================================================================
// STATUS COMMAND TESTS
// =============================================================================

#[test]
fn test_status_text_mode() {
    let temp = create_temp_dir();
    let db_path = initialized_db(&temp);

    let out = cmd_status(&db_path, false).unwrap();
    assert!(out.contains("products"));
    assert!(out.contains("Pending: 0 quotes, 0 applications, 0 transactions"));
}

#[test]
fn test_status_json_mode() {
    let temp = create_temp_dir();
    let db_path = initialized_db(&temp);
    cmd_create_admin(&db_path, "admin@jeasonsteel.com", Some("rebar-2024")).unwrap();

    let report: Value = serde_json::from_str(&cmd_status(&db_path, true).unwrap()).unwrap();
    assert_eq!(report["tables"]["accounts"], 1);
    assert_eq!(report["tables"]["transactions"], 0);
    assert_eq!(report["summary"]["pending_quotes"], 0);
}

#[test]
fn test_status_missing_database() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("nope.redb");

    assert!(matches!(
        cmd_status(&db_path, false),
        Err(CliError::MissingDatabase(_))
    ));
    assert!(!db_path.exists());
}

// =============================================================================
// ARGUMENT PARSING
// =============================================================================

#[test]
fn test_serve_flags_build_config() {
    let cli = Cli::try_parse_from([
        "jeason",
        "serve",
        "--port",
        "9000",
        "--cors-origins",
        "https://jeasonsteel.com, https://admin.jeasonsteel.com",
        "--submissions-per-minute",
        "5",
    ])
    .unwrap();
    let Commands::Serve(args) = cli.command else {
        panic!("expected serve");
    };
    let config = args.to_config();
    assert_eq!(config.port, 9000);
    assert_eq!(config.submissions_per_minute, 5);
    assert_eq!(config.auth_attempts_per_minute, 20);
    assert_eq!(config.cors_origins.len(), 2);
    assert!(config.flutterwave_secret.is_none());
    assert_eq!(args.database, PathBuf::from("jeason.redb"));
}

#[test]
fn test_create_admin_requires_email() {
    assert!(Cli::try_parse_from(["jeason", "create-admin"]).is_err());
}

//! # CLI
//!
//! Command definitions and their implementations.
//!
//! | Command        | Purpose                                        |
//! |----------------|------------------------------------------------|
//! | `serve`        | run the HTTP server                            |
//! | `init`         | create an empty database file                  |
//! | `create-admin` | add a back-office account                      |
//! | `status`       | print row counts and the dashboard summary     |

use crate::api::{self, AppState};
use crate::api::auth::new_salt;
use crate::clock;
use crate::config::{ServerConfig, parse_origins};
use clap::{Args, Parser, Subcommand};
use jeason_core::storage::{MemoryStore, RecordStore, RedbStore, Table};
use jeason_core::{Account, Backoffice, CoreError, Role};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Default database file.
pub const DEFAULT_DB: &str = "jeason.redb";

/// Environment variable read by `create-admin` when `--password` is absent.
pub const ADMIN_PASSWORD_VAR: &str = "JEASON_ADMIN_PASSWORD";

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database already exists at {0} (use --force to overwrite)")]
    AlreadyExists(PathBuf),

    #[error("no database at {0} (run `jeason init` first)")]
    MissingDatabase(PathBuf),

    #[error("{0}")]
    Usage(String),
}

// =============================================================================
// ARGUMENTS
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "jeason", version, about = "Jeason Steel storefront and back-office server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server.
    Serve(ServeArgs),

    /// Create an empty database.
    Init {
        #[arg(short, long, default_value = DEFAULT_DB)]
        database: PathBuf,
        /// Replace an existing database.
        #[arg(long)]
        force: bool,
    },

    /// Create an admin account.
    CreateAdmin {
        #[arg(short, long, default_value = DEFAULT_DB)]
        database: PathBuf,
        #[arg(long)]
        email: String,
        /// Falls back to $JEASON_ADMIN_PASSWORD.
        #[arg(long)]
        password: Option<String>,
    },

    /// Show row counts.
    Status {
        #[arg(short, long, default_value = DEFAULT_DB)]
        database: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(short, long, default_value = DEFAULT_DB)]
    pub database: PathBuf,
    /// Keep everything in memory (data is lost on exit).
    #[arg(long)]
    pub in_memory: bool,
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,
    #[arg(long, default_value = "uploads")]
    pub files_dir: PathBuf,
    #[arg(long, default_value = "http://localhost:8080")]
    pub public_url: String,
    /// Comma-separated list of allowed CORS origins.
    #[arg(long, default_value = "")]
    pub cors_origins: String,
    #[arg(long, default_value = "https://api.flutterwave.com")]
    pub flutterwave_url: String,
    #[arg(long, default_value = "https://api.resend.com")]
    pub email_api_url: String,
    #[arg(long, default_value = "Jeason Steel <payments@jeasonsteel.com>")]
    pub email_from: String,
    #[arg(long, default_value_t = 30)]
    pub submissions_per_minute: u32,
    #[arg(long, default_value_t = 20)]
    pub auth_attempts_per_minute: u32,
    #[arg(long, default_value_t = 5 * 1024 * 1024)]
    pub max_upload_bytes: usize,
}

impl ServeArgs {
    /// Server settings from the flags. Secrets are loaded separately.
    #[must_use]
    pub fn to_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            files_dir: self.files_dir.clone(),
            public_url: self.public_url.clone(),
            cors_origins: parse_origins(&self.cors_origins),
            flutterwave_url: self.flutterwave_url.clone(),
            flutterwave_secret: None,
            email_api_url: self.email_api_url.clone(),
            email_api_key: None,
            email_from: self.email_from.clone(),
            submissions_per_minute: self.submissions_per_minute,
            auth_attempts_per_minute: self.auth_attempts_per_minute,
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

fn open_existing(database: &Path) -> Result<Backoffice, CliError> {
    if !database.exists() {
        return Err(CliError::MissingDatabase(database.to_path_buf()));
    }
    Ok(Backoffice::new(Arc::new(RedbStore::open(database)?)))
}

/// Create an empty database at `database`.
pub fn cmd_init(database: &Path, force: bool) -> Result<(), CliError> {
    if database.exists() {
        if !force {
            return Err(CliError::AlreadyExists(database.to_path_buf()));
        }
        std::fs::remove_file(database)?;
    }
    if let Some(parent) = database.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    RedbStore::open(database)?;
    info!("Initialized database at {}", database.display());
    Ok(())
}

/// Add an admin account to an existing database.
pub fn cmd_create_admin(
    database: &Path,
    email: &str,
    password: Option<&str>,
) -> Result<Account, CliError> {
    let from_env = std::env::var(ADMIN_PASSWORD_VAR).ok();
    let password = password
        .or(from_env.as_deref())
        .ok_or_else(|| CliError::Usage(format!("pass --password or set {ADMIN_PASSWORD_VAR}")))?;

    let office = open_existing(database)?;
    let account = office.create_account(email, password, Role::Admin, new_salt(), clock::now())?;
    info!(account = account.id, email = %account.email, "admin account created");
    Ok(account)
}

/// Row counts and dashboard summary, as text or JSON.
pub fn cmd_status(database: &Path, json_output: bool) -> Result<String, CliError> {
    if !database.exists() {
        return Err(CliError::MissingDatabase(database.to_path_buf()));
    }
    let store = RedbStore::open(database)?;
    let mut counts = Vec::with_capacity(Table::ALL.len());
    for table in Table::ALL {
        counts.push((table.name(), store.count(table)?));
    }
    let summary = Backoffice::new(Arc::new(store)).summary()?;

    if json_output {
        let tables: serde_json::Map<String, serde_json::Value> = counts
            .iter()
            .map(|(name, count)| ((*name).to_string(), json!(count)))
            .collect();
        let report = json!({
            "database": database.display().to_string(),
            "tables": tables,
            "summary": summary,
        });
        return Ok(serde_json::to_string_pretty(&report).unwrap_or_default());
    }

    let mut out = format!("Database: {}\n", database.display());
    for (name, count) in &counts {
        out.push_str(&format!("  {name:<20} {count}\n"));
    }
    out.push_str(&format!(
        "Pending: {} quotes, {} applications, {} transactions\n",
        summary.pending_quotes, summary.pending_applications, summary.pending_transactions
    ));
    Ok(out)
}

/// Run the server until shutdown.
pub async fn cmd_serve(args: &ServeArgs) -> Result<(), CliError> {
    let store: Arc<dyn RecordStore> = if args.in_memory {
        info!("Using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        info!("Opening database at {}", args.database.display());
        Arc::new(RedbStore::open(&args.database)?)
    };
    let config = args.to_config().with_secrets();
    let state = AppState::new(Backoffice::new(store), config)?;
    api::serve(state).await?;
    Ok(())
}

//! # Server Configuration
//!
//! Plain settings come from `serve` flags. Secrets come from the environment,
//! falling back to a Docker/Swarm secret file at `/run/secrets/<NAME>`.
//! A missing secret disables the feature that needs it and is logged once
//! at startup.

use std::env;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable holding the payment provider secret key.
pub const FLUTTERWAVE_SECRET_VAR: &str = "FLW_SECRET_KEY";

/// Environment variable holding the email API key.
pub const EMAIL_API_KEY_VAR: &str = "RESEND_API_KEY";

const SECRETS_DIR: &str = "/run/secrets";

/// Everything the HTTP server needs besides the store.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Root of the file store; one sub-directory per bucket.
    pub files_dir: PathBuf,
    /// Public base URL of the site, used for payment callbacks and file links
    /// when the request carries no `Origin`.
    pub public_url: String,
    /// Allowed CORS origins. Empty means same-origin only.
    pub cors_origins: Vec<String>,
    pub flutterwave_url: String,
    pub flutterwave_secret: Option<String>,
    pub email_api_url: String,
    pub email_api_key: Option<String>,
    pub email_from: String,
    /// Public form submissions allowed per minute across all clients.
    pub submissions_per_minute: u32,
    /// Sign-up and sign-in attempts allowed per minute across all clients.
    pub auth_attempts_per_minute: u32,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            files_dir: PathBuf::from("uploads"),
            public_url: "http://localhost:8080".to_string(),
            cors_origins: Vec::new(),
            flutterwave_url: "https://api.flutterwave.com".to_string(),
            flutterwave_secret: None,
            email_api_url: "https://api.resend.com".to_string(),
            email_api_key: None,
            email_from: "Jeason Steel <payments@jeasonsteel.com>".to_string(),
            submissions_per_minute: 30,
            auth_attempts_per_minute: 20,
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// `host:port` for the listener.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Pull secrets from the environment or secret files.
    #[must_use]
    pub fn with_secrets(mut self) -> Self {
        self.flutterwave_secret = load_secret(FLUTTERWAVE_SECRET_VAR, Path::new(SECRETS_DIR));
        self.email_api_key = load_secret(EMAIL_API_KEY_VAR, Path::new(SECRETS_DIR));
        if self.flutterwave_secret.is_none() {
            warn!("{FLUTTERWAVE_SECRET_VAR} not set; card payments will fail");
        }
        if self.email_api_key.is_none() {
            info!("{EMAIL_API_KEY_VAR} not set; payment emails are disabled");
        }
        self
    }
}

/// Read a secret from `name` in the environment, then from `<dir>/<name>`.
///
/// Blank values count as unset.
pub fn load_secret(name: &str, dir: &Path) -> Option<String> {
    if let Ok(value) = env::var(name) {
        let value = value.trim().to_string();
        if !value.is_empty() {
            return Some(value);
        }
    }
    let path = dir.join(name);
    match read_to_string(&path) {
        Ok(contents) => Some(contents.trim().to_string()).filter(|s| !s.is_empty()),
        Err(e) => {
            info!("No secret file for {name} at {}: {e}", path.display());
            None
        }
    }
}

/// Split a comma-separated origin list, dropping blanks and trailing slashes.
#[must_use]
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn secret_file_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("JEASON_TEST_SECRET_A"), "  sk_test_123\n").unwrap();
        assert_eq!(
            load_secret("JEASON_TEST_SECRET_A", dir.path()),
            Some("sk_test_123".to_string())
        );
    }

    #[test]
    fn missing_or_blank_secret_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_secret("JEASON_TEST_SECRET_B", dir.path()), None);
        std::fs::write(dir.path().join("JEASON_TEST_SECRET_C"), "   ").unwrap();
        assert_eq!(load_secret("JEASON_TEST_SECRET_C", dir.path()), None);
    }

    #[test]
    fn origins_are_split_and_cleaned() {
        assert_eq!(
            parse_origins("https://jeasonsteel.com/, ,http://localhost:5173"),
            vec![
                "https://jeasonsteel.com".to_string(),
                "http://localhost:5173".to_string()
            ]
        );
        assert!(parse_origins("").is_empty());
    }
}

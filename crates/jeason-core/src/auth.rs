//! # Auth
//!
//! Accounts, password hashing and bearer sessions.
//!
//! ## Passwords
//!
//! Each account has a random 16-byte salt (drawn by the caller). The stored
//! hash is an iterated blake3 key derivation over salt and password, and
//! comparisons use `subtle::ConstantTimeEq`.
//!
//! ## Sessions
//!
//! Sign-in issues an access/refresh token pair. Tokens are opaque random
//! strings generated by the caller; only their blake3 digest is stored.
//! Refreshing deletes both halves of the old pair and issues a new one.
//! Sign-out deletes the pair. Expired rows are pruned on every sign-in.

use crate::storage::Table;
use crate::validation::{self, FieldErrors};
use crate::{Account, Backoffice, CoreError, Role, Session, SessionKind, Timestamp};
use serde::Serialize;
use subtle::ConstantTimeEq;

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Access token lifetime (1 hour).
pub const ACCESS_TTL_SECS: u64 = 60 * 60;

/// Refresh token lifetime (30 days).
pub const REFRESH_TTL_SECS: u64 = 30 * 24 * 60 * 60;

const PASSWORD_CONTEXT: &str = "jeason-steel 2024-06 account password";
const PASSWORD_ROUNDS: u32 = 4_096;

const BAD_CREDENTIALS: &str = "Invalid email or password";
const BAD_SESSION: &str = "Session expired or invalid";

// =============================================================================
// HASHING
// =============================================================================

/// Derive the stored password hash.
#[must_use]
pub fn hash_password(password: &str, salt: &[u8; 16]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(PASSWORD_CONTEXT);
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let mut out = *hasher.finalize().as_bytes();
    for _ in 1..PASSWORD_ROUNDS {
        let mut round = blake3::Hasher::new_derive_key(PASSWORD_CONTEXT);
        round.update(salt);
        round.update(&out);
        out = *round.finalize().as_bytes();
    }
    out
}

/// Hex digest under which a token's session is stored.
#[must_use]
pub fn token_digest(token: &str) -> String {
    blake3::hash(token.as_bytes()).to_hex().to_string()
}

/// Lowercased, trimmed email used as the account key.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn password_matches(account: &Account, password: &str) -> bool {
    let candidate = hash_password(password, &account.password_salt);
    candidate.ct_eq(&account.password_hash).into()
}

// =============================================================================
// TYPES
// =============================================================================

/// Caller-generated token strings for a new session pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// What a client receives after signing in or refreshing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionGrant {
    pub access_token: String,
    pub refresh_token: String,
    /// When the access token stops working.
    pub expires_at: Timestamp,
    pub user: Profile,
}

/// The public face of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: u64,
    pub email: String,
    pub role: Role,
}

impl From<&Account> for Profile {
    fn from(account: &Account) -> Self {
        Profile {
            id: account.id,
            email: account.email.clone(),
            role: account.role,
        }
    }
}

/// The three fields of the change-password form.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl Backoffice {
    // =========================================================================
    // ACCOUNTS
    // =========================================================================

    /// Self-service registration. Always creates a customer.
    pub fn sign_up(
        &self,
        email: &str,
        password: &str,
        salt: [u8; 16],
        now: Timestamp,
    ) -> Result<Account, CoreError> {
        self.create_account(email, password, Role::Customer, salt, now)
    }

    /// Create an account with an explicit role.
    pub fn create_account(
        &self,
        email: &str,
        password: &str,
        role: Role,
        salt: [u8; 16],
        now: Timestamp,
    ) -> Result<Account, CoreError> {
        let mut errors = FieldErrors::new();
        validation::email(&mut errors, "email", email);
        if password.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            );
        }
        errors.into_result()?;

        let email = normalize_email(email);
        if self.load::<Account>(&email)?.is_some() {
            return Err(CoreError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }
        let account = Account {
            id: self.next_id(Table::Accounts)?,
            email,
            role,
            password_salt: salt,
            password_hash: hash_password(password, &salt),
            created_at: now,
            updated_at: now,
        };
        if !self.save_new(&account)? {
            return Err(CoreError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }
        Ok(account)
    }

    /// Check an email and password pair.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Account, CoreError> {
        match self.load::<Account>(&normalize_email(email))? {
            Some(account) if password_matches(&account, password) => Ok(account),
            Some(_) => Err(CoreError::Unauthorized(BAD_CREDENTIALS.to_string())),
            None => {
                // Burn the same work as a real check.
                std::hint::black_box(hash_password(password, &[0; 16]));
                Err(CoreError::Unauthorized(BAD_CREDENTIALS.to_string()))
            }
        }
    }

    pub fn account_by_id(&self, id: u64) -> Result<Account, CoreError> {
        self.load_all::<Account>()?
            .into_iter()
            .find(|a| a.id == id)
            .ok_or_else(|| CoreError::not_found(format!("account {id}")))
    }

    pub fn list_accounts(&self) -> Result<Vec<Account>, CoreError> {
        let mut accounts: Vec<Account> = self.load_all()?;
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    /// Replace the password after re-checking the current one.
    ///
    /// Existing sessions stay valid.
    pub fn change_password(
        &self,
        account_id: u64,
        change: &PasswordChange,
        salt: [u8; 16],
        now: Timestamp,
    ) -> Result<Account, CoreError> {
        let mut errors = FieldErrors::new();
        validation::required(
            &mut errors,
            "current_password",
            &change.current_password,
            "Current password",
        );
        validation::required(&mut errors, "new_password", &change.new_password, "New password");
        validation::required(
            &mut errors,
            "confirm_password",
            &change.confirm_password,
            "Password confirmation",
        );
        errors.into_result()?;

        if change.new_password != change.confirm_password {
            return Err(CoreError::field("confirm_password", "Passwords do not match"));
        }
        if change.new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CoreError::field(
                "new_password",
                &format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }

        let mut account = self.account_by_id(account_id)?;
        if !password_matches(&account, &change.current_password) {
            return Err(CoreError::field(
                "current_password",
                "Current password is incorrect",
            ));
        }
        account.password_salt = salt;
        account.password_hash = hash_password(&change.new_password, &salt);
        account.updated_at = now;
        self.save(&account)?;
        Ok(account)
    }

    // =========================================================================
    // SESSIONS
    // =========================================================================

    /// Store a fresh access/refresh pair for an account.
    pub fn open_session(
        &self,
        account: &Account,
        tokens: TokenPair,
        now: Timestamp,
    ) -> Result<SessionGrant, CoreError> {
        if tokens.access.is_empty()
            || tokens.refresh.is_empty()
            || tokens.access == tokens.refresh
        {
            return Err(CoreError::Conflict("unusable session tokens".to_string()));
        }
        let access_digest = token_digest(&tokens.access);
        let refresh_digest = token_digest(&tokens.refresh);
        let expires_at = now.plus_secs(ACCESS_TTL_SECS);

        let access = Session {
            digest: access_digest.clone(),
            pair_digest: refresh_digest.clone(),
            account_id: account.id,
            kind: SessionKind::Access,
            issued_at: now,
            expires_at,
        };
        let refresh = Session {
            digest: refresh_digest,
            pair_digest: access_digest,
            account_id: account.id,
            kind: SessionKind::Refresh,
            issued_at: now,
            expires_at: now.plus_secs(REFRESH_TTL_SECS),
        };
        if !self.save_new(&access)? || !self.save_new(&refresh)? {
            return Err(CoreError::Conflict("session token collision".to_string()));
        }

        Ok(SessionGrant {
            access_token: tokens.access,
            refresh_token: tokens.refresh,
            expires_at,
            user: Profile::from(account),
        })
    }

    /// Sign in and open a session in one step.
    pub fn sign_in(
        &self,
        email: &str,
        password: &str,
        tokens: TokenPair,
        now: Timestamp,
    ) -> Result<SessionGrant, CoreError> {
        let account = self.authenticate(email, password)?;
        self.prune_sessions(now)?;
        self.open_session(&account, tokens, now)
    }

    fn live_session(
        &self,
        token: &str,
        kind: SessionKind,
        now: Timestamp,
    ) -> Result<Session, CoreError> {
        let digest = token_digest(token);
        let session = self
            .load::<Session>(&digest)?
            .filter(|s| bool::from(s.digest.as_bytes().ct_eq(digest.as_bytes())))
            .filter(|s| s.kind == kind && s.is_live(now))
            .ok_or_else(|| CoreError::Unauthorized(BAD_SESSION.to_string()))?;
        Ok(session)
    }

    /// The account behind a live access token.
    pub fn resolve_session(
        &self,
        access_token: &str,
        now: Timestamp,
    ) -> Result<Account, CoreError> {
        let session = self.live_session(access_token, SessionKind::Access, now)?;
        self.account_by_id(session.account_id).map_err(|err| match err {
            CoreError::NotFound(_) => CoreError::Unauthorized(BAD_SESSION.to_string()),
            other => other,
        })
    }

    /// Delete both halves of a pair.
    ///
    /// The refresh row is removed first and acts as the claim: only the
    /// request that removes it wins, so a pair ends at most once even under
    /// concurrent refresh and sign-out.
    fn end_pair(&self, session: &Session) -> Result<bool, CoreError> {
        let (refresh, access) = match session.kind {
            SessionKind::Refresh => (&session.digest, &session.pair_digest),
            SessionKind::Access => (&session.pair_digest, &session.digest),
        };
        if !self.remove::<Session>(refresh)? {
            return Ok(false);
        }
        self.remove::<Session>(access)?;
        Ok(true)
    }

    /// Trade a live refresh token for a new pair. The old pair stops working.
    pub fn refresh_session(
        &self,
        refresh_token: &str,
        tokens: TokenPair,
        now: Timestamp,
    ) -> Result<SessionGrant, CoreError> {
        let session = self.live_session(refresh_token, SessionKind::Refresh, now)?;
        let account = self
            .account_by_id(session.account_id)
            .map_err(|_| CoreError::Unauthorized(BAD_SESSION.to_string()))?;
        if !self.end_pair(&session)? {
            return Err(CoreError::Unauthorized(BAD_SESSION.to_string()));
        }
        self.open_session(&account, tokens, now)
    }

    /// End the pair an access token belongs to.
    pub fn sign_out(&self, access_token: &str, now: Timestamp) -> Result<(), CoreError> {
        let session = self.live_session(access_token, SessionKind::Access, now)?;
        if !self.end_pair(&session)? {
            return Err(CoreError::Unauthorized(BAD_SESSION.to_string()));
        }
        Ok(())
    }

    /// Delete every session row that has expired at `now`.
    pub fn prune_sessions(&self, now: Timestamp) -> Result<usize, CoreError> {
        let mut pruned = 0;
        for session in self.load_all::<Session>()? {
            if !session.is_live(now) && self.remove::<Session>(&session.digest)? {
                pruned += 1;
            }
        }
        Ok(pruned)
    }
}

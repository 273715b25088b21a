//! Identity gate: credential check, token issuance and verification.
//!
//! # Invariants
//! - Unknown usernames and wrong secrets fail with the same `Unauthorized`.
//! - Tokens are random, opaque and expire after the configured TTL.
//! - Every successful login drops expired sessions, so the table stays bounded
//!   by the sessions live within one TTL.
//! - Tokens and secrets are never logged.

use crate::auth::password::PasswordHasher;
use crate::repo::admin_repo::AdminRepository;
use crate::repo::student_repo::RepoError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use uuid::Uuid;

pub type AuthResult<T> = Result<T, AuthError>;

/// Opaque bearer token issued by [`IdentityGate::authenticate`].
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Verified caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminIdentity {
    pub username: String,
}

#[derive(Debug)]
pub enum AuthError {
    Unauthorized,
    Repo(RepoError),
    /// A thread panicked while holding the session table lock.
    SessionsPoisoned,
    /// The password hasher failed to produce a hash.
    Hashing(String),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "invalid or missing credentials"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::SessionsPoisoned => write!(f, "session table lock is poisoned"),
            Self::Hashing(message) => write!(f, "password hashing failed: {message}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Unauthorized | Self::SessionsPoisoned | Self::Hashing(_) => None,
        }
    }
}

impl From<RepoError> for AuthError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Authenticates credential pairs and verifies issued tokens.
pub trait IdentityGate: Send + Sync {
    fn authenticate(&self, username: &str, secret: &str) -> AuthResult<Token>;
    fn verify(&self, token: &Token) -> AuthResult<AdminIdentity>;
    /// Invalidates `token`; unknown tokens are ignored.
    fn revoke(&self, token: &Token) -> AuthResult<()>;
}

#[derive(Debug, Clone)]
struct Session {
    username: String,
    expires_at: Instant,
}

/// In-process session table over stored admin accounts.
pub struct SessionGate<R: AdminRepository> {
    repo: R,
    hasher: Arc<dyn PasswordHasher>,
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl<R: AdminRepository> SessionGate<R> {
    pub fn new(repo: R, hasher: Arc<dyn PasswordHasher>, ttl: Duration) -> Self {
        Self {
            repo,
            hasher,
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Drops every expired session; returns how many were removed.
    pub fn purge_expired(&self) -> AuthResult<usize> {
        let now = Instant::now();
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| AuthError::SessionsPoisoned)?;
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        Ok(before - sessions.len())
    }
}

impl<R: AdminRepository + Send + Sync> IdentityGate for SessionGate<R> {
    fn authenticate(&self, username: &str, secret: &str) -> AuthResult<Token> {
        let admin = self.repo.find_by_username(username)?;
        let accepted = admin
            .as_ref()
            .is_some_and(|admin| self.hasher.verify(secret, &admin.password_hash));
        if !accepted {
            warn!("event=auth_login module=auth status=rejected username={username}");
            return Err(AuthError::Unauthorized);
        }

        let purged = self.purge_expired()?;
        let token = Uuid::new_v4().simple().to_string();
        let session = Session {
            username: username.to_string(),
            expires_at: Instant::now() + self.ttl,
        };
        self.sessions
            .write()
            .map_err(|_| AuthError::SessionsPoisoned)?
            .insert(token.clone(), session);

        info!(
            "event=auth_login module=auth status=ok username={} ttl_secs={} purged_sessions={}",
            username,
            self.ttl.as_secs(),
            purged
        );
        Ok(Token(token))
    }

    fn verify(&self, token: &Token) -> AuthResult<AdminIdentity> {
        let session = self
            .sessions
            .read()
            .map_err(|_| AuthError::SessionsPoisoned)?
            .get(token.as_str())
            .cloned();

        match session {
            Some(session) if session.expires_at > Instant::now() => Ok(AdminIdentity {
                username: session.username,
            }),
            Some(_) => {
                self.revoke(token)?;
                Err(AuthError::Unauthorized)
            }
            None => Err(AuthError::Unauthorized),
        }
    }

    fn revoke(&self, token: &Token) -> AuthResult<()> {
        self.sessions
            .write()
            .map_err(|_| AuthError::SessionsPoisoned)?
            .remove(token.as_str());
        Ok(())
    }
}

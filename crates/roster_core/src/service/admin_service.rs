//! Administrator account use-cases: registration, login and bootstrap.

use crate::auth::gate::{IdentityGate, Token};
use crate::auth::password::PasswordHasher;
use crate::config::BootstrapAdmin;
use crate::model::validation::ValidationError;
use crate::repo::admin_repo::AdminRepository;
use crate::service::error::ServiceResult;
use log::info;
use std::sync::Arc;

/// Admin account service sharing its hasher with the identity gate.
pub struct AdminService<R: AdminRepository, G: IdentityGate> {
    repo: R,
    hasher: Arc<dyn PasswordHasher>,
    gate: Arc<G>,
}

impl<R: AdminRepository, G: IdentityGate> AdminService<R, G> {
    pub fn new(repo: R, hasher: Arc<dyn PasswordHasher>, gate: Arc<G>) -> Self {
        Self { repo, hasher, gate }
    }

    /// Registers a new admin; `Conflict` when the username is taken.
    pub fn register(&self, username: &str, password: &str) -> ServiceResult<()> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ValidationError::new("username", "username is required").into());
        }
        if password.is_empty() {
            return Err(ValidationError::new("password", "password is required").into());
        }

        self.repo.create(username, &self.hasher.hash(password)?)?;
        info!("event=admin_register module=service status=ok username={username}");
        Ok(())
    }

    /// Exchanges credentials for a session token.
    pub fn login(&self, username: &str, password: &str) -> ServiceResult<Token> {
        Ok(self.gate.authenticate(username, password)?)
    }

    /// Creates the configured admin when no admin exists yet.
    ///
    /// Returns whether an account was created.
    pub fn ensure_bootstrap_admin(&self, admin: &BootstrapAdmin) -> ServiceResult<bool> {
        if self.repo.count()? > 0 {
            return Ok(false);
        }
        self.repo
            .create(&admin.username, &self.hasher.hash(&admin.password)?)?;
        info!(
            "event=admin_bootstrap module=service status=ok username={}",
            admin.username
        );
        Ok(true)
    }
}

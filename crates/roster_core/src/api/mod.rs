//! Transport-facing facade over the roster services.
//!
//! # Responsibility
//! - Guard every student operation behind token verification.
//! - Map service outcomes onto status-coded `ApiResponse` envelopes.
//!
//! # Invariants
//! - Unknown and wrong credentials produce the same 401 envelope.
//! - Internal failures surface as a generic 500; details go to the log only.

use crate::auth::gate::{AdminIdentity, IdentityGate, SessionGate, Token};
use crate::auth::password::{Argon2PasswordHasher, PasswordHasher};
use crate::config::AppConfig;
use crate::db::{open_db, open_db_in_memory, share, DbError, SharedConnection};
use crate::model::page::Page;
use crate::model::student::{Student, StudentDraft, StudentId};
use crate::repo::admin_repo::SqliteAdminRepository;
use crate::repo::student_repo::SqliteStudentRepository;
use crate::service::admin_service::AdminService;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::student_service::{ExportSummary, ImportSummary, StudentQuery, StudentService};
use log::{error, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{Read, Write};
use std::sync::Arc;

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;
pub const STATUS_NO_CONTENT: u16 = 204;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_UNAUTHORIZED: u16 = 401;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_CONFLICT: u16 = 409;
pub const STATUS_INTERNAL: u16 = 500;

/// Error payload of a failed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
    /// Field name to message; empty unless the call failed validation.
    pub errors: BTreeMap<String, String>,
}

/// Status-coded result envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> ApiResponse<T> {
    fn success(status: u16, body: Option<T>) -> Self {
        Self {
            status,
            body,
            error: None,
        }
    }

    fn failure(err: ServiceError) -> Self {
        let message = err.to_string();
        let (status, message, errors) = match err {
            ServiceError::Validation(err) => (
                STATUS_BAD_REQUEST,
                message,
                BTreeMap::from([(err.field, err.message)]),
            ),
            ServiceError::NotFound(_) => (STATUS_NOT_FOUND, message, BTreeMap::new()),
            ServiceError::Conflict(_) => (STATUS_CONFLICT, message, BTreeMap::new()),
            ServiceError::Unauthorized => (STATUS_UNAUTHORIZED, message, BTreeMap::new()),
            _ => {
                error!("event=api_call module=api status=error code=500 error={message}");
                (STATUS_INTERNAL, "internal error".to_string(), BTreeMap::new())
            }
        };

        Self {
            status,
            body: None,
            error: Some(ErrorBody {
                status,
                message,
                errors,
            }),
        }
    }

    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure while wiring the facade.
#[derive(Debug)]
pub enum InitError {
    Db(DbError),
    Bootstrap(ServiceError),
}

impl Display for InitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Bootstrap(err) => write!(f, "admin bootstrap failed: {err}"),
        }
    }
}

impl Error for InitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Bootstrap(err) => Some(err),
        }
    }
}

impl From<DbError> for InitError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

type Gate = SessionGate<SqliteAdminRepository>;

/// Roster facade bound to one SQLite store.
pub struct RosterApi {
    students: StudentService<SqliteStudentRepository>,
    admins: AdminService<SqliteAdminRepository, Gate>,
    gate: Arc<Gate>,
}

impl RosterApi {
    /// Opens the configured store (in memory without `db_path`) and
    /// bootstraps the default admin when configured.
    pub fn open(config: &AppConfig) -> Result<Self, InitError> {
        let conn = match config.db_path.as_deref() {
            Some(path) => open_db(path)?,
            None => open_db_in_memory()?,
        };
        Self::from_connection(share(conn), config)
    }

    /// Builds the facade over an already migrated connection.
    pub fn from_connection(conn: SharedConnection, config: &AppConfig) -> Result<Self, InitError> {
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher);
        let gate = Arc::new(SessionGate::new(
            SqliteAdminRepository::new(conn.clone()),
            hasher.clone(),
            config.session_ttl(),
        ));
        let admins = AdminService::new(
            SqliteAdminRepository::new(conn.clone()),
            hasher,
            gate.clone(),
        );
        if let Some(admin) = &config.bootstrap_admin {
            admins
                .ensure_bootstrap_admin(admin)
                .map_err(InitError::Bootstrap)?;
        }

        Ok(Self {
            students: StudentService::new(SqliteStudentRepository::new(conn), config.paging()),
            admins,
            gate,
        })
    }

    /// Exchanges credentials for a bearer token.
    pub fn login(&self, username: &str, password: &str) -> ApiResponse<Token> {
        respond(STATUS_OK, self.admins.login(username, password))
    }

    /// Invalidates `token`.
    pub fn logout(&self, token: &Token) -> ApiResponse<()> {
        let outcome = self
            .authorize(token)
            .and_then(|_| self.gate.revoke(token).map_err(ServiceError::from));
        respond_empty(outcome)
    }

    /// Registers another admin; only an authenticated admin may do so.
    pub fn register(
        &self,
        token: &Token,
        username: &str,
        password: &str,
    ) -> ApiResponse<AdminIdentity> {
        let outcome = self.authorize(token).and_then(|_| {
            self.admins.register(username, password)?;
            Ok(AdminIdentity {
                username: username.trim().to_string(),
            })
        });
        respond(STATUS_CREATED, outcome)
    }

    pub fn list_students(&self, token: &Token, query: &StudentQuery) -> ApiResponse<Page<Student>> {
        let outcome = self
            .authorize(token)
            .and_then(|_| self.students.search(query));
        respond(STATUS_OK, outcome)
    }

    pub fn get_student(&self, token: &Token, id: StudentId) -> ApiResponse<Student> {
        let outcome = self.authorize(token).and_then(|_| self.students.get(id));
        respond(STATUS_OK, outcome)
    }

    pub fn create_student(&self, token: &Token, draft: &StudentDraft) -> ApiResponse<Student> {
        let outcome = self
            .authorize(token)
            .and_then(|_| self.students.create(draft));
        respond(STATUS_CREATED, outcome)
    }

    pub fn update_student(
        &self,
        token: &Token,
        id: StudentId,
        draft: &StudentDraft,
    ) -> ApiResponse<Student> {
        let outcome = self
            .authorize(token)
            .and_then(|_| self.students.update(id, draft));
        respond(STATUS_OK, outcome)
    }

    pub fn delete_student(&self, token: &Token, id: StudentId) -> ApiResponse<()> {
        let outcome = self.authorize(token).and_then(|_| self.students.delete(id));
        respond_empty(outcome)
    }

    /// Streams every student as CSV into `writer`.
    pub fn export_students<W: Write>(&self, token: &Token, writer: W) -> ApiResponse<ExportSummary> {
        let outcome = self
            .authorize(token)
            .and_then(|_| self.students.export(writer));
        respond(STATUS_OK, outcome)
    }

    /// Replaces the whole roster with the CSV read from `reader`.
    pub fn import_students<R: Read>(&self, token: &Token, reader: R) -> ApiResponse<ImportSummary> {
        let outcome = self
            .authorize(token)
            .and_then(|_| self.students.import(reader));
        respond(STATUS_OK, outcome)
    }

    fn authorize(&self, token: &Token) -> ServiceResult<AdminIdentity> {
        self.gate.verify(token).map_err(|err| {
            warn!("event=api_call module=api status=rejected code=401");
            ServiceError::from(err)
        })
    }
}

fn respond<T>(status: u16, outcome: ServiceResult<T>) -> ApiResponse<T> {
    match outcome {
        Ok(body) => ApiResponse::success(status, Some(body)),
        Err(err) => ApiResponse::failure(err),
    }
}

fn respond_empty(outcome: ServiceResult<()>) -> ApiResponse<()> {
    match outcome {
        Ok(()) => ApiResponse::success(STATUS_NO_CONTENT, None),
        Err(err) => ApiResponse::failure(err),
    }
}

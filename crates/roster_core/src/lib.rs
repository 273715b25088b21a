//! Core domain logic for the student roster.
//! This crate is the single source of truth for business invariants.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod transfer;

pub use api::{ApiResponse, ErrorBody, InitError, RosterApi};
pub use auth::gate::{AdminIdentity, AuthError, IdentityGate, SessionGate, Token};
pub use config::{AppConfig, BootstrapAdmin, ConfigError, PagingConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::page::{Page, PageRequest};
pub use model::student::{Level, Student, StudentDraft, StudentId, StudentValidationError};
pub use model::validation::ValidationError;
pub use repo::student_repo::{
    RepoError, RepoResult, SqliteStudentRepository, StudentRepository,
};
pub use search::resolver::{resolve, Filter};
pub use service::error::{ServiceError, ServiceResult};
pub use service::student_service::{ExportSummary, ImportSummary, StudentQuery, StudentService};

//! Use-case level error taxonomy.

use crate::auth::gate::AuthError;
use crate::model::student::{StudentId, StudentValidationError};
use crate::model::validation::ValidationError;
use crate::repo::student_repo::RepoError;
use crate::transfer::csv_codec::TransferError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error surfaced to API callers.
#[derive(Debug)]
pub enum ServiceError {
    /// Target student id is absent.
    NotFound(StudentId),
    /// Username already taken.
    Conflict(String),
    /// Malformed caller input.
    Validation(ValidationError),
    /// Failed or absent identity verification.
    Unauthorized,
    /// Persistence failure.
    Repo(RepoError),
    /// Stream failure during export/import.
    Io(std::io::Error),
    /// Broken internal invariant, such as a poisoned lock.
    Internal(String),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "student not found with id {id}"),
            Self::Conflict(username) => write!(f, "username `{username}` already exists"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Conflict(username) => Self::Conflict(username),
            RepoError::Validation(err) => Self::Validation(err.into()),
            RepoError::DuplicateInBatch { index, username } => {
                Self::Validation(ValidationError::new(
                    "username",
                    format!("batch entry {index} repeats username `{username}`"),
                ))
            }
            other => Self::Repo(other),
        }
    }
}

impl From<StudentValidationError> for ServiceError {
    fn from(value: StudentValidationError) -> Self {
        Self::Validation(value.into())
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<TransferError> for ServiceError {
    fn from(value: TransferError) -> Self {
        match value {
            TransferError::Validation(err) => Self::Validation(err),
            TransferError::Io(err) => Self::Io(err),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::Unauthorized => Self::Unauthorized,
            AuthError::Repo(err) => Self::Repo(err),
            other @ (AuthError::SessionsPoisoned | AuthError::Hashing(_)) => {
                Self::Internal(other.to_string())
            }
        }
    }
}

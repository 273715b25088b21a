//! Student domain model.
//!
//! # Responsibility
//! - Define the canonical student record and its proficiency levels.
//! - Own field-level validation for usernames and level labels.
//!
//! # Invariants
//! - `id` is assigned by the store, strictly increasing and never reused.
//! - `username` is 3-50 ASCII characters from `[A-Za-z0-9._-]`.
//! - Level labels are parsed exactly (case-sensitive upper snake case).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Store-assigned student identifier.
pub type StudentId = i64;

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 50;

static USERNAME_CHARSET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid username regex"));

/// Fixed proficiency levels a student can be placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    FirstGrade,
    SecondGrade,
    ThirdGrade,
    FourthGrade,
    FifthGrade,
    Intermediate,
    Advanced,
}

const ALL_LEVELS: &[Level] = &[
    Level::FirstGrade,
    Level::SecondGrade,
    Level::ThirdGrade,
    Level::FourthGrade,
    Level::FifthGrade,
    Level::Intermediate,
    Level::Advanced,
];

impl Level {
    /// Canonical label used in storage, CSV files and API payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstGrade => "FIRST_GRADE",
            Self::SecondGrade => "SECOND_GRADE",
            Self::ThirdGrade => "THIRD_GRADE",
            Self::FourthGrade => "FOURTH_GRADE",
            Self::FifthGrade => "FIFTH_GRADE",
            Self::Intermediate => "INTERMEDIATE",
            Self::Advanced => "ADVANCED",
        }
    }

    /// Every level in declaration order.
    pub fn all() -> &'static [Level] {
        ALL_LEVELS
    }

    /// Parses one canonical label; returns `None` for anything else.
    pub fn parse(value: &str) -> Option<Level> {
        ALL_LEVELS
            .iter()
            .copied()
            .find(|level| level.as_str() == value)
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = StudentValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::parse(s).ok_or_else(|| StudentValidationError::UnknownLevel(s.to_string()))
    }
}

/// Canonical stored student record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub username: String,
    pub level: Level,
}

/// Create/update payload; everything but the store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentDraft {
    pub username: String,
    pub level: Level,
}

impl StudentDraft {
    pub fn new(username: impl Into<String>, level: Level) -> Self {
        Self {
            username: username.into(),
            level,
        }
    }

    /// Checks field constraints before any write reaches the store.
    pub fn validate(&self) -> Result<(), StudentValidationError> {
        validate_username(&self.username)
    }

    /// Attaches a store-assigned id.
    pub fn into_student(self, id: StudentId) -> Student {
        Student {
            id,
            username: self.username,
            level: self.level,
        }
    }
}

/// Field-level validation failures for student input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentValidationError {
    UsernameLength { chars: usize },
    UsernameCharset(String),
    UnknownLevel(String),
}

impl StudentValidationError {
    /// Name of the offending input field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::UsernameLength { .. } | Self::UsernameCharset(_) => "username",
            Self::UnknownLevel(_) => "level",
        }
    }
}

impl Display for StudentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UsernameLength { chars } => write!(
                f,
                "username must be between {USERNAME_MIN_CHARS} and {USERNAME_MAX_CHARS} characters, got {chars}"
            ),
            Self::UsernameCharset(value) => write!(
                f,
                "username `{value}` may only contain letters, digits, `.`, `_` and `-`"
            ),
            Self::UnknownLevel(value) => write!(f, "unknown level `{value}`"),
        }
    }
}

impl Error for StudentValidationError {}

/// Validates one username against length and charset rules.
pub fn validate_username(username: &str) -> Result<(), StudentValidationError> {
    let chars = username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&chars) {
        return Err(StudentValidationError::UsernameLength { chars });
    }
    if !USERNAME_CHARSET_RE.is_match(username) {
        return Err(StudentValidationError::UsernameCharset(username.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_username, Level, StudentDraft, StudentValidationError};

    #[test]
    fn level_labels_roundtrip_through_parse() {
        for level in Level::all() {
            assert_eq!(Level::parse(level.as_str()), Some(*level));
        }
    }

    #[test]
    fn level_parse_is_case_sensitive() {
        assert_eq!(Level::parse("first_grade"), None);
        assert_eq!(Level::parse(" FIRST_GRADE"), None);
        let err = "Advanced".parse::<Level>().expect_err("mixed case must fail");
        assert_eq!(err, StudentValidationError::UnknownLevel("Advanced".to_string()));
        assert_eq!(err.field(), "level");
    }

    #[test]
    fn level_serializes_as_canonical_label() {
        let json = serde_json::to_string(&Level::FourthGrade).expect("serialize level");
        assert_eq!(json, "\"FOURTH_GRADE\"");
    }

    #[test]
    fn username_length_bounds_are_inclusive() {
        assert!(validate_username("abc").is_ok());
        assert!(validate_username(&"a".repeat(50)).is_ok());
        assert_eq!(
            validate_username("ab"),
            Err(StudentValidationError::UsernameLength { chars: 2 })
        );
        assert_eq!(
            validate_username(&"a".repeat(51)),
            Err(StudentValidationError::UsernameLength { chars: 51 })
        );
    }

    #[test]
    fn username_rejects_disallowed_characters() {
        assert!(validate_username("john.doe_2-b").is_ok());
        for bad in ["john doe", "jo,hn", "jo\"hn", "jöhn"] {
            let err = validate_username(bad).expect_err("charset must be enforced");
            assert_eq!(err.field(), "username");
        }
    }

    #[test]
    fn draft_validate_delegates_to_username_rules() {
        assert!(StudentDraft::new("alice", Level::Advanced).validate().is_ok());
        assert!(StudentDraft::new("", Level::Advanced).validate().is_err());
    }
}

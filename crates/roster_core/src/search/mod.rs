//! Search term resolution.
//!
//! # Responsibility
//! - Turn one free-text term plus an optional level into a store `Filter`.
//!
//! # See also
//! - `repo::student_repo` for how each filter is executed.

pub mod resolver;

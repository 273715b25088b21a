//! Domain model for managed student records.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep field validation next to the types it protects.
//!
//! # Invariants
//! - Every student is identified by a store-assigned `StudentId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod page;
pub mod student;
pub mod validation;

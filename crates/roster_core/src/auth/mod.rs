//! Administrator authentication.
//!
//! # Responsibility
//! - Hash and verify administrator secrets.
//! - Issue and verify opaque session tokens guarding every student operation.

pub mod gate;
pub mod password;

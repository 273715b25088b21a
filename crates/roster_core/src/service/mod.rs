//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the transport facade decoupled from storage details.

pub mod admin_service;
pub mod error;
pub mod student_service;

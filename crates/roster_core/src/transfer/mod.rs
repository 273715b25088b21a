//! Bulk transfer of the student set.
//!
//! # Responsibility
//! - Convert the store to and from the tabular CSV exchange format.
//! - Keep parsing and validation separate from the store commit step.

pub mod csv_codec;

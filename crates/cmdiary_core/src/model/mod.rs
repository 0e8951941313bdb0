//! Diary domain model.
//!
//! # Responsibility
//! - Define the record shape and the validated-field contract it is built on.
//! - Provide the untyped value form shared with persistence ports.
//!
//! # Invariants
//! - Every record is identified by a store-unique `RecordId`.
//! - Field assignment either validates fully or leaves the old value intact.

pub mod field;
pub mod record;
pub mod value;

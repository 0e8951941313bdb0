//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate record mutations and their persistence.
//! - Keep presentation callers decoupled from storage details.

pub mod record_store;

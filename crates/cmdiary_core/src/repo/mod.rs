//! Persistence ports and their storage adapters.
//!
//! # Responsibility
//! - Define the load-all / replace-all contract the record store consumes.
//! - Keep storage-format details (SQL, JSON lines) out of the store.
//!
//! # Invariants
//! - `save_all` is a full overwrite; a failed save leaves the previous
//!   persisted set readable.
//! - `load_all` on a fresh medium returns an empty list.

pub mod jsonl_repo;
pub mod memory_repo;
pub mod port;
pub mod sqlite_repo;

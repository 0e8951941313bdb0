//! Core domain logic for CMDiary.
//! This crate is the single source of truth for diary invariants.

pub mod db;
pub mod filter;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use filter::condition::{Condition, FilterAttribute, Operator};
pub use filter::session::FilterSession;
pub use filter::{FilterError, FilterResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::field::{FieldType, ValidatedField, ValidationError};
pub use model::record::{IdAllocator, ItemType, NewRecord, Record, RecordAttribute, RecordId};
pub use model::value::{format_date, parse_date, FieldKind, FieldMap, FieldValue, DATE_FORMAT};
pub use repo::jsonl_repo::JsonLinesRecordRepository;
pub use repo::memory_repo::MemoryRecordRepository;
pub use repo::port::{PersistError, PersistResult, PersistencePort};
pub use repo::sqlite_repo::SqliteRecordRepository;
pub use service::record_store::{
    RecordStore, StoreConfig, StoreError, StoreResult, RECORD_ID_BOUNDS,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

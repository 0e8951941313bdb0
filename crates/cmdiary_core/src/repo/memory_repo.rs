//! In-process persistence port.

use super::port::{PersistError, PersistResult, PersistencePort};
use crate::model::value::FieldMap;

/// Keeps the saved set in memory. Useful for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordRepository {
    records: Vec<FieldMap>,
    save_count: usize,
    fail_next_save: bool,
}

impl MemoryRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an already persisted set.
    pub fn with_records(records: Vec<FieldMap>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn records(&self) -> &[FieldMap] {
        &self.records
    }

    /// Number of successful `save_all` calls.
    pub fn save_count(&self) -> usize {
        self.save_count
    }

    /// Makes the next `save_all` fail without touching the stored set.
    pub fn fail_next_save(&mut self) {
        self.fail_next_save = true;
    }
}

impl PersistencePort for MemoryRecordRepository {
    fn load_all(&mut self) -> PersistResult<Vec<FieldMap>> {
        Ok(self.records.clone())
    }

    fn save_all(&mut self, records: &[FieldMap]) -> PersistResult<()> {
        if std::mem::take(&mut self.fail_next_save) {
            return Err(PersistError::Unavailable("injected save failure".to_string()));
        }
        self.records = records.to_vec();
        self.save_count += 1;
        Ok(())
    }
}

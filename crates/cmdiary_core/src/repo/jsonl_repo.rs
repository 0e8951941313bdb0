//! JSON-lines persistence port: one serialized record per line.
//!
//! # Invariants
//! - A missing file is created empty on first load.
//! - Saves write a sibling temp file and rename it over the target, so a
//!   crash mid-save leaves the previous file intact.

use super::port::{PersistError, PersistResult, PersistencePort};
use crate::model::value::FieldMap;
use log::{debug, info};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct JsonLinesRecordRepository {
    path: PathBuf,
}

impl JsonLinesRecordRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PersistencePort for JsonLinesRecordRepository {
    fn load_all(&mut self) -> PersistResult<Vec<FieldMap>> {
        if !self.path.exists() {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::File::create(&self.path)?;
            info!("event=records_load module=repo backend=jsonl status=created count=0");
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        let mut records = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str::<FieldMap>(line).map_err(|err| {
                PersistError::InvalidData(format!("line {}: {err}", index + 1))
            })?;
            records.push(record);
        }

        info!(
            "event=records_load module=repo backend=jsonl status=ok count={}",
            records.len()
        );
        Ok(records)
    }

    fn save_all(&mut self, records: &[FieldMap]) -> PersistResult<()> {
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path)?;
            for record in records {
                serde_json::to_writer(&mut file, record)?;
                file.write_all(b"\n")?;
            }
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;

        debug!(
            "event=records_save module=repo backend=jsonl status=ok count={}",
            records.len()
        );
        Ok(())
    }
}

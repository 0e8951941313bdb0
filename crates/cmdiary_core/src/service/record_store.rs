//! Record store use-case service.
//!
//! # Responsibility
//! - Own the ordered in-memory record set and id allocation.
//! - Apply add/remove/edit/extend/priority mutations and persist them.
//!
//! # Invariants
//! - Record ids are unique within one store and lie in `RECORD_ID_BOUNDS`.
//! - Every public mutation ends with a full `save_all` of the current set.
//! - A mutation that fails validation or persistence leaves memory exactly
//!   as it was before the call, so memory and storage never diverge.
//! - Hydration either reconstructs every stored record or fails.

use crate::model::field::{FieldType, ValidationError};
use crate::model::record::{IdAllocator, NewRecord, Record, RecordAttribute, RecordId};
use crate::model::value::{FieldMap, FieldValue};
use crate::repo::port::{PersistError, PersistencePort};
use chrono::{Days, NaiveDate};
use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

/// Ids any record may hold, whether allocated, caller-assigned, edited or
/// loaded from storage.
pub const RECORD_ID_BOUNDS: RangeInclusive<RecordId> = 1..=999;

/// Failure of a store command.
#[derive(Debug)]
pub enum StoreError {
    Validation(ValidationError),
    Persist(PersistError),
    /// Store-level edit named an attribute that does not exist.
    UnknownAttribute(String),
    DuplicateId(RecordId),
    IdOutOfRange(RecordId),
    IdSpaceExhausted {
        start: RecordId,
        end: RecordId,
    },
    DateOutOfRange {
        id: RecordId,
        days: i64,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persist(err) => write!(f, "{err}"),
            Self::UnknownAttribute(name) => write!(f, "attribute `{name}` does not exist"),
            Self::DuplicateId(id) => write!(f, "an entry with uid {id} already exists"),
            Self::IdOutOfRange(id) => write!(
                f,
                "uid {id} is outside {}..={}",
                RECORD_ID_BOUNDS.start(),
                RECORD_ID_BOUNDS.end()
            ),
            Self::IdSpaceExhausted { start, end } => {
                write!(f, "every uid between {start} and {end} is in use")
            }
            Self::DateOutOfRange { id, days } => {
                write!(f, "moving the due date of {id} by {days} days is out of range")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persist(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PersistError> for StoreError {
    fn from(value: PersistError) -> Self {
        Self::Persist(value)
    }
}

/// Store options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Range auto-allocated ids are drawn from, clipped to `RECORD_ID_BOUNDS`.
    pub id_range: RangeInclusive<RecordId>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { id_range: 100..=999 }
    }
}

impl StoreConfig {
    /// Allocation over `1..=999`, matching stores that also accept
    /// caller-assigned ids.
    pub fn wide() -> Self {
        Self { id_range: 1..=999 }
    }
}

/// In-memory diary backed by a persistence port.
pub struct RecordStore<P: PersistencePort> {
    entries: Vec<Record>,
    port: P,
    config: StoreConfig,
    rng: StdRng,
}

impl<P: PersistencePort> RecordStore<P> {
    /// Hydrates a store from `port`.
    ///
    /// # Errors
    /// - `Persist` when the medium cannot be read.
    /// - `Validation` when any stored record cannot be reconstructed.
    /// - `DuplicateId` when two stored records share an id.
    /// - `IdOutOfRange` when a stored id lies outside `RECORD_ID_BOUNDS`.
    pub fn open(port: P, config: StoreConfig) -> StoreResult<Self> {
        Self::open_with_rng(port, config, StdRng::from_entropy())
    }

    /// Same as [`RecordStore::open`] with a caller-provided id generator.
    pub fn open_with_rng(mut port: P, config: StoreConfig, rng: StdRng) -> StoreResult<Self> {
        let started_at = Instant::now();
        let maps = port.load_all().map_err(|err| {
            error!("event=store_open module=store status=error error_code=load_failed error={err}");
            err
        })?;

        let mut entries = Vec::with_capacity(maps.len());
        let mut seen = HashSet::with_capacity(maps.len());
        for (index, map) in maps.iter().enumerate() {
            let record = Record::from_field_map(map).map_err(|err| {
                error!(
                    "event=store_open module=store status=error error_code=invalid_record index={index} error={err}"
                );
                err
            })?;
            if !RECORD_ID_BOUNDS.contains(&record.id()) {
                error!(
                    "event=store_open module=store status=error error_code=uid_out_of_range index={index}"
                );
                return Err(StoreError::IdOutOfRange(record.id()));
            }
            if !seen.insert(record.id()) {
                error!(
                    "event=store_open module=store status=error error_code=duplicate_uid index={index}"
                );
                return Err(StoreError::DuplicateId(record.id()));
            }
            entries.push(record);
        }

        info!(
            "event=store_open module=store status=ok count={} duration_ms={}",
            entries.len(),
            started_at.elapsed().as_millis()
        );
        Ok(Self {
            entries,
            port,
            config,
            rng,
        })
    }

    /// Records in insertion order.
    pub fn entries(&self) -> &[Record] {
        &self.entries
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.entries.iter().find(|record| record.id() == id)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.entries.iter().map(Record::id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn into_port(self) -> P {
        self.port
    }

    /// Adds a record with an auto-allocated id and returns that id.
    pub fn add(&mut self, new_record: NewRecord) -> StoreResult<RecordId> {
        self.mutate("store_add", |store| {
            let record = Record::create(new_record, None, store)?;
            let id = record.id();
            store.entries.push(record);
            Ok(id)
        })
    }

    /// Adds a record under a caller-assigned id.
    ///
    /// # Errors
    /// - `IdOutOfRange` for ids outside `RECORD_ID_BOUNDS`.
    /// - `DuplicateId` when `id` is already held.
    pub fn add_with_id(&mut self, new_record: NewRecord, id: RecordId) -> StoreResult<RecordId> {
        if !RECORD_ID_BOUNDS.contains(&id) {
            return Err(StoreError::IdOutOfRange(id));
        }
        if self.contains(id) {
            return Err(StoreError::DuplicateId(id));
        }
        self.mutate("store_add", |store| {
            let record = Record::create(new_record, Some(id), store)?;
            store.entries.push(record);
            Ok(id)
        })
    }

    /// Removes every record whose id is listed. Unknown ids are ignored.
    ///
    /// Returns the number of records removed.
    pub fn remove(&mut self, ids: &[RecordId]) -> StoreResult<usize> {
        self.mutate("store_remove", |store| {
            let before = store.entries.len();
            store.entries.retain(|record| !ids.contains(&record.id()));
            Ok(before - store.entries.len())
        })
    }

    /// Sets `attribute` to `value` on every listed record.
    ///
    /// `attribute` may be a canonical name or an abbreviation. The value is
    /// validated against all targets before any of them changes.
    ///
    /// # Errors
    /// - `UnknownAttribute` for names outside the record schema.
    /// - `Validation` for illegal values.
    /// - `IdOutOfRange` when a uid edit leaves `RECORD_ID_BOUNDS`.
    /// - `DuplicateId` when a uid edit would collide.
    pub fn edit(
        &mut self,
        attribute: &str,
        value: FieldValue,
        ids: &[RecordId],
    ) -> StoreResult<usize> {
        let Some(resolved) = RecordAttribute::resolve(attribute) else {
            warn!("event=store_edit module=store status=rejected error_code=unknown_attribute");
            return Err(StoreError::UnknownAttribute(attribute.to_string()));
        };

        let targets = self.positions_of(ids);
        for &index in &targets {
            self.entries[index].check_attribute(resolved, &value)?;
        }
        if resolved == RecordAttribute::Uid {
            self.check_uid_edit(&value, &targets)?;
        }

        self.mutate("store_edit", |store| {
            for &index in &targets {
                store.entries[index].set_attribute(resolved, &value)?;
            }
            Ok(targets.len())
        })
    }

    /// Moves non-null due dates of the listed records by `days`.
    ///
    /// Records without a due date are left untouched.
    pub fn extend(&mut self, days: i64, ids: &[RecordId]) -> StoreResult<usize> {
        let mut moves = Vec::new();
        for index in self.positions_of(ids) {
            let record = &self.entries[index];
            if let Some(due) = record.due_date() {
                let moved = shift_date(due, days).ok_or(StoreError::DateOutOfRange {
                    id: record.id(),
                    days,
                })?;
                moves.push((index, moved));
            }
        }

        self.mutate("store_extend", |store| {
            for &(index, moved) in &moves {
                store.entries[index].set_due_date(Some(moved))?;
            }
            Ok(moves.len())
        })
    }

    /// Sets the priority flag on every listed record.
    pub fn set_priority(&mut self, priority: bool, ids: &[RecordId]) -> StoreResult<usize> {
        let targets = self.positions_of(ids);
        self.mutate("store_priority", |store| {
            for &index in &targets {
                store.entries[index].set_priority(priority)?;
            }
            Ok(targets.len())
        })
    }

    fn positions_of(&self, ids: &[RecordId]) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, record)| ids.contains(&record.id()))
            .map(|(index, _)| index)
            .collect()
    }

    fn check_uid_edit(&self, value: &FieldValue, targets: &[usize]) -> StoreResult<()> {
        let Some(new_id) = RecordId::from_value(value) else {
            return Ok(());
        };
        if !RECORD_ID_BOUNDS.contains(&new_id) {
            return Err(StoreError::IdOutOfRange(new_id));
        }
        if targets.len() > 1 {
            return Err(StoreError::DuplicateId(new_id));
        }
        let collides = self
            .entries
            .iter()
            .enumerate()
            .any(|(index, record)| record.id() == new_id && !targets.contains(&index));
        if collides {
            return Err(StoreError::DuplicateId(new_id));
        }
        Ok(())
    }

    /// Applies a mutation and persists the full set, restoring the previous
    /// entries if either step fails.
    fn mutate<T>(
        &mut self,
        event: &'static str,
        apply: impl FnOnce(&mut Self) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let started_at = Instant::now();
        let snapshot = self.entries.clone();

        let outcome = match apply(self) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.entries = snapshot;
                warn!("event={event} module=store status=rejected error={err}");
                return Err(err);
            }
        };

        let maps: Vec<FieldMap> = self.entries.iter().map(Record::to_field_map).collect();
        if let Err(err) = self.port.save_all(&maps) {
            self.entries = snapshot;
            error!(
                "event={} module=store status=error error_code=save_failed duration_ms={} error={}",
                event,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }

        info!(
            "event={} module=store status=ok count={} duration_ms={}",
            event,
            self.entries.len(),
            started_at.elapsed().as_millis()
        );
        Ok(outcome)
    }
}

impl<P: PersistencePort> IdAllocator for RecordStore<P> {
    type Error = StoreError;

    /// Draws random ids from the configured range until one is free.
    fn allocate_id(&mut self) -> StoreResult<RecordId> {
        let range = (*self.config.id_range.start()).max(*RECORD_ID_BOUNDS.start())
            ..=(*self.config.id_range.end()).min(*RECORD_ID_BOUNDS.end());
        let exhausted = StoreError::IdSpaceExhausted {
            start: *range.start(),
            end: *range.end(),
        };
        if range.is_empty() {
            return Err(exhausted);
        }

        let capacity = (*range.end() - *range.start()) as usize + 1;
        let held = self
            .entries
            .iter()
            .filter(|record| range.contains(&record.id()))
            .count();
        if held >= capacity {
            return Err(exhausted);
        }

        loop {
            let candidate = self.rng.gen_range(range.clone());
            if !self.contains(candidate) {
                return Ok(candidate);
            }
        }
    }
}

fn shift_date(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    }
}

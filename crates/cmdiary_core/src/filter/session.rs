//! Stacked filter session over a borrowed record list.
//!
//! # Responsibility
//! - Keep the original list, the current selection and the condition trail.
//! - Apply refinements atomically and support reset.
//!
//! # Invariants
//! - `original` is never modified after the session starts.
//! - `current` holds references into `original`, in original order.
//! - A refinement error leaves `current` and the trail untouched.

use super::condition::{is_valid_condition, Condition};
use super::FilterResult;
use crate::model::record::{Record, RecordId};
use chrono::{Local, NaiveDate};
use log::{debug, warn};

/// One interactive filtering episode.
///
/// The session is active while it exists; dropping it ends the episode.
#[derive(Debug, Clone)]
pub struct FilterSession<'a> {
    original: Vec<&'a Record>,
    current: Vec<&'a Record>,
    conditions: Vec<String>,
    today: Option<NaiveDate>,
}

impl<'a> FilterSession<'a> {
    /// Starts a session over every record in `records`.
    pub fn start(records: &'a [Record]) -> Self {
        Self::from_refs(records.iter().collect())
    }

    /// Starts a session over an existing selection.
    pub fn from_refs(records: Vec<&'a Record>) -> Self {
        Self {
            current: records.clone(),
            original: records,
            conditions: Vec::new(),
            today: None,
        }
    }

    /// Pins the date used for `days` conditions instead of the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Narrows the current selection by one condition.
    ///
    /// # Errors
    /// - Any `FilterError`; the selection is left unchanged.
    pub fn refine(&mut self, condition: &str) -> FilterResult<()> {
        let parsed = Condition::parse(condition).map_err(|err| {
            warn!("event=filter_refine module=filter status=rejected error={err}");
            err
        })?;
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());

        let mut matched = Vec::with_capacity(self.current.len());
        for &record in &self.current {
            let selected = parsed.matches(record, today).map_err(|err| {
                warn!("event=filter_refine module=filter status=rejected error={err}");
                err
            })?;
            if selected {
                matched.push(record);
            }
        }

        debug!(
            "event=filter_refine module=filter status=ok before={} after={} depth={}",
            self.current.len(),
            matched.len(),
            self.conditions.len() + 1
        );
        self.current = matched;
        self.conditions.push(parsed.describe());
        Ok(())
    }

    /// Restores the original selection and clears the condition trail.
    pub fn reset(&mut self) {
        self.current = self.original.clone();
        self.conditions.clear();
    }

    pub fn original(&self) -> &[&'a Record] {
        &self.original
    }

    pub fn current(&self) -> &[&'a Record] {
        &self.current
    }

    /// Ids of the current selection, for targeting bulk store commands.
    pub fn ids(&self) -> Vec<RecordId> {
        self.current.iter().map(|record| record.id()).collect()
    }

    pub fn applied_conditions(&self) -> &[String] {
        &self.conditions
    }

    /// Applied conditions, one per line.
    pub fn filter_string(&self) -> String {
        self.conditions.join("\n")
    }

    pub fn is_refined(&self) -> bool {
        !self.conditions.is_empty()
    }

    pub fn is_valid_condition(text: &str) -> bool {
        is_valid_condition(text)
    }
}

//! Diary record domain model.
//!
//! # Responsibility
//! - Define the record shape and its per-attribute validation contract.
//! - Convert records to and from flat persistence field maps.
//!
//! # Invariants
//! - `uid` and `item_type` are always set once a record exists.
//! - Construction is atomic: a record that fails validation is never returned.
//! - `Record::edit` ignores attribute names outside the edit whitelist.
//! - `days_remaining` is derived on every call, never cached.

use super::field::{FieldType, ValidatedField, ValidationError};
use super::value::{FieldKind, FieldMap, FieldValue};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Store-unique record identifier.
pub type RecordId = u32;

/// Category of a diary record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    #[default]
    Homework,
    Assessment,
    Note,
}

impl ItemType {
    pub const ALL: [ItemType; 3] = [Self::Homework, Self::Assessment, Self::Note];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Homework => "homework",
            Self::Assessment => "assessment",
            Self::Note => "note",
        }
    }

    /// Parses a type name or its one-letter abbreviation, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "homework" | "h" => Some(Self::Homework),
            "assessment" | "a" => Some(Self::Assessment),
            "note" | "n" => Some(Self::Note),
            _ => None,
        }
    }
}

impl FieldType for ItemType {
    const KIND: FieldKind = FieldKind::Text;

    fn from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Text(text) => Self::parse(text),
            _ => None,
        }
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Text(self.as_str().to_string())
    }
}

/// Editable and persisted record attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordAttribute {
    Uid,
    ItemType,
    Subject,
    Description,
    DueDate,
    Priority,
}

impl RecordAttribute {
    /// Fields that participate in persistence, in column order.
    pub const PERSISTED: [RecordAttribute; 6] = [
        Self::Uid,
        Self::ItemType,
        Self::Subject,
        Self::Description,
        Self::DueDate,
        Self::Priority,
    ];

    /// Canonical name used as persistence key and edit whitelist entry.
    pub fn name(self) -> &'static str {
        match self {
            Self::Uid => "uid",
            Self::ItemType => "item_type",
            Self::Subject => "subject",
            Self::Description => "description",
            Self::DueDate => "due_date",
            Self::Priority => "priority",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Self::Uid => FieldKind::Int,
            Self::ItemType | Self::Subject | Self::Description => FieldKind::Text,
            Self::DueDate => FieldKind::Date,
            Self::Priority => FieldKind::Bool,
        }
    }

    /// Exact canonical-name lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::PERSISTED
            .into_iter()
            .find(|attribute| attribute.name() == name)
    }

    /// Resolves a canonical name or a user-facing abbreviation.
    pub fn resolve(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "uid" | "u" => Some(Self::Uid),
            "item_type" | "type" | "t" | "i" => Some(Self::ItemType),
            "subject" | "s" => Some(Self::Subject),
            "description" | "d" => Some(Self::Description),
            "due_date" | "duedate" | "due" => Some(Self::DueDate),
            "priority" | "p" => Some(Self::Priority),
            _ => None,
        }
    }
}

/// Source of fresh record ids.
pub trait IdAllocator {
    type Error: From<ValidationError>;

    fn allocate_id(&mut self) -> Result<RecordId, Self::Error>;
}

/// Input for creating a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub item_type: ItemType,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: bool,
}

impl NewRecord {
    pub fn new(
        item_type: ItemType,
        subject: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            item_type,
            subject: Some(subject.into()),
            description: Some(description.into()),
            due_date: None,
            priority: false,
        }
    }

    pub fn due(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_priority(mut self, priority: bool) -> Self {
        self.priority = priority;
        self
    }
}

/// One diary entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    uid: ValidatedField<RecordId>,
    item_type: ValidatedField<ItemType>,
    subject: ValidatedField<String>,
    description: ValidatedField<String>,
    due_date: ValidatedField<NaiveDate>,
    priority: ValidatedField<bool>,
}

impl Record {
    fn declare() -> Self {
        Self {
            uid: ValidatedField::new(RecordAttribute::Uid.name()),
            item_type: ValidatedField::with_options(
                RecordAttribute::ItemType.name(),
                ItemType::ALL,
            ),
            subject: ValidatedField::new(RecordAttribute::Subject.name()),
            description: ValidatedField::new(RecordAttribute::Description.name()),
            due_date: ValidatedField::new(RecordAttribute::DueDate.name()),
            priority: ValidatedField::new(RecordAttribute::Priority.name()).with_default(false),
        }
    }

    /// Creates a record, drawing an id from `allocator` when `id` is `None`.
    ///
    /// # Errors
    /// - Validation errors for any illegal field; nothing is allocated.
    /// - Allocator errors when no id can be drawn.
    pub fn create<A: IdAllocator>(
        new_record: NewRecord,
        id: Option<RecordId>,
        allocator: &mut A,
    ) -> Result<Self, A::Error> {
        let mut record = Self::declare();
        record.item_type.set_typed(Some(new_record.item_type))?;
        record.subject.set_typed(new_record.subject)?;
        record.description.set_typed(new_record.description)?;
        record.due_date.set_typed(new_record.due_date)?;
        record.priority.set_typed(Some(new_record.priority))?;

        let id = match id {
            Some(id) => id,
            None => allocator.allocate_id()?,
        };
        record.uid.set_typed(Some(id))?;
        Ok(record)
    }

    /// Rebuilds a record from a persisted field map.
    ///
    /// Missing optional keys become null; a missing `priority` falls back to
    /// `false`.
    pub fn from_field_map(map: &FieldMap) -> Result<Self, ValidationError> {
        let mut record = Self::declare();
        for attribute in RecordAttribute::PERSISTED {
            match map.get(attribute.name()) {
                Some(value) => record.set_attribute(attribute, value)?,
                None if is_required(attribute) => {
                    return Err(ValidationError::MissingField(attribute.name()));
                }
                None => {}
            }
        }
        Ok(record)
    }

    /// Flat map that reconstructs an identical record.
    pub fn to_field_map(&self) -> FieldMap {
        RecordAttribute::PERSISTED
            .into_iter()
            .map(|attribute| (attribute.name().to_string(), self.value_of(attribute)))
            .collect()
    }

    /// Applies an edit by canonical attribute name.
    ///
    /// Names outside the whitelist are ignored without error.
    pub fn edit(&mut self, attribute: &str, value: &FieldValue) -> Result<(), ValidationError> {
        match RecordAttribute::from_name(attribute) {
            Some(attribute) => self.set_attribute(attribute, value),
            None => Ok(()),
        }
    }

    /// Validates `value` for `attribute` without mutating the record.
    pub fn check_attribute(
        &self,
        attribute: RecordAttribute,
        value: &FieldValue,
    ) -> Result<(), ValidationError> {
        if value.is_null() && is_required(attribute) {
            return Err(ValidationError::MissingField(attribute.name()));
        }
        match attribute {
            RecordAttribute::Uid => self.uid.check(value).map(drop),
            RecordAttribute::ItemType => self.item_type.check(value).map(drop),
            RecordAttribute::Subject => self.subject.check(value).map(drop),
            RecordAttribute::Description => self.description.check(value).map(drop),
            RecordAttribute::DueDate => self.due_date.check(value).map(drop),
            RecordAttribute::Priority => self.priority.check(value).map(drop),
        }
    }

    pub fn set_attribute(
        &mut self,
        attribute: RecordAttribute,
        value: &FieldValue,
    ) -> Result<(), ValidationError> {
        self.check_attribute(attribute, value)?;
        match attribute {
            RecordAttribute::Uid => self.uid.set(value),
            RecordAttribute::ItemType => self.item_type.set(value),
            RecordAttribute::Subject => self.subject.set(value),
            RecordAttribute::Description => self.description.set(value),
            RecordAttribute::DueDate => self.due_date.set(value),
            RecordAttribute::Priority => self.priority.set(value),
        }
    }

    pub fn value_of(&self, attribute: RecordAttribute) -> FieldValue {
        match attribute {
            RecordAttribute::Uid => self.uid.value(),
            RecordAttribute::ItemType => self.item_type.value(),
            RecordAttribute::Subject => self.subject.value(),
            RecordAttribute::Description => self.description.value(),
            RecordAttribute::DueDate => self.due_date.value(),
            RecordAttribute::Priority => self.priority.value(),
        }
    }

    /// Store id. `uid` is required: construction always sets it and a null
    /// assignment is rejected, so the `0` fallback is never observed.
    pub fn id(&self) -> RecordId {
        debug_assert!(self.uid.get().is_some(), "record uid is never null");
        self.uid.get().copied().unwrap_or_default()
    }

    pub fn item_type(&self) -> ItemType {
        debug_assert!(self.item_type.get().is_some(), "record item_type is never null");
        self.item_type.get().copied().unwrap_or_default()
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.get().map(String::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.get().map(String::as_str)
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date.get().copied()
    }

    pub fn priority(&self) -> bool {
        self.priority.get().copied().unwrap_or(false)
    }

    pub fn set_item_type(&mut self, item_type: ItemType) -> Result<(), ValidationError> {
        self.item_type.set_typed(Some(item_type))
    }

    pub fn set_subject(&mut self, subject: Option<String>) -> Result<(), ValidationError> {
        self.subject.set_typed(subject)
    }

    pub fn set_description(&mut self, description: Option<String>) -> Result<(), ValidationError> {
        self.description.set_typed(description)
    }

    pub fn set_due_date(&mut self, due_date: Option<NaiveDate>) -> Result<(), ValidationError> {
        self.due_date.set_typed(due_date)
    }

    pub fn set_priority(&mut self, priority: bool) -> Result<(), ValidationError> {
        self.priority.set_typed(Some(priority))
    }

    /// Whole days until the due date, measured from the local clock.
    pub fn days_remaining(&self) -> Option<i64> {
        self.days_remaining_from(Local::now().date_naive())
    }

    pub fn days_remaining_from(&self, today: NaiveDate) -> Option<i64> {
        self.due_date()
            .map(|due| due.signed_duration_since(today).num_days())
    }
}

fn is_required(attribute: RecordAttribute) -> bool {
    matches!(attribute, RecordAttribute::Uid | RecordAttribute::ItemType)
}

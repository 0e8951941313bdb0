//! Typed, validated attribute slots.
//!
//! # Responsibility
//! - Enforce the value contract of one record attribute.
//! - Convert untyped `FieldValue`s into the declared primitive type.
//!
//! # Invariants
//! - Null is always legal.
//! - A non-null value is legal iff it converts to `T` and, when an option
//!   set is declared, is a member of it.
//! - A rejected `set` never overwrites the stored value.

use super::value::{parse_date, FieldKind, FieldValue};
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Value is not an instance of the declared type.
    WrongType {
        field: &'static str,
        expected: FieldKind,
    },
    /// Value has the right type but is outside the declared option set.
    NotAnOption { field: &'static str, value: String },
    /// Value has the right primitive kind but `T` cannot represent it.
    OutOfRange { field: &'static str, value: String },
    /// A required attribute is absent from a persisted field map.
    MissingField(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WrongType { field, expected } => {
                write!(f, "{field}: new value must be of type {}", expected.name())
            }
            Self::NotAnOption { field, value } => {
                write!(f, "{field}: `{value}` is not one of the allowed values")
            }
            Self::OutOfRange { field, value } => {
                write!(f, "{field}: `{value}` is out of range")
            }
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
        }
    }
}

impl Error for ValidationError {}

/// Primitive types a `ValidatedField` can declare.
pub trait FieldType: Clone + PartialEq + Sized {
    /// Declared kind, reported in type errors.
    const KIND: FieldKind;

    /// Converts an untyped value, returning `None` on a type mismatch.
    /// Never called with `FieldValue::Null`.
    fn from_value(value: &FieldValue) -> Option<Self>;

    fn to_value(&self) -> FieldValue;
}

impl FieldType for u32 {
    const KIND: FieldKind = FieldKind::Int;

    fn from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Int(raw) => u32::try_from(*raw).ok(),
            _ => None,
        }
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Int(i64::from(*self))
    }
}

impl FieldType for String {
    const KIND: FieldKind = FieldKind::Text;

    fn from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Text(text) => Some(text.clone()),
            _ => None,
        }
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Text(self.clone())
    }
}

impl FieldType for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Bool(*self)
    }
}

/// Dates accept native values or `dd/mm/yyyy` text.
impl FieldType for NaiveDate {
    const KIND: FieldKind = FieldKind::Date;

    fn from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Date(date) => Some(*date),
            FieldValue::Text(text) => parse_date(text),
            _ => None,
        }
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Date(*self)
    }
}

/// One validated attribute slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedField<T: FieldType> {
    name: &'static str,
    options: Vec<T>,
    default: Option<T>,
    // Outer `None` means never set; `Some(None)` is an explicit null.
    slot: Option<Option<T>>,
}

impl<T: FieldType> ValidatedField<T> {
    /// Declares an unrestricted field of type `T`.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            options: Vec::new(),
            default: None,
            slot: None,
        }
    }

    /// Declares a field limited to a closed set of values.
    pub fn with_options(name: &'static str, options: impl IntoIterator<Item = T>) -> Self {
        let mut declared: Vec<T> = Vec::new();
        for option in options {
            if !declared.contains(&option) {
                declared.push(option);
            }
        }
        Self {
            options: declared,
            ..Self::new(name)
        }
    }

    /// Sets the value returned by `get` before any assignment.
    ///
    /// An illegal default is discarded in favour of null.
    pub fn with_default(mut self, default: T) -> Self {
        self.default = if self.is_legal(Some(&default)) {
            Some(default)
        } else {
            None
        };
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn options(&self) -> &[T] {
        &self.options
    }

    pub fn is_legal(&self, value: Option<&T>) -> bool {
        match value {
            None => true,
            Some(value) if !self.options.is_empty() => self.options.contains(value),
            Some(_) => true,
        }
    }

    /// Converts and validates `value` without storing it.
    pub fn check(&self, value: &FieldValue) -> Result<Option<T>, ValidationError> {
        if value.is_null() {
            return Ok(None);
        }

        let Some(typed) = T::from_value(value) else {
            if value.kind() == Some(T::KIND) {
                return Err(ValidationError::OutOfRange {
                    field: self.name,
                    value: value.to_string(),
                });
            }
            return Err(ValidationError::WrongType {
                field: self.name,
                expected: T::KIND,
            });
        };

        if !self.is_legal(Some(&typed)) {
            return Err(ValidationError::NotAnOption {
                field: self.name,
                value: value.to_string(),
            });
        }

        Ok(Some(typed))
    }

    /// Assigns an untyped value.
    ///
    /// # Errors
    /// - `WrongType` / `OutOfRange` / `NotAnOption` when the value is
    ///   illegal; the stored value is left untouched.
    pub fn set(&mut self, value: &FieldValue) -> Result<(), ValidationError> {
        let typed = self.check(value)?;
        self.slot = Some(typed);
        Ok(())
    }

    /// Assigns a typed value, still enforcing the option set.
    pub fn set_typed(&mut self, value: Option<T>) -> Result<(), ValidationError> {
        if let Some(candidate) = value.as_ref() {
            if !self.is_legal(Some(candidate)) {
                return Err(ValidationError::NotAnOption {
                    field: self.name,
                    value: candidate.to_value().to_string(),
                });
            }
        }
        self.slot = Some(value);
        Ok(())
    }

    /// Returns the stored value, or the default if never assigned.
    pub fn get(&self) -> Option<&T> {
        match &self.slot {
            Some(value) => value.as_ref(),
            None => self.default.as_ref(),
        }
    }

    /// Current value in untyped form.
    pub fn value(&self) -> FieldValue {
        self.get().map_or(FieldValue::Null, T::to_value)
    }
}

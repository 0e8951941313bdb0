//! Condition-based filtering over diary records.
//!
//! # Responsibility
//! - Parse `<attribute><operator><value>` conditions.
//! - Narrow a record list through stacked refinements with reset.
//!
//! # Invariants
//! - A failed refinement never changes the current selection.
//! - The current selection is always a subset of the original list, kept in
//!   the original order.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod condition;
pub mod session;

pub type FilterResult<T> = Result<T, FilterError>;

/// Reason a condition could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Text does not have the `<attribute><operator><value>` shape.
    InvalidCondition(String),
    UnknownAttribute(String),
    /// An ordering comparison could not coerce a value to an integer.
    InvalidValue(String),
    /// `<`/`>` was used on the due date.
    DateComparison,
}

impl Display for FilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCondition(_) => write!(
                f,
                "Invalid condition. Use the format [attribute][operator][value]"
            ),
            Self::UnknownAttribute(_) => write!(f, "Attribute does not exist"),
            Self::InvalidValue(_) => write!(f, "Invalid value"),
            Self::DateComparison => write!(
                f,
                "Due date cannot be used with the < or > operator. Use 'days' instead."
            ),
        }
    }
}

impl Error for FilterError {}

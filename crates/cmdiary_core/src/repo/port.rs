//! Persistence port contract and error type.

use crate::db::DbError;
use crate::model::value::FieldMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PersistResult<T> = Result<T, PersistError>;

/// Storage-layer failure while loading or saving records.
#[derive(Debug)]
pub enum PersistError {
    Db(DbError),
    Io(std::io::Error),
    Json(serde_json::Error),
    /// Stored data exists but cannot be decoded into field maps.
    InvalidData(String),
    /// Injected by test doubles.
    Unavailable(String),
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::InvalidData(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for PersistError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for PersistError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for PersistError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Full-collection storage used by the record store.
pub trait PersistencePort {
    /// Loads every stored record field map in stored order.
    fn load_all(&mut self) -> PersistResult<Vec<FieldMap>>;

    /// Replaces the stored set with `records`.
    fn save_all(&mut self, records: &[FieldMap]) -> PersistResult<()>;
}

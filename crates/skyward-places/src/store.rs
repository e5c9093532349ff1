//! Place storage trait and error types.

use skyward_core::{AppError, DatabaseError};
use thiserror::Error;

use crate::place::SavedPlace;

/// Errors from place storage operations.
///
/// Messages are kept as strings so the error can be cloned into observable
/// state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    #[error("Failed to save place: {0}")]
    Save(String),

    #[error("Failed to list places: {0}")]
    List(String),

    #[error("Failed to remove place: {0}")]
    Remove(String),
}

impl PersistError {
    pub fn user_message(&self) -> &'static str {
        match self {
            PersistError::Save(_) => "Could not save this place. Please try again.",
            PersistError::List(_) => "Could not load saved places.",
            PersistError::Remove(_) => "Could not remove this place. Please try again.",
        }
    }
}

impl From<PersistError> for AppError {
    fn from(err: PersistError) -> Self {
        AppError::Database(DatabaseError::QueryFailed(err.to_string()))
    }
}

pub type PersistResult<T> = Result<T, PersistError>;

/// Durable storage for saved places.
///
/// Calls may block; async callers should go through `spawn_blocking`.
pub trait PlaceStore: Send + Sync {
    /// Insert or wholesale replace the record with `place.id`.
    fn save(&self, place: &SavedPlace) -> PersistResult<()>;

    /// All places, ordered by name then id.
    fn list(&self) -> PersistResult<Vec<SavedPlace>>;

    /// Delete by id. Removing an unknown id is not an error.
    fn remove(&self, id: i64) -> PersistResult<()>;
}

//! Saved places for Skyward.
//!
//! `PlaceStore` is the persistence seam used by the forecast orchestrator;
//! `SqlitePlaceStore` survives restarts, `InMemoryPlaceStore` does not.

pub mod memory_store;
pub mod place;
pub mod sqlite_store;
pub mod store;

pub use memory_store::InMemoryPlaceStore;
pub use place::SavedPlace;
pub use sqlite_store::SqlitePlaceStore;
pub use store::{PersistError, PersistResult, PlaceStore};

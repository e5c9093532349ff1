use parking_lot::Mutex;
use std::collections::BTreeMap;

use crate::place::SavedPlace;
use crate::store::{PersistResult, PlaceStore};

/// Non-durable store for tests and for running without a database.
#[derive(Default)]
pub struct InMemoryPlaceStore {
    places: Mutex<BTreeMap<i64, SavedPlace>>,
}

impl InMemoryPlaceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlaceStore for InMemoryPlaceStore {
    fn save(&self, place: &SavedPlace) -> PersistResult<()> {
        self.places.lock().insert(place.id, place.clone());
        Ok(())
    }

    fn list(&self) -> PersistResult<Vec<SavedPlace>> {
        let mut places: Vec<SavedPlace> = self.places.lock().values().cloned().collect();
        places.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(places)
    }

    fn remove(&self, id: i64) -> PersistResult<()> {
        self.places.lock().remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyward_core::Coordinate;

    #[test]
    fn test_matches_sqlite_ordering() {
        let store = InMemoryPlaceStore::new();
        let origin = Coordinate::new(0.0, 0.0);
        store.save(&SavedPlace::from_named_place(5, "Quito", origin)).unwrap();
        store.save(&SavedPlace::from_named_place(4, "Accra", origin)).unwrap();
        store.save(&SavedPlace::from_named_place(2, "Quito", origin)).unwrap();

        let ids: Vec<i64> = store.list().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![4, 2, 5]);

        store.remove(4).unwrap();
        assert_eq!(store.list().unwrap().len(), 2);
    }
}

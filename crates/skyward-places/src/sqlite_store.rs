//! SQLite-backed place storage.

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use skyward_core::{Coordinate, DatabaseError, RusqliteErrorExt};
use std::path::Path;

use crate::place::SavedPlace;
use crate::store::{PersistError, PersistResult, PlaceStore};

const SCHEMA_VERSION: i32 = 1;

/// Saved places in a local SQLite file.
///
/// The connection sits behind a mutex so the store can be shared across
/// blocking tasks.
pub struct SqlitePlaceStore {
    conn: Mutex<Connection>,
}

impl SqlitePlaceStore {
    /// Open or create the database, creating parent directories as needed.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
        }

        let conn = Connection::open(path).map_err(RusqliteErrorExt::into_database_error)?;
        tracing::debug!("Opened places database at {}", path.display());
        Self::with_connection(conn)
    }

    /// In-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(RusqliteErrorExt::into_database_error)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, DatabaseError> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_place(row: &rusqlite::Row) -> rusqlite::Result<SavedPlace> {
        Ok(SavedPlace {
            id: row.get(0)?,
            name: row.get(1)?,
            country: row.get(2)?,
            coordinate: Coordinate::new(row.get(3)?, row.get(4)?),
            population: row.get(5)?,
            timezone: row.get(6)?,
            sunrise: row.get(7)?,
            sunset: row.get(8)?,
        })
    }
}

fn init_schema(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)", [])
        .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .optional()
        .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?
        .unwrap_or(0);

    if version > SCHEMA_VERSION {
        return Err(DatabaseError::MigrationFailed(format!(
            "database schema v{} is newer than supported v{}",
            version, SCHEMA_VERSION
        )));
    }

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS places (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            country TEXT NOT NULL DEFAULT '',
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            population INTEGER NOT NULL DEFAULT 0,
            timezone INTEGER NOT NULL DEFAULT 0,
            sunrise INTEGER NOT NULL DEFAULT 0,
            sunset INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_places_name ON places(name);",
    )
    .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

    if version < SCHEMA_VERSION {
        conn.execute("DELETE FROM schema_version", [])
            .and_then(|_| {
                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    params![SCHEMA_VERSION],
                )
            })
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        tracing::info!("Places schema migrated from v{} to v{}", version, SCHEMA_VERSION);
    }

    Ok(())
}

impl PlaceStore for SqlitePlaceStore {
    fn save(&self, place: &SavedPlace) -> PersistResult<()> {
        self.conn
            .lock()
            .execute(
                "INSERT OR REPLACE INTO places
                    (id, name, country, latitude, longitude, population, timezone, sunrise, sunset)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    place.id,
                    place.name,
                    place.country,
                    place.coordinate.latitude,
                    place.coordinate.longitude,
                    place.population,
                    place.timezone,
                    place.sunrise,
                    place.sunset,
                ],
            )
            .map_err(|e| PersistError::Save(e.into_database_error().to_string()))?;

        tracing::debug!("Saved place {} ({})", place.id, place.name);
        Ok(())
    }

    fn list(&self) -> PersistResult<Vec<SavedPlace>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, name, country, latitude, longitude, population, timezone, sunrise, sunset
                 FROM places ORDER BY name, id",
            )
            .map_err(|e| PersistError::List(e.into_database_error().to_string()))?;

        let places = stmt
            .query_map([], Self::row_to_place)
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|e| PersistError::List(e.into_database_error().to_string()))?;

        Ok(places)
    }

    fn remove(&self, id: i64) -> PersistResult<()> {
        let removed = self
            .conn
            .lock()
            .execute("DELETE FROM places WHERE id = ?1", params![id])
            .map_err(|e| PersistError::Remove(e.into_database_error().to_string()))?;

        if removed == 0 {
            tracing::debug!("Place {} was not stored", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(id: i64, name: &str) -> SavedPlace {
        SavedPlace {
            id,
            coordinate: Coordinate::new(51.5, -0.12),
            name: name.to_string(),
            country: "GB".to_string(),
            population: 8_900_000,
            timezone: 3600,
            sunrise: 1_700_000_000,
            sunset: 1_700_030_000,
        }
    }

    #[test]
    fn test_save_and_list() {
        let store = SqlitePlaceStore::open_in_memory().unwrap();
        store.save(&place(1, "London")).unwrap();

        let places = store.list().unwrap();
        assert_eq!(places, vec![place(1, "London")]);
    }

    #[test]
    fn test_save_replaces_whole_record() {
        let store = SqlitePlaceStore::open_in_memory().unwrap();
        store.save(&place(1, "London")).unwrap();

        let replacement = SavedPlace::from_named_place(1, "Londres", Coordinate::new(51.0, 0.0));
        store.save(&replacement).unwrap();

        assert_eq!(store.list().unwrap(), vec![replacement]);
    }

    #[test]
    fn test_list_orders_by_name_then_id() {
        let store = SqlitePlaceStore::open_in_memory().unwrap();
        store.save(&place(3, "Paris")).unwrap();
        store.save(&place(2, "Berlin")).unwrap();
        store.save(&place(1, "Paris")).unwrap();

        let ids: Vec<i64> = store.list().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_remove() {
        let store = SqlitePlaceStore::open_in_memory().unwrap();
        store.save(&place(1, "London")).unwrap();
        store.save(&place(2, "Leeds")).unwrap();

        store.remove(1).unwrap();
        store.remove(99).unwrap();

        let ids: Vec<i64> = store.list().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_rejects_newer_schema() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_version (version INTEGER NOT NULL);
             INSERT INTO schema_version (version) VALUES (99);",
        )
        .unwrap();

        let result = SqlitePlaceStore::with_connection(conn);
        assert!(matches!(result, Err(DatabaseError::MigrationFailed(_))));
    }
}

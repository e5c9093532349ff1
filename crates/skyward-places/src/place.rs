use serde::{Deserialize, Serialize};
use skyward_core::{Coordinate, PlaceReference};

/// A place the user chose to keep.
///
/// Integer fields are epoch seconds (`sunrise`, `sunset`) and a UTC offset in
/// seconds (`timezone`). Saving a record with an existing `id` replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlace {
    pub id: i64,
    pub coordinate: Coordinate,
    pub name: String,
    pub country: String,
    pub population: i64,
    pub timezone: i64,
    pub sunrise: i64,
    pub sunset: i64,
}

impl SavedPlace {
    /// Build a record for a place picked from search.
    ///
    /// Search results carry no population, timezone or sun times, so those
    /// start at zero.
    pub fn from_named_place(id: i64, name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id,
            coordinate,
            name: name.into(),
            country: String::new(),
            population: 0,
            timezone: 0,
            sunrise: 0,
            sunset: 0,
        }
    }

    /// The reference used to fetch a forecast for this place.
    pub fn to_reference(&self) -> PlaceReference {
        PlaceReference::NamedPlace {
            place_id: self.id.to_string(),
            coordinate: self.coordinate,
            formatted_address: self.display_name(),
        }
    }

    /// "Name, Country", or just the name when no country is known.
    pub fn display_name(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_named_place_zeroes_metadata() {
        let place = SavedPlace::from_named_place(7, "Lisbon", Coordinate::new(38.72, -9.14));
        assert_eq!(place.population, 0);
        assert_eq!(place.timezone, 0);
        assert_eq!(place.sunrise, 0);
        assert_eq!(place.sunset, 0);
        assert!(place.country.is_empty());
        assert_eq!(place.display_name(), "Lisbon");
    }

    #[test]
    fn test_to_reference() {
        let mut place = SavedPlace::from_named_place(42, "Oslo", Coordinate::new(59.91, 10.75));
        place.country = "NO".to_string();

        assert_eq!(
            place.to_reference(),
            PlaceReference::named("42", Coordinate::new(59.91, 10.75), "Oslo, NO")
        );
    }
}

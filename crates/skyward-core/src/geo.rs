//! Coordinates and place references shared by the place store and the
//! forecast orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A WGS84 latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid coordinate ({latitude}, {longitude})")]
pub struct InvalidCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Reject non-finite values and anything outside ±90 / ±180.
    pub fn validated(self) -> Result<Self, InvalidCoordinate> {
        let ok = self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude);

        if ok {
            Ok(self)
        } else {
            Err(InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// What to fetch a forecast for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaceReference {
    /// Wherever the device currently is.
    CurrentLocation,
    /// A place chosen by the user (search result or saved place).
    NamedPlace {
        place_id: String,
        coordinate: Coordinate,
        formatted_address: String,
    },
}

impl PlaceReference {
    pub fn named(
        place_id: impl Into<String>,
        coordinate: Coordinate,
        formatted_address: impl Into<String>,
    ) -> Self {
        PlaceReference::NamedPlace {
            place_id: place_id.into(),
            coordinate,
            formatted_address: formatted_address.into(),
        }
    }

    pub fn is_current_location(&self) -> bool {
        matches!(self, PlaceReference::CurrentLocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_accepts_bounds() {
        assert!(Coordinate::new(90.0, 180.0).validated().is_ok());
        assert!(Coordinate::new(-90.0, -180.0).validated().is_ok());
        assert!(Coordinate::new(47.6, -122.3).validated().is_ok());
    }

    #[test]
    fn test_validated_rejects_out_of_range_and_non_finite() {
        assert!(Coordinate::new(90.5, 0.0).validated().is_err());
        assert!(Coordinate::new(0.0, -180.1).validated().is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).validated().is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).validated().is_err());
    }

    #[test]
    fn test_reference_serde_shape() {
        let reference = PlaceReference::named("abc", Coordinate::new(1.0, 2.0), "Somewhere");
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(json["kind"], "named_place");
        assert_eq!(json["coordinate"]["latitude"], 1.0);

        let current: PlaceReference =
            serde_json::from_value(serde_json::json!({"kind": "current_location"})).unwrap();
        assert!(current.is_current_location());
    }
}

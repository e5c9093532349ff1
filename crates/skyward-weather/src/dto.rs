//! Upstream response shapes.
//!
//! Only `current` is required in a forecast body; everything else defaults so
//! that sparse responses still decode.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use skyward_core::Coordinate;

use crate::types::{
    ConditionSummary, CurrentConditions, DailyPoint, ForecastSnapshot, GeocodeResult, HourlyPoint,
};

/// `GET /data/3.0/onecall`
#[derive(Debug, Deserialize)]
pub struct OneCallResponse {
    #[serde(default)]
    pub timezone_offset: i64,
    pub current: CurrentDto,
    #[serde(default)]
    pub hourly: Vec<HourlyDto>,
    #[serde(default)]
    pub daily: Vec<DailyDto>,
}

#[derive(Debug, Deserialize)]
pub struct CurrentDto {
    #[serde(default)]
    pub dt: i64,
    #[serde(default)]
    pub temp: f64,
    #[serde(default)]
    pub feels_like: f64,
    #[serde(default)]
    pub humidity: u32,
    #[serde(default)]
    pub wind_speed: f64,
    #[serde(default)]
    pub sunrise: i64,
    #[serde(default)]
    pub sunset: i64,
    #[serde(default)]
    pub weather: Vec<ConditionDto>,
}

#[derive(Debug, Deserialize)]
pub struct HourlyDto {
    pub dt: i64,
    pub temp: f64,
    #[serde(default)]
    pub pop: f64,
    #[serde(default)]
    pub weather: Vec<ConditionDto>,
}

#[derive(Debug, Deserialize)]
pub struct DailyDto {
    pub dt: i64,
    pub temp: DailyTempDto,
    #[serde(default)]
    pub pop: f64,
    #[serde(default)]
    pub sunrise: i64,
    #[serde(default)]
    pub sunset: i64,
    #[serde(default)]
    pub weather: Vec<ConditionDto>,
}

#[derive(Debug, Deserialize)]
pub struct DailyTempDto {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Deserialize)]
pub struct ConditionDto {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

impl From<ConditionDto> for ConditionSummary {
    fn from(dto: ConditionDto) -> Self {
        Self {
            id: dto.id,
            main: dto.main,
            description: dto.description,
            icon: dto.icon,
        }
    }
}

fn conditions(weather: Vec<ConditionDto>) -> Vec<ConditionSummary> {
    weather.into_iter().map(ConditionSummary::from).collect()
}

impl OneCallResponse {
    pub fn into_snapshot(self, fetched_at: DateTime<Utc>) -> ForecastSnapshot {
        let current = self.current;

        ForecastSnapshot {
            current: CurrentConditions {
                observed_at: current.dt,
                temp: current.temp,
                feels_like: current.feels_like,
                humidity: current.humidity,
                wind_speed: current.wind_speed,
                sunrise: current.sunrise,
                sunset: current.sunset,
                conditions: conditions(current.weather),
            },
            hourly: self
                .hourly
                .into_iter()
                .map(|h| HourlyPoint {
                    at: h.dt,
                    temp: h.temp,
                    pop: h.pop,
                    conditions: conditions(h.weather),
                })
                .collect(),
            daily: self
                .daily
                .into_iter()
                .map(|d| DailyPoint {
                    at: d.dt,
                    min: d.temp.min,
                    max: d.temp.max,
                    pop: d.pop,
                    sunrise: d.sunrise,
                    sunset: d.sunset,
                    conditions: conditions(d.weather),
                })
                .collect(),
            fetched_at,
            timezone_offset_secs: self.timezone_offset,
        }
    }
}

/// One element of `GET /geo/1.0/reverse`
#[derive(Debug, Deserialize)]
pub struct GeocodeDto {
    #[serde(alias = "formattedAddress")]
    pub name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub country: Option<String>,
    pub state: Option<String>,
}

impl GeocodeDto {
    /// Missing lat/lon falls back to the coordinate that was requested.
    pub fn into_result(self, requested: Coordinate) -> GeocodeResult {
        let coordinate = match (self.lat, self.lon) {
            (Some(latitude), Some(longitude)) => Coordinate::new(latitude, longitude),
            _ => requested,
        };

        GeocodeResult {
            formatted_address: self.name,
            coordinate,
            country: self.country,
            state: self.state,
        }
    }
}

/// Index 0 of the geocode array, or `None` when the array is empty.
pub fn first_geocode(entries: Vec<GeocodeDto>, requested: Coordinate) -> Option<GeocodeResult> {
    entries
        .into_iter()
        .next()
        .map(|entry| entry.into_result(requested))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_forecast_decodes() {
        let body: OneCallResponse = serde_json::from_value(json!({"current": {"temp": 70}})).unwrap();
        let snapshot = body.into_snapshot(Utc::now());

        assert_eq!(snapshot.current.temp, 70.0);
        assert!(snapshot.hourly.is_empty());
        assert!(snapshot.daily.is_empty());
        assert_eq!(snapshot.timezone_offset_secs, 0);
    }

    #[test]
    fn test_forecast_without_current_is_rejected() {
        let result = serde_json::from_value::<OneCallResponse>(json!({"hourly": []}));
        assert!(result.is_err());
    }

    #[test]
    fn test_full_forecast_decodes() {
        let body = json!({
            "lat": 33.44,
            "lon": -94.04,
            "timezone_offset": -18000,
            "current": {
                "dt": 1684929490,
                "sunrise": 1684926645,
                "sunset": 1684977332,
                "temp": 292.55,
                "feels_like": 292.87,
                "humidity": 89,
                "wind_speed": 4.12,
                "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}]
            },
            "hourly": [
                {"dt": 1684926000, "temp": 292.01, "pop": 0.15,
                 "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}]}
            ],
            "daily": [
                {"dt": 1684951200, "sunrise": 1684926645, "sunset": 1684977332,
                 "temp": {"day": 299.03, "min": 290.69, "max": 300.35, "night": 291.45, "eve": 297.51, "morn": 292.55},
                 "pop": 0.47,
                 "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}]}
            ]
        });

        let snapshot = serde_json::from_value::<OneCallResponse>(body)
            .unwrap()
            .into_snapshot(Utc::now());

        assert_eq!(snapshot.timezone_offset_secs, -18000);
        assert_eq!(snapshot.current.humidity, 89);
        assert_eq!(snapshot.current.conditions[0].description, "broken clouds");
        assert_eq!(snapshot.hourly[0].pop, 0.15);
        assert_eq!(snapshot.daily[0].min, 290.69);
        assert_eq!(snapshot.daily[0].max, 300.35);
    }

    #[test]
    fn test_geocode_takes_first_entry() {
        let entries: Vec<GeocodeDto> = serde_json::from_value(json!([
            {"name": "Townsville", "lat": -19.26, "lon": 146.81, "country": "AU", "state": "Queensland"},
            {"name": "Elsewhere"}
        ]))
        .unwrap();

        let geocode = first_geocode(entries, Coordinate::new(0.0, 0.0)).unwrap();
        assert_eq!(geocode.formatted_address, "Townsville");
        assert_eq!(geocode.coordinate, Coordinate::new(-19.26, 146.81));
        assert_eq!(geocode.state.as_deref(), Some("Queensland"));
    }

    #[test]
    fn test_geocode_accepts_formatted_address_and_falls_back_to_request() {
        let entries: Vec<GeocodeDto> =
            serde_json::from_value(json!([{"formattedAddress": "Townsville"}])).unwrap();
        let requested = Coordinate::new(-19.0, 146.0);

        let geocode = first_geocode(entries, requested).unwrap();
        assert_eq!(geocode.formatted_address, "Townsville");
        assert_eq!(geocode.coordinate, requested);
    }

    #[test]
    fn test_empty_geocode_array() {
        assert!(first_geocode(Vec::new(), Coordinate::new(0.0, 0.0)).is_none());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skyward_core::{Coordinate, TemperatureUnit};

/// Weather condition categories mapped from OpenWeather condition ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    Clouds,
    Atmosphere,
    Drizzle,
    Rain,
    Snow,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert an OpenWeather condition id to a category
    /// See: https://openweathermap.org/weather-conditions
    pub fn from_owm_id(id: i32) -> Self {
        match id {
            200..=299 => Self::Thunderstorm,
            300..=399 => Self::Drizzle,
            500..=599 => Self::Rain,
            600..=699 => Self::Snow,
            700..=799 => Self::Atmosphere,
            801..=899 => Self::Clouds,
            _ => Self::Clear, // 800 and unknown ids
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Clouds => "Cloudy",
            Self::Atmosphere => "Haze",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Thunderstorm => "Thunderstorm",
        }
    }

    /// Icon name, varied by part of day where it matters
    pub fn icon_name(&self, part_of_day: PartOfDay) -> &'static str {
        match (self, part_of_day) {
            (Self::Clear, PartOfDay::Day) => "sun",
            (Self::Clear, PartOfDay::Night) => "moon",
            (Self::Clouds, PartOfDay::Day) => "cloud_sun",
            (Self::Clouds, PartOfDay::Night) => "cloud_moon",
            (Self::Atmosphere, _) => "cloud_fog",
            (Self::Drizzle, _) | (Self::Rain, _) => "cloud_rain",
            (Self::Snow, _) => "cloud_snow",
            (Self::Thunderstorm, _) => "cloud_lightning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PartOfDay {
    #[default]
    Day,
    Night,
}

impl PartOfDay {
    /// OpenWeather icon codes end in `d` or `n` (e.g. `10n`).
    pub fn from_icon(icon: &str) -> Self {
        if icon.ends_with('n') {
            Self::Night
        } else {
            Self::Day
        }
    }
}

/// One entry of the upstream `weather` array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConditionSummary {
    pub id: i32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

impl ConditionSummary {
    pub fn category(&self) -> WeatherCondition {
        WeatherCondition::from_owm_id(self.id)
    }

    pub fn part_of_day(&self) -> PartOfDay {
        PartOfDay::from_icon(&self.icon)
    }
}

/// Current conditions. Temperatures are Kelvin, times are epoch seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CurrentConditions {
    pub observed_at: i64,
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u32,
    pub wind_speed: f64,
    pub sunrise: i64,
    pub sunset: i64,
    pub conditions: Vec<ConditionSummary>,
}

/// Hourly forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub at: i64,
    pub temp: f64,
    /// Probability of precipitation, 0.0 to 1.0
    pub pop: f64,
    pub conditions: Vec<ConditionSummary>,
}

/// Daily forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub at: i64,
    pub min: f64,
    pub max: f64,
    pub pop: f64,
    pub sunrise: i64,
    pub sunset: i64,
    pub conditions: Vec<ConditionSummary>,
}

impl DailyPoint {
    pub fn high_low_label(&self, unit: TemperatureUnit) -> String {
        unit.high_low_label(self.max, self.min)
    }
}

/// Forecast produced wholesale from one upstream response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyPoint>,
    pub daily: Vec<DailyPoint>,
    pub fetched_at: DateTime<Utc>,
    pub timezone_offset_secs: i64,
}

/// Summary of what it is like outside right now
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub condition: WeatherCondition,
    pub part_of_day: PartOfDay,
    pub description: String,
    pub icon_name: &'static str,
}

impl ForecastSnapshot {
    /// Derived from the first current condition; `None` when upstream sent none.
    pub fn headline(&self) -> Option<Headline> {
        let summary = self.current.conditions.first()?;
        let condition = summary.category();
        let part_of_day = summary.part_of_day();
        let description = if summary.description.is_empty() {
            condition.description().to_string()
        } else {
            summary.description.clone()
        };

        Some(Headline {
            condition,
            part_of_day,
            description,
            icon_name: condition.icon_name(part_of_day),
        })
    }

    /// Today's high/low, if a daily forecast was included.
    pub fn today_high_low(&self, unit: TemperatureUnit) -> Option<String> {
        self.daily.first().map(|day| day.high_low_label(unit))
    }
}

/// Reverse-geocoded address for the resolved coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub formatted_address: String,
    pub coordinate: Coordinate,
    pub country: Option<String>,
    pub state: Option<String>,
}

impl GeocodeResult {
    /// "Name, State" or "Name, Country" for display.
    pub fn display_name(&self) -> String {
        let suffix = self
            .state
            .as_deref()
            .or(self.country.as_deref())
            .filter(|s| !s.is_empty() && *s != self.formatted_address);

        match suffix {
            Some(s) => format!("{}, {}", self.formatted_address, s),
            None => self.formatted_address.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: i32, icon: &str) -> ConditionSummary {
        ConditionSummary {
            id,
            main: String::new(),
            description: String::new(),
            icon: icon.to_string(),
        }
    }

    #[test]
    fn test_owm_id_ranges() {
        assert_eq!(WeatherCondition::from_owm_id(211), WeatherCondition::Thunderstorm);
        assert_eq!(WeatherCondition::from_owm_id(301), WeatherCondition::Drizzle);
        assert_eq!(WeatherCondition::from_owm_id(502), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_owm_id(611), WeatherCondition::Snow);
        assert_eq!(WeatherCondition::from_owm_id(741), WeatherCondition::Atmosphere);
        assert_eq!(WeatherCondition::from_owm_id(800), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_owm_id(804), WeatherCondition::Clouds);
    }

    #[test]
    fn test_unknown_id_defaults_to_clear() {
        assert_eq!(WeatherCondition::from_owm_id(0), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_owm_id(999), WeatherCondition::Clear);
    }

    #[test]
    fn test_part_of_day_from_icon() {
        assert_eq!(PartOfDay::from_icon("01d"), PartOfDay::Day);
        assert_eq!(PartOfDay::from_icon("10n"), PartOfDay::Night);
        assert_eq!(PartOfDay::from_icon(""), PartOfDay::Day);
    }

    #[test]
    fn test_icon_name_varies_by_part_of_day() {
        assert_eq!(WeatherCondition::Clear.icon_name(PartOfDay::Night), "moon");
        assert_eq!(WeatherCondition::Rain.icon_name(PartOfDay::Night), "cloud_rain");
    }

    #[test]
    fn test_headline() {
        let mut snapshot = ForecastSnapshot {
            current: CurrentConditions::default(),
            hourly: Vec::new(),
            daily: Vec::new(),
            fetched_at: Utc::now(),
            timezone_offset_secs: 0,
        };
        assert!(snapshot.headline().is_none());

        snapshot.current.conditions.push(summary(800, "01n"));
        let headline = snapshot.headline().unwrap();
        assert_eq!(headline.condition, WeatherCondition::Clear);
        assert_eq!(headline.part_of_day, PartOfDay::Night);
        assert_eq!(headline.description, "Clear");
        assert_eq!(headline.icon_name, "moon");
    }

    #[test]
    fn test_today_high_low() {
        let snapshot = ForecastSnapshot {
            current: CurrentConditions::default(),
            hourly: Vec::new(),
            daily: vec![DailyPoint {
                at: 0,
                min: 283.15,
                max: 297.15,
                pop: 0.0,
                sunrise: 0,
                sunset: 0,
                conditions: Vec::new(),
            }],
            fetched_at: Utc::now(),
            timezone_offset_secs: 0,
        };
        assert_eq!(
            snapshot.today_high_low(TemperatureUnit::Celsius).as_deref(),
            Some("H:24° L:10°")
        );
    }

    #[test]
    fn test_geocode_display_name() {
        let geocode = GeocodeResult {
            formatted_address: "Portland".to_string(),
            coordinate: Coordinate::new(45.5, -122.6),
            country: Some("US".to_string()),
            state: Some("Oregon".to_string()),
        };
        assert_eq!(geocode.display_name(), "Portland, Oregon");

        let bare = GeocodeResult {
            state: None,
            country: None,
            ..geocode
        };
        assert_eq!(bare.display_name(), "Portland");
    }
}

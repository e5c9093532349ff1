//! Upstream URL construction.

use skyward_core::Coordinate;
use url::Url;

const ONECALL_PATH: &str = "data/3.0/onecall";
const REVERSE_GEOCODE_PATH: &str = "geo/1.0/reverse";

/// Base endpoint shared by the forecast and geocode calls.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

/// The pair of URLs issued for one resolve.
#[derive(Debug, Clone)]
pub struct RequestUrls {
    pub forecast: Url,
    pub geocode: Url,
}

impl Endpoints {
    /// Parse the base endpoint, e.g. `https://api.openweathermap.org`.
    pub fn parse(endpoint: &str) -> Result<Self, String> {
        let mut base =
            Url::parse(endpoint).map_err(|e| format!("invalid endpoint '{}': {}", endpoint, e))?;

        if base.cannot_be_a_base() {
            return Err(format!("endpoint '{}' cannot be used as a base URL", endpoint));
        }

        // Keep any path prefix (e.g. a proxy mount) when joining.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self { base })
    }

    /// Build both request URLs. The coordinate must already be validated.
    pub fn build(&self, coordinate: Coordinate, api_key: &str) -> Result<RequestUrls, String> {
        let lat = coordinate.latitude.to_string();
        let lon = coordinate.longitude.to_string();

        let mut forecast = self
            .base
            .join(ONECALL_PATH)
            .map_err(|e| format!("failed to build forecast URL: {}", e))?;
        forecast
            .query_pairs_mut()
            .append_pair("lat", &lat)
            .append_pair("lon", &lon)
            .append_pair("exclude", "minutely")
            .append_pair("appid", api_key);

        let mut geocode = self
            .base
            .join(REVERSE_GEOCODE_PATH)
            .map_err(|e| format!("failed to build geocode URL: {}", e))?;
        geocode
            .query_pairs_mut()
            .append_pair("lat", &lat)
            .append_pair("lon", &lon)
            .append_pair("appid", api_key);

        Ok(RequestUrls { forecast, geocode })
    }
}

/// URL safe to log: the `appid` value is replaced.
pub fn redact(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if k == "appid" { "REDACTED".to_string() } else { v.into_owned() };
            (k.into_owned(), value)
        })
        .collect();

    if pairs.is_empty() {
        return redacted.to_string();
    }

    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_both_urls() {
        let endpoints = Endpoints::parse("https://api.openweathermap.org").unwrap();
        let urls = endpoints.build(Coordinate::new(33.44, -94.04), "k3y").unwrap();

        assert_eq!(
            urls.forecast.as_str(),
            "https://api.openweathermap.org/data/3.0/onecall?lat=33.44&lon=-94.04&exclude=minutely&appid=k3y"
        );
        assert_eq!(
            urls.geocode.as_str(),
            "https://api.openweathermap.org/geo/1.0/reverse?lat=33.44&lon=-94.04&appid=k3y"
        );
    }

    #[test]
    fn test_keeps_path_prefix() {
        let endpoints = Endpoints::parse("http://localhost:8080/owm").unwrap();
        let urls = endpoints.build(Coordinate::new(1.0, 2.0), "k").unwrap();
        assert_eq!(urls.forecast.path(), "/owm/data/3.0/onecall");
        assert_eq!(urls.geocode.path(), "/owm/geo/1.0/reverse");
    }

    #[test]
    fn test_api_key_is_percent_encoded() {
        let endpoints = Endpoints::parse("https://api.openweathermap.org").unwrap();
        let urls = endpoints.build(Coordinate::new(0.0, 0.0), "a b&c").unwrap();
        assert!(urls.forecast.as_str().ends_with("appid=a+b%26c"));

        let appid = urls
            .forecast
            .query_pairs()
            .find(|(k, _)| k == "appid")
            .map(|(_, v)| v.into_owned());
        assert_eq!(appid.as_deref(), Some("a b&c"));
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        assert!(Endpoints::parse("not a url").is_err());
        assert!(Endpoints::parse("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_redact() {
        let url = Url::parse("https://example.com/x?lat=1&appid=secret").unwrap();
        let redacted = redact(&url);
        assert!(!redacted.contains("secret"));
        assert!(redacted.contains("appid=REDACTED"));
        assert!(redacted.contains("lat=1"));
    }
}

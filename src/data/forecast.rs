//! Forecast endpoint client
//!
//! Builds the per-city forecast URL, fetches the body over HTTP and parses it
//! into a `Snapshot`. The `ForecastSource` trait is the seam the fetcher
//! depends on, so tests and the response-cache decorator can stand in for the
//! network.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use super::{Currently, DailyForecasts, Snapshot};

/// Default base URL of the forecast endpoint
pub const DEFAULT_BASE_URL: &str = "https://publicdata-weather.firebaseio.com";

/// Errors that can occur when fetching or parsing a forecast
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with something other than 200
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    /// Failed to parse JSON body
    #[error("Failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Anything that can return the raw forecast body for a URL
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Fetch the body at `url`. Only a 200 response counts as success.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Builds the forecast URL for a city key: `{base}/{key}.json`
pub fn forecast_url(base_url: &str, key: &str) -> String {
    format!("{}/{}.json", base_url.trim_end_matches('/'), key)
}

/// Body returned by the endpoint. Key and label are supplied by the caller.
#[derive(Debug, Deserialize)]
struct ForecastBody {
    currently: Currently,
    daily: DailyForecasts,
}

/// Parse an endpoint body into a `Snapshot` for the given city
pub fn parse_forecast(body: &str, key: &str, label: &str) -> Result<Snapshot, FetchError> {
    let parsed: ForecastBody = serde_json::from_str(body)?;
    Ok(Snapshot {
        key: key.to_string(),
        label: label.to_string(),
        currently: parsed.currently,
        daily: parsed.daily,
    })
}

/// reqwest-backed forecast source
#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: Client,
}

impl Default for ForecastClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastClient {
    /// Create a new ForecastClient with default settings (no timeout)
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Create a ForecastClient whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ForecastSource for ForecastClient {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Trimmed-down endpoint body, with fields the snapshot does not use
    const VALID_BODY: &str = r#"{
        "latitude": 37.77,
        "longitude": -122.42,
        "timezone": "America/Los_Angeles",
        "currently": {
            "time": 1453489481,
            "summary": "Mostly Cloudy",
            "icon": "partly-cloudy-day",
            "nearestStormDistance": 12,
            "temperature": 58.3,
            "apparentTemperature": 58.3,
            "precipProbability": 0.1,
            "humidity": 0.84,
            "windBearing": 271,
            "windSpeed": 7.49
        },
        "daily": {
            "summary": "Rain throughout the week.",
            "data": [
                {"time": 1453449600, "icon": "rain", "temperatureMax": 59.1, "temperatureMin": 49.6},
                {"time": 1453536000, "icon": "rain", "temperatureMax": 60.2, "temperatureMin": 51.0},
                {"time": 1453622400, "icon": "cloudy", "temperatureMax": 61.7, "temperatureMin": 50.3},
                {"time": 1453708800, "icon": "clear-day", "temperatureMax": 62.0, "temperatureMin": 48.8},
                {"time": 1453795200, "icon": "clear-day", "temperatureMax": 63.4, "temperatureMin": 47.9},
                {"time": 1453881600, "icon": "fog", "temperatureMax": 60.0, "temperatureMin": 50.1},
                {"time": 1453968000, "icon": "wind", "temperatureMax": 58.8, "temperatureMin": 49.2}
            ]
        }
    }"#;

    #[test]
    fn test_forecast_url() {
        assert_eq!(
            forecast_url("https://example.test", "sf"),
            "https://example.test/sf.json"
        );
    }

    #[test]
    fn test_forecast_url_trims_trailing_slash() {
        assert_eq!(
            forecast_url("https://example.test/", "austin"),
            "https://example.test/austin.json"
        );
    }

    #[test]
    fn test_parse_valid_body() {
        let snapshot =
            parse_forecast(VALID_BODY, "sf", "San Francisco").expect("Failed to parse body");

        assert_eq!(snapshot.key, "sf");
        assert_eq!(snapshot.label, "San Francisco");
        assert_eq!(snapshot.currently.time, 1453489481);
        assert_eq!(snapshot.currently.summary, "Mostly Cloudy");
        assert!((snapshot.currently.temperature - 58.3).abs() < 0.01);
        assert!((snapshot.currently.humidity - 0.84).abs() < 0.01);
        assert!((snapshot.currently.wind_bearing - 271.0).abs() < 0.01);
        assert_eq!(snapshot.daily.data.len(), 7);
        assert_eq!(snapshot.daily.data[3].icon, "clear-day");
        assert!((snapshot.daily.data[3].temperature_max - 62.0).abs() < 0.01);
    }

    #[test]
    fn test_parse_malformed_json() {
        let result = parse_forecast("{ invalid json }", "sf", "San Francisco");
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_parse_missing_daily() {
        let missing_daily = r#"{
            "currently": {
                "time": 1, "summary": "Clear", "icon": "clear-day",
                "temperature": 60, "apparentTemperature": 60,
                "precipProbability": 0, "humidity": 0.5,
                "windBearing": 0, "windSpeed": 0
            }
        }"#;
        assert!(parse_forecast(missing_daily, "sf", "San Francisco").is_err());
    }

    #[test]
    fn test_status_error_message() {
        let err = FetchError::Status(500);
        assert_eq!(err.to_string(), "Unexpected HTTP status: 500");
    }

    #[test]
    fn test_with_timeout_builds_client() {
        assert!(ForecastClient::with_timeout(Duration::from_secs(5)).is_ok());
    }
}

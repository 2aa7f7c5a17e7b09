//! Core data models for weatherwatch
//!
//! This module contains the watched-city descriptor and the forecast snapshot
//! shape shared by the fetcher, the dispatcher and the renderers.

pub mod city;
pub mod forecast;

pub use city::{all_cities, default_city, get_city_by_key};
pub use forecast::{forecast_url, parse_forecast, FetchError, ForecastClient, ForecastSource};

use serde::{Deserialize, Serialize};

/// A city on the watch list
///
/// `key` is the stable identifier used in the forecast URL and as the
/// display-surface id; `label` is the human-readable name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct City {
    pub key: String,
    pub label: String,
}

impl City {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// A forecast for one city, ready to render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Key of the city this forecast belongs to
    pub key: String,
    /// Display label of the city
    pub label: String,
    /// Current conditions
    pub currently: Currently,
    /// Day-by-day outlook
    pub daily: DailyForecasts,
}

/// Current conditions block of a forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currently {
    /// Observation time in epoch seconds
    pub time: i64,
    /// Short text summary (e.g. "Clear")
    pub summary: String,
    /// Icon name (e.g. "partly-cloudy-day")
    pub icon: String,
    /// Temperature in degrees
    pub temperature: f64,
    /// Feels-like temperature in degrees
    pub apparent_temperature: f64,
    /// Chance of precipitation, 0.0 to 1.0
    pub precip_probability: f64,
    /// Relative humidity, 0.0 to 1.0
    pub humidity: f64,
    /// Direction the wind is coming from, in degrees
    pub wind_bearing: f64,
    /// Wind speed
    pub wind_speed: f64,
}

/// Daily outlook wrapper, matching the remote `{"daily": {"data": [...]}}` shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecasts {
    pub data: Vec<DayForecast>,
}

/// One day of the outlook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayForecast {
    pub icon: String,
    pub temperature_max: f64,
    pub temperature_min: f64,
}

/// Where a snapshot came from while it moves through the fetcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Served from the local response cache
    Cached,
    /// Returned by the live endpoint
    Live,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Cached => write!(f, "cached"),
            Source::Live => write!(f, "live"),
        }
    }
}

impl Snapshot {
    /// Built-in forecast shown for the default city on first run, before any
    /// network data is available.
    pub fn placeholder() -> Self {
        let city = default_city();
        let day = |icon: &str| DayForecast {
            icon: icon.to_string(),
            temperature_max: 55.0,
            temperature_min: 34.0,
        };

        Self {
            key: city.key,
            label: city.label,
            currently: Currently {
                time: 1_453_489_481,
                summary: "Clear".to_string(),
                icon: "partly-cloudy-day".to_string(),
                temperature: 52.74,
                apparent_temperature: 74.34,
                precip_probability: 0.20,
                humidity: 0.77,
                wind_bearing: 125.0,
                wind_speed: 1.52,
            },
            daily: DailyForecasts {
                data: vec![
                    day("clear-day"),
                    day("rain"),
                    day("snow"),
                    day("sleet"),
                    day("fog"),
                    day("wind"),
                    day("partly-cloudy-day"),
                ],
            },
        }
    }
}

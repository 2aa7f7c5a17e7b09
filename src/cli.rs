//! Command-line interface parsing for weatherwatch
//!
//! This module handles parsing of CLI arguments using clap and validating the
//! city given to `add`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::data::city::all_cities;
use crate::data::forecast::DEFAULT_BASE_URL;
use crate::data::{get_city_by_key, City};

/// Error types for CLI argument handling
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// The key contains characters that cannot go into a forecast URL
    #[error("Invalid city key: '{0}'. Keys may only contain letters, digits, '-' and '_'")]
    InvalidCityKey(String),

    /// No label was given and the key is not in the catalog
    #[error("Unknown city: '{0}'. Give a label, or use one of: {1}")]
    UnknownCity(String, String),

    /// Neither --db nor a platform data directory is available
    #[error("Could not determine a data directory; pass --db")]
    NoDataDir,
}

/// weatherwatch - keep forecasts for your watched cities fresh
#[derive(Parser, Debug)]
#[command(name = "weatherwatch")]
#[command(about = "Forecasts for your watched cities, online or off")]
#[command(version)]
pub struct Cli {
    /// Base URL of the forecast endpoint; `{base}/{key}.json` is fetched per city
    #[arg(long, env = "WEATHERWATCH_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Path of the watch-list database
    #[arg(long, env = "WEATHERWATCH_DB", value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,

    /// Directory for cached forecast responses
    #[arg(long, env = "WEATHERWATCH_CACHE_DIR", value_name = "DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Neither read nor fill the response cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Give up on a live request after this many seconds
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..),
        global = true
    )]
    pub timeout: u64,

    /// More log output on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// What to do; `show` when omitted
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the forecast for every watched city
    Show,
    /// Add a city to the watch list and show its forecast
    ///
    /// Examples:
    ///   weatherwatch add seattle
    ///   weatherwatch add sf "San Francisco"
    Add {
        /// City key, as used in the forecast URL
        key: String,
        /// Display name; defaults to the catalog name for known keys
        label: Option<String>,
    },
    /// Remove a city from the watch list
    Remove {
        /// City key
        key: String,
    },
    /// Print the watch list without fetching forecasts
    List,
    /// Print the cities that can be added by key alone
    Cities,
    /// Show forecasts, then refresh them periodically until Ctrl-C
    Watch {
        /// Seconds between refreshes
        #[arg(
            long,
            value_name = "SECS",
            default_value_t = 300,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        interval: u64,
    },
}

/// Checks that a city key is safe to interpolate into the forecast URL
pub fn parse_city_key(key: &str) -> Result<String, CliError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(key.to_string())
    } else {
        Err(CliError::InvalidCityKey(key.to_string()))
    }
}

/// Builds the city for `add`, taking the label from the catalog when omitted
pub fn resolve_city(key: &str, label: Option<&str>) -> Result<City, CliError> {
    let key = parse_city_key(key)?;
    match label {
        Some(label) => Ok(City::new(key, label)),
        None => get_city_by_key(&key).map(|c| c.to_city()).ok_or_else(|| {
            let known: Vec<_> = all_cities().iter().map(|c| c.key).collect();
            CliError::UnknownCity(key, known.join(", "))
        }),
    }
}

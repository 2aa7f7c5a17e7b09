//! Forecast cards rendered as plain text
//!
//! `TextRenderer` is the presentation collaborator used by the CLI. Each
//! snapshot is printed as a card; a second snapshot for the same key prints
//! the card again marked as updated, so the newest card is always the last
//! one written for that key.

use std::collections::BTreeSet;
use std::io::Write;

use chrono::{DateTime, Datelike, Local, Utc, Weekday};
use tracing::warn;

use crate::data::Snapshot;
use crate::dispatch::Renderer;

/// Number of daily rows shown on a card
const DAYS_SHOWN: usize = 7;

/// Writes forecast cards to any `Write` sink (stdout in the binary)
pub struct TextRenderer<W> {
    out: W,
    displayed: BTreeSet<String>,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            displayed: BTreeSet::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render_snapshot(&mut self, snapshot: Snapshot) {
        let updated = !self.displayed.insert(snapshot.key.clone());
        let card = format_card(&snapshot, Local::now().weekday(), updated);

        if let Err(e) = self.out.write_all(card.as_bytes()).and_then(|_| self.out.flush()) {
            warn!(key = %snapshot.key, error = %e, "Failed to write forecast card");
        }
    }

    fn discard(&mut self, key: &str) {
        self.displayed.remove(key);
    }

    fn displayed_keys(&self) -> BTreeSet<String> {
        self.displayed.clone()
    }
}

/// Formats a snapshot as a multi-line card
///
/// Daily rows are labelled with weekdays starting at `today`.
pub fn format_card(snapshot: &Snapshot, today: Weekday, updated: bool) -> String {
    let current = &snapshot.currently;
    let mut lines = Vec::new();

    let marker = if updated { "  (updated)" } else { "" };
    lines.push(format!("{} [{}]{}", snapshot.label, snapshot.key, marker));
    lines.push(format!(
        "  {} {}  {}",
        icon_glyph(&current.icon),
        current.summary,
        format_time(current.time)
    ));
    lines.push(format!(
        "  {}\u{00B0}  feels like {}\u{00B0}",
        rounded(current.temperature),
        rounded(current.apparent_temperature)
    ));
    lines.push(format!(
        "  Precip {}%  Humidity {}%  Wind {} from {}\u{00B0}",
        percent(current.precip_probability),
        percent(current.humidity),
        rounded(current.wind_speed),
        rounded(current.wind_bearing)
    ));

    let mut day = today;
    for forecast in snapshot.daily.data.iter().take(DAYS_SHOWN) {
        lines.push(format!(
            "  {}  {}  {:>4}\u{00B0} / {:>4}\u{00B0}",
            day,
            icon_glyph(&forecast.icon),
            rounded(forecast.temperature_max),
            rounded(forecast.temperature_min)
        ));
        day = day.succ();
    }

    lines.push(String::new());
    lines.join("\n") + "\n"
}

/// Rounds half away from zero, the way forecast figures are usually shown
fn rounded(value: f64) -> i64 {
    value.round() as i64
}

/// Converts a 0.0..=1.0 fraction to a rounded percentage
fn percent(fraction: f64) -> i64 {
    rounded(fraction * 100.0)
}

/// Formats epoch seconds in local time
fn format_time(epoch_seconds: i64) -> String {
    match DateTime::<Utc>::from_timestamp(epoch_seconds, 0) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%a %b %e %Y %H:%M")
            .to_string(),
        None => "unknown time".to_string(),
    }
}

/// Returns an icon character for a forecast icon name
fn icon_glyph(icon: &str) -> &'static str {
    match icon {
        "clear-day" => "\u{2600}",                              // ☀
        "clear-night" => "\u{263E}",                            // ☾
        "partly-cloudy-day" | "partly-cloudy-night" => "\u{26C5}", // ⛅
        "cloudy" => "\u{2601}",                                 // ☁
        "rain" => "\u{1F327}",                                  // 🌧
        "sleet" => "\u{1F328}",                                 // 🌨
        "snow" => "\u{2744}",                                   // ❄
        "wind" => "\u{1F32C}",                                  // 🌬
        "fog" => "\u{1F32B}",                                   // 🌫
        "thunderstorm" => "\u{26C8}",                           // ⛈
        _ => "?",
    }
}

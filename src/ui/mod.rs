//! Presentation layer for weatherwatch
//!
//! Plain-text rendering of forecast cards for the command line.

pub mod card;

pub use card::{format_card, TextRenderer};

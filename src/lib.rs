//! weatherwatch library
//!
//! Keeps a persisted watch list of cities and renders a forecast card for
//! each, from the on-disk response cache first and the network second.
//! The binary in `main.rs` is a thin command-line front end over `App`.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod dispatch;
pub mod fetcher;
pub mod refresh;
pub mod store;
pub mod ui;
pub mod watchlist;

//! Response cache for forecast bodies
//!
//! This module provides the opaque cache-of-responses the fetcher consults
//! alongside the live request. `CacheManager` persists bodies to disk keyed by
//! request URL, and `WriteThrough` fills it from successful live responses so
//! a later offline run still has something to show.

mod manager;
mod write_through;

pub use manager::{CacheManager, CachedResponse, ResponseCache};
pub use write_through::WriteThrough;

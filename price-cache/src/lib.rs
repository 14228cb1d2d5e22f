//! Transparent price cache
//!
//! Wraps a slow [`ports::PriceSource`] and remembers the prices it returns for a
//! fixed freshness window. Single lookups go through [`TransparentCache::get_price`];
//! batches fan out one task per item through [`TransparentCache::get_prices`].

pub mod domain;
pub mod events;
pub mod ports;
pub mod store;
pub mod transparent_cache;

pub use domain::{CacheEntry, CacheStats, FreshnessPolicy};
pub use events::PriceEvent;
pub use ports::PriceSource;
pub use transparent_cache::TransparentCache;

#![deny(clippy::all)]

use async_trait::async_trait;
use shared::{Price, Result};

// Ports are the pluggable extension points for upstream price services

/// Port for looking up the current price of an item
///
/// Implementations may be slow and may fail. They must tolerate being called
/// concurrently from several batch workers at once.
#[async_trait]
pub trait PriceSource: Send + Sync + 'static {
    async fn fetch_price(&self, item: &str) -> Result<Price>;
}

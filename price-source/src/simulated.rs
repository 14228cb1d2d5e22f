use crate::catalog::CatalogEntry;
use async_trait::async_trait;
use price_cache::PriceSource;
use rand::Rng;
use shared::{Error, Price, Result};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Slow price service stand-in
/// Every call sleeps for `latency` plus a random share of `jitter` before answering
pub struct SimulatedPriceService {
    latency: Duration,
    jitter: Duration,
    prices: HashMap<String, Price>,
    failing: HashSet<String>,
    generate_unknown: bool,
    calls: AtomicU64,
}

impl SimulatedPriceService {
    /// Create a service that quotes a random price for any item
    pub fn new(latency: Duration, jitter: Duration) -> Self {
        Self {
            latency,
            jitter,
            prices: HashMap::new(),
            failing: HashSet::new(),
            generate_unknown: true,
            calls: AtomicU64::new(0),
        }
    }

    /// Quote these items at fixed prices instead of random ones
    pub fn with_prices(mut self, entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        self.prices
            .extend(entries.into_iter().map(|e| (e.item, e.price)));
        self
    }

    /// Make every lookup for these items fail as unavailable
    pub fn with_failing<S: Into<String>>(mut self, items: impl IntoIterator<Item = S>) -> Self {
        self.failing.extend(items.into_iter().map(Into::into));
        self
    }

    /// Answer unknown items with `PriceNotFound` rather than a random quote
    pub fn without_generated_prices(mut self) -> Self {
        self.generate_unknown = false;
        self
    }

    /// Number of lookups served so far, failed ones included
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    fn delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.latency;
        }
        let extra_ms = rand::rng().random_range(0..=self.jitter.as_millis() as u64);
        self.latency + Duration::from_millis(extra_ms)
    }

    fn quote(&self, item: &str) -> Result<Price> {
        if self.failing.contains(item) {
            return Err(Error::Unavailable(format!("no quote available for '{item}'")));
        }
        if let Some(price) = self.prices.get(item) {
            return Ok(*price);
        }
        if self.generate_unknown {
            let raw: f64 = rand::rng().random_range(1.0..1000.0);
            return Ok((raw * 100.0).round() / 100.0);
        }
        Err(Error::PriceNotFound(item.to_string()))
    }
}

#[async_trait]
impl PriceSource for SimulatedPriceService {
    async fn fetch_price(&self, item: &str) -> Result<Price> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let delay = self.delay();
        tracing::trace!("Simulating {:?} of latency for '{}'", delay, item);
        tokio::time::sleep(delay).await;

        self.quote(item)
    }
}

impl Debug for SimulatedPriceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedPriceService")
            .field("latency", &self.latency)
            .field("jitter", &self.jitter)
            .field("fixed_prices", &self.prices.len())
            .field("failing", &self.failing.len())
            .field("calls", &self.calls())
            .finish()
    }
}

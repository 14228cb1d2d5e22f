use crate::domain::{CacheEntry, CacheStats, FreshnessPolicy, StatsCounters};
use crate::events::{PriceEvent, PriceFetchFailedEvent, PriceFetchedEvent, now_timestamp, publish};
use crate::ports::PriceSource;
use crate::store::PriceStore;
use async_trait::async_trait;
use shared::{Error, Price, Result};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Cache that sits in front of a slow price source
///
/// Prices are served from memory while they are younger than `max_age`; anything
/// missing or stale is fetched again and overwrites the previous entry. Cloning is
/// cheap and every clone shares the same entries.
#[derive(Clone)]
pub struct TransparentCache {
    source: Arc<dyn PriceSource>,
    policy: FreshnessPolicy,
    store: PriceStore,
    stats: Arc<StatsCounters>,
    event_broadcaster: Option<broadcast::Sender<PriceEvent>>,
}

/// Result reported by one batch worker
struct FetchOutcome {
    index: usize,
    result: Result<Price>,
}

impl TransparentCache {
    pub fn new(source: Arc<dyn PriceSource>, max_age: Duration) -> Self {
        Self {
            source,
            policy: FreshnessPolicy::new(max_age),
            store: PriceStore::new(),
            stats: Arc::new(StatsCounters::default()),
            event_broadcaster: None,
        }
    }

    pub fn with_event_broadcaster(
        source: Arc<dyn PriceSource>,
        max_age: Duration,
        broadcaster: broadcast::Sender<PriceEvent>,
    ) -> Self {
        Self {
            event_broadcaster: Some(broadcaster),
            ..Self::new(source, max_age)
        }
    }

    pub fn max_age(&self) -> Duration {
        self.policy.max_age()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Subscribe to fetch events, if this cache was built with a broadcaster
    pub fn subscribe(&self) -> Option<broadcast::Receiver<PriceEvent>> {
        self.event_broadcaster.as_ref().map(|b| b.subscribe())
    }

    /// Number of items that currently have an entry, fresh or stale
    pub async fn len(&self) -> usize {
        self.store.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.store.is_empty().await
    }

    /// Get the price for an item, from the cache when fresh or from the source otherwise
    pub async fn get_price(&self, item: &str) -> Result<Price> {
        let cached = self.store.get(item).await;

        if let Some(entry) = cached {
            if self.policy.is_fresh(&entry) {
                self.stats.record_hit();
                tracing::debug!("Cache hit for '{}'", item);
                return Ok(entry.value);
            }
        }

        if cached.is_some() {
            self.stats.record_stale();
            tracing::debug!("Cached price for '{}' is stale, refetching", item);
        } else {
            self.stats.record_miss();
            tracing::debug!("Cache miss for '{}'", item);
        }

        let price = match self.source.fetch_price(item).await {
            Ok(price) => price,
            Err(err) => {
                self.stats.record_failure();
                tracing::warn!("Price source failed for '{}': {}", item, err);
                if let Some(ref broadcaster) = self.event_broadcaster {
                    publish(
                        broadcaster,
                        PriceEvent::FetchFailed(PriceFetchFailedEvent {
                            item: item.to_string(),
                            reason: err.to_string(),
                            timestamp: now_timestamp(),
                        }),
                    );
                }
                return Err(Error::fetch(item, err));
            }
        };

        // Another worker may have filled the entry while this fetch was in flight
        let refreshed = self
            .store
            .insert(item, CacheEntry::fetched_now(price))
            .await
            .is_some();

        if let Some(ref broadcaster) = self.event_broadcaster {
            publish(
                broadcaster,
                PriceEvent::Fetched(PriceFetchedEvent {
                    item: item.to_string(),
                    price,
                    refreshed,
                    timestamp: now_timestamp(),
                }),
            );
        }

        Ok(price)
    }

    /// Get the prices for several items at once, aligned with the input order
    ///
    /// Every item is resolved by its own task, so misses are fetched in parallel.
    /// Duplicates are not merged. The first failure to arrive is returned and no
    /// prices are; tasks still in flight at that point run to completion and keep
    /// populating the cache.
    pub async fn get_prices<I, S>(&self, items: I) -> Result<Vec<Price>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        if items.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!("Resolving batch of {} item(s)", items.len());

        // One slot per worker, so no send ever waits on the receiver
        let (tx, mut rx) = mpsc::channel::<FetchOutcome>(items.len());

        for (index, item) in items.iter().enumerate() {
            let cache = self.clone();
            let tx = tx.clone();
            let item = item.clone();

            tokio::spawn(async move {
                let result = cache.get_price(&item).await;
                // Receiver is gone if the batch already failed
                let _ = tx.send(FetchOutcome { index, result }).await;
            });
        }
        drop(tx);

        let mut prices: Vec<Option<Price>> = vec![None; items.len()];
        for _ in 0..items.len() {
            match rx.recv().await {
                Some(FetchOutcome {
                    index,
                    result: Ok(price),
                }) => prices[index] = Some(price),
                Some(FetchOutcome { result: Err(err), .. }) => {
                    tracing::warn!("Aborting batch of {} item(s): {}", items.len(), err);
                    return Err(err);
                }
                None => break,
            }
        }

        let prices = prices
            .into_iter()
            .zip(items)
            .map(|(price, item)| price.ok_or(Error::WorkerLost(item)))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Batch of {} item(s) resolved", prices.len());
        Ok(prices)
    }
}

#[async_trait]
impl PriceSource for TransparentCache {
    async fn fetch_price(&self, item: &str) -> Result<Price> {
        self.get_price(item).await
    }
}

impl Debug for TransparentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransparentCache")
            .field("max_age", &self.policy.max_age())
            .field("store", &self.store)
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

use serde::{Deserialize, Serialize};
use shared::Price;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PriceEvent {
    Fetched(PriceFetchedEvent),
    FetchFailed(PriceFetchFailedEvent),
}

impl PriceEvent {
    pub fn item(&self) -> &str {
        match self {
            PriceEvent::Fetched(e) => &e.item,
            PriceEvent::FetchFailed(e) => &e.item,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            PriceEvent::Fetched(e) => e.timestamp,
            PriceEvent::FetchFailed(e) => e.timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceFetchedEvent {
    pub item: String,
    pub price: Price,
    /// A stale entry was replaced rather than a missing one filled in
    pub refreshed: bool,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceFetchFailedEvent {
    pub item: String,
    pub reason: String,
    pub timestamp: i64,
}

/// Current wall-clock time in milliseconds since UNIX epoch
pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Send an event to every subscriber; a channel with no receivers is not an error
pub(crate) fn publish(broadcaster: &broadcast::Sender<PriceEvent>, event: PriceEvent) {
    let item = event.item().to_string();
    match broadcaster.send(event) {
        Ok(subscriber_count) => {
            tracing::debug!(
                "Broadcasted price event for item '{}' to {} subscriber(s)",
                item,
                subscriber_count
            );
        }
        Err(_) => {
            tracing::debug!("No subscribers for price event on item '{}'", item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = PriceEvent::Fetched(PriceFetchedEvent {
            item: "apple".into(),
            price: 1.25,
            refreshed: false,
            timestamp: 1_700_000_000_000,
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "fetched");
        assert_eq!(json["item"], "apple");
        assert_eq!(json["price"], 1.25);
    }

    #[tokio::test]
    async fn publish_reaches_subscribers() {
        let (tx, mut rx) = broadcast::channel(4);
        publish(
            &tx,
            PriceEvent::FetchFailed(PriceFetchFailedEvent {
                item: "pear".into(),
                reason: "down".into(),
                timestamp: now_timestamp(),
            }),
        );

        let received = rx.recv().await.unwrap();
        assert_eq!(received.item(), "pear");
        assert!(received.timestamp() > 0);
    }

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let (tx, rx) = broadcast::channel(4);
        drop(rx);
        publish(
            &tx,
            PriceEvent::FetchFailed(PriceFetchFailedEvent {
                item: "plum".into(),
                reason: "down".into(),
                timestamp: now_timestamp(),
            }),
        );
    }
}

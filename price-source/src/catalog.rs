use async_trait::async_trait;
use price_cache::PriceSource;
use shared::{Error, Price, Result};
use std::collections::HashMap;
use std::fmt::Debug;
use std::str::FromStr;

/// One `item=price` pair
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogEntry {
    pub item: String,
    pub price: Price,
}

impl FromStr for CatalogEntry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (item, price) = s
            .split_once('=')
            .ok_or_else(|| Error::InvalidConfig(format!("expected item=price, got '{s}'")))?;

        let item = item.trim();
        if item.is_empty() {
            return Err(Error::InvalidConfig(format!("missing item name in '{s}'")));
        }

        let price = price
            .trim()
            .parse::<Price>()
            .map_err(|e| Error::InvalidConfig(format!("invalid price in '{s}': {e}")))?;
        if !price.is_finite() || price < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "price must be a non-negative number in '{s}'"
            )));
        }

        Ok(Self {
            item: item.to_string(),
            price,
        })
    }
}

/// Fixed in-memory price table with no latency
pub struct CatalogPriceService {
    prices: HashMap<String, Price>,
}

impl CatalogPriceService {
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        Self {
            prices: entries.into_iter().map(|e| (e.item, e.price)).collect(),
        }
    }

    /// Build a catalog from `item=price` strings
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        let entries = entries
            .iter()
            .map(|raw| raw.as_ref().parse::<CatalogEntry>())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

#[async_trait]
impl PriceSource for CatalogPriceService {
    async fn fetch_price(&self, item: &str) -> Result<Price> {
        self.prices
            .get(item)
            .copied()
            .ok_or_else(|| Error::PriceNotFound(item.to_string()))
    }
}

impl Debug for CatalogPriceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogPriceService")
            .field("items", &self.prices.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry() {
        let entry: CatalogEntry = " apple = 1.25 ".parse().unwrap();
        assert_eq!(entry.item, "apple");
        assert_eq!(entry.price, 1.25);
    }

    #[test]
    fn test_parse_rejects_malformed_entries() {
        assert!(matches!("apple".parse::<CatalogEntry>(), Err(Error::InvalidConfig(_))));
        assert!(matches!("=1.0".parse::<CatalogEntry>(), Err(Error::InvalidConfig(_))));
        assert!(matches!("apple=cheap".parse::<CatalogEntry>(), Err(Error::InvalidConfig(_))));
        assert!(matches!("apple=-2".parse::<CatalogEntry>(), Err(Error::InvalidConfig(_))));
        assert!(matches!("apple=NaN".parse::<CatalogEntry>(), Err(Error::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_catalog_lookup() {
        let catalog = CatalogPriceService::parse(&["apple=1.25", "pear=0.8"]).unwrap();
        assert_eq!(catalog.len(), 2);

        assert_eq!(catalog.fetch_price("pear").await.unwrap(), 0.8);
        assert!(matches!(
            catalog.fetch_price("plum").await,
            Err(Error::PriceNotFound(item)) if item == "plum"
        ));
    }

    #[tokio::test]
    async fn test_later_entries_win() {
        let catalog = CatalogPriceService::parse(&["apple=1", "apple=2"]).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.fetch_price("apple").await.unwrap(), 2.0);
    }
}

//! Command-line arguments for the price lookup tool

use clap::Parser;
use price_source::CatalogEntry;
use shared::config::Config;
use std::time::Duration;

/// Look up item prices through a transparent cache in front of a slow price service
#[derive(Parser, Debug)]
#[command(name = "price-cli", version)]
pub struct Cli {
    /// Items to look up on every round
    #[arg(required = true, value_name = "ITEM")]
    pub items: Vec<String>,

    /// How long a fetched price may be served from the cache
    #[arg(long, value_name = "MS")]
    pub max_age_ms: Option<u64>,

    /// Base latency of the simulated price service
    #[arg(long, value_name = "MS")]
    pub latency_ms: Option<u64>,

    /// Random extra latency added on top of the base latency
    #[arg(long, value_name = "MS")]
    pub jitter_ms: Option<u64>,

    /// Fixed price for an item (repeatable)
    #[arg(long = "price", value_name = "ITEM=PRICE")]
    pub prices: Vec<CatalogEntry>,

    /// Make lookups for this item fail (repeatable)
    #[arg(long = "fail", value_name = "ITEM")]
    pub failing: Vec<String>,

    /// Only quote items given with --price
    #[arg(long)]
    pub strict: bool,

    /// Number of batch lookups to run
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    pub rounds: u32,

    /// Pause between rounds
    #[arg(long, value_name = "MS", default_value_t = 0)]
    pub pause_ms: u64,

    /// Print one JSON object per round instead of a table
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Overlay command-line values on top of the environment configuration
    pub fn apply_to(&self, mut config: Config) -> Config {
        if let Some(ms) = self.max_age_ms {
            config.max_age = Duration::from_millis(ms);
        }
        if let Some(ms) = self.latency_ms {
            config.source_latency = Duration::from_millis(ms);
        }
        if let Some(ms) = self.jitter_ms {
            config.source_jitter = Duration::from_millis(ms);
        }
        config
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

mod cli;

use clap::Parser;
use cli::Cli;
use price_cache::{CacheStats, PriceEvent, TransparentCache};
use price_source::SimulatedPriceService;
use serde::Serialize;
use shared::Price;
use shared::config::Config;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
struct ItemPrice<'a> {
    item: &'a str,
    price: Price,
}

#[derive(Debug, Serialize)]
struct RoundReport<'a> {
    round: u32,
    elapsed_ms: u128,
    upstream_calls: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    prices: Option<Vec<ItemPrice<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Totals printed once all rounds have run
#[derive(Debug, Serialize)]
struct StatsReport {
    #[serde(flatten)]
    stats: CacheStats,
    upstream_lookups: u64,
    entries: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so that stdout only carries results
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match dotenvy::dotenv() {
        Ok(_) => debug!("Loaded environment variables from .env file"),
        Err(_) => debug!("No .env file found, using system environment variables"),
    }

    let config = cli.apply_to(Config::from_env());
    config.validate()?;

    info!(
        "Starting price lookups: max_age={:?}, latency={:?}, jitter={:?}",
        config.max_age, config.source_latency, config.source_jitter
    );

    let mut service = SimulatedPriceService::new(config.source_latency, config.source_jitter)
        .with_prices(cli.prices.iter().cloned())
        .with_failing(cli.failing.iter().cloned());
    if cli.strict {
        service = service.without_generated_prices();
    }
    let source = Arc::new(service);

    let (event_tx, _event_rx) = broadcast::channel(config.event_capacity);
    let cache = TransparentCache::with_event_broadcaster(source.clone(), config.max_age, event_tx);

    if let Some(events) = cache.subscribe() {
        tokio::spawn(log_events(events));
    }

    let mut last_error = None;
    for round in 1..=cli.rounds {
        let calls_before = source.calls();
        let started = Instant::now();
        let result = cache.get_prices(cli.items.iter().cloned()).await;

        let mut report = RoundReport {
            round,
            elapsed_ms: started.elapsed().as_millis(),
            upstream_calls: source.calls() - calls_before,
            prices: None,
            error: None,
        };
        match result {
            Ok(prices) => {
                report.prices = Some(
                    cli.items
                        .iter()
                        .zip(prices)
                        .map(|(item, price)| ItemPrice { item, price })
                        .collect(),
                );
            }
            Err(err) => {
                warn!("Round {} failed: {}", round, err);
                report.error = Some(err.to_string());
                last_error = Some(err);
            }
        }

        print_report(&report, cli.json)?;

        if round < cli.rounds && !cli.pause().is_zero() {
            tokio::time::sleep(cli.pause()).await;
        }
    }

    let stats = cache.stats();
    let summary = StatsReport {
        stats,
        upstream_lookups: stats.upstream_lookups(),
        entries: cache.len().await,
    };
    if cli.json {
        println!("{}", serde_json::to_string(&summary)?);
    }
    info!(
        "Cache stats: hits={}, misses={}, stale_refreshes={}, upstream_failures={}, upstream_lookups={}, entries={}",
        stats.hits,
        stats.misses,
        stats.stale_refreshes,
        stats.upstream_failures,
        summary.upstream_lookups,
        summary.entries
    );

    match last_error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn print_report(report: &RoundReport<'_>, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }

    println!(
        "round {}: {} ms, {} upstream call(s)",
        report.round, report.elapsed_ms, report.upstream_calls
    );
    if let Some(ref prices) = report.prices {
        let width = prices.iter().map(|p| p.item.len()).max().unwrap_or(0);
        for p in prices {
            println!("  {:<width$}  {:>10.2}", p.item, p.price, width = width);
        }
    }
    if let Some(ref error) = report.error {
        println!("  error: {}", error);
    }
    Ok(())
}

async fn log_events(mut events: broadcast::Receiver<PriceEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => debug!("price event: {}", json),
                Err(e) => warn!("Failed to encode price event: {}", e),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Event logger lagged, skipped {} event(s)", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

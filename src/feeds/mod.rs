//! Feed fetching.
//!
//! Downloads every configured feed concurrently and parses the bodies into
//! per-source entry batches. A failing source (network error, bad status,
//! malformed XML) is logged and yields an empty batch so one outage never
//! sinks the whole run.

pub mod parse;

use crate::config::{Config, Feed};
use crate::models::{RawEntry, SourceBatch};
use futures::{StreamExt, stream};
use std::error::Error;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// How many feed requests are in flight at once.
const FETCH_CONCURRENCY: usize = 4;

/// Timeout for a single feed request.
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

async fn fetch_feed(
    client: &reqwest::Client,
    feed: Feed,
) -> Result<Vec<RawEntry>, Box<dyn Error>> {
    let response = client.get(feed.url).send().await?.error_for_status()?;
    let body = response.text().await?;
    Ok(parse::parse_feed(&body)?)
}

/// Fetch every configured feed and return one batch per source.
///
/// Batches come back in feed-table order regardless of which download
/// finishes first, so downstream dedup always favors the same sources.
/// Failed sources are logged and kept as empty batches.
///
/// # Arguments
///
/// * `cfg` - Runtime configuration with the feed table.
///
/// # Returns
///
/// A batch for each configured feed, in table order.
///
/// # Errors
///
/// Only client construction can fail; individual feed failures are absorbed.
#[instrument(level = "info", skip_all, fields(feeds = cfg.feeds.len()))]
pub async fn fetch_all(cfg: &Config) -> Result<Vec<SourceBatch>, Box<dyn Error>> {
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(concat!("cyber_newsletter/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let batches: Vec<SourceBatch> = stream::iter(cfg.feeds.iter().copied())
        .map(|feed| {
            let client = client.clone();
            async move {
                match fetch_feed(&client, feed).await {
                    Ok(entries) => {
                        info!(source = feed.name, count = entries.len(), "Fetched feed");
                        SourceBatch {
                            source: feed.name.to_string(),
                            entries,
                        }
                    }
                    Err(e) => {
                        warn!(source = feed.name, error = %e, "Feed fetch failed; skipping source");
                        SourceBatch {
                            source: feed.name.to_string(),
                            entries: Vec::new(),
                        }
                    }
                }
            }
        })
        .buffered(FETCH_CONCURRENCY)
        .collect()
        .await;

    let total: usize = batches.iter().map(|b| b.entries.len()).sum();
    info!(sources = batches.len(), entries = total, "Fetched all feeds");
    Ok(batches)
}

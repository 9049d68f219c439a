//! Machine-readable briefing sidecar.
//!
//! Serializes the ranked articles, with their assigned categories, next to
//! the PDF as `briefing.json` so downstream automation does not have to
//! parse the newsletter itself.

use chrono::{DateTime, Utc};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

use crate::classify::Classified;
use crate::config::Config;
use crate::models::{Article, Briefing, BriefingItem};

fn briefing_json(
    now: DateTime<Utc>,
    lookback_hours: i64,
    articles: &[Article],
    classified: &Classified,
) -> Result<String, serde_json::Error> {
    let items: Vec<BriefingItem> = articles
        .iter()
        .zip(classified.by_article.iter())
        .map(|(article, category)| BriefingItem {
            article,
            category: *category,
        })
        .collect();
    serde_json::to_string(&Briefing {
        generated_at: now,
        lookback_hours,
        articles: items,
    })
}

/// Write the briefing sidecar as `{out_dir}/briefing.json`.
///
/// # Returns
///
/// `Ok(())` on success, or an error if serialization or the write fails.
#[instrument(level = "info", skip_all, fields(out_dir = %cfg.out_dir))]
pub async fn write_briefing(
    cfg: &Config,
    now: DateTime<Utc>,
    articles: &[Article],
    classified: &Classified,
) -> Result<(), Box<dyn Error>> {
    let json = briefing_json(now, cfg.lookback_hours, articles, classified)?;
    let path = Path::new(&cfg.out_dir).join("briefing.json");
    fs::write(&path, json).await?;
    info!(path = %path.display(), articles = articles.len(), "Wrote briefing JSON");
    Ok(())
}

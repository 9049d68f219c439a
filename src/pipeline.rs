//! Aggregation pipeline: filter fetched entries to the lookback window,
//! drop duplicates, score what remains, and keep the top of the ranking.

use crate::config::Config;
use crate::dedup::{DedupState, canonical_link};
use crate::feeds::parse::entry_datetime;
use crate::models::{Article, RawEntry, SourceBatch};
use crate::normalize::{decode_entities, normalize_space, shorten, strip_html_to_text};
use crate::scoring::{compute_score, scoring_signals};
use crate::utils::{hours_since, truncate_for_log};
use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;
use tracing::{debug, info, instrument};

/// Summary text for an entry: the full content block when present, the short
/// description otherwise, stripped of markup and shortened to the cap.
fn extract_summary(cfg: &Config, entry: &RawEntry) -> String {
    let raw = if entry.content.trim().is_empty() {
        &entry.summary
    } else {
        &entry.content
    };
    let text = strip_html_to_text(raw);
    decode_entities(&shorten(&text, cfg.summary_max_chars))
}

/// Turn fetched source batches into the ranked briefing list.
///
/// Entries pass through in batch order: ones without a usable timestamp or
/// published before the cutoff are dropped, titles are whitespace-normalized
/// and empty ones discarded, links canonicalized, and duplicates (same link
/// or near-identical title) rejected in favor of the first occurrence. The
/// survivors are scored, sorted by descending score (ties keep encounter
/// order), and truncated to the configured top N.
///
/// # Arguments
///
/// * `cfg` - Runtime configuration.
/// * `now` - Reference time for the cutoff and article ages.
/// * `batches` - Per-source entry batches, in feed-table order.
///
/// # Returns
///
/// At most `cfg.top_n` articles, highest score first.
#[instrument(level = "info", skip_all, fields(batches = batches.len()))]
pub fn rank(cfg: &Config, now: DateTime<Utc>, batches: Vec<SourceBatch>) -> Vec<Article> {
    let cutoff = now - Duration::hours(cfg.lookback_hours);
    let mut dedup = DedupState::new(cfg.duplicate_threshold);
    let mut articles: Vec<Article> = Vec::new();
    let mut scanned = 0usize;
    let mut undated = 0usize;
    let mut stale = 0usize;
    let mut duplicates = 0usize;

    for batch in &batches {
        for entry in &batch.entries {
            scanned += 1;
            let Some(published) = entry_datetime(entry) else {
                undated += 1;
                debug!(
                    source = %batch.source,
                    title = %truncate_for_log(&entry.title, 120),
                    "No usable timestamp; dropping entry"
                );
                continue;
            };
            if published < cutoff {
                stale += 1;
                debug!(
                    source = %batch.source,
                    %published,
                    "Published before cutoff; dropping entry"
                );
                continue;
            }
            let title = normalize_space(&entry.title);
            if title.is_empty() {
                continue;
            }
            let link = canonical_link(&entry.link);
            if !dedup.admit(&title, &link) {
                duplicates += 1;
                continue;
            }
            let title = decode_entities(&title);
            let summary = extract_summary(cfg, entry);
            let hours_old = hours_since(now, published);
            let score = compute_score(cfg, &title, &summary, &batch.source, hours_old);
            let signals = if cfg.show_signals {
                scoring_signals(cfg, &title, &summary, &batch.source, hours_old)
            } else {
                Vec::new()
            };
            articles.push(Article {
                title,
                summary,
                source: batch.source.clone(),
                link,
                published,
                score,
                signals,
            });
        }
    }

    articles.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    articles.truncate(cfg.top_n);
    info!(
        scanned,
        undated,
        stale,
        duplicates,
        kept = articles.len(),
        "Ranked qualifying articles"
    );
    articles
}

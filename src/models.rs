//! Data structures shared across the pipeline: raw feed entries on the way
//! in, ranked articles on the way out, and the serialized briefing sidecar.

use crate::classify::Category;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One entry as pulled from a feed, before any cleanup.
///
/// Fields hold raw strings straight from the XML; empty means the feed did
/// not provide the element. `content` is the full-body element
/// (`content:encoded` or Atom `content`) and is preferred over `summary`
/// when building the article summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub content: String,
    pub published: String,
    pub updated: String,
}

/// All entries fetched from a single source, tagged with the source's
/// configured display name. A failed fetch yields an empty batch so the
/// fixed source order is preserved downstream.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    pub source: String,
    pub entries: Vec<RawEntry>,
}

/// A cleaned, scored article that survived the ranking pipeline.
///
/// Immutable once ranked: title and summary are entity-decoded plain text,
/// the link is canonicalized, and `score` was computed exactly once from
/// keywords, source trust, and recency.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub title: String,
    pub summary: String,
    pub source: String,
    pub link: String,
    pub published: DateTime<Utc>,
    pub score: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub signals: Vec<String>,
}

/// The machine-readable briefing written next to the PDF.
#[derive(Debug, Serialize)]
pub struct Briefing<'a> {
    pub generated_at: DateTime<Utc>,
    pub lookback_hours: i64,
    pub articles: Vec<BriefingItem<'a>>,
}

/// One ranked article plus its assigned category.
#[derive(Debug, Serialize)]
pub struct BriefingItem<'a> {
    #[serde(flatten)]
    pub article: &'a Article,
    pub category: Category,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_article() -> Article {
        Article {
            title: "Zero-day in Widget X".to_string(),
            summary: "Exploitation observed in the wild.".to_string(),
            source: "Krebs on Security".to_string(),
            link: "https://example.com/widget-x".to_string(),
            published: Utc.with_ymd_and_hms(2025, 6, 6, 9, 0, 0).unwrap(),
            score: 85.3,
            signals: vec!["zero-day".to_string(), "trusted source".to_string()],
        }
    }

    #[test]
    fn test_article_serializes_with_iso_timestamp() {
        let json = serde_json::to_string(&sample_article()).unwrap();
        assert!(json.contains("\"published\":\"2025-06-06T09:00:00Z\""));
        assert!(json.contains("\"score\":85.3"));
        assert!(json.contains("\"signals\":[\"zero-day\",\"trusted source\"]"));
    }

    #[test]
    fn test_article_skips_empty_signals() {
        let mut article = sample_article();
        article.signals.clear();
        let json = serde_json::to_string(&article).unwrap();
        assert!(!json.contains("signals"));
    }

    #[test]
    fn test_briefing_item_flattens_article_and_adds_category() {
        let article = sample_article();
        let item = BriefingItem {
            article: &article,
            category: Category::ZeroDays,
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"title\":\"Zero-day in Widget X\""));
        assert!(json.contains("\"category\":\"ZERO-DAYS\""));
    }

    #[test]
    fn test_raw_entry_default_is_empty() {
        let entry = RawEntry::default();
        assert!(entry.title.is_empty());
        assert!(entry.published.is_empty());
    }
}

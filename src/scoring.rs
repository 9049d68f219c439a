//! Risk scoring for ranked items.
//!
//! A score is the sum of three parts: matched keyword weights (clamped so a
//! keyword-stuffed headline cannot run away), the trust weight of the source,
//! and a logistic freshness bonus that decays over the lookback window.

use crate::config::Config;

/// Freshness contribution for an item of the given age.
///
/// The curve is logistic with its midpoint at the lookback horizon, so a
/// brand-new item earns close to 30 points, an item exactly at the horizon
/// earns 15, and anything much older approaches zero.
///
/// # Arguments
///
/// * `hours_old` - Age of the item in hours.
/// * `lookback_hours` - The configured lookback window.
///
/// # Returns
///
/// A value in `[0, 30]`.
pub fn recency_score(hours_old: f64, lookback_hours: i64) -> f64 {
    let midpoint = lookback_hours.max(1) as f64;
    let spread = (midpoint / 4.0).max(2.0);
    let value = 30.0 / (1.0 + ((hours_old - midpoint) / spread).exp());
    value.max(0.0)
}

/// Compute the risk score for one item, rounded to one decimal.
///
/// Keywords are matched against the lowercased concatenation of title and
/// summary and their weights summed, clamped to `cfg.max_keyword_score`.
/// The source trust weight and the recency bonus are added on top.
///
/// # Arguments
///
/// * `cfg` - Runtime configuration holding the keyword and source tables.
/// * `title` - Item title.
/// * `summary` - Item summary, may be empty.
/// * `source` - Source display name.
/// * `hours_old` - Age of the item in hours.
///
/// # Examples
///
/// ```ignore
/// let score = compute_score(&cfg, "Ransomware hits vendor", "", "Sophos News", 4.0);
/// assert!(score > 35.0);
/// ```
pub fn compute_score(
    cfg: &Config,
    title: &str,
    summary: &str,
    source: &str,
    hours_old: f64,
) -> f64 {
    let text = format!("{} {}", title, summary).to_lowercase();
    let keyword_score: f64 = cfg
        .keyword_rules()
        .iter()
        .filter(|rule| rule.matches(&text))
        .map(|rule| rule.weight)
        .sum();
    let keyword_score = keyword_score.min(cfg.max_keyword_score);
    let raw =
        keyword_score + cfg.source_weight(source) + recency_score(hours_old, cfg.lookback_hours);
    (raw * 10.0).round() / 10.0
}

/// Short labels explaining why an item scored the way it did.
///
/// Up to four matched keyword labels in table order (the spaced spelling of
/// zero day is folded into the hyphenated one), then "trusted source" for
/// high-weight sources and a "breaking" or "recent" freshness tag.
pub fn scoring_signals(
    cfg: &Config,
    title: &str,
    summary: &str,
    source: &str,
    hours_old: f64,
) -> Vec<String> {
    let text = format!("{} {}", title, summary).to_lowercase();
    let mut signals: Vec<String> = Vec::new();
    for rule in cfg.keyword_rules() {
        if !rule.matches(&text) {
            continue;
        }
        let label = if rule.label == "zero day" {
            "zero-day"
        } else {
            rule.label
        };
        if !signals.iter().any(|s| s == label) {
            signals.push(label.to_string());
        }
    }
    signals.truncate(4);
    if cfg.source_weight(source) >= 20.0 {
        signals.push("trusted source".to_string());
    }
    if hours_old <= 6.0 {
        signals.push("breaking".to_string());
    } else if hours_old <= 12.0 {
        signals.push("recent".to_string());
    }
    signals
}

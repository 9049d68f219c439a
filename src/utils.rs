//! Small shared helpers: risk bars, article age, log truncation, and output
//! directory validation.

use chrono::{DateTime, Utc};
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Map a score to a risk level of 1 through 4, one level per 25 points.
///
/// The score is clamped to 0..=100 first, and even a zero score earns one
/// level so every article shows at least a minimal bar.
pub fn risk_level(score: f64) -> usize {
    let level = (score.clamp(0.0, 100.0) / 25.0).round() as i64;
    level.clamp(1, 4) as usize
}

/// Render a score as a four-step risk bar, e.g. `■■■□`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(risk_bar(0.0), "■□□□");
/// assert_eq!(risk_bar(100.0), "■■■■");
/// ```
pub fn risk_bar(score: f64) -> String {
    let level = risk_level(score);
    format!("{}{}", "■".repeat(level), "□".repeat(4 - level))
}

/// Fractional hours elapsed between `published` and `now`.
///
/// Negative when `published` lies in the future; callers treat that as age
/// zero where it matters (recency scoring already saturates).
pub fn hours_since(now: DateTime<Utc>, published: DateTime<Utc>) -> f64 {
    (now - published).num_milliseconds() as f64 / 3_600_000.0
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (backing off to the
/// nearest character boundary) with an ellipsis and byte count appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…(+{} bytes)", &s[..end], s.len() - end)
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable
/// (permission denied, read-only filesystem, etc.).
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

//! Plain-text digest of the briefing, plus chunking for message delivery.

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::models::Article;
use crate::utils::{hours_since, risk_bar};

/// Render the ranked articles as a plain-text digest.
///
/// One numbered block per article: title, then a source/risk/age line, then
/// the summary and link when present. An empty run still yields a headed
/// digest saying nothing qualified.
pub fn build_text_digest(cfg: &Config, now: DateTime<Utc>, articles: &[Article]) -> String {
    if articles.is_empty() {
        return format!(
            "Cybersecurity Briefing • Top {} ({}h)\n\nNo qualifying items found.",
            cfg.top_n, cfg.lookback_hours
        );
    }

    let mut lines: Vec<String> = Vec::with_capacity(articles.len() * 5 + 1);
    lines.push(format!(
        "Cybersecurity Briefing • Top {} ({}h)\n\n",
        cfg.top_n.min(articles.len()),
        cfg.lookback_hours
    ));
    for (i, article) in articles.iter().enumerate() {
        let hours = hours_since(now, article.published).max(0.0);
        lines.push(format!("{}. {}", i + 1, article.title));
        lines.push(format!(
            "{} • {} {:.1} • {:.1}h",
            article.source,
            risk_bar(article.score),
            article.score,
            hours
        ));
        if !article.summary.is_empty() {
            lines.push(article.summary.clone());
        }
        if !article.link.is_empty() {
            lines.push(article.link.clone());
        }
        lines.push(String::new());
    }
    lines.join("\n").trim().to_string()
}

/// Split text into chunks of at most `max_len` characters.
///
/// Splits on blank lines first and greedily packs whole paragraphs back
/// together; a single paragraph longer than the limit is hard-split at the
/// character boundary. Character counts, not bytes, so multibyte text never
/// breaks mid-glyph.
pub fn chunk_text(text: &str, max_len: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return vec![String::new()];
    }
    if text.chars().count() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut buf = String::new();
    for part in text.split("\n\n") {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let candidate = if buf.is_empty() {
            part.to_string()
        } else {
            format!("{}\n\n{}", buf, part)
        };
        if candidate.chars().count() <= max_len {
            buf = candidate;
            continue;
        }

        if !buf.is_empty() {
            chunks.push(std::mem::take(&mut buf));
        }
        let mut rest = part;
        while rest.chars().count() > max_len {
            let cut = rest
                .char_indices()
                .nth(max_len)
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            chunks.push(rest[..cut].to_string());
            rest = &rest[cut..];
        }
        buf = rest.to_string();
    }
    if !buf.is_empty() {
        chunks.push(buf);
    }
    chunks
}

/// Number multi-part messages with a `(i/n)` header line; a single part is
/// passed through untouched.
pub fn prefix_parts(parts: Vec<String>) -> Vec<String> {
    let total = parts.len();
    if total <= 1 {
        return parts;
    }
    parts
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| format!("({}/{})\n{}", i + 1, total, chunk))
        .collect()
}

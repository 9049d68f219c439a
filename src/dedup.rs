//! Cross-source duplicate suppression.
//!
//! Two articles count as duplicates when their canonicalized links match
//! exactly or their titles are nearly identical under a matching-blocks
//! similarity ratio. Suppression is order-dependent: the first article seen
//! wins and later near-matches are dropped.

use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

static FRAGMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#.*$").unwrap());
static UTM_PARAM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?&]utm_[^=&]+=[^&]+").unwrap());
static REF_PARAM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?&]ref=[^&]+").unwrap());
static TRAILING_QMARK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?$").unwrap());

/// Canonicalize a link for exact-match deduplication.
///
/// Strips the fragment, `utm_*` and `ref` tracking parameters, and a
/// trailing bare `?`. This is deliberately string-level (no URL re-parsing),
/// so removing a leading `?utm_...` pair can leave an `&`-led tail; the
/// result is a dedup key, not necessarily a fetchable URL.
pub fn canonical_link(link: &str) -> String {
    let link = link.trim();
    let link = FRAGMENT_RE.replace(link, "");
    let link = UTM_PARAM_RE.replace_all(&link, "");
    let link = REF_PARAM_RE.replace_all(&link, "");
    let link = TRAILING_QMARK_RE.replace(&link, "");
    link.into_owned()
}

/// Similarity of two strings as the matching-blocks ratio `2*M / (|a|+|b|)`,
/// where `M` is the total length of the recursively found longest common
/// blocks. Symmetric, in `[0, 1]`, and `1.0` for two empty strings.
///
/// Character-based, so hyphen/space variants of the same headline land very
/// close to 1 while genuinely different headlines fall well below typical
/// thresholds.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }

    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, ch) in b.iter().enumerate() {
        b2j.entry(*ch).or_default().push(j);
    }

    let mut matched = 0usize;
    let mut queue = vec![(0usize, a.len(), 0usize, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(&a, &b2j, alo, ahi, blo, bhi);
        if k > 0 {
            matched += k;
            queue.push((alo, i, blo, j));
            queue.push((i + k, ahi, j + k, bhi));
        }
    }
    2.0 * matched as f64 / (a.len() + b.len()) as f64
}

/// Longest common contiguous block of `a[alo..ahi]` and `b[blo..bhi]`,
/// returned as `(start_in_a, start_in_b, length)`. Ties resolve to the
/// earliest start in `a`, then in `b`.
fn longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut besti, mut bestj, mut bestk) = (alo, blo, 0usize);
    let mut j2len: HashMap<usize, usize> = HashMap::new();
    for (i, ch) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut newj2len: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b2j.get(ch) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = if j > 0 {
                    j2len.get(&(j - 1)).copied().unwrap_or(0) + 1
                } else {
                    1
                };
                newj2len.insert(j, k);
                if k > bestk {
                    besti = i + 1 - k;
                    bestj = j + 1 - k;
                    bestk = k;
                }
            }
        }
        j2len = newj2len;
    }
    (besti, bestj, bestk)
}

/// First-seen-wins duplicate tracker for one ranking run.
#[derive(Debug)]
pub struct DedupState {
    threshold: f64,
    seen_links: HashSet<String>,
    seen_titles: Vec<String>,
}

impl DedupState {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            seen_links: HashSet::new(),
            seen_titles: Vec::new(),
        }
    }

    /// Admit or reject a candidate article.
    ///
    /// Rejects when the (non-empty) canonical link was already accepted, or
    /// when the title's similarity to any accepted title exceeds the
    /// threshold. Accepted candidates claim both their link and title.
    pub fn admit(&mut self, title: &str, link: &str) -> bool {
        if !link.is_empty() && self.seen_links.contains(link) {
            debug!(title = %truncate_for_log(title, 120), "Duplicate link; dropping entry");
            return false;
        }
        if self.is_duplicate_title(title) {
            debug!(title = %truncate_for_log(title, 120), "Near-duplicate title; dropping entry");
            return false;
        }
        if !link.is_empty() {
            self.seen_links.insert(link.to_string());
        }
        self.seen_titles.push(title.to_string());
        true
    }

    fn is_duplicate_title(&self, title: &str) -> bool {
        let probe = title.to_lowercase();
        let probe = probe.trim();
        self.seen_titles.iter().any(|seen| {
            let seen = seen.to_lowercase();
            similarity(probe, seen.trim()) > self.threshold
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_link_strips_tracking() {
        assert_eq!(
            canonical_link("https://x.example/a?utm_source=feed&utm_medium=rss#section"),
            "https://x.example/a"
        );
        assert_eq!(
            canonical_link("https://x.example/a?ref=newsletter"),
            "https://x.example/a"
        );
        assert_eq!(canonical_link("https://x.example/a?"), "https://x.example/a");
        assert_eq!(canonical_link("  https://x.example/a  "), "https://x.example/a");
    }

    #[test]
    fn test_canonical_link_keeps_real_params() {
        assert_eq!(
            canonical_link("https://x.example/a?id=42&utm_campaign=z"),
            "https://x.example/a?id=42"
        );
        // String-level stripping: a leading utm pair leaves the `&` tail.
        assert_eq!(
            canonical_link("https://x.example/a?utm_a=1&b=2"),
            "https://x.example/a&b=2"
        );
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("same headline", "same headline"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        let r = similarity("abcd", "bcde");
        assert!((r - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_similarity_symmetric() {
        let a = "patch tuesday roundup for june";
        let b = "patch tuesday roundup (june)";
        assert!((similarity(a, b) - similarity(b, a)).abs() < 1e-12);
    }

    #[test]
    fn test_near_identical_titles_cross_threshold() {
        let a = "critical zero-day exploited in acme router";
        let b = "critical zero day exploited in acme router";
        assert!(similarity(a, b) > 0.93);

        let c = "ransomware gang leaks hospital records";
        assert!(similarity(a, c) < 0.93);
    }

    #[test]
    fn test_admit_first_seen_wins() {
        let mut state = DedupState::new(0.93);
        assert!(state.admit(
            "Critical zero-day exploited in Acme Router",
            "https://a.example/1"
        ));
        // Same link, different title: rejected on the link.
        assert!(!state.admit("Totally different headline", "https://a.example/1"));
        // Near-identical title, new link: rejected on similarity.
        assert!(!state.admit(
            "Critical zero day exploited in Acme Router",
            "https://b.example/2"
        ));
        // Genuinely new article: accepted.
        assert!(state.admit(
            "Ransomware gang leaks hospital records",
            "https://c.example/3"
        ));
    }

    #[test]
    fn test_rejected_candidate_claims_nothing() {
        let mut state = DedupState::new(0.93);
        assert!(state.admit("Acme router zero-day under attack", "https://a.example/1"));
        // Rejected by title; its link must stay unclaimed.
        assert!(!state.admit("Acme router zero day under attack", "https://b.example/2"));
        assert!(state.admit("Completely unrelated campaign report", "https://b.example/2"));
    }

    #[test]
    fn test_empty_link_never_collides() {
        let mut state = DedupState::new(0.93);
        assert!(state.admit("First distinct headline here", ""));
        assert!(state.admit("Second unrelated report today", ""));
    }
}

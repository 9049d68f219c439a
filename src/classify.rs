//! Threat-category assignment for ranked articles.
//!
//! A closed set of categories checked in precedence order with plain
//! case-insensitive substring tests over title plus summary. Classification
//! runs once after ranking; layout and the JSON sidecar both consume the
//! result instead of re-deriving it.

use crate::models::Article;
use serde::Serialize;
use std::fmt;

/// Newsletter sections, in the order they appear on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    #[serde(rename = "ZERO-DAYS")]
    ZeroDays,
    #[serde(rename = "RANSOMWARE")]
    Ransomware,
    #[serde(rename = "BREACHES")]
    Breaches,
    #[serde(rename = "PHISHING")]
    Phishing,
    #[serde(rename = "OTHER")]
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::ZeroDays,
        Category::Ransomware,
        Category::Breaches,
        Category::Phishing,
        Category::Other,
    ];

    /// Section header label, e.g. `ZERO-DAYS`.
    pub fn label(&self) -> &'static str {
        match self {
            Category::ZeroDays => "ZERO-DAYS",
            Category::Ransomware => "RANSOMWARE",
            Category::Breaches => "BREACHES",
            Category::Phishing => "PHISHING",
            Category::Other => "OTHER",
        }
    }

    /// Title-cased form used in the sidebar counts, e.g. `Zero-Days`.
    pub fn title_case(&self) -> &'static str {
        match self {
            Category::ZeroDays => "Zero-Days",
            Category::Ransomware => "Ransomware",
            Category::Breaches => "Breaches",
            Category::Phishing => "Phishing",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify one article by precedence: zero-day terms, then ransomware,
/// then breaches, then phishing, else other.
pub fn classify(title: &str, summary: &str) -> Category {
    let text = format!("{} {}", title, summary).to_lowercase();
    if ["zero-day", "zero day", "0day", "actively exploited"]
        .iter()
        .any(|t| text.contains(t))
    {
        return Category::ZeroDays;
    }
    if text.contains("ransomware") {
        return Category::Ransomware;
    }
    if text.contains("breach") {
        return Category::Breaches;
    }
    if text.contains("phishing") {
        return Category::Phishing;
    }
    Category::Other
}

/// Classification result over a ranked list.
///
/// `by_article[i]` is the category of the i-th ranked article. `sequence`
/// is the layout order: articles grouped by category in section order, rank
/// order preserved within each group, as `(category, ranked_index)` pairs.
/// `counts` is indexed by section order.
#[derive(Debug)]
pub struct Classified {
    pub by_article: Vec<Category>,
    pub sequence: Vec<(Category, usize)>,
    pub counts: [usize; Category::ALL.len()],
}

/// Classify every ranked article once and derive the grouped layout order
/// and the sidebar counts.
pub fn classify_ranked(articles: &[Article]) -> Classified {
    let by_article: Vec<Category> = articles
        .iter()
        .map(|a| classify(&a.title, &a.summary))
        .collect();

    let mut counts = [0usize; Category::ALL.len()];
    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); Category::ALL.len()];
    for (idx, cat) in by_article.iter().enumerate() {
        counts[*cat as usize] += 1;
        groups[*cat as usize].push(idx);
    }

    let mut sequence = Vec::with_capacity(articles.len());
    for cat in Category::ALL {
        for idx in &groups[cat as usize] {
            sequence.push((cat, *idx));
        }
    }

    Classified {
        by_article,
        sequence,
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(title: &str, summary: &str) -> Article {
        Article {
            title: title.to_string(),
            summary: summary.to_string(),
            source: "Test Feed".to_string(),
            link: String::new(),
            published: Utc::now(),
            score: 50.0,
            signals: Vec::new(),
        }
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            classify("Ransomware crew abuses zero-day", ""),
            Category::ZeroDays
        );
        assert_eq!(
            classify("Phishing kit spreads ransomware", ""),
            Category::Ransomware
        );
        assert_eq!(
            classify("Breach exposes phishing targets", ""),
            Category::Breaches
        );
        assert_eq!(classify("New phishing lure observed", ""), Category::Phishing);
        assert_eq!(classify("Patch roundup", "monthly updates"), Category::Other);
    }

    #[test]
    fn test_case_insensitive_and_summary() {
        assert_eq!(classify("Quiet title", "ACTIVELY EXPLOITED bug"), Category::ZeroDays);
        assert_eq!(classify("0DAY dropped on forum", ""), Category::ZeroDays);
    }

    #[test]
    fn test_substring_matching_is_deliberate() {
        // Plain substring containment, not word matching.
        assert_eq!(classify("Databreach roundup", ""), Category::Breaches);
    }

    #[test]
    fn test_classify_ranked_groups_in_section_order() {
        let articles = vec![
            article("Patch roundup", ""),
            article("Zero-day in widget", ""),
            article("Ransomware hits desk", ""),
            article("Second zero day note", ""),
        ];
        let classified = classify_ranked(&articles);

        assert_eq!(classified.by_article.len(), 4);
        assert_eq!(classified.counts[Category::ZeroDays as usize], 2);
        assert_eq!(classified.counts[Category::Ransomware as usize], 1);
        assert_eq!(classified.counts[Category::Other as usize], 1);

        let cats: Vec<Category> = classified.sequence.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            cats,
            vec![
                Category::ZeroDays,
                Category::ZeroDays,
                Category::Ransomware,
                Category::Other
            ]
        );
        // Rank order preserved inside a group.
        assert_eq!(classified.sequence[0].1, 1);
        assert_eq!(classified.sequence[1].1, 3);
        assert_eq!(classified.sequence[3].1, 0);
    }

    #[test]
    fn test_label_round_trip() {
        for cat in Category::ALL {
            assert_eq!(cat.to_string(), cat.label());
        }
        assert_eq!(Category::ZeroDays.title_case(), "Zero-Days");
    }
}

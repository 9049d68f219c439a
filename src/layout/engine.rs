//! Two-column newsletter layout.
//!
//! Flows ranked, categorized articles into card-style boxes across two
//! columns with a branded sidebar on every page. The renderer is pure: it
//! turns articles into a [`Document`] of draw commands, and the PDF backend
//! serializes those without making any layout decisions of its own.

use chrono::{DateTime, Utc};
use itertools::Itertools;

use super::text::{Face, TextMeasure, ellipsize_to_width, wrap_to_width, wrap_url};
use super::{
    BOTTOM, COLUMN_GUTTER, COLUMN_WIDTH, CONTENT_LEFT, Color, Document, DrawCommand, INCH, MARGIN,
    PAGE_HEIGHT, PAGE_WIDTH, Page, SIDEBAR_WIDTH, TOP, theme,
};
use crate::classify::{Category, Classified};
use crate::config::Config;
use crate::models::Article;
use crate::normalize::shorten;
use crate::utils::{hours_since, risk_level};

const COLUMN_X: [f64; 2] = [CONTENT_LEFT, CONTENT_LEFT + COLUMN_WIDTH + COLUMN_GUTTER];

const HEADLINE_SIZE: f64 = 11.0;
const HEADLINE_LEADING: f64 = 0.16 * INCH;
const META_SIZE: f64 = 8.5;
const META_LEADING: f64 = 0.12 * INCH;
const SUMMARY_SIZE: f64 = 9.4;
const SUMMARY_LEADING: f64 = 0.13 * INCH;
const KICKER_SIZE: f64 = 8.2;
const KICKER_LEADING: f64 = 0.11 * INCH;
const LINK_SIZE: f64 = 7.2;
const LINK_LEADING: f64 = 0.11 * INCH;

/// Vertical padding inside a card, above the first baseline and below the
/// last, in points.
const CARD_PAD: f64 = 12.0;
/// Horizontal inset of card text from the card edge, in points.
const CARD_INNER_X: f64 = 8.0;
/// Gap between a card and whatever follows it in the column.
const CARD_SPACING: f64 = 0.16 * INCH;

const SECTION_HEIGHT: f64 = 0.22 * INCH;
const SECTION_SPACING: f64 = 0.16 * INCH;
/// Room a section header needs before it is worth starting in a column.
const SECTION_ROOM: f64 = 0.60 * INCH;

/// How far one column may run ahead of the other before placement switches
/// to the shorter one.
const REBALANCE_SLACK: f64 = 0.90 * INCH;

const RISK_SQUARE: f64 = 4.5;
const RISK_SQUARE_GAP: f64 = 1.5;
const RISK_SQUARES_WIDTH: f64 = 4.0 * RISK_SQUARE + 3.0 * RISK_SQUARE_GAP;

const SIDEBAR_PAD: f64 = 0.18 * INCH;
const INDEX_LINE_LEADING: f64 = 0.16 * INCH;
const INDEX_ITEM_SPACING: f64 = 0.04 * INCH;
const INDEX_SIZE: f64 = 8.2;

/// A card's wrapped text, ready to draw, with its exact height.
///
/// Built once per article so the room check and the draw use the same
/// numbers.
struct Card {
    headline: Vec<String>,
    meta_prefix: String,
    meta_suffix: String,
    risk_level: usize,
    summary: Vec<String>,
    kicker: Option<String>,
    links: Vec<String>,
    height: f64,
}

struct LayoutState<'a> {
    cfg: &'a Config,
    measure: &'a dyn TextMeasure,
    now: DateTime<Utc>,
    articles: &'a [Article],
    counts: [usize; Category::ALL.len()],
    pages: Vec<Page>,
    page: Page,
    page_no: usize,
    col_y: [f64; 2],
    col: usize,
}

impl<'a> LayoutState<'a> {
    fn text(&mut self, x: f64, y: f64, content: String, face: Face, size: f64, color: Color) {
        self.page.commands.push(DrawCommand::Text {
            x,
            y,
            content,
            face,
            size,
            color,
        });
    }

    /// Close out the current page (if any) and open a fresh one with the
    /// page number and sidebar already drawn.
    fn start_page(&mut self) {
        if self.page_no > 0 {
            let done = std::mem::take(&mut self.page);
            self.pages.push(done);
        }
        self.page_no += 1;

        let label = self.page_no.to_string();
        let label_w = self.measure.width(&label, Face::Serif, 9.0);
        self.text(
            PAGE_WIDTH - MARGIN - label_w,
            BOTTOM - 0.18 * INCH,
            label,
            Face::Serif,
            9.0,
            theme::GREY,
        );
        self.draw_sidebar();

        self.col_y = [TOP, TOP];
        self.col = 0;
    }

    fn draw_sidebar(&mut self) {
        let x = MARGIN;
        self.page.commands.push(DrawCommand::Rect {
            x,
            y: BOTTOM,
            w: SIDEBAR_WIDTH,
            h: TOP - BOTTOM,
            fill: Some(theme::SIDEBAR_BG),
            stroke: None,
        });

        let tx = x + SIDEBAR_PAD;
        let y = TOP;
        self.text(tx, y - 0.45 * INCH, "CYBER".to_string(), Face::SerifBold, 18.0, theme::SIDEBAR_TEXT);
        self.text(
            tx,
            y - 0.78 * INCH,
            "NEWSLETTER".to_string(),
            Face::SerifBold,
            18.0,
            theme::SIDEBAR_TEXT,
        );
        let stamp = self.now.format("%A, %b %d, %Y • %H:%M UTC").to_string();
        self.text(tx, y - 1.10 * INCH, stamp, Face::Serif, 9.5, theme::SIDEBAR_TEXT);
        self.page.commands.push(DrawCommand::Line {
            from: (tx, y - 1.25 * INCH),
            to: (x + SIDEBAR_WIDTH - SIDEBAR_PAD, y - 1.25 * INCH),
            color: theme::SIDEBAR_RULE,
            width: 0.6,
        });

        self.text(
            tx,
            y - 1.52 * INCH,
            "THREAT PULSE".to_string(),
            Face::SerifBold,
            10.0,
            theme::SIDEBAR_TEXT,
        );
        let mut yy = y - 1.72 * INCH;
        let counts = self.counts;
        for (cat, count) in Category::ALL.iter().zip(counts.iter()) {
            let line = format!("{:<12}  {}", cat.title_case(), count);
            self.text(tx, yy, line, Face::Serif, 9.0, theme::SIDEBAR_TEXT);
            yy -= 0.18 * INCH;
        }
        self.page.commands.push(DrawCommand::Line {
            from: (tx, yy - 0.08 * INCH),
            to: (x + SIDEBAR_WIDTH - SIDEBAR_PAD, yy - 0.08 * INCH),
            color: theme::SIDEBAR_RULE,
            width: 0.6,
        });
        yy -= 0.30 * INCH;

        let shown = self.cfg.top_n.min(self.articles.len());
        self.text(
            tx,
            yy,
            format!("TOP {}", shown),
            Face::SerifBold,
            10.0,
            theme::SIDEBAR_TEXT,
        );
        yy -= 0.22 * INCH;

        let max_idx_w = SIDEBAR_WIDTH - 2.0 * SIDEBAR_PAD;
        for (i, article) in self.articles.iter().enumerate() {
            if yy < BOTTOM + 0.75 * INCH {
                break;
            }
            let entry = format!("{}. {}", i + 1, shorten(&article.title, 150));
            let mut lines = wrap_to_width(self.measure, &entry, Face::Serif, INDEX_SIZE, max_idx_w);
            if lines.len() == 1 && self.measure.width(&lines[0], Face::Serif, INDEX_SIZE) > max_idx_w {
                lines = wrap_url(self.measure, &entry, Face::Serif, INDEX_SIZE, max_idx_w);
            }
            lines.truncate(2);
            for line in lines {
                let fitted = ellipsize_to_width(self.measure, &line, Face::Serif, INDEX_SIZE, max_idx_w);
                self.text(tx, yy, fitted, Face::Serif, INDEX_SIZE, theme::SIDEBAR_TEXT);
                yy -= INDEX_LINE_LEADING;
            }
            yy -= INDEX_ITEM_SPACING;
        }

        self.text(
            tx,
            BOTTOM + 0.25 * INCH,
            format!("Lookback: {}h • Ranked by risk", self.cfg.lookback_hours),
            Face::Serif,
            INDEX_SIZE,
            theme::SIDEBAR_TEXT,
        );
    }

    /// Make sure `need` points of vertical space are available, preferring
    /// the current column, then the other, then a new page.
    fn ensure_room(&mut self, need: f64) {
        if self.col_y[self.col] - need >= BOTTOM {
            return;
        }
        let other = 1 - self.col;
        if self.col_y[other] - need >= BOTTOM {
            self.col = other;
            return;
        }
        self.start_page();
    }

    /// After a card lands, move to the other column if this one has run far
    /// ahead, so sections zigzag instead of filling a full column first.
    fn rebalance(&mut self) {
        if self.col_y[0] < self.col_y[1] - REBALANCE_SLACK {
            self.col = 1;
        } else if self.col_y[1] < self.col_y[0] - REBALANCE_SLACK {
            self.col = 0;
        }
    }

    fn draw_section(&mut self, category: Category) {
        let x = COLUMN_X[self.col];
        let y_top = self.col_y[self.col];
        let w = COLUMN_WIDTH.min(2.4 * INCH);
        self.page.commands.push(DrawCommand::Rect {
            x,
            y: y_top - SECTION_HEIGHT,
            w,
            h: SECTION_HEIGHT,
            fill: Some(theme::BLUE_100),
            stroke: Some((theme::BLUE_BORDER, 0.8)),
        });
        self.text(
            x + 8.0,
            y_top - SECTION_HEIGHT + 8.0,
            category.label().to_string(),
            Face::SerifBold,
            9.0,
            theme::BLUE_TEXT,
        );
        self.col_y[self.col] = y_top - (SECTION_HEIGHT + SECTION_SPACING);
    }

    /// Wrap an article's text to the column width and total up the card
    /// height it will need.
    fn build_card(&self, article: &Article) -> Card {
        let max_w = COLUMN_WIDTH - 2.0 * CARD_INNER_X;

        let mut headline =
            wrap_to_width(self.measure, &article.title, Face::SerifBold, HEADLINE_SIZE, max_w);
        headline.truncate(2);

        let mut summary = wrap_to_width(self.measure, &article.summary, Face::Serif, SUMMARY_SIZE, max_w);
        summary.truncate(3);

        let kicker = if self.cfg.show_signals && !article.signals.is_empty() {
            let text = format!(
                "Why it matters: {}.",
                article.signals.iter().take(2).join(", ")
            );
            wrap_to_width(self.measure, &text, Face::SerifItalic, KICKER_SIZE, max_w)
                .into_iter()
                .next()
        } else {
            None
        };

        let mut links = wrap_url(self.measure, &article.link, Face::Serif, LINK_SIZE, max_w);
        if links.len() > self.cfg.max_url_lines {
            links.truncate(self.cfg.max_url_lines);
            if let Some(last) = links.last_mut() {
                let clipped = format!("{}…", last);
                *last = ellipsize_to_width(self.measure, &clipped, Face::Serif, LINK_SIZE, max_w);
            }
        }

        let hours = hours_since(self.now, article.published).max(0.0);
        let meta_suffix = format!(" {:.1} • {:.1}h", article.score, hours);
        let suffix_w = self.measure.width(&meta_suffix, Face::Serif, META_SIZE);
        let prefix_budget = (max_w - RISK_SQUARES_WIDTH - suffix_w).max(0.0);
        let meta_prefix = ellipsize_to_width(
            self.measure,
            &format!("{} • ", article.source),
            Face::Serif,
            META_SIZE,
            prefix_budget,
        );

        let mut height = CARD_PAD
            + headline.len() as f64 * HEADLINE_LEADING
            + META_LEADING
            + summary.len() as f64 * SUMMARY_LEADING;
        if kicker.is_some() {
            height += KICKER_LEADING;
        }
        height += links.len() as f64 * LINK_LEADING;
        height += CARD_PAD;

        Card {
            headline,
            meta_prefix,
            meta_suffix,
            risk_level: risk_level(article.score),
            summary,
            kicker,
            links,
            height,
        }
    }

    fn draw_card(&mut self, article: &Article, card: &Card) {
        let x = COLUMN_X[self.col];
        let y_top = self.col_y[self.col];
        self.page.commands.push(DrawCommand::Rect {
            x,
            y: y_top - card.height,
            w: COLUMN_WIDTH,
            h: card.height,
            fill: Some(theme::card_fill_for_score(article.score)),
            stroke: Some((theme::BLUE_BORDER, 0.9)),
        });

        let tx = x + CARD_INNER_X;
        let mut ty = y_top - CARD_PAD;

        for line in &card.headline {
            self.text(tx, ty, line.clone(), Face::SerifBold, HEADLINE_SIZE, theme::BLACK);
            ty -= HEADLINE_LEADING;
        }

        self.text(tx, ty, card.meta_prefix.clone(), Face::Serif, META_SIZE, theme::BLUE_TEXT);
        let prefix_w = self.measure.width(&card.meta_prefix, Face::Serif, META_SIZE);
        let mut sq_x = tx + prefix_w;
        for i in 0..4 {
            let filled = i < card.risk_level;
            self.page.commands.push(DrawCommand::Rect {
                x: sq_x,
                y: ty,
                w: RISK_SQUARE,
                h: RISK_SQUARE,
                fill: filled.then_some(theme::BLUE_BORDER),
                stroke: Some((theme::BLUE_BORDER, 0.8)),
            });
            sq_x += RISK_SQUARE + RISK_SQUARE_GAP;
        }
        self.text(
            tx + prefix_w + RISK_SQUARES_WIDTH,
            ty,
            card.meta_suffix.clone(),
            Face::Serif,
            META_SIZE,
            theme::BLUE_TEXT,
        );
        ty -= META_LEADING;

        for line in &card.summary {
            self.text(tx, ty, line.clone(), Face::Serif, SUMMARY_SIZE, theme::BLACK);
            ty -= SUMMARY_LEADING;
        }

        if let Some(kicker) = &card.kicker {
            self.text(tx, ty, kicker.clone(), Face::SerifItalic, KICKER_SIZE, theme::GREY);
            ty -= KICKER_LEADING;
        }

        for line in &card.links {
            let tw = self.measure.width(line, Face::Serif, LINK_SIZE);
            self.text(tx, ty, line.clone(), Face::Serif, LINK_SIZE, theme::GREY);
            self.page.commands.push(DrawCommand::Link {
                rect: (tx, ty - 2.0, tx + tw, ty + 9.0),
                url: article.link.clone(),
            });
            ty -= LINK_LEADING;
        }

        self.col_y[self.col] = y_top - card.height - CARD_SPACING;
    }

    fn finish(mut self) -> Document {
        self.pages.push(self.page);
        Document {
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
            pages: self.pages,
        }
    }
}

/// Lay out the whole briefing.
///
/// Articles flow in `classified.sequence` order: grouped by category with a
/// section header drawn whenever the category changes, rank order preserved
/// within each group. An empty run still produces a one-page document with
/// the sidebar and a notice.
///
/// # Arguments
///
/// * `measure` - Width oracle matching the faces the backend will embed.
/// * `now` - Timestamp shown in the sidebar and used for article ages.
pub fn render_document(
    cfg: &Config,
    measure: &dyn TextMeasure,
    now: DateTime<Utc>,
    articles: &[Article],
    classified: &Classified,
) -> Document {
    let mut state = LayoutState {
        cfg,
        measure,
        now,
        articles,
        counts: classified.counts,
        pages: Vec::new(),
        page: Page::default(),
        page_no: 0,
        col_y: [TOP, TOP],
        col: 0,
    };
    state.start_page();

    if articles.is_empty() {
        state.text(
            CONTENT_LEFT,
            TOP - 0.6 * INCH,
            "No qualifying items found.".to_string(),
            Face::Serif,
            12.0,
            theme::BLACK,
        );
        return state.finish();
    }

    let mut current_section: Option<Category> = None;
    for &(category, idx) in &classified.sequence {
        let article = &articles[idx];
        if current_section != Some(category) {
            state.ensure_room(SECTION_ROOM);
            state.draw_section(category);
            current_section = Some(category);
        }
        let card = state.build_card(article);
        state.ensure_room(card.height);
        state.draw_card(article, &card);
        state.rebalance();
    }

    state.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_ranked;
    use crate::layout::text::FixedMeasure;
    use chrono::TimeZone;

    const M: FixedMeasure = FixedMeasure { unit: 5.0 };

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 6, 12, 0, 0).unwrap()
    }

    fn article(title: &str, score: f64, hours_ago: i64) -> Article {
        Article {
            title: title.to_string(),
            summary: String::new(),
            source: "Test Feed".to_string(),
            link: format!("https://example.com/{}", title.to_lowercase().replace(' ', "-")),
            published: fixed_now() - chrono::Duration::hours(hours_ago),
            score,
            signals: Vec::new(),
        }
    }

    fn render(cfg: &Config, articles: &[Article]) -> Document {
        let classified = classify_ranked(articles);
        render_document(cfg, &M, fixed_now(), articles, &classified)
    }

    fn texts(page: &Page) -> Vec<&str> {
        page.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_empty_run_renders_notice_page() {
        let cfg = Config::for_tests();
        let doc = render(&cfg, &[]);
        assert_eq!(doc.pages.len(), 1);
        let texts = texts(&doc.pages[0]);
        assert!(texts.contains(&"No qualifying items found."));
        assert!(texts.contains(&"TOP 0"));
        assert!(texts.contains(&"CYBER"));
    }

    #[test]
    fn test_every_page_has_sidebar_and_number() {
        let cfg = Config::for_tests();
        let articles: Vec<Article> = (0..40)
            .map(|i| article(&format!("Incident report {}", i), 50.0, i))
            .collect();
        let doc = render(&cfg, &articles);
        assert!(doc.pages.len() >= 2, "expected overflow onto extra pages");
        for (i, page) in doc.pages.iter().enumerate() {
            let sidebar = page.commands.iter().any(|c| {
                matches!(c, DrawCommand::Rect { x, w, .. }
                    if (*x - MARGIN).abs() < 1e-6 && (*w - SIDEBAR_WIDTH).abs() < 1e-6)
            });
            assert!(sidebar, "page {} missing sidebar", i + 1);
            let number = (i + 1).to_string();
            assert!(texts(page).contains(&number.as_str()), "page {} missing number", i + 1);
        }
    }

    #[test]
    fn test_cards_stay_inside_page_bounds() {
        let cfg = Config::for_tests();
        let articles: Vec<Article> = (0..40)
            .map(|i| article(&format!("Incident report {}", i), 50.0, i))
            .collect();
        let doc = render(&cfg, &articles);
        for page in &doc.pages {
            for cmd in &page.commands {
                if let DrawCommand::Rect { x, y, w, h, .. } = cmd {
                    if (*w - COLUMN_WIDTH).abs() < 1e-6 {
                        assert!(COLUMN_X.iter().any(|cx| (*x - cx).abs() < 1e-6));
                        assert!(*y >= BOTTOM - 1e-6, "card below bottom margin: y={}", y);
                        assert!(*y + *h <= TOP + 1e-6, "card above top margin");
                    }
                }
            }
        }
    }

    #[test]
    fn test_both_columns_are_used() {
        let cfg = Config::for_tests();
        let articles: Vec<Article> = (0..12)
            .map(|i| article(&format!("Incident report {}", i), 50.0, i))
            .collect();
        let doc = render(&cfg, &articles);
        let second_col_used = doc.pages[0].commands.iter().any(|c| {
            matches!(c, DrawCommand::Rect { x, w, .. }
                if (*w - COLUMN_WIDTH).abs() < 1e-6 && (*x - COLUMN_X[1]).abs() < 1e-6)
        });
        assert!(second_col_used);
    }

    #[test]
    fn test_section_headers_follow_category_grouping() {
        let cfg = Config::for_tests();
        let articles = vec![
            article("Zero-day exploited in firewall", 80.0, 2),
            article("Ransomware crew hits hospital", 70.0, 5),
            article("Quarterly infrastructure notes", 20.0, 30),
        ];
        let doc = render(&cfg, &articles);
        let all_texts: Vec<&str> = doc.pages.iter().flat_map(texts).collect();
        let zd = all_texts.iter().position(|t| *t == "ZERO-DAYS");
        let rw = all_texts.iter().position(|t| *t == "RANSOMWARE");
        let other = all_texts.iter().position(|t| *t == "OTHER");
        assert!(zd.is_some() && rw.is_some() && other.is_some());
        assert!(zd < rw && rw < other);
        assert!(!all_texts.contains(&"PHISHING"), "empty category drew a header");
    }

    #[test]
    fn test_card_height_accounts_for_every_block() {
        let cfg = Config::for_tests();
        let mut a = article("Exploit chain analysis", 75.0, 3);
        a.summary = "One line worth of summary text here".to_string();
        a.signals = vec!["zero-day".to_string(), "breaking".to_string()];
        let state = LayoutState {
            cfg: &cfg,
            measure: &M,
            now: fixed_now(),
            articles: std::slice::from_ref(&a),
            counts: [0; Category::ALL.len()],
            pages: Vec::new(),
            page: Page::default(),
            page_no: 0,
            col_y: [TOP, TOP],
            col: 0,
        };
        let card = state.build_card(&a);
        let expected = CARD_PAD
            + card.headline.len() as f64 * HEADLINE_LEADING
            + META_LEADING
            + card.summary.len() as f64 * SUMMARY_LEADING
            + KICKER_LEADING
            + card.links.len() as f64 * LINK_LEADING
            + CARD_PAD;
        assert!((card.height - expected).abs() < 1e-9);
        assert!(card.kicker.as_deref().is_some_and(|k| k.starts_with("Why it matters:")));
        assert_eq!(card.risk_level, 3);
    }

    #[test]
    fn test_kicker_suppressed_when_signals_hidden() {
        let mut cfg = Config::for_tests();
        cfg.show_signals = false;
        let mut a = article("Exploit chain analysis", 75.0, 3);
        a.signals = vec!["zero-day".to_string()];
        let state = LayoutState {
            cfg: &cfg,
            measure: &M,
            now: fixed_now(),
            articles: std::slice::from_ref(&a),
            counts: [0; Category::ALL.len()],
            pages: Vec::new(),
            page: Page::default(),
            page_no: 0,
            col_y: [TOP, TOP],
            col: 0,
        };
        let card = state.build_card(&a);
        assert!(card.kicker.is_none());
    }

    #[test]
    fn test_link_lines_capped_and_ellipsized() {
        let cfg = Config::for_tests();
        let mut a = article("Short title", 40.0, 3);
        a.link = format!("https://example.com/{}", "segment/".repeat(40));
        let state = LayoutState {
            cfg: &cfg,
            measure: &M,
            now: fixed_now(),
            articles: std::slice::from_ref(&a),
            counts: [0; Category::ALL.len()],
            pages: Vec::new(),
            page: Page::default(),
            page_no: 0,
            col_y: [TOP, TOP],
            col: 0,
        };
        let card = state.build_card(&a);
        assert_eq!(card.links.len(), cfg.max_url_lines);
        assert!(card.links.last().is_some_and(|l| l.ends_with('…')));
    }

    #[test]
    fn test_link_annotation_bound_to_article_url() {
        let cfg = Config::for_tests();
        let articles = vec![article("Incident report", 50.0, 4)];
        let doc = render(&cfg, &articles);
        let annotated = doc.pages[0].commands.iter().any(|c| {
            matches!(c, DrawCommand::Link { url, .. } if url == &articles[0].link)
        });
        assert!(annotated);
    }
}

//! Text measurement and line breaking.
//!
//! Widths come from embedded advance-width tables for the three standard
//! serif faces the PDF backend uses, so layout is deterministic and needs no
//! font files at runtime. The [`TextMeasure`] trait is the seam: layout code
//! only ever asks "how wide is this string", which lets tests substitute an
//! exact fixed-width measurer.

/// The three faces available to the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Serif,
    SerifBold,
    SerifItalic,
}

/// Measures rendered string widths in points.
pub trait TextMeasure {
    fn width(&self, text: &str, face: Face, size: f64) -> f64;
}

/// Advance width any glyph outside the tables falls back to, in 1/1000 em.
const DEFAULT_ADVANCE: f64 = 500.0;

// Advance widths for the printable ASCII range 0x20..=0x7E, in 1/1000 em,
// taken from the standard serif (Times) metrics.
#[rustfmt::skip]
const SERIF_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278, // ' '..'/'
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444, // '0'..'?'
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722, // '@'..'O'
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500, // 'P'..'_'
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500, // '`'..'o'
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,      // 'p'..'~'
];

#[rustfmt::skip]
const SERIF_BOLD_WIDTHS: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278, // ' '..'/'
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,  // '0'..'?'
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,  // '@'..'O'
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500, // 'P'..'_'
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,  // '`'..'o'
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,       // 'p'..'~'
];

#[rustfmt::skip]
const SERIF_ITALIC_WIDTHS: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278, // ' '..'/'
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 675, 675, 675, 500, // '0'..'?'
    920, 611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722, // '@'..'O'
    611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556, 389, 278, 389, 422, 500, // 'P'..'_'
    333, 500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722, 500, 500, // '`'..'o'
    500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,      // 'p'..'~'
];

/// Widths for the common non-ASCII typography glyphs the pipeline produces.
fn special_advance(face: Face, ch: char) -> f64 {
    match ch {
        '\u{2026}' => {
            if face == Face::SerifItalic {
                889.0
            } else {
                1000.0
            }
        }
        '\u{2022}' => 350.0,
        '\u{2013}' => 500.0,
        '\u{2014}' => 1000.0,
        '\u{2018}' | '\u{2019}' => 333.0,
        '\u{201C}' | '\u{201D}' => match face {
            Face::Serif => 444.0,
            Face::SerifBold => 500.0,
            Face::SerifItalic => 556.0,
        },
        _ => DEFAULT_ADVANCE,
    }
}

/// Width measurement backed by the embedded serif tables.
#[derive(Debug, Default)]
pub struct SerifMetrics;

impl TextMeasure for SerifMetrics {
    fn width(&self, text: &str, face: Face, size: f64) -> f64 {
        let table = match face {
            Face::Serif => &SERIF_WIDTHS,
            Face::SerifBold => &SERIF_BOLD_WIDTHS,
            Face::SerifItalic => &SERIF_ITALIC_WIDTHS,
        };
        let units: f64 = text
            .chars()
            .map(|ch| {
                let code = ch as u32;
                if (0x20..=0x7E).contains(&code) {
                    table[(code - 0x20) as usize] as f64
                } else {
                    special_advance(face, ch)
                }
            })
            .sum();
        units / 1000.0 * size
    }
}

/// Greedy word wrap.
///
/// Words are packed onto lines up to `max_width`; a single word wider than
/// the limit gets its own line unbroken (callers that must stay inside the
/// limit follow up with [`wrap_url`] or [`ellipsize_to_width`]).
pub fn wrap_to_width(
    measure: &dyn TextMeasure,
    text: &str,
    face: Face,
    size: f64,
    max_width: f64,
) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        if cur.is_empty() {
            cur = word.to_string();
            continue;
        }
        let cand = format!("{} {}", cur, word);
        if measure.width(&cand, face, size) <= max_width {
            cur = cand;
        } else {
            lines.push(cur);
            cur = word.to_string();
        }
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

/// Characters a URL may break after.
const URL_BREAK_CHARS: &str = "/?&=_-.#:";

/// Wrap a URL (or any unspaced token) by characters, preferring to break
/// just after separator characters.
///
/// # Arguments
///
/// * `measure` - Width oracle.
/// * `url` - The string to wrap; leading/trailing whitespace is ignored.
/// * `face`, `size` - Type settings the string will be drawn with.
/// * `max_width` - Line width limit in points.
///
/// # Returns
///
/// The wrapped lines in order; empty input produces no lines.
pub fn wrap_url(
    measure: &dyn TextMeasure,
    url: &str,
    face: Face,
    size: f64,
    max_width: f64,
) -> Vec<String> {
    let url = url.trim();
    if url.is_empty() {
        return Vec::new();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut cur: Vec<char> = Vec::new();
    // 1-based position just after the most recent break character.
    let mut last_break: usize = 0;

    for ch in url.chars() {
        let mut cand = cur.clone();
        cand.push(ch);
        if URL_BREAK_CHARS.contains(ch) {
            last_break = cand.len();
        }

        let cand_str: String = cand.iter().collect();
        if measure.width(&cand_str, face, size) <= max_width {
            cur = cand;
            continue;
        }

        if last_break > 0 {
            let cut = last_break.min(cur.len());
            let head: String = cur[..cut].iter().collect();
            lines.push(head.trim_end().to_string());
            let tail: String = cur[cut..].iter().collect();
            let tail = tail.trim_start();
            if tail.is_empty() {
                cur = vec![ch];
            } else {
                cur = tail.chars().collect();
                cur.push(ch);
            }
        } else if !cur.is_empty() {
            lines.push(cur.iter().collect());
            cur = vec![ch];
        } else {
            lines.push(ch.to_string());
            cur.clear();
        }

        last_break = 0;
        for (i, cc) in cur.iter().enumerate() {
            if URL_BREAK_CHARS.contains(*cc) {
                last_break = i + 1;
            }
        }
    }
    if !cur.is_empty() {
        lines.push(cur.iter().collect());
    }
    lines
}

/// Shorten a line with a trailing ellipsis until it fits `max_width`.
///
/// Returns the input unchanged when it already fits; returns a bare ellipsis
/// when not even one character fits.
pub fn ellipsize_to_width(
    measure: &dyn TextMeasure,
    text: &str,
    face: Face,
    size: f64,
    max_width: f64,
) -> String {
    if measure.width(text, face, size) <= max_width {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    let mut lo = 0usize;
    let mut hi = chars.len();
    let mut best = String::new();
    while lo <= hi {
        let mid = (lo + hi) / 2;
        let prefix: String = chars[..mid].iter().collect();
        let cand = format!("{}…", prefix.trim_end());
        if measure.width(&cand, face, size) <= max_width {
            best = cand;
            lo = mid + 1;
        } else {
            if mid == 0 {
                break;
            }
            hi = mid - 1;
        }
    }
    if best.is_empty() { "…".to_string() } else { best }
}

/// Test measurer: every glyph is exactly `unit` points wide regardless of
/// face or size, so wrap points land on exact character counts.
#[cfg(test)]
pub struct FixedMeasure {
    pub unit: f64,
}

#[cfg(test)]
impl TextMeasure for FixedMeasure {
    fn width(&self, text: &str, _face: Face, _size: f64) -> f64 {
        text.chars().count() as f64 * self.unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const M: FixedMeasure = FixedMeasure { unit: 10.0 };

    #[test]
    fn test_serif_metrics_sums_advances() {
        let m = SerifMetrics;
        // 'H' is 722 and 'i' is 278, exactly one em together.
        assert!((m.width("Hi", Face::Serif, 10.0) - 10.0).abs() < 1e-9);
        assert!((m.width(" ", Face::Serif, 12.0) - 3.0).abs() < 1e-9);
        assert_eq!(m.width("", Face::Serif, 12.0), 0.0);
    }

    #[test]
    fn test_serif_metrics_face_differences() {
        let m = SerifMetrics;
        let roman = m.width("again", Face::Serif, 9.0);
        let bold = m.width("again", Face::SerifBold, 9.0);
        assert!(bold > roman);
    }

    #[test]
    fn test_serif_metrics_unmapped_glyphs_use_default() {
        let m = SerifMetrics;
        assert!((m.width("Ж", Face::Serif, 10.0) - 5.0).abs() < 1e-9);
        assert!((m.width("…", Face::Serif, 10.0) - 10.0).abs() < 1e-9);
        assert!((m.width("…", Face::SerifItalic, 10.0) - 8.89).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_packs_words_greedily() {
        let lines = wrap_to_width(&M, "alpha beta gamma", Face::Serif, 9.0, 100.0);
        assert_eq!(lines, vec!["alpha beta", "gamma"]);
    }

    #[test]
    fn test_wrap_keeps_overlong_word_whole() {
        let lines = wrap_to_width(&M, "hi supercalifragilistic go", Face::Serif, 9.0, 100.0);
        assert_eq!(lines, vec!["hi", "supercalifragilistic", "go"]);
    }

    #[test]
    fn test_wrap_empty_text() {
        assert!(wrap_to_width(&M, "", Face::Serif, 9.0, 100.0).is_empty());
        assert!(wrap_to_width(&M, "   ", Face::Serif, 9.0, 100.0).is_empty());
    }

    #[test]
    fn test_wrap_url_breaks_after_separators() {
        let lines = wrap_url(
            &M,
            "https://example.com/path/to/page?x=1",
            Face::Serif,
            7.2,
            100.0,
        );
        assert_eq!(
            lines,
            vec!["https://", "example.", "com/path/", "to/page?x=", "1"]
        );
        for line in &lines {
            assert!(line.chars().count() <= 10);
        }
    }

    #[test]
    fn test_wrap_url_hard_splits_without_separators() {
        let lines = wrap_url(&M, "abcdefghijklmnopqrstuv", Face::Serif, 7.2, 100.0);
        assert_eq!(lines, vec!["abcdefghij", "klmnopqrst", "uv"]);
    }

    #[test]
    fn test_wrap_url_empty() {
        assert!(wrap_url(&M, "  ", Face::Serif, 7.2, 100.0).is_empty());
    }

    #[test]
    fn test_ellipsize_fits_unchanged() {
        assert_eq!(
            ellipsize_to_width(&M, "short", Face::Serif, 9.0, 100.0),
            "short"
        );
    }

    #[test]
    fn test_ellipsize_takes_longest_fitting_prefix() {
        let out = ellipsize_to_width(&M, "abcdefghij", Face::Serif, 9.0, 50.0);
        assert_eq!(out, "abcd…");
    }

    #[test]
    fn test_ellipsize_trims_trailing_space_before_ellipsis() {
        let out = ellipsize_to_width(&M, "ab cdefgh", Face::Serif, 9.0, 40.0);
        assert_eq!(out, "ab…");
    }

    #[test]
    fn test_ellipsize_degenerate_width() {
        assert_eq!(ellipsize_to_width(&M, "abcdef", Face::Serif, 9.0, 5.0), "…");
    }
}

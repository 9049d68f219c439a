//! Feed text cleanup: entity decoding, image and markup stripping, whitespace
//! collapse, and word-safe truncation.
//!
//! Feed summaries arrive as HTML fragments, often with embedded figures,
//! tracking pixels, and inline base64 images. Everything here reduces that
//! to plain single-spaced text suitable for scoring and card rendering.

use once_cell::sync::Lazy;
use regex::Regex;

static FIGURE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<figure\b[^>]*>.*?</figure>").unwrap());
static PICTURE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<picture\b[^>]*>.*?</picture>").unwrap());
static SVG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<svg\b[^>]*>.*?</svg>").unwrap());
static IFRAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<iframe\b[^>]*>.*?</iframe>").unwrap());
static IMG_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<img\b[^>]*>").unwrap());
static MD_IMAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]+\)").unwrap());
static DATA_IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"data:image/[^;]+;base64,[A-Za-z0-9+/=]+").unwrap());
// The regex crate has no backreferences, so script and style blocks get one
// pattern each instead of a shared `</\1>` tail.
static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").unwrap());
static STYLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse all runs of whitespace (including newlines) to single spaces and
/// trim the ends.
pub fn normalize_space(s: &str) -> String {
    WS_RE.replace_all(s, " ").trim().to_string()
}

/// Decode HTML entities (named and numeric) and trim the result.
///
/// Applied to titles and to already-stripped summaries, so text that was
/// double-encoded in the feed comes out readable.
pub fn decode_entities(s: &str) -> String {
    html_escape::decode_html_entities(s).trim().to_string()
}

/// Remove image-bearing markup from an HTML fragment.
///
/// Drops `<figure>`, `<picture>`, `<svg>` and `<iframe>` blocks with their
/// contents, bare `<img>` tags, markdown image references, and inline base64
/// image data URIs. Each removal leaves a single space so surrounding words
/// stay separated.
pub fn strip_images(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let s = FIGURE_RE.replace_all(raw, " ");
    let s = PICTURE_RE.replace_all(&s, " ");
    let s = SVG_RE.replace_all(&s, " ");
    let s = IFRAME_RE.replace_all(&s, " ");
    let s = IMG_TAG_RE.replace_all(&s, " ");
    let s = MD_IMAGE_RE.replace_all(&s, " ");
    let s = DATA_IMAGE_RE.replace_all(&s, " ");
    s.into_owned()
}

/// Reduce an HTML fragment to plain single-spaced text.
///
/// Decodes entities, strips images, drops `<script>`/`<style>` blocks with
/// their contents, removes remaining tags, and collapses whitespace.
pub fn strip_html_to_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let s = html_escape::decode_html_entities(raw);
    let s = strip_images(&s);
    let s = SCRIPT_RE.replace_all(&s, " ");
    let s = STYLE_RE.replace_all(&s, " ");
    let s = TAG_RE.replace_all(&s, " ");
    normalize_space(&s)
}

/// Truncate text to roughly `max_chars` characters without cutting words.
///
/// Text within budget is returned trimmed. Otherwise the text is cut at
/// `max_chars + 1` characters, backed off to the last space when one exists,
/// trimmed, and finished with a `…`. Counts are Unicode scalar values, not
/// bytes.
pub fn shorten(s: &str, max_chars: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_chars + 1).collect();
    let cut = match cut.rfind(' ') {
        Some(pos) => &cut[..pos],
        None => cut.as_str(),
    };
    format!("{}…", cut.trim_end())
}

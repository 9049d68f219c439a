//! Page layout: geometry, draw commands, and the engine that turns a ranked
//! article list into pages.
//!
//! The engine emits backend-neutral draw commands; the PDF writer in
//! `outputs::pdf` is the only consumer. Coordinates are PDF-style points
//! with the origin at the bottom-left of the page.

pub mod engine;
pub mod text;
pub mod theme;

use self::text::Face;

pub const INCH: f64 = 72.0;

/// Landscape US Letter.
pub const PAGE_WIDTH: f64 = 11.0 * INCH;
pub const PAGE_HEIGHT: f64 = 8.5 * INCH;

pub const MARGIN: f64 = 0.55 * INCH;
/// Lowest y content may reach.
pub const BOTTOM: f64 = 0.65 * INCH;
/// Highest y content starts at.
pub const TOP: f64 = PAGE_HEIGHT - MARGIN;

pub const SIDEBAR_WIDTH: f64 = 2.70 * INCH;
/// Gap between the sidebar panel and the content area.
pub const SIDEBAR_GAP: f64 = 0.30 * INCH;
/// Gap between the two content columns.
pub const COLUMN_GUTTER: f64 = 0.25 * INCH;

/// Left edge of the two-column content area.
pub const CONTENT_LEFT: f64 = MARGIN + SIDEBAR_WIDTH + SIDEBAR_GAP;
pub const CONTENT_WIDTH: f64 = PAGE_WIDTH - MARGIN - CONTENT_LEFT;
pub const COLUMN_WIDTH: f64 = (CONTENT_WIDTH - COLUMN_GUTTER) / 2.0;

/// An RGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

/// One drawing operation on a page.
///
/// `y` on a rect is its bottom edge; text `y` is the baseline.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        fill: Option<Color>,
        stroke: Option<(Color, f64)>,
    },
    Text {
        x: f64,
        y: f64,
        content: String,
        face: Face,
        size: f64,
        color: Color,
    },
    Line {
        from: (f64, f64),
        to: (f64, f64),
        color: Color,
        width: f64,
    },
    /// A clickable region `(x1, y1, x2, y2)` bound to a URL.
    Link { rect: (f64, f64, f64, f64), url: String },
}

#[derive(Debug, Default)]
pub struct Page {
    pub commands: Vec<DrawCommand>,
}

/// A fully laid-out document, ready for a rendering backend.
#[derive(Debug)]
pub struct Document {
    pub width: f64,
    pub height: f64,
    pub pages: Vec<Page>,
}

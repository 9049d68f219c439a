//! The fixed blue-on-white palette.

use super::Color;

pub const BLUE_050: Color = Color::new(0.94, 0.97, 1.00);
pub const BLUE_075: Color = Color::new(0.90, 0.95, 1.00);
pub const BLUE_100: Color = Color::new(0.85, 0.92, 1.00);
pub const BLUE_BORDER: Color = Color::new(0.25, 0.50, 0.85);
pub const BLUE_TEXT: Color = Color::new(0.10, 0.25, 0.45);

pub const SIDEBAR_BG: Color = Color::new(0.14, 0.32, 0.55);
pub const SIDEBAR_TEXT: Color = Color::new(1.00, 1.00, 1.00);
pub const SIDEBAR_RULE: Color = Color::new(0.75, 0.85, 0.95);

pub const BLACK: Color = Color::new(0.00, 0.00, 0.00);
pub const GREY: Color = Color::new(0.50, 0.50, 0.50);

/// High scorers get the slightly darker card tint.
pub fn card_fill_for_score(score: f64) -> Color {
    if score >= 70.0 { BLUE_075 } else { BLUE_050 }
}

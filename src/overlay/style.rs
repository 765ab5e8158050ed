use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::dom::Rect;

/// Marks every node the overlay layer owns.
pub const OVERLAY_ATTR: &str = "data-page-anchor-overlay";
/// Overlay id on the decoration node.
pub const OVERLAY_ID_ATTR: &str = "data-page-anchor-id";
pub const OVERLAY_CLASS: &str = "page-anchor-overlay";
pub const LABEL_CLASS: &str = "page-anchor-overlay-label";

const Z_INDEX_MAX: i64 = 2_147_483_647;
const BASE_BLUR_PX: f64 = 10.0;
const BLUR_SWING_PX: f64 = 10.0;
const BASE_ALPHA: f64 = 0.5;
const ALPHA_SWING: f64 = 0.3;

/// `#rgb` or `#rrggbb` to `rgba(r, g, b, a)`. Unparseable channels are 0.
pub fn hex_to_rgba(hex: &str, alpha: f64) -> String {
    let hex = hex.trim().trim_start_matches('#');
    let expanded: String = if hex.chars().count() == 3 {
        hex.chars().flat_map(|c| [c, c]).collect()
    } else {
        hex.to_string()
    };

    let channel = |range: std::ops::Range<usize>| {
        expanded
            .get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .unwrap_or(0)
    };
    format!(
        "rgba({}, {}, {}, {})",
        channel(0..2),
        channel(2..4),
        channel(4..6),
        alpha
    )
}

/// Glow state of one overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum Glow {
    /// Animated frame: blur in px and shadow opacity
    Pulse { blur: f64, alpha: f64 },
    /// Used once too many overlays are active to animate them all
    Static { blur: f64 },
}

impl Glow {
    /// Pulse sample `elapsed_ms` into the animation.
    pub fn pulse_at(elapsed_ms: u64, period_ms: u64) -> Self {
        let period = period_ms.max(1);
        let progress = (elapsed_ms % period) as f64 / period as f64;
        let intensity = (progress * PI * 2.0).sin().abs();
        Glow::Pulse {
            blur: BASE_BLUR_PX + BLUR_SWING_PX * intensity,
            alpha: BASE_ALPHA + ALPHA_SWING * intensity,
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, Glow::Pulse { .. })
    }

    fn box_shadow(&self, color: &str) -> String {
        match self {
            Glow::Pulse { blur, alpha } => {
                format!("0 0 {}px {}", round2(*blur), hex_to_rgba(color, round2(*alpha)))
            }
            Glow::Static { blur } => format!("0 0 {}px {}", round2(*blur), color),
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Everything that determines how an overlay node is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    pub rect: Rect,
    pub color: String,
    pub visible: bool,
    pub glow: Glow,
}

impl OverlayStyle {
    /// Inline CSS for the decoration node: fixed, topmost, pointer-transparent.
    pub fn to_css(&self) -> String {
        let mut css = String::from("position: fixed; ");
        css.push_str(if self.visible {
            "display: block; "
        } else {
            "display: none; "
        });
        css.push_str(&format!(
            "left: {}px; top: {}px; width: {}px; height: {}px; ",
            self.rect.x, self.rect.y, self.rect.width, self.rect.height
        ));
        css.push_str(&format!("border: 3px solid {}; ", self.color));
        css.push_str(&format!("background-color: {}15; ", self.color));
        css.push_str(&format!("box-shadow: {}; ", self.glow.box_shadow(&self.color)));
        css.push_str(&format!(
            "pointer-events: none; user-select: none; z-index: {}; border-radius: 4px;",
            Z_INDEX_MAX
        ));
        css
    }
}

/// Inline CSS for the number tag in the overlay's top-left corner.
pub fn label_css(color: &str) -> String {
    format!(
        "position: absolute; top: -8px; left: -8px; background: {}; color: white; \
         font-size: 12px; font-weight: bold; padding: 3px 6px; border-radius: 3px; \
         z-index: 1; pointer-events: none; box-shadow: 0 2px 4px rgba(0, 0, 0, 0.2);",
        color
    )
}

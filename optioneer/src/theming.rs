//! Theme color resolution.
//!
//! Turns stored theme colors into concrete presentation values: hex or HSL
//! strings are normalized into an [`Hsl`] record, a foreground color is
//! derived from the text-color mode, and a small fixed set of CSS variables
//! is generated for the embed.
//!
//! The resolver never fails: malformed color input degrades to the platform
//! default blue so an embed always renders something.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A color as hue (degrees), saturation and lightness (percent), rounded to
/// the nearest integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Hsl {
    pub h: u16,
    pub s: u8,
    pub l: u8,
}

impl Hsl {
    /// CSS-variable formatting: `"217 91% 60%"`.
    pub fn to_css(self) -> String {
        format!("{} {}% {}%", self.h, self.s, self.l)
    }
}

/// Platform default blue, used whenever a color cannot be parsed.
pub const FALLBACK_HSL: Hsl = Hsl { h: 217, s: 91, l: 60 };

/// Foreground used on dark backgrounds.
const NEAR_WHITE: Hsl = Hsl { h: 0, s: 0, l: 98 };

/// Foreground used on light backgrounds.
const NEAR_BLACK: Hsl = Hsl { h: 222, s: 47, l: 11 };

/// How the embed derives its text color from the theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text_color_mode", rename_all = "lowercase")]
pub enum TextColorMode {
    Auto,
    White,
    Black,
    Custom,
}

/// Parse a `#rrggbb` hex color into HSL. Returns `None` for anything else
/// (short forms, missing `#`, bad digits).
pub fn hex_to_hsl(hex: &str) -> Option<Hsl> {
    let hex = hex.trim();
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&digits[0..2], 16).ok()? as f64 / 255.0;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()? as f64 / 255.0;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()? as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let d = max - min;

    let (h, s) = if d == 0.0 {
        (0.0, 0.0)
    } else {
        let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
        let h = if max == r {
            ((g - b) / d).rem_euclid(6.0)
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        } * 60.0;
        (h, s)
    };

    Some(Hsl {
        h: h.round() as u16 % 360,
        s: (s * 100.0).round() as u8,
        l: (l * 100.0).round() as u8,
    })
}

/// Parse an HSL triplet string of the form `"217 91% 60%"` (commas
/// tolerated). Returns `None` on any malformed part.
pub fn parse_hsl_string(value: &str) -> Option<Hsl> {
    let normalized = value.trim().replace(',', " ");
    let mut parts = normalized.split_whitespace();

    let h: f64 = parts.next()?.parse().ok()?;
    let s: f64 = parts.next()?.strip_suffix('%')?.parse().ok()?;
    let l: f64 = parts.next()?.strip_suffix('%')?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    if !(0.0..=360.0).contains(&h) || !(0.0..=100.0).contains(&s) || !(0.0..=100.0).contains(&l) {
        return None;
    }

    Some(Hsl {
        h: h.round() as u16 % 360,
        s: s.round() as u8,
        l: l.round() as u8,
    })
}

/// Normalize any stored color string (hex or HSL triplet) into HSL, falling
/// back to the platform default blue. Never fails.
pub fn hsl_from_color(value: &str) -> Hsl {
    hex_to_hsl(value)
        .or_else(|| parse_hsl_string(value))
        .unwrap_or(FALLBACK_HSL)
}

/// Derive the foreground text color for a primary color and mode.
///
/// `Auto` is a simple lightness threshold, not a WCAG contrast computation:
/// lightness above 50 gets a dark foreground, anything else a light one.
pub fn calculate_text_color(primary_color: &str, mode: TextColorMode, custom_color: Option<&str>) -> Hsl {
    match mode {
        TextColorMode::White => NEAR_WHITE,
        TextColorMode::Black => NEAR_BLACK,
        TextColorMode::Custom => custom_color.map(hsl_from_color).unwrap_or(FALLBACK_HSL),
        TextColorMode::Auto => {
            if hsl_from_color(primary_color).l > 50 {
                NEAR_BLACK
            } else {
                NEAR_WHITE
            }
        }
    }
}

/// Derive the fixed CSS variable set for a theme's primary color.
///
/// Pure: the same inputs always yield the same variables.
pub fn css_variables(primary_color: &str, mode: TextColorMode, custom_color: Option<&str>) -> Vec<(&'static str, String)> {
    let primary = hsl_from_color(primary_color);
    let foreground = calculate_text_color(primary_color, mode, custom_color);

    vec![
        ("--primary", primary.to_css()),
        ("--primary-foreground", foreground.to_css()),
        ("--ring", primary.to_css()),
        ("--accent", primary.to_css()),
        ("--accent-foreground", foreground.to_css()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_hsl_platform_blue() {
        // #3b82f6 is the platform default blue: 217 91% 60%
        assert_eq!(hex_to_hsl("#3b82f6"), Some(Hsl { h: 217, s: 91, l: 60 }));
    }

    #[test]
    fn test_hex_to_hsl_grayscale_and_primaries() {
        assert_eq!(hex_to_hsl("#ffffff"), Some(Hsl { h: 0, s: 0, l: 100 }));
        assert_eq!(hex_to_hsl("#000000"), Some(Hsl { h: 0, s: 0, l: 0 }));
        assert_eq!(hex_to_hsl("#ff0000"), Some(Hsl { h: 0, s: 100, l: 50 }));
        assert_eq!(hex_to_hsl("#00ff00"), Some(Hsl { h: 120, s: 100, l: 50 }));
        assert_eq!(hex_to_hsl("#0000ff"), Some(Hsl { h: 240, s: 100, l: 50 }));
    }

    #[test]
    fn test_hex_round_trips_through_display_pipeline() {
        // Formatting the parsed HSL and reparsing it is stable to the nearest
        // integer degree/percent.
        for hex in ["#3b82f6", "#8b5cf6", "#f59e0b", "#10b981", "#64748b"] {
            let parsed = hex_to_hsl(hex).unwrap();
            let reparsed = parse_hsl_string(&parsed.to_css()).unwrap();
            assert_eq!(parsed, reparsed, "round trip for {hex}");
        }
    }

    #[test]
    fn test_parse_hsl_string() {
        assert_eq!(parse_hsl_string("217 91% 60%"), Some(Hsl { h: 217, s: 91, l: 60 }));
        assert_eq!(parse_hsl_string(" 217, 91%, 60% "), Some(Hsl { h: 217, s: 91, l: 60 }));
        assert_eq!(parse_hsl_string("217 91 60"), None);
        assert_eq!(parse_hsl_string("banana 91% 60%"), None);
        assert_eq!(parse_hsl_string("400 91% 60%"), None);
    }

    #[test]
    fn test_malformed_colors_fall_back_to_default_blue() {
        for bad in ["", "#12", "#gggggg", "not-a-color", "rgb(1,2,3)", "#1234567"] {
            assert_eq!(hsl_from_color(bad), FALLBACK_HSL, "fallback for {bad:?}");
        }
    }

    #[test]
    fn test_auto_mode_picks_dark_text_on_light_primary() {
        // #3b82f6 has lightness 60, so the light-background path applies
        let text = calculate_text_color("#3b82f6", TextColorMode::Auto, None);
        assert_eq!(text, NEAR_BLACK);
    }

    #[test]
    fn test_auto_mode_picks_light_text_on_dark_primary() {
        // #1e3a8a (dark navy) has lightness around 33
        let text = calculate_text_color("#1e3a8a", TextColorMode::Auto, None);
        assert_eq!(text, NEAR_WHITE);
    }

    #[test]
    fn test_explicit_modes() {
        assert_eq!(calculate_text_color("#3b82f6", TextColorMode::White, None), NEAR_WHITE);
        assert_eq!(calculate_text_color("#3b82f6", TextColorMode::Black, None), NEAR_BLACK);
        assert_eq!(
            calculate_text_color("#3b82f6", TextColorMode::Custom, Some("#ff0000")),
            Hsl { h: 0, s: 100, l: 50 }
        );
        // Custom without a custom color degrades to the default
        assert_eq!(calculate_text_color("#3b82f6", TextColorMode::Custom, None), FALLBACK_HSL);
    }

    #[test]
    fn test_css_variables_are_deterministic() {
        let first = css_variables("#3b82f6", TextColorMode::Auto, None);
        let second = css_variables("#3b82f6", TextColorMode::Auto, None);
        assert_eq!(first, second);

        let names: Vec<&str> = first.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec!["--primary", "--primary-foreground", "--ring", "--accent", "--accent-foreground"]
        );
        assert_eq!(first[0].1, "217 91% 60%");
    }
}

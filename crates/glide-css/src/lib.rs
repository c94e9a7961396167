//! # Glide CSS
//!
//! Style value parsing for the Glide toolkit.
//!
//! ## Design Goals
//!
//! 1. **Color channels**: Convert between `rgb(r, g, b)`, `#RRGGBB` and channel triples
//! 2. **Units**: Strip `px`/`em`/`%` from lengths the way the tween engine expects
//! 3. **Property classes**: Decide once how a property is interpolated and rendered
//!
//! Malformed colors are not rejected: unparsable channels become `NaN` and
//! render as an empty hex pair, so a bad value yields a bad color string
//! instead of an error.

use tracing::warn;

/// A color as three numeric channels.
///
/// Channels are `f64` so that malformed input can carry `NaN` through
/// interpolation instead of failing up front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Rgb = Rgb {
        r: 255.0,
        g: 255.0,
        b: 255.0,
    };

    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// A color whose channels are all `NaN`.
    pub fn invalid() -> Self {
        Self::new(f64::NAN, f64::NAN, f64::NAN)
    }

    pub fn from_channels(channels: [f64; 3]) -> Self {
        Self::new(channels[0], channels[1], channels[2])
    }

    pub fn channels(&self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }

    /// Check that every channel is a finite value in `0..=255`.
    pub fn is_valid(&self) -> bool {
        self.channels()
            .iter()
            .all(|c| c.is_finite() && (0.0..=255.0).contains(c))
    }

    /// Encode as `#RRGGBB` (uppercase).
    pub fn to_hex(&self) -> String {
        rgb_to_hex(*self)
    }

    /// Encode as `rgb(r, g, b)`.
    pub fn to_rgb_string(&self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Parse a leading base-`radix` integer the way browsers' `parseInt` does:
/// optional sign, then as many digits as possible. No digits yields `NaN`.
fn parse_int_prefix(value: &str, radix: u32) -> f64 {
    let value = value.trim();
    let (negative, digits) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };

    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_digit(radix))
        .map(|(i, _)| i)
        .unwrap_or(digits.len());

    match i64::from_str_radix(&digits[..end], radix) {
        Ok(n) if negative => -(n as f64),
        Ok(n) => n as f64,
        Err(_) => f64::NAN,
    }
}

/// Parse an `rgb(r, g, b)` string into channels.
///
/// Missing or non-numeric channels become `NaN`.
pub fn find_rgb(value: &str) -> Rgb {
    let inner = value.trim().replacen("rgb(", "", 1).replacen(')', "", 1);
    let mut parts = inner.split(',').map(|part| parse_int_prefix(part, 10));

    Rgb::new(
        parts.next().unwrap_or(f64::NAN),
        parts.next().unwrap_or(f64::NAN),
        parts.next().unwrap_or(f64::NAN),
    )
}

/// Parse a `#RRGGBB` (or `#RGB`) color into channels.
fn parse_hex(value: &str) -> Rgb {
    let hex = value.trim().trim_start_matches('#');

    let expanded: String;
    let hex = if hex.len() == 3 {
        expanded = hex.chars().flat_map(|c| [c, c]).collect();
        expanded.as_str()
    } else {
        hex
    };

    let pair = |range: std::ops::Range<usize>| {
        hex.get(range)
            .map(|p| parse_int_prefix(p, 16))
            .unwrap_or(f64::NAN)
    };

    Rgb::new(pair(0..2), pair(2..4), pair(4..6))
}

/// Convert a hex color to its `rgb(r, g, b)` form.
pub fn hex_to_rgb(hex: &str) -> String {
    parse_hex(hex).to_rgb_string()
}

/// Convert channels to an uppercase `#RRGGBB` string.
///
/// Channels that are not finite or fall outside `0..=255` encode as an empty pair.
pub fn rgb_to_hex(rgb: Rgb) -> String {
    let mut hex = String::with_capacity(7);
    hex.push('#');
    for channel in rgb.channels() {
        if channel.is_finite() && (0.0..=255.0).contains(&channel) {
            hex.push_str(&format!("{:02X}", channel.trunc() as u8));
        }
    }
    hex
}

/// Parse a color in hex or `rgb(...)` form.
///
/// Anything else yields `NaN` channels.
pub fn parse_color(value: &str) -> Rgb {
    let trimmed = value.trim();
    if trimmed.starts_with('#') {
        parse_hex(trimmed)
    } else if trimmed.starts_with("rgb") {
        find_rgb(trimmed)
    } else {
        warn!(value = trimmed, "unrecognized color value");
        Rgb::invalid()
    }
}

/// A CSS length value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    /// Pixels.
    Px(f64),
    /// Em (relative to font size).
    Em(f64),
    /// Percentage.
    Percent(f64),
    /// Auto.
    Auto,
}

impl Length {
    /// The numeric part, whatever the unit.
    pub fn number(&self) -> Option<f64> {
        match self {
            Length::Px(n) | Length::Em(n) | Length::Percent(n) => Some(*n),
            Length::Auto => None,
        }
    }
}

/// Parse a length value.
pub fn parse_length(value: &str) -> Option<Length> {
    let value = value.trim();

    if value == "auto" {
        return Some(Length::Auto);
    }

    if let Some(num) = value.strip_suffix("px") {
        return num.trim().parse::<f64>().ok().map(Length::Px);
    }
    if let Some(num) = value.strip_suffix("em") {
        return num.trim().parse::<f64>().ok().map(Length::Em);
    }
    if let Some(num) = value.strip_suffix('%') {
        return num.trim().parse::<f64>().ok().map(Length::Percent);
    }

    // Plain number, treated as px
    value.parse::<f64>().ok().map(Length::Px)
}

/// Remove the unit from a length and truncate it to an integer.
pub fn strip_units(value: &str) -> Option<f64> {
    parse_length(value)
        .and_then(|length| length.number())
        .map(f64::trunc)
}

/// Format a number followed by `px`.
pub fn px(value: f64) -> String {
    format!("{}px", value)
}

/// How a property is interpolated and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// A length rendered with a `px` suffix.
    Scalar,
    /// Opacity in `0..=1`, rendered through the opacity setter.
    Opacity,
    /// A color, interpolated per channel and rendered as hex.
    Color,
}

impl PropertyKind {
    /// Classify a property name.
    pub fn of(property: &str) -> Self {
        if property == "opacity" {
            PropertyKind::Opacity
        } else if property.contains("color") {
            PropertyKind::Color
        } else {
            PropertyKind::Scalar
        }
    }
}

/// `left`, `right`, `top` or `bottom`.
pub fn is_box_offset(property: &str) -> bool {
    matches!(property, "left" | "right" | "top" | "bottom")
}

/// Any `background*` property.
pub fn is_background(property: &str) -> bool {
    property.contains("background")
}

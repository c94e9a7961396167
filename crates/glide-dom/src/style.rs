//! Reading and writing style values.

use std::rc::Rc;

use glide_css::{find_rgb, rgb_to_hex, strip_units};

use crate::{Element, OpacitySupport};

/// A normalized style reading.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    /// A length with its unit stripped, or an opacity.
    Number(f64),
    /// Anything else, including colors normalized to `#RRGGBB`.
    Text(String),
    /// No value at all.
    Missing,
}

impl StyleValue {
    /// Numeric reading; text is parsed as a bare number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            StyleValue::Number(n) => Some(*n),
            StyleValue::Text(text) => text.trim().parse().ok(),
            StyleValue::Missing => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            StyleValue::Number(n) => Some(n.to_string()),
            StyleValue::Text(text) => Some(text.clone()),
            StyleValue::Missing => None,
        }
    }
}

/// Reads the effective value of a style property.
pub trait StyleInspector {
    fn read(&self, element: &Element, property: &str) -> StyleValue;
}

/// Reads inline styles first, then cascaded ones, normalizing the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComputedStyleInspector {
    opacity: OpacitySupport,
}

impl ComputedStyleInspector {
    pub fn new(opacity: OpacitySupport) -> Self {
        Self { opacity }
    }

    fn read_filter_opacity(element: &Element) -> StyleValue {
        let Some(filter) = element.resolved_style("filter") else {
            return StyleValue::Number(1.0);
        };
        filter
            .split("opacity=")
            .nth(1)
            .map(|rest| rest.trim_end_matches(')'))
            .and_then(|n| n.trim().parse::<f64>().ok())
            .map(|n| StyleValue::Number(n / 100.0))
            .unwrap_or(StyleValue::Number(1.0))
    }
}

impl StyleInspector for ComputedStyleInspector {
    fn read(&self, element: &Element, property: &str) -> StyleValue {
        if property == "opacity" && self.opacity == OpacitySupport::Filter {
            return Self::read_filter_opacity(element);
        }

        let Some(raw) = element.resolved_style(property) else {
            return StyleValue::Missing;
        };

        if property.contains("color") && raw.contains("rgb") {
            return StyleValue::Text(rgb_to_hex(find_rgb(&raw)));
        }
        if raw.contains("px") || raw.contains("em") || raw.contains('%') {
            if let Some(n) = strip_units(&raw) {
                return StyleValue::Number(n);
            }
        }
        if property == "opacity" {
            if let Ok(n) = raw.trim().parse::<f64>() {
                return StyleValue::Number(n);
            }
        }
        StyleValue::Text(raw)
    }
}

/// Set an element's opacity (0 to 1) through the host's mechanism.
///
/// Hosts without opacity toggle `visibility` on each call instead.
pub fn set_opacity(element: &Rc<Element>, value: f64, support: OpacitySupport) {
    match support {
        OpacitySupport::Standard => element.set_style("opacity", &value.to_string()),
        OpacitySupport::Moz => element.set_style("-moz-opacity", &value.to_string()),
        OpacitySupport::Khtml => element.set_style("-khtml-opacity", &value.to_string()),
        OpacitySupport::Filter => {
            if value == 1.0 {
                element.set_style("filter", "");
            } else {
                element.set_style("filter", &format!("alpha(opacity={})", (value * 100.0).ceil()));
            }
        }
        OpacitySupport::None => {
            let next = if element.style("visibility").as_deref() == Some("hidden") {
                "visible"
            } else {
                "hidden"
            };
            element.set_style("visibility", next);
        }
    }
}

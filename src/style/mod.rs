//! Stylesheet bridge.
//!
//! Configure closures read style rules by `(namespace, name)` from whatever
//! [`StyleSheet`] the context was given. The engine does not parse a styling
//! language; it only consumes resolved values.
//!
//! # Value Kinds
//!
//! - `StyleValue::Color` - an [`Rgba`]
//! - `StyleValue::Font` - family, size and weight
//! - `StyleValue::Number` - any scalar (sizes, opacities, insets)
//! - `StyleValue::Bool` - flags
//! - `StyleValue::Text` - free-form strings
//!
//! Failed lookups are recoverable. The `*_or_warn` accessors log and return
//! `None`, leaving whatever property the caller was about to set untouched.
//!
//! # Example
//!
//! ```
//! use render_tree::style::{StyleRegistry, StyleSheet};
//! use render_tree::types::Rgba;
//!
//! let mut sheet = StyleRegistry::new();
//! sheet.define("Palette", "accent", "#ff0000");
//! sheet.define("Typography", "scale", 1.5);
//!
//! let sheet: &dyn StyleSheet = &sheet;
//! assert_eq!(sheet.color("Palette", "accent"), Ok(Rgba::RED));
//! assert_eq!(sheet.number_or_warn("Typography", "missing"), None);
//! ```

mod registry;

use thiserror::Error;

use crate::types::Rgba;

pub use registry::StyleRegistry;

// =============================================================================
// Values
// =============================================================================

/// Font weight on the usual 100-900 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    Light,
    #[default]
    Regular,
    Medium,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub family: String,
    pub size: f32,
    pub weight: FontWeight,
}

impl Font {
    pub fn new(family: impl Into<String>, size: f32, weight: FontWeight) -> Self {
        Self {
            family: family.into(),
            size,
            weight,
        }
    }
}

/// A resolved style rule.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    Color(Rgba),
    Font(Font),
    Number(f64),
    Bool(bool),
    Text(String),
}

impl StyleValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Color(_) => "color",
            Self::Font(_) => "font",
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
        }
    }

    /// Interpret a raw rule value.
    ///
    /// Hex colors, `true`/`false` and numbers are recognized; anything else
    /// is kept as text.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with('#') {
            if let Some(color) = Rgba::from_hex(raw) {
                return Self::Color(color);
            }
        }
        match raw {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }
        if let Ok(number) = raw.parse::<f64>() {
            return Self::Number(number);
        }
        Self::Text(raw.to_string())
    }
}

impl From<Rgba> for StyleValue {
    fn from(color: Rgba) -> Self {
        Self::Color(color)
    }
}

impl From<Font> for StyleValue {
    fn from(font: Font) -> Self {
        Self::Font(font)
    }
}

impl From<f64> for StyleValue {
    fn from(number: f64) -> Self {
        Self::Number(number)
    }
}

impl From<bool> for StyleValue {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

/// `&str` goes through [`StyleValue::parse`].
impl From<&str> for StyleValue {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

// =============================================================================
// Lookup
// =============================================================================

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StyleError {
    #[error("no style rule {namespace}.{name}")]
    Missing { namespace: String, name: String },

    #[error("style rule {namespace}.{name} is a {found}, expected a {expected}")]
    WrongKind {
        namespace: String,
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Source of resolved style rules.
pub trait StyleSheet {
    fn value(&self, namespace: &str, name: &str) -> Option<StyleValue>;
}

macro_rules! typed_lookup {
    ($get:ident, $or_warn:ident, $variant:ident, $ty:ty, $kind:literal) => {
        pub fn $get(&self, namespace: &str, name: &str) -> Result<$ty, StyleError> {
            match self.lookup(namespace, name)? {
                StyleValue::$variant(value) => Ok(value),
                other => Err(StyleError::WrongKind {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    expected: $kind,
                    found: other.kind(),
                }),
            }
        }

        pub fn $or_warn(&self, namespace: &str, name: &str) -> Option<$ty> {
            self.$get(namespace, name)
                .map_err(|err| log::warn!("{err}"))
                .ok()
        }
    };
}

impl dyn StyleSheet + '_ {
    pub fn lookup(&self, namespace: &str, name: &str) -> Result<StyleValue, StyleError> {
        self.value(namespace, name).ok_or_else(|| StyleError::Missing {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }

    typed_lookup!(color, color_or_warn, Color, Rgba, "color");
    typed_lookup!(font, font_or_warn, Font, Font, "font");
    typed_lookup!(number, number_or_warn, Number, f64, "number");
    typed_lookup!(boolean, boolean_or_warn, Bool, bool, "bool");
    typed_lookup!(text, text_or_warn, Text, String, "text");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> StyleRegistry {
        let mut sheet = StyleRegistry::new();
        sheet.define("Palette", "primary", Rgba::BLUE);
        sheet.define("Palette", "title", "Counter");
        sheet.define("Type", "body", Font::new("Inter", 14.0, FontWeight::Regular));
        sheet.define("Flags", "compact", true);
        sheet
    }

    #[test]
    fn test_parse_values() {
        assert_eq!(StyleValue::parse("#00ff00"), StyleValue::Color(Rgba::GREEN));
        assert_eq!(StyleValue::parse(" 12.5 "), StyleValue::Number(12.5));
        assert_eq!(StyleValue::parse("false"), StyleValue::Bool(false));
        assert_eq!(StyleValue::parse("#nothex"), StyleValue::Text("#nothex".into()));
    }

    #[test]
    fn test_typed_lookups() {
        let registry = sheet();
        let sheet: &dyn StyleSheet = &registry;

        assert_eq!(sheet.color("Palette", "primary"), Ok(Rgba::BLUE));
        assert_eq!(sheet.text("Palette", "title"), Ok("Counter".to_string()));
        assert_eq!(sheet.boolean("Flags", "compact"), Ok(true));
        assert_eq!(sheet.font("Type", "body").map(|font| font.size), Ok(14.0));
    }

    #[test]
    fn test_failed_lookups_are_recoverable() {
        let registry = sheet();
        let sheet: &dyn StyleSheet = &registry;

        assert!(matches!(sheet.color("Palette", "missing"), Err(StyleError::Missing { .. })));
        assert!(matches!(
            sheet.number("Palette", "primary"),
            Err(StyleError::WrongKind { expected: "number", found: "color", .. })
        ));
        assert_eq!(sheet.color_or_warn("Flags", "compact"), None);
    }
}

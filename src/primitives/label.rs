//! Label view.

use crate::engine::Property;
use crate::host::NativeView;
use crate::layout::text_size;
use crate::types::{Rgba, Size};

/// Single- or multi-line text.
///
/// Measured in glyph units: one per narrow character, `line_height` per
/// line, wrapping at the available width.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    text: String,
    color: Rgba,
    line_height: f32,
}

impl Default for Label {
    fn default() -> Self {
        Self {
            text: String::new(),
            color: Rgba::BLACK,
            line_height: 1.0,
        }
    }
}

impl Label {
    pub const TEXT: Property<Label, String> =
        Property::new("text", |l| l.text.clone(), |l, text| l.text = text);

    pub const COLOR: Property<Label, Rgba> =
        Property::new("color", |l| l.color, |l, color| l.color = color);

    pub const LINE_HEIGHT: Property<Label, f32> = Property::new(
        "line_height",
        |l| l.line_height,
        |l, height| l.line_height = height.max(0.0),
    );

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }
}

impl NativeView for Label {
    fn intrinsic_size(&self, available: Size) -> Option<Size> {
        Some(text_size(&self.text, available.width, self.line_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intrinsic_size_wraps() {
        let mut label = Label::default();
        Label::TEXT.set(&mut label, "hello world".to_string());

        assert_eq!(label.intrinsic_size(Size::UNBOUNDED), Some(Size::new(11.0, 1.0)));
        assert_eq!(label.intrinsic_size(Size::new(5.0, f32::INFINITY)), Some(Size::new(5.0, 3.0)));
    }

    #[test]
    fn test_empty_label_measures_zero() {
        assert_eq!(Label::default().intrinsic_size(Size::UNBOUNDED), Some(Size::ZERO));
    }
}

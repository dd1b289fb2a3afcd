//! Container view.

use crate::engine::{Property, Transition};
use crate::host::NativeView;
use crate::layout::LayoutAnimator;
use crate::types::{Frame, Rgba};

/// Generic parent view.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    background: Rgba,
    opacity: f32,
    corner_radius: f32,
    frame: Frame,
    /// Frame changes delivered through the animation hook.
    animated: usize,
    transitions: Vec<&'static str>,
}

impl Default for Container {
    fn default() -> Self {
        Self {
            background: Rgba::TRANSPARENT,
            opacity: 1.0,
            corner_radius: 0.0,
            frame: Frame::ZERO,
            animated: 0,
            transitions: Vec::new(),
        }
    }
}

impl Container {
    pub const BACKGROUND: Property<Container, Rgba> =
        Property::new("background", |c| c.background, |c, color| c.background = color);

    pub const OPACITY: Property<Container, f32> =
        Property::new("opacity", |c| c.opacity, |c, opacity| c.opacity = opacity.clamp(0.0, 1.0));

    pub const CORNER_RADIUS: Property<Container, f32> = Property::new(
        "corner_radius",
        |c| c.corner_radius,
        |c, radius| c.corner_radius = radius.max(0.0),
    );

    pub fn background(&self) -> Rgba {
        self.background
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn corner_radius(&self) -> f32 {
        self.corner_radius
    }

    /// Last frame written by the engine.
    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn animated_frames(&self) -> usize {
        self.animated
    }

    /// Properties that received an animated binding, oldest first.
    pub fn transitions(&self) -> &[&'static str] {
        &self.transitions
    }
}

impl NativeView for Container {
    fn frame_did_change(&mut self, frame: Frame) {
        self.frame = frame;
    }

    fn animate_frame(&mut self, _from: Frame, to: Frame, _animator: &LayoutAnimator) {
        self.animated += 1;
        self.frame = to;
    }

    fn will_transition(&mut self, property: &'static str, _transition: &Transition) {
        self.transitions.push(property);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let container = Container::default();
        assert_eq!(container.background(), Rgba::TRANSPARENT);
        assert_eq!(container.opacity(), 1.0);
        assert_eq!(container.corner_radius(), 0.0);
    }

    #[test]
    fn test_setters_clamp() {
        let mut container = Container::default();
        Container::OPACITY.set(&mut container, 3.0);
        Container::CORNER_RADIUS.set(&mut container, -2.0);
        assert_eq!(container.opacity(), 1.0);
        assert_eq!(container.corner_radius(), 0.0);
    }

    #[test]
    fn test_has_no_intrinsic_size() {
        let container = Container::default();
        assert_eq!(container.intrinsic_size(crate::types::Size::new(10.0, 10.0)), None);
    }
}

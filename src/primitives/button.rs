//! Button view.

use std::fmt;
use std::rc::Rc;

use crate::engine::Property;
use crate::host::NativeView;
use crate::layout::text_size;
use crate::types::Size;

/// Tap callback. Capture a [`WeakHandle`](crate::engine::WeakHandle) rather
/// than a strong handle to avoid a cycle through the view tree.
pub type TapHandler = Rc<dyn Fn()>;

/// Titled button with one tap target.
///
/// The tap target is dropped before every configure pass, so a reused button
/// only fires the handler bound in the latest pass.
pub struct Button {
    title: String,
    enabled: bool,
    on_tap: Option<TapHandler>,
    gesture_flushes: usize,
}

impl Default for Button {
    fn default() -> Self {
        Self {
            title: String::new(),
            enabled: true,
            on_tap: None,
            gesture_flushes: 0,
        }
    }
}

impl fmt::Debug for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Button")
            .field("title", &self.title)
            .field("enabled", &self.enabled)
            .field("has_target", &self.on_tap.is_some())
            .finish()
    }
}

impl Button {
    pub const TITLE: Property<Button, String> =
        Property::new("title", |b| b.title.clone(), |b, title| b.title = title);

    pub const ENABLED: Property<Button, bool> =
        Property::new("enabled", |b| b.enabled, |b, enabled| b.enabled = enabled);

    /// Bind with `set_unchecked`; handlers have no equality.
    pub const ON_TAP: Property<Button, Option<TapHandler>> =
        Property::new("on_tap", |b| b.on_tap.clone(), |b, handler| b.on_tap = handler);

    /// Wrap a closure for [`Button::ON_TAP`].
    pub fn handler(f: impl Fn() + 'static) -> Option<TapHandler> {
        let handler: TapHandler = Rc::new(f);
        Some(handler)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current tap target.
    ///
    /// Handlers usually trigger a render, which needs the view tree; clone
    /// the handler out and release the tree before calling it.
    pub fn target(&self) -> Option<TapHandler> {
        self.on_tap.clone()
    }

    /// Fire the tap target. False if disabled or unbound.
    pub fn tap(&self) -> bool {
        match (&self.on_tap, self.enabled) {
            (Some(handler), true) => {
                handler();
                true
            }
            _ => false,
        }
    }

    pub fn gesture_flushes(&self) -> usize {
        self.gesture_flushes
    }
}

impl NativeView for Button {
    fn reset_targets(&mut self) {
        self.on_tap = None;
    }

    fn prepare_for_reuse(&mut self) {
        self.title.clear();
        self.enabled = true;
        self.on_tap = None;
    }

    fn flush_gestures(&mut self) {
        self.gesture_flushes += 1;
    }

    fn intrinsic_size(&self, available: Size) -> Option<Size> {
        Some(text_size(&self.title, available.width, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_tap_fires_handler() {
        let taps = Rc::new(Cell::new(0));
        let counter = taps.clone();
        let mut button = Button::default();
        Button::ON_TAP.set(&mut button, Button::handler(move || counter.set(counter.get() + 1)));

        assert!(button.tap());
        assert_eq!(taps.get(), 1);
    }

    #[test]
    fn test_disabled_button_ignores_tap() {
        let mut button = Button::default();
        Button::ON_TAP.set(&mut button, Button::handler(|| panic!("disabled")));
        Button::ENABLED.set(&mut button, false);
        assert!(!button.tap());
    }

    #[test]
    fn test_reset_targets_drops_handler() {
        let mut button = Button::default();
        Button::ON_TAP.set(&mut button, Button::handler(|| {}));
        button.reset_targets();
        assert!(button.target().is_none());
        assert!(!button.tap());
    }
}

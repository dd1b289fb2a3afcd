//! Text measurement for headless text views.
//!
//! Widths are in glyph units from the `unicode-width` East Asian Width
//! tables: one unit per narrow character, two per wide (CJK, fullwidth,
//! emoji) character, zero for combining marks and control characters.
//! Wrapping is per character, which is all the headless views need to
//! exercise width-dependent sizing.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::types::Size;

/// Width of one character in glyph units.
pub fn char_width(c: char) -> u16 {
    c.width().map_or(0, |width| width as u16)
}

/// Display width of a single line.
pub fn string_width(s: &str) -> u16 {
    s.width().min(u16::MAX as usize) as u16
}

/// Break `text` into lines no wider than `width`.
///
/// Explicit newlines always break. A character wider than the whole line
/// still gets a line of its own. `width == 0` disables wrapping.
pub fn wrap_text(text: &str, width: u16) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        if width == 0 {
            lines.push(paragraph.to_string());
            continue;
        }

        let mut line = String::new();
        let mut line_width = 0usize;
        for c in paragraph.chars() {
            let w = usize::from(char_width(c));
            if line_width + w > usize::from(width) && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }
            line.push(c);
            line_width += w;
        }
        lines.push(line);
    }

    // A trailing newline does not open an extra line.
    if text.ends_with('\n') {
        lines.pop();
    }
    if text.is_empty() {
        lines.clear();
    }
    lines
}

/// Number of lines `text` occupies when wrapped at `available_width`.
pub fn measure_text_height(text: &str, available_width: u16) -> u16 {
    wrap_text(text, available_width.max(1)).len().min(u16::MAX as usize) as u16
}

/// Size of `text` laid out inside `max_width` (may be infinite).
///
/// Width is the widest wrapped line, height the line count times
/// `line_height`.
pub fn text_size(text: &str, max_width: f32, line_height: f32) -> Size {
    let wrap_at = if max_width.is_finite() {
        max_width.max(1.0).min(u16::MAX as f32) as u16
    } else {
        0
    };
    let lines = wrap_text(text, wrap_at);
    let width = lines.iter().map(|line| string_width(line)).max().unwrap_or(0);
    Size::new(width as f32, lines.len() as f32 * line_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_width() {
        assert_eq!(string_width("hello"), 5);
        assert_eq!(string_width(""), 0);
        assert_eq!(string_width("日本"), 4);
        assert_eq!(string_width("e\u{301}"), 1);
    }

    #[test]
    fn test_char_width() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width('日'), 2);
        assert_eq!(char_width('\u{2705}'), 2);
        assert_eq!(char_width('\u{301}'), 0);
        assert_eq!(char_width('\u{200D}'), 0);
        assert_eq!(char_width('\u{7}'), 0);
    }

    #[test]
    fn test_measure_text_height() {
        assert_eq!(measure_text_height("hello", 10), 1);
        assert_eq!(measure_text_height("hello world", 5), 3);
        assert_eq!(measure_text_height("", 10), 0);
        assert_eq!(measure_text_height("a\nb\nc", 10), 3);
        assert_eq!(measure_text_height("a\n", 10), 1);
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("hello world", 5), vec!["hello", " worl", "d"]);
        assert_eq!(wrap_text("a\nb", 10), vec!["a", "b"]);
        assert_eq!(wrap_text("unbounded line", 0), vec!["unbounded line"]);
    }

    #[test]
    fn test_text_size_depends_on_width() {
        assert_eq!(text_size("hello world", f32::INFINITY, 1.0), Size::new(11.0, 1.0));
        assert_eq!(text_size("hello world", 5.0, 2.0), Size::new(5.0, 6.0));
        assert_eq!(text_size("", 5.0, 1.0), Size::ZERO);
    }

    #[test]
    fn test_very_long_line_does_not_overflow() {
        let text = "a".repeat(70_000);
        let size = text_size(&text, 100_000.0, 1.0);
        assert_eq!(size, Size::new(u16::MAX as f32, 2.0));
        assert_eq!(wrap_text(&text, u16::MAX)[1].len(), 70_000 - u16::MAX as usize);
    }
}

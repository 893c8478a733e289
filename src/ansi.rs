//! ANSI escape sequence builders
//!
//! All builders append to an existing `String` so backends can accumulate a
//! whole frame without intermediate allocations.

use std::fmt::Write;

use crate::color::Color;

/// Basic control codes
pub mod control {
    /// Bell (terminates OSC sequences)
    pub const BEL: &str = "\x07";
    /// String terminator (terminates APC/DCS sequences)
    pub const ST: &str = "\x1B\\";
}

/// CSI (Control Sequence Introducer) sequences
pub mod csi {
    use std::fmt::Write;

    /// Erase entire display
    pub const CLEAR_SCREEN: &str = "\x1B[2J";

    /// Cursor to row 1, column 1
    pub const HOME: &str = "\x1B[H";

    /// Hide Cursor
    pub const HIDE_CURSOR: &str = "\x1B[?25l";

    /// Show Cursor
    pub const SHOW_CURSOR: &str = "\x1B[?25h";

    /// Cursor Position for a 0-based cell; the wire format is 1-based
    pub fn cursor_to(out: &mut String, x: i32, y: i32) {
        let _ = write!(
            out,
            "\x1B[{};{}H",
            i64::from(y) + 1,
            i64::from(x) + 1
        );
    }
}

/// SGR (Select Graphic Rendition)
pub mod sgr {
    /// Reset all attributes
    pub const RESET: &str = "\x1B[0m";
}

/// 24-bit foreground color: `ESC[38;2;R;G;Bm`
pub fn fg_rgb(out: &mut String, color: Color) {
    let _ = write!(out, "\x1B[38;2;{};{};{}m", color.r, color.g, color.b);
}

/// 24-bit background color: `ESC[48;2;R;G;Bm`
pub fn bg_rgb(out: &mut String, color: Color) {
    let _ = write!(out, "\x1B[48;2;{};{};{}m", color.r, color.g, color.b);
}

/// A colored glyph: fg, bg, glyph, reset
///
/// Tiles flagged transparent skip the background code.
pub fn styled_glyph(out: &mut String, glyph: char, fg: Color, bg: Option<Color>) {
    fg_rgb(out, fg);
    if let Some(bg) = bg {
        bg_rgb(out, bg);
    }
    out.push(glyph);
    out.push_str(sgr::RESET);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_is_one_based() {
        let mut out = String::new();
        csi::cursor_to(&mut out, 0, 0);
        assert_eq!(out, "\x1B[1;1H");

        out.clear();
        csi::cursor_to(&mut out, 10, 5);
        assert_eq!(out, "\x1B[6;11H");
    }

    #[test]
    fn test_rgb_codes() {
        let mut out = String::new();
        fg_rgb(&mut out, Color::rgb(1, 2, 3));
        bg_rgb(&mut out, Color::rgb(4, 5, 6));
        assert_eq!(out, "\x1B[38;2;1;2;3m\x1B[48;2;4;5;6m");
    }

    #[test]
    fn test_styled_glyph_without_background() {
        let mut out = String::new();
        styled_glyph(&mut out, 'x', Color::WHITE, None);
        assert_eq!(out, "\x1B[38;2;255;255;255mx\x1B[0m");
    }
}

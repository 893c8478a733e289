//! Braille backend - 2x4 dot patterns ⠁⠂⠄⡀⠈⠐⠠⢀ per cell
//!
//! Glyphs become Braille pattern characters (U+2800..=U+28FF). Dot bit
//! layout inside a cell:
//!
//! ```text
//! 0x01 0x08
//! 0x02 0x10
//! 0x04 0x20
//! 0x40 0x80
//! ```
//!
//! Cells are collected sparsely during the frame and written in row-major
//! order at `end_frame`, with cursor moves and color codes only where they
//! change.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ansi::{self, csi, sgr};
use crate::color::Color;
use crate::errors::Result;
use crate::output::{RenderTarget, Sink};
use crate::types::{Tile, Viewport};

use super::frame::FrameCore;
use super::{Renderer, RendererCapabilities, RendererKind};

/// Blank Braille cell (no dots)
pub const BRAILLE_EMPTY: char = '\u{2800}';

/// Patterns for glyphs common on a dungeon map
fn mapped_pattern(glyph: char) -> Option<u8> {
    let bits = match glyph {
        // player
        '@' => 0x7E,
        // walls and doors
        '#' => 0xFF,
        '+' => 0x5A,
        '\'' => 0x09,
        '/' => 0x4A,
        '|' => 0x47,
        '-' => 0x12,
        '_' => 0xC0,
        // floor
        '.' => 0x04,
        ',' => 0x44,
        ':' => 0x12,
        // stairs
        '<' => 0x2A,
        '>' => 0x15,
        // items
        '$' => 0x3C,
        '!' => 0x0B,
        '?' => 0x19,
        '*' => 0x55,
        '=' => 0x36,
        '%' => 0x96,
        // terrain
        '~' => 0x2D,
        '^' => 0x0A,
        // monsters
        'g' => 0x33,
        'o' => 0x1E,
        'r' => 0x13,
        'k' => 0x3A,
        's' => 0x2E,
        'T' => 0x8F,
        'D' => 0xF7,
        _ => return None,
    };
    Some(bits)
}

/// Braille character used for `glyph`
///
/// Whitespace is blank; unmapped glyphs get a stable pattern derived from
/// their code point, identical across calls and runs.
pub fn braille_for(glyph: char) -> char {
    if glyph.is_whitespace() {
        return BRAILLE_EMPTY;
    }
    let bits = mapped_pattern(glyph)
        .map_or_else(|| (u32::from(glyph).wrapping_mul(17).wrapping_add(31)) % 256, u32::from);
    char::from_u32(0x2800 + bits).unwrap_or(BRAILLE_EMPTY)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BrailleCell {
    ch: char,
    fg: Color,
    bg: Color,
}

/// Sparse Braille renderer
#[derive(Debug)]
pub struct BrailleRenderer {
    core: FrameCore,
    /// Keyed by (row, column) so iteration is row-major
    cells: BTreeMap<(i32, i32), BrailleCell>,
}

impl BrailleRenderer {
    pub fn new(sink: Sink) -> Self {
        Self {
            core: FrameCore::new("braille", sink),
            cells: BTreeMap::new(),
        }
    }

    /// Cells drawn in the current frame
    pub fn buffered_cells(&self) -> usize {
        self.cells.len()
    }

    fn put(&mut self, x: i32, y: i32, cell: BrailleCell) {
        if self.core.visible(x, y) {
            self.cells.insert((y, x), cell);
        }
    }

    fn encode_cells(&mut self) {
        if self.cells.is_empty() {
            return;
        }
        let out = self.core.buffer_mut();
        let mut prev: Option<(i32, i32)> = None;
        let mut last_fg: Option<Color> = None;
        let mut last_bg: Option<Color> = None;

        for (&(row, col), cell) in &self.cells {
            let adjacent = prev.is_some_and(|(r, c)| r == row && c.checked_add(1) == Some(col));
            if !adjacent {
                csi::cursor_to(out, col, row);
            }
            if last_fg != Some(cell.fg) {
                ansi::fg_rgb(out, cell.fg);
                last_fg = Some(cell.fg);
            }
            if last_bg != Some(cell.bg) {
                ansi::bg_rgb(out, cell.bg);
                last_bg = Some(cell.bg);
            }
            out.push(cell.ch);
            prev = Some((row, col));
        }
        out.push_str(sgr::RESET);
        self.cells.clear();
    }
}

impl Renderer for BrailleRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Braille
    }

    fn capabilities(&self) -> RendererCapabilities {
        RendererCapabilities::CHARACTER_BASED | RendererCapabilities::TRUE_COLOR
    }

    fn initialize(&mut self, target: Arc<dyn RenderTarget>) -> Result<()> {
        self.core.initialize(target)
    }

    fn begin_frame(&mut self) -> Result<()> {
        self.core.begin_frame()?;
        self.cells.clear();
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        if self.core.in_frame() {
            self.encode_cells();
        }
        self.core.end_frame()
    }

    fn draw_tile(&mut self, x: i32, y: i32, tile: &Tile) -> Result<()> {
        self.core.ensure_in_frame()?;
        self.put(
            x,
            y,
            BrailleCell {
                ch: braille_for(tile.glyph),
                fg: tile.foreground,
                bg: tile.background,
            },
        );
        Ok(())
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str, fg: Color, bg: Color) -> Result<()> {
        self.core.ensure_in_frame()?;
        for (col, glyph) in (x..).zip(text.chars()) {
            self.put(
                col,
                y,
                BrailleCell {
                    ch: braille_for(glyph),
                    fg,
                    bg,
                },
            );
        }
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        self.core.ensure_in_frame()?;
        let viewport = self.core.viewport();
        let blank = BrailleCell {
            ch: BRAILLE_EMPTY,
            fg: color,
            bg: color,
        };
        for row in viewport.rows() {
            for col in viewport.columns() {
                self.cells.insert((row, col), blank);
            }
        }
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.core.set_viewport(viewport)
    }

    fn dispose(&mut self) -> Result<()> {
        if !self.core.is_disposed() {
            self.cells.clear();
            self.core.flush();
            self.core.mark_disposed();
        }
        Ok(())
    }

    fn pending_output(&self) -> &str {
        self.core.pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{FixedTarget, SharedBuffer};

    fn renderer() -> (BrailleRenderer, SharedBuffer) {
        let out = SharedBuffer::new();
        let mut r = BrailleRenderer::new(out.sink());
        r.initialize(Arc::new(FixedTarget::new(20, 10))).unwrap();
        (r, out)
    }

    #[test]
    fn test_fallback_pattern_is_deterministic() {
        // (90 * 17 + 31) % 256 = 25
        assert_eq!(braille_for('Z'), '\u{2819}');
        assert_eq!(braille_for('Z'), braille_for('Z'));
    }

    #[test]
    fn test_mapped_and_blank_glyphs() {
        assert_eq!(braille_for('#'), '\u{28FF}');
        assert_eq!(braille_for(' '), BRAILLE_EMPTY);
        assert_eq!(braille_for('\t'), BRAILLE_EMPTY);
    }

    #[test]
    fn test_adjacent_cells_share_cursor_and_colors() {
        let (mut r, out) = renderer();
        r.begin_frame().unwrap();
        r.draw_text(2, 1, "##", Color::WHITE, Color::BLACK).unwrap();
        r.end_frame().unwrap();

        assert_eq!(
            out.contents(),
            "\x1B[2;3H\x1B[38;2;255;255;255m\x1B[48;2;0;0;0m\u{28FF}\u{28FF}\x1B[0m"
        );
    }

    #[test]
    fn test_cells_sorted_and_gaps_move_cursor() {
        let (mut r, out) = renderer();
        r.begin_frame().unwrap();
        let tile = Tile::new('.', Color::GRAY, Color::BLACK);
        r.draw_tile(5, 3, &tile).unwrap();
        r.draw_tile(0, 0, &tile).unwrap();
        r.draw_tile(2, 0, &tile).unwrap();
        r.end_frame().unwrap();

        let text = out.contents();
        let first = text.find("\x1B[1;1H").unwrap();
        let second = text.find("\x1B[1;3H").unwrap();
        let third = text.find("\x1B[4;6H").unwrap();
        assert!(first < second && second < third);
        // colors never change, so they are emitted once
        assert_eq!(text.matches("38;2").count(), 1);
        assert!(text.ends_with("\x1B[0m"));
    }

    #[test]
    fn test_color_change_reemits_code() {
        let (mut r, _) = renderer();
        r.begin_frame().unwrap();
        r.draw_tile(0, 0, &Tile::new('@', Color::RED, Color::BLACK))
            .unwrap();
        r.draw_tile(1, 0, &Tile::new('@', Color::GREEN, Color::BLACK))
            .unwrap();
        r.encode_cells();
        let text = r.pending_output();
        assert_eq!(text.matches("38;2").count(), 2);
        assert_eq!(text.matches("48;2").count(), 1);
    }

    #[test]
    fn test_clear_fills_viewport_with_blank() {
        let (mut r, _) = renderer();
        r.set_viewport(Viewport::new(1, 1, 3, 2)).unwrap();
        r.begin_frame().unwrap();
        r.clear(Color::BLUE).unwrap();
        assert_eq!(r.buffered_cells(), 6);
        r.encode_cells();
        assert_eq!(r.pending_output().matches(BRAILLE_EMPTY).count(), 6);
        assert!(!r.pending_output().contains("\x1B[2J"));
    }

    #[test]
    fn test_begin_frame_discards_previous_cells() {
        let (mut r, out) = renderer();
        r.begin_frame().unwrap();
        r.draw_tile(0, 0, &Tile::default()).unwrap();
        r.end_frame().unwrap();
        out.take();

        r.begin_frame().unwrap();
        r.end_frame().unwrap();
        assert!(out.is_empty());
    }
}

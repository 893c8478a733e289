//! ASCII backend - plain glyphs with optional 24-bit ANSI color
//!
//! The fallback that works on every terminal. The Sixel and Kitty backends
//! reuse its character path for tiles and text.

use std::sync::Arc;

use crate::ansi::{self, csi, sgr};
use crate::color::Color;
use crate::errors::Result;
use crate::output::{RenderTarget, Sink};
use crate::types::{Tile, TileFlags, Viewport};

use super::frame::FrameCore;
use super::{Renderer, RendererCapabilities, RendererKind};

/// Append one tile at (x, y): cursor, colors, glyph, reset
pub(crate) fn encode_tile(out: &mut String, x: i32, y: i32, tile: &Tile, color: bool) {
    csi::cursor_to(out, x, y);
    if color {
        let bg = (!tile.flags.contains(TileFlags::TRANSPARENT)).then_some(tile.background);
        ansi::styled_glyph(out, tile.glyph, tile.foreground, bg);
    } else {
        out.push(tile.glyph);
    }
}

/// Append the part of `text` that falls inside `viewport` as one run
pub(crate) fn encode_text(
    out: &mut String,
    viewport: Viewport,
    x: i32,
    y: i32,
    text: &str,
    fg: Color,
    bg: Color,
    color: bool,
) {
    if !viewport.rows().contains(&y) {
        return;
    }
    let columns = viewport.columns();
    let visible: String = text
        .chars()
        .enumerate()
        .filter(|(i, _)| {
            i32::try_from(*i)
                .ok()
                .and_then(|i| x.checked_add(i))
                .is_some_and(|col| columns.contains(&col))
        })
        .map(|(_, ch)| ch)
        .collect();
    if visible.is_empty() {
        return;
    }
    let start = x.max(columns.start);
    csi::cursor_to(out, start, y);
    if color {
        ansi::fg_rgb(out, fg);
        ansi::bg_rgb(out, bg);
        out.push_str(&visible);
        out.push_str(sgr::RESET);
    } else {
        out.push_str(&visible);
    }
}

/// Full-screen clear in `color`
pub(crate) fn encode_clear(out: &mut String, background: Color, color: bool) {
    if color {
        ansi::bg_rgb(out, background);
    }
    out.push_str(csi::CLEAR_SCREEN);
    out.push_str(csi::HOME);
}

/// Glyph-per-cell renderer
#[derive(Debug)]
pub struct AsciiRenderer {
    core: FrameCore,
    color: bool,
}

impl AsciiRenderer {
    pub fn new(sink: Sink) -> Self {
        Self::with_color(sink, true)
    }

    /// `color = false` emits bare glyphs with no SGR sequences
    pub fn with_color(sink: Sink, color: bool) -> Self {
        Self {
            core: FrameCore::new("ascii", sink),
            color,
        }
    }
}

impl Renderer for AsciiRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Ascii
    }

    fn capabilities(&self) -> RendererCapabilities {
        if self.color {
            RendererCapabilities::CHARACTER_BASED | RendererCapabilities::TRUE_COLOR
        } else {
            RendererCapabilities::CHARACTER_BASED
        }
    }

    fn initialize(&mut self, target: Arc<dyn RenderTarget>) -> Result<()> {
        self.core.initialize(target)
    }

    fn begin_frame(&mut self) -> Result<()> {
        self.core.begin_frame()
    }

    fn end_frame(&mut self) -> Result<()> {
        self.core.end_frame()
    }

    fn draw_tile(&mut self, x: i32, y: i32, tile: &Tile) -> Result<()> {
        self.core.ensure_in_frame()?;
        if !self.core.visible(x, y) {
            return Ok(());
        }
        encode_tile(self.core.buffer_mut(), x, y, tile, self.color);
        Ok(())
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str, fg: Color, bg: Color) -> Result<()> {
        self.core.ensure_in_frame()?;
        if text.is_empty() {
            return Ok(());
        }
        let viewport = self.core.viewport();
        encode_text(self.core.buffer_mut(), viewport, x, y, text, fg, bg, self.color);
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        self.core.ensure_in_frame()?;
        encode_clear(self.core.buffer_mut(), color, self.color);
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.core.set_viewport(viewport)
    }

    fn dispose(&mut self) -> Result<()> {
        if !self.core.is_disposed() {
            self.core.flush();
            self.core.mark_disposed();
        }
        Ok(())
    }

    fn pending_output(&self) -> &str {
        self.core.pending()
    }
}

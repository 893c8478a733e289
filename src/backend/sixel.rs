//! Sixel backend
//!
//! Images go through the [`crate::sixel`] encoder; tiles and text take the
//! ASCII character path since Sixel has no notion of reusable sprites.

use std::sync::Arc;

use tracing::debug;

use crate::ansi::csi;
use crate::color::Color;
use crate::errors::Result;
use crate::output::{RenderTarget, Sink};
use crate::sixel;
use crate::types::{Tile, Viewport};

use super::ascii;
use super::frame::FrameCore;
use super::{PixelRenderer, Renderer, RendererCapabilities, RendererKind};

#[derive(Debug)]
pub struct SixelRenderer {
    core: FrameCore,
}

impl SixelRenderer {
    pub fn new(sink: Sink) -> Self {
        Self {
            core: FrameCore::new("sixel", sink),
        }
    }

    fn place(&mut self, x: i32, y: i32, encoded: &str) {
        if !self.core.visible(x, y) {
            return;
        }
        debug!(x, y, bytes = encoded.len(), "sixel image queued");
        let out = self.core.buffer_mut();
        csi::cursor_to(out, x, y);
        out.push_str(encoded);
    }
}

impl Renderer for SixelRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Sixel
    }

    fn capabilities(&self) -> RendererCapabilities {
        RendererCapabilities::TRUE_COLOR
            | RendererCapabilities::PIXEL_GRAPHICS
            | RendererCapabilities::CHARACTER_BASED
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
        if self.core.visible(x, y) {
            ascii::encode_tile(self.core.buffer_mut(), x, y, tile, true);
        }
        Ok(())
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str, fg: Color, bg: Color) -> Result<()> {
        self.core.ensure_in_frame()?;
        if text.is_empty() {
            return Ok(());
        }
        let viewport = self.core.viewport();
        ascii::encode_text(self.core.buffer_mut(), viewport, x, y, text, fg, bg, true);
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        self.core.ensure_in_frame()?;
        ascii::encode_clear(self.core.buffer_mut(), color, true);
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

    fn as_pixel_renderer(&mut self) -> Option<&mut dyn PixelRenderer> {
        Some(self)
    }
}

impl PixelRenderer for SixelRenderer {
    fn draw_rgb(&mut self, x: i32, y: i32, rgb: &[u8], width: u32, height: u32) -> Result<()> {
        self.core.ensure_in_frame()?;
        let encoded = sixel::encode_rgb(rgb, width, height)?;
        self.place(x, y, &encoded);
        Ok(())
    }

    fn draw_colors(
        &mut self,
        x: i32,
        y: i32,
        pixels: &[Color],
        width: u32,
        height: u32,
    ) -> Result<()> {
        self.core.ensure_in_frame()?;
        let encoded = sixel::encode_colors(pixels, width, height)?;
        self.place(x, y, &encoded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{FixedTarget, SharedBuffer};

    fn renderer() -> (SixelRenderer, SharedBuffer) {
        let out = SharedBuffer::new();
        let mut r = SixelRenderer::new(out.sink());
        r.initialize(Arc::new(FixedTarget::new(40, 20))).unwrap();
        (r, out)
    }

    #[test]
    fn test_image_positions_cursor_once() {
        let (mut r, out) = renderer();
        r.begin_frame().unwrap();
        r.draw_rgb(3, 2, &[0, 255, 0, 0, 255, 0], 2, 1).unwrap();
        r.end_frame().unwrap();

        let text = out.contents();
        assert!(text.starts_with("\x1B[3;4H\x1BPq"));
        assert!(text.ends_with("\x1B\\"));
        assert_eq!(text.matches('H').count(), 1);
    }

    #[test]
    fn test_tiles_use_character_path() {
        let (mut r, _) = renderer();
        r.begin_frame().unwrap();
        r.draw_tile(0, 0, &Tile::new('#', Color::WHITE, Color::BLACK))
            .unwrap();
        assert_eq!(
            r.pending_output(),
            "\x1B[1;1H\x1B[38;2;255;255;255m\x1B[48;2;0;0;0m#\x1B[0m"
        );
    }

    #[test]
    fn test_invalid_image_leaves_buffer_untouched() {
        let (mut r, _) = renderer();
        r.begin_frame().unwrap();
        let err = r.draw_colors(0, 0, &[Color::RED], 2, 2).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(r.pending_output().is_empty());
    }

    #[test]
    fn test_reachable_through_trait_object() {
        let (r, out) = renderer();
        let mut boxed: Box<dyn Renderer> = Box::new(r);
        assert!(boxed.as_image_renderer().is_none());
        boxed.begin_frame().unwrap();
        let pixels = boxed.as_pixel_renderer().expect("sixel draws pixels");
        pixels.draw_colors(0, 0, &[Color::BLUE; 6], 1, 6).unwrap();
        boxed.end_frame().unwrap();
        assert!(out.contents().contains("\x1BPq\"1;1;1;6#0;2;0;0;100"));
    }

    #[test]
    fn test_offscreen_image_dropped() {
        let (mut r, _) = renderer();
        r.begin_frame().unwrap();
        r.draw_colors(50, 0, &[Color::RED], 1, 1).unwrap();
        assert!(r.pending_output().is_empty());
    }
}

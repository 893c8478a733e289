//! Kitty graphics protocol backend
//!
//! Transmits raw RGBA once per image id, then places it by id as often as
//! needed. Supported by: Kitty, WezTerm, Ghostty.
//!
//! Protocol: <https://sw.kovidgoyal.net/kitty/graphics-protocol/>

use std::fmt::Write;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::debug;

use crate::ansi::{control, csi};
use crate::color::Color;
use crate::errors::Result;
use crate::output::{RenderTarget, Sink};
use crate::types::{Tile, Viewport};

use super::ascii;
use super::frame::FrameCore;
use super::image_cache::{validate_rgba, CachedImage, ImageCache};
use super::{ImageRenderer, Renderer, RendererCapabilities, RendererKind};

/// Largest base64 payload allowed in a single escape sequence
const CHUNK_SIZE: usize = 4096;

/// Append the transmit-and-store command(s) for one image
///
/// a=T: transmit and display, f=32: RGBA, t=d: direct (inline) data.
fn encode_transmit(out: &mut String, id: u32, width: u32, height: u32, b64: &str) {
    if b64.len() <= CHUNK_SIZE {
        let _ = write!(
            out,
            "\x1B_Ga=T,f=32,t=d,s={width},v={height},i={id};{b64}{}",
            control::ST
        );
        return;
    }

    // base64 is ASCII, so byte offsets are char boundaries
    let mut start = 0;
    while start < b64.len() {
        let end = (start + CHUNK_SIZE).min(b64.len());
        let more = u8::from(end < b64.len());
        let chunk = &b64[start..end];
        if start == 0 {
            let _ = write!(
                out,
                "\x1B_Ga=T,f=32,t=d,s={width},v={height},i={id},m={more};{chunk}{}",
                control::ST
            );
        } else {
            let _ = write!(out, "\x1B_Gm={more};{chunk}{}", control::ST);
        }
        start = end;
    }
}

fn encode_place(out: &mut String, x: i32, y: i32, id: u32) {
    csi::cursor_to(out, x, y);
    let _ = write!(out, "\x1B_Ga=p,i={id}{}", control::ST);
}

fn encode_delete(out: &mut String, id: u32) {
    let _ = write!(out, "\x1B_Ga=d,i={id}{}", control::ST);
}

/// Image-protocol renderer with a terminal-side image cache
#[derive(Debug)]
pub struct KittyRenderer {
    core: FrameCore,
    images: ImageCache,
}

impl KittyRenderer {
    pub fn new(sink: Sink) -> Self {
        Self {
            core: FrameCore::new("kitty", sink),
            images: ImageCache::new(),
        }
    }
}

impl Renderer for KittyRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::ImageProtocol
    }

    fn capabilities(&self) -> RendererCapabilities {
        RendererCapabilities::TRUE_COLOR
            | RendererCapabilities::PIXEL_GRAPHICS
            | RendererCapabilities::SPRITES
            | RendererCapabilities::ANIMATION
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

    /// Tiles whose sprite id is a transmitted image are placed as images
    fn draw_tile(&mut self, x: i32, y: i32, tile: &Tile) -> Result<()> {
        self.core.ensure_in_frame()?;
        if !self.core.visible(x, y) {
            return Ok(());
        }
        match tile.sprite {
            Some(sprite) if self.images.contains(sprite.id) => {
                encode_place(self.core.buffer_mut(), x, y, sprite.id);
            }
            _ => ascii::encode_tile(self.core.buffer_mut(), x, y, tile, true),
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

    /// Delete every cached image on the terminal, then release local state
    fn dispose(&mut self) -> Result<()> {
        if self.core.is_disposed() {
            return Ok(());
        }
        if self.core.target().is_some() {
            let ids = self.images.ids();
            debug!(count = ids.len(), "deleting cached images");
            for id in ids {
                encode_delete(self.core.buffer_mut(), id);
            }
            self.core.flush();
        }
        self.images.clear();
        self.core.mark_disposed();
        Ok(())
    }

    fn pending_output(&self) -> &str {
        self.core.pending()
    }

    fn as_image_renderer(&mut self) -> Option<&mut dyn ImageRenderer> {
        Some(self)
    }
}

impl ImageRenderer for KittyRenderer {
    fn transmit_image(&mut self, id: u32, rgba: &[u8], width: u32, height: u32) -> Result<()> {
        self.core.ensure_initialized()?;
        validate_rgba(rgba, width, height)?;
        if self.images.contains(id) {
            debug!(id, "image already transmitted, skipping");
            return Ok(());
        }

        let payload = BASE64.encode(rgba);
        encode_transmit(self.core.buffer_mut(), id, width, height, &payload);
        debug!(id, width, height, bytes = payload.len(), "image transmitted");
        self.images.insert(
            id,
            CachedImage {
                width,
                height,
                payload,
            },
        );
        self.core.write_through();
        Ok(())
    }

    fn display_image(&mut self, x: i32, y: i32, id: u32) -> Result<()> {
        self.core.ensure_initialized()?;
        self.images.get(id)?;
        if !self.core.visible(x, y) {
            return Ok(());
        }
        encode_place(self.core.buffer_mut(), x, y, id);
        self.core.write_through();
        Ok(())
    }

    fn delete_image(&mut self, id: u32) -> Result<()> {
        self.core.ensure_initialized()?;
        self.images.remove(id);
        encode_delete(self.core.buffer_mut(), id);
        self.core.write_through();
        Ok(())
    }

    fn cached_image_count(&self) -> usize {
        self.images.len()
    }

    fn is_cached(&self, id: u32) -> bool {
        self.images.contains(id)
    }
}

impl Drop for KittyRenderer {
    fn drop(&mut self) {
        let _ = self.dispose();
    }
}

//! iTerm2 inline-image backend
//!
//! Images are PNG-encoded and sent whole inside one OSC 1337 sequence:
//!
//! ```text
//! ESC ] 1337 ; File=size=N;inline=1;width=W;height=H : <base64 png> BEL
//! ```
//!
//! There is no store-only command in this protocol, so "transmitting" only
//! encodes and caches the PNG; every display resends it.

use std::fmt::Write;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{codecs::png::PngEncoder, ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ansi::{control, csi};
use crate::color::Color;
use crate::errors::{RenderError, Result};
use crate::output::{RenderTarget, Sink};
use crate::types::{Tile, Viewport};

use super::ascii;
use super::frame::FrameCore;
use super::image_cache::{validate_rgba, CachedImage, ImageCache};
use super::{ImageRenderer, Renderer, RendererCapabilities, RendererKind};

/// Default cell size in pixels when the terminal does not report one
pub const DEFAULT_CELL_SIZE: (u32, u32) = (8, 16);

/// How image size metadata is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    /// Terminal cells, rounded up
    #[default]
    Cells,
    /// Raw pixels (`Npx`)
    Pixels,
    /// Percentage of the viewport (`N%`)
    Percent,
}

/// Encode RGBA pixels as a PNG file
pub fn encode_png(rgba: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    validate_rgba(rgba, width, height)?;
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(rgba, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))?;
    Ok(png)
}

/// Decoded byte length of a padded base64 string
fn decoded_len(b64: &str) -> usize {
    let padding = b64.bytes().rev().take_while(|&b| b == b'=').count();
    (b64.len() / 4 * 3).saturating_sub(padding)
}

/// Inline-image renderer
#[derive(Debug)]
pub struct InlineImageRenderer {
    core: FrameCore,
    images: ImageCache,
    unit: SizeUnit,
    fallback_cell: (u32, u32),
}

impl InlineImageRenderer {
    pub fn new(sink: Sink) -> Self {
        Self {
            core: FrameCore::new("iterm2", sink),
            images: ImageCache::new(),
            unit: SizeUnit::default(),
            fallback_cell: DEFAULT_CELL_SIZE,
        }
    }

    #[must_use]
    pub fn with_unit(mut self, unit: SizeUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Cell size used when the target does not report pixel dimensions
    #[must_use]
    pub fn with_cell_size(mut self, width: u32, height: u32) -> Self {
        self.fallback_cell = (width.max(1), height.max(1));
        self
    }

    pub fn set_unit(&mut self, unit: SizeUnit) {
        self.unit = unit;
    }

    /// Pixels per cell, from the target when it knows, else the fallback
    pub fn cell_size(&self) -> (u32, u32) {
        let Some(target) = self.core.target() else {
            return self.fallback_cell;
        };
        match (target.pixel_width(), target.pixel_height()) {
            (Some(pw), Some(ph)) if pw > 0 && ph > 0 => (
                (pw / u32::from(target.width())).max(1),
                (ph / u32::from(target.height())).max(1),
            ),
            _ => self.fallback_cell,
        }
    }

    /// Force an explicit pixel footprint, bypassing the unit conversion
    pub fn display_image_pixels(
        &mut self,
        x: i32,
        y: i32,
        id: u32,
        pixel_width: u32,
        pixel_height: u32,
    ) -> Result<()> {
        self.core.ensure_initialized()?;
        if pixel_width == 0 || pixel_height == 0 {
            return Err(RenderError::invalid_argument(format!(
                "pixel size must be positive, got {pixel_width}x{pixel_height}"
            )));
        }
        let size = format!("width={pixel_width}px;height={pixel_height}px;preserveAspectRatio=0");
        self.emit(x, y, id, &size)
    }

    /// Swap the image under `id` for the new payload and show it.
    /// The old entry survives if encoding fails.
    pub fn replace_and_display(
        &mut self,
        x: i32,
        y: i32,
        id: u32,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<()> {
        self.core.ensure_initialized()?;
        let image = Self::encode_entry(rgba, width, height)?;
        self.images.remove(id);
        self.images.insert(id, image);
        self.display_image(x, y, id)
    }

    fn encode_entry(rgba: &[u8], width: u32, height: u32) -> Result<CachedImage> {
        let png = encode_png(rgba, width, height)?;
        debug!(width, height, png_bytes = png.len(), "image encoded");
        Ok(CachedImage {
            width,
            height,
            payload: BASE64.encode(&png),
        })
    }

    /// `width=..;height=..` for an image in the current unit
    fn size_args(&self, image: &CachedImage) -> String {
        let (cell_w, cell_h) = self.cell_size();
        match self.unit {
            SizeUnit::Cells => format!(
                "width={};height={}",
                image.width.div_ceil(cell_w),
                image.height.div_ceil(cell_h)
            ),
            SizeUnit::Pixels => format!("width={}px;height={}px", image.width, image.height),
            SizeUnit::Percent => {
                let viewport = self.core.viewport();
                let span_w = u32::from(viewport.width).saturating_mul(cell_w).max(1);
                let span_h = u32::from(viewport.height).saturating_mul(cell_h).max(1);
                let pct =
                    |px: u32, span: u32| px.saturating_mul(100).div_ceil(span).clamp(1, 100);
                format!(
                    "width={}%;height={}%",
                    pct(image.width, span_w),
                    pct(image.height, span_h)
                )
            }
        }
    }

    fn emit(&mut self, x: i32, y: i32, id: u32, size: &str) -> Result<()> {
        let image = self.images.get(id)?;
        if !self.core.visible(x, y) {
            return Ok(());
        }
        let png_len = decoded_len(&image.payload);
        let mut seq = String::with_capacity(image.payload.len() + 64);
        csi::cursor_to(&mut seq, x, y);
        let _ = write!(
            seq,
            "\x1B]1337;File=size={png_len};inline=1;{size}:{}{}",
            image.payload,
            control::BEL
        );
        self.core.buffer_mut().push_str(&seq);
        self.core.write_through();
        Ok(())
    }
}

impl Renderer for InlineImageRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::InlineImage
    }

    fn capabilities(&self) -> RendererCapabilities {
        RendererCapabilities::TRUE_COLOR
            | RendererCapabilities::PIXEL_GRAPHICS
            | RendererCapabilities::SPRITES
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
        match tile.sprite {
            Some(sprite) if self.images.contains(sprite.id) => self.display_image(x, y, sprite.id),
            _ => {
                ascii::encode_tile(self.core.buffer_mut(), x, y, tile, true);
                Ok(())
            }
        }
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
            self.images.clear();
            self.core.mark_disposed();
        }
        Ok(())
    }

    fn pending_output(&self) -> &str {
        self.core.pending()
    }

    fn as_image_renderer(&mut self) -> Option<&mut dyn ImageRenderer> {
        Some(self)
    }
}

impl ImageRenderer for InlineImageRenderer {
    fn transmit_image(&mut self, id: u32, rgba: &[u8], width: u32, height: u32) -> Result<()> {
        self.core.ensure_initialized()?;
        validate_rgba(rgba, width, height)?;
        if self.images.contains(id) {
            debug!(id, "image already cached, skipping");
            return Ok(());
        }
        let image = Self::encode_entry(rgba, width, height)?;
        self.images.insert(id, image);
        Ok(())
    }

    fn display_image(&mut self, x: i32, y: i32, id: u32) -> Result<()> {
        self.core.ensure_initialized()?;
        let size = self.size_args(self.images.get(id)?);
        self.emit(x, y, id, &size)
    }

    fn delete_image(&mut self, id: u32) -> Result<()> {
        self.core.ensure_initialized()?;
        self.images.remove(id);
        Ok(())
    }

    fn cached_image_count(&self) -> usize {
        self.images.len()
    }

    fn is_cached(&self, id: u32) -> bool {
        self.images.contains(id)
    }
}

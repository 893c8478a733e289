//! # Renderer backends
//!
//! One contract, five wire formats:
//! 1. Kitty graphics protocol (raw RGBA, id-keyed image cache)
//! 2. iTerm2 inline images (PNG, sized in cells/pixels/percent)
//! 3. Sixel bitmaps (palette + 6-row bands)
//! 4. Braille ⠿ patterns (2x4 dots per cell)
//! 5. ASCII + 24-bit ANSI color, works everywhere
//!
//! ## Architecture
//!
//! ```text
//!                 ┌─────────────────────────┐
//!                 │   Renderer (contract)   │
//!                 │  FrameCore: lifecycle,  │
//!                 │  viewport, cmd buffer   │
//!                 └───────────┬─────────────┘
//!                             │
//!     ┌──────────┬────────────┼────────────┬───────────┐
//!     ▼          ▼            ▼            ▼           ▼
//! ┌───────┐ ┌────────┐  ┌──────────┐  ┌─────────┐ ┌─────────┐
//! │ Kitty │ │ iTerm2 │  │  Sixel   │  │ Braille │ │  ASCII  │
//! └───────┘ └────────┘  └──────────┘  └─────────┘ └─────────┘
//! ```

mod ascii;
mod braille;
mod frame;
mod image_cache;
mod iterm2;
mod kitty;
mod sixel;

use std::fmt;
use std::sync::Arc;

pub use ascii::AsciiRenderer;
pub use braille::{braille_for, BrailleRenderer, BRAILLE_EMPTY};
pub use frame::FrameCore;
pub use image_cache::{CachedImage, ImageCache};
pub use iterm2::{InlineImageRenderer, SizeUnit};
pub use kitty::KittyRenderer;
pub use sixel::SixelRenderer;

use crate::color::Color;
use crate::errors::Result;
use crate::output::RenderTarget;
use crate::types::{Tile, Viewport};

/// Which backend a renderer instance is
///
/// Returned alongside the instance by the selector so callers branch on the
/// tag instead of on the concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RendererKind {
    /// Kitty-style graphics protocol
    ImageProtocol,
    /// iTerm2-style inline images
    InlineImage,
    Sixel,
    Braille,
    Ascii,
}

impl RendererKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::ImageProtocol => "kitty",
            Self::InlineImage => "iterm2",
            Self::Sixel => "sixel",
            Self::Braille => "braille",
            Self::Ascii => "ascii",
        }
    }
}

impl fmt::Display for RendererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags::bitflags! {
    /// Features a backend offers, so callers can adapt without knowing the type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RendererCapabilities: u8 {
        const TRUE_COLOR      = 0b0000_0001;
        const PIXEL_GRAPHICS  = 0b0000_0010;
        const SPRITES         = 0b0000_0100;
        const CHARACTER_BASED = 0b0000_1000;
        const MOUSE_INPUT     = 0b0001_0000;
        const ANIMATION       = 0b0010_0000;
        const PARTICLES       = 0b0100_0000;
    }
}

/// Contract every backend implements
///
/// Lifecycle: `initialize` once, then per frame `begin_frame`, draw calls,
/// `end_frame`. Draw calls outside the viewport succeed without output.
pub trait Renderer: Send {
    fn kind(&self) -> RendererKind;

    fn capabilities(&self) -> RendererCapabilities;

    /// Store the target; the viewport defaults to its full size
    fn initialize(&mut self, target: Arc<dyn RenderTarget>) -> Result<()>;

    /// Start a frame, discarding anything still buffered
    fn begin_frame(&mut self) -> Result<()>;

    /// Flush the frame to the sink, then present the target
    fn end_frame(&mut self) -> Result<()>;

    fn draw_tile(&mut self, x: i32, y: i32, tile: &Tile) -> Result<()>;

    fn draw_text(&mut self, x: i32, y: i32, text: &str, fg: Color, bg: Color) -> Result<()>;

    fn clear(&mut self, color: Color) -> Result<()>;

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Release terminal-side state; repeated calls are no-ops
    fn dispose(&mut self) -> Result<()>;

    /// Commands buffered for the current frame
    fn pending_output(&self) -> &str;

    /// Image cache operations, for backends that keep one
    fn as_image_renderer(&mut self) -> Option<&mut dyn ImageRenderer> {
        None
    }

    /// Raw pixel drawing, for backends that encode bitmaps per frame
    fn as_pixel_renderer(&mut self) -> Option<&mut dyn PixelRenderer> {
        None
    }
}

/// Backends that draw bitmaps directly into the frame
pub trait PixelRenderer: Renderer {
    /// Draw packed RGB pixels (width * height * 3 bytes) with the top-left at cell (x, y)
    fn draw_rgb(&mut self, x: i32, y: i32, rgb: &[u8], width: u32, height: u32) -> Result<()>;

    /// Draw a row-major color array with the top-left at cell (x, y)
    fn draw_colors(
        &mut self,
        x: i32,
        y: i32,
        pixels: &[Color],
        width: u32,
        height: u32,
    ) -> Result<()>;
}

/// Backends that keep an id-keyed image cache on the terminal side
pub trait ImageRenderer: Renderer {
    /// Send `rgba` (width * height * 4 bytes) under `id`; no-op when already sent
    fn transmit_image(&mut self, id: u32, rgba: &[u8], width: u32, height: u32) -> Result<()>;

    /// Place a transmitted image with its top-left corner at cell (x, y)
    fn display_image(&mut self, x: i32, y: i32, id: u32) -> Result<()>;

    /// Forget `id`; absent ids are ignored
    fn delete_image(&mut self, id: u32) -> Result<()>;

    fn cached_image_count(&self) -> usize;

    fn is_cached(&self, id: u32) -> bool;
}

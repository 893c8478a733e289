#![allow(clippy::too_many_arguments)]

//! # Tileterm
//!
//! Renders a tile/pixel world inside a text terminal. Detects what the
//! attached terminal supports and emits bit-exact escape sequences for the
//! best protocol available: Kitty graphics, iTerm2 inline images, Sixel,
//! Unicode Braille, or plain ASCII with 24-bit color.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tileterm::{
//!     select, CapabilityDescriptor, Color, RendererOverride, TerminalTarget, Tile,
//! };
//!
//! # fn main() -> tileterm::Result<()> {
//! let caps = CapabilityDescriptor::from_env();
//! let mut selection = select(&caps, RendererOverride::Auto, tileterm::output::stdout_sink());
//! let renderer = selection.renderer.as_mut();
//! renderer.initialize(Arc::new(TerminalTarget::detect()))?;
//! renderer.begin_frame()?;
//! renderer.draw_tile(1, 1, &Tile::new('@', Color::YELLOW, Color::BLACK))?;
//! renderer.end_frame()?;
//! renderer.dispose()?;
//! # Ok(())
//! # }
//! ```

pub mod ansi;
pub mod backend;
pub mod caps;
pub mod color;
pub mod config;
pub mod errors;
pub mod output;
pub mod selector;
pub mod sixel;
pub mod types;

pub use backend::{
    AsciiRenderer, BrailleRenderer, ImageRenderer, InlineImageRenderer, KittyRenderer,
    PixelRenderer, Renderer, RendererCapabilities, RendererKind, SixelRenderer, SizeUnit,
};
pub use caps::{detect, CapabilityDescriptor, EnvironmentSnapshot};
pub use color::Color;
pub use config::{load_config, RendererConfig};
pub use errors::{RenderError, Result};
pub use output::{FixedTarget, RenderTarget, SharedBuffer, TerminalTarget};
pub use selector::{choose_kind, select, select_configured, RendererOverride, Selection};
pub use types::{SpriteRef, Tile, TileFlags, Viewport};

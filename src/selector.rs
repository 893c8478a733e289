//! Backend selection
//!
//! Priority under `Auto`: image protocol, then Sixel, then Braille. Braille
//! is always reported as supported, so ASCII (and the inline-image backend)
//! are only reachable through an explicit override.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::backend::{
    AsciiRenderer, BrailleRenderer, InlineImageRenderer, KittyRenderer, Renderer, RendererKind,
    SixelRenderer,
};
use crate::caps::CapabilityDescriptor;
use crate::config::RendererConfig;
use crate::output::Sink;

/// Caller's choice of backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RendererOverride {
    #[default]
    Auto,
    ImageProtocol,
    Sixel,
    Braille,
    Ascii,
    InlineImage,
}

impl RendererOverride {
    pub const ALL: [Self; 6] = [
        Self::Auto,
        Self::ImageProtocol,
        Self::Sixel,
        Self::Braille,
        Self::Ascii,
        Self::InlineImage,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::ImageProtocol => "kitty",
            Self::Sixel => "sixel",
            Self::Braille => "braille",
            Self::Ascii => "ascii",
            Self::InlineImage => "iterm2",
        }
    }
}

impl fmt::Display for RendererOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parsing never fails: unknown names mean `Auto`
impl FromStr for RendererOverride {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Self::Auto,
            "kitty" => Self::ImageProtocol,
            "sixel" => Self::Sixel,
            "braille" => Self::Braille,
            "ascii" => Self::Ascii,
            "iterm2" => Self::InlineImage,
            other => {
                warn!(renderer = other, "unknown renderer, falling back to auto");
                Self::Auto
            }
        };
        Ok(parsed)
    }
}

impl RendererOverride {
    /// Lenient parse, unknown names become `Auto`
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

/// A renderer together with its kind tag
pub struct Selection {
    pub kind: RendererKind,
    pub renderer: Box<dyn Renderer>,
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Which backend to use; a pure function of its inputs
pub fn choose_kind(caps: &CapabilityDescriptor, choice: RendererOverride) -> RendererKind {
    match choice {
        RendererOverride::ImageProtocol => RendererKind::ImageProtocol,
        RendererOverride::Sixel => RendererKind::Sixel,
        RendererOverride::Braille => RendererKind::Braille,
        RendererOverride::Ascii => RendererKind::Ascii,
        RendererOverride::InlineImage => RendererKind::InlineImage,
        RendererOverride::Auto if caps.image_protocol => RendererKind::ImageProtocol,
        RendererOverride::Auto if caps.sixel => RendererKind::Sixel,
        RendererOverride::Auto if caps.braille => RendererKind::Braille,
        RendererOverride::Auto => RendererKind::Ascii,
    }
}

/// Instantiate the backend for `caps` and `choice` with default settings
pub fn select(caps: &CapabilityDescriptor, choice: RendererOverride, sink: Sink) -> Selection {
    let config = RendererConfig {
        color: caps.true_color || caps.palette_256,
        ..RendererConfig::default()
    };
    select_configured(caps, choice, &config, sink)
}

/// Instantiate the backend, applying color and inline-image settings
pub fn select_configured(
    caps: &CapabilityDescriptor,
    choice: RendererOverride,
    config: &RendererConfig,
    sink: Sink,
) -> Selection {
    let kind = choose_kind(caps, choice);
    debug!(%kind, %choice, terminal = %caps.terminal, "renderer selected");
    let renderer: Box<dyn Renderer> = match kind {
        RendererKind::ImageProtocol => Box::new(KittyRenderer::new(sink)),
        RendererKind::InlineImage => Box::new(
            InlineImageRenderer::new(sink)
                .with_unit(config.inline_unit)
                .with_cell_size(config.cell_width, config.cell_height),
        ),
        RendererKind::Sixel => Box::new(SixelRenderer::new(sink)),
        RendererKind::Braille => Box::new(BrailleRenderer::new(sink)),
        RendererKind::Ascii => Box::new(AsciiRenderer::with_color(sink, config.color)),
    };
    Selection { kind, renderer }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!(RendererOverride::parse_lenient("kitty"), RendererOverride::ImageProtocol);
        assert_eq!(RendererOverride::parse_lenient("SIXEL"), RendererOverride::Sixel);
        assert_eq!(RendererOverride::parse_lenient(" ascii "), RendererOverride::Ascii);
        assert_eq!(RendererOverride::parse_lenient("vt100"), RendererOverride::Auto);
        for choice in RendererOverride::ALL {
            assert_eq!(RendererOverride::parse_lenient(choice.name()), choice);
        }
    }

    #[test]
    fn test_auto_never_reaches_ascii_with_braille() {
        let caps = CapabilityDescriptor::default();
        assert_eq!(choose_kind(&caps, RendererOverride::Auto), RendererKind::Braille);
    }

    #[test]
    fn test_selection_kind_matches_instance() {
        let caps = CapabilityDescriptor {
            sixel: true,
            ..CapabilityDescriptor::default()
        };
        let selection = select(&caps, RendererOverride::Auto, Box::new(std::io::sink()));
        assert_eq!(selection.kind, RendererKind::Sixel);
        assert_eq!(selection.renderer.kind(), RendererKind::Sixel);
    }
}

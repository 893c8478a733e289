//! Value types passed across the renderer contract

use crate::color::Color;

bitflags::bitflags! {
    /// Per-tile rendering hints.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TileFlags: u8 {
        /// Tile belongs to an animation sequence.
        const ANIMATED    = 0b0000_0001;
        /// Background should not be painted.
        const TRANSPARENT = 0b0000_0010;
        /// Short-lived particle effect.
        const PARTICLE    = 0b0000_0100;
    }
}

/// Reference into a sprite set: image id plus animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteRef {
    pub id: u32,
    pub frame: u16,
}

/// A single drawable cell
///
/// Tiles are plain values: backends copy them per draw call and never
/// hold on to them across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub glyph: char,
    pub foreground: Color,
    pub background: Color,
    pub sprite: Option<SpriteRef>,
    pub flags: TileFlags,
}

impl Tile {
    pub const fn new(glyph: char, foreground: Color, background: Color) -> Self {
        Self {
            glyph,
            foreground,
            background,
            sprite: None,
            flags: TileFlags::empty(),
        }
    }

    #[must_use]
    pub const fn with_sprite(mut self, id: u32, frame: u16) -> Self {
        self.sprite = Some(SpriteRef { id, frame });
        self
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: TileFlags) -> Self {
        self.flags = flags;
        self
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::new(' ', Color::WHITE, Color::BLACK)
    }
}

/// Clip rectangle in cell units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub const fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    /// Viewport anchored at the origin
    pub const fn sized(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x
            && y >= self.y
            && i64::from(x) < i64::from(self.x) + i64::from(self.width)
            && i64::from(y) < i64::from(self.y) + i64::from(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Column range `[start, end)` covered by the viewport
    pub fn columns(&self) -> std::ops::Range<i32> {
        self.x..self.x.saturating_add(i32::from(self.width))
    }

    /// Row range `[start, end)` covered by the viewport
    pub fn rows(&self) -> std::ops::Range<i32> {
        self.y..self.y.saturating_add(i32::from(self.height))
    }
}

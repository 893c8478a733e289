//! Color type with alpha support

use std::fmt;

/// RGBA color with 8-bit components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    pub const YELLOW: Self = Self::rgb(255, 255, 0);
    pub const CYAN: Self = Self::rgb(0, 255, 255);
    pub const MAGENTA: Self = Self::rgb(255, 0, 255);
    pub const GRAY: Self = Self::rgb(128, 128, 128);

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create from hex color (e.g., 0xFF0000 for red)
    #[inline]
    pub const fn from_hex(hex: u32) -> Self {
        Self::rgb(
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
        )
    }

    /// Same color with the alpha channel dropped
    #[inline]
    pub const fn opaque(self) -> Self {
        Self::rgb(self.r, self.g, self.b)
    }

    #[inline]
    pub const fn to_rgb8(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    /// Squared Euclidean RGB distance (alpha ignored)
    #[inline]
    pub fn distance_sq(self, other: Self) -> u32 {
        let dr = i32::from(self.r) - i32::from(other.r);
        let dg = i32::from(self.g) - i32::from(other.g);
        let db = i32::from(self.b) - i32::from(other.b);
        (dr * dr + dg * dg + db * db) as u32
    }

    /// Linear interpolation between two colors, `t` in 0..=255
    pub fn lerp(self, other: Self, t: u8) -> Self {
        let mix = |a: u8, b: u8| -> u8 {
            let a = u32::from(a);
            let b = u32::from(b);
            let t = u32::from(t);
            ((a * (255 - t) + b * t) / 255) as u8
        };
        Self::rgba(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        let red = Color::from_hex(0xFF0000);
        assert_eq!(red, Color::RED);
        assert_eq!(Color::from_hex(0x102030).to_rgb8(), (0x10, 0x20, 0x30));
    }

    #[test]
    fn test_distance_ignores_alpha() {
        let a = Color::rgba(10, 20, 30, 0);
        let b = Color::rgb(13, 24, 30);
        assert_eq!(a.distance_sq(b), 9 + 16);
        assert_eq!(Color::BLACK.distance_sq(Color::WHITE), 3 * 255 * 255);
    }

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(Color::BLACK.lerp(Color::WHITE, 0), Color::BLACK);
        assert_eq!(Color::BLACK.lerp(Color::WHITE, 255), Color::WHITE);
    }

    #[test]
    fn test_display() {
        assert_eq!(Color::from_hex(0xABCDEF).to_string(), "#abcdef");
    }
}

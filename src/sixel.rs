//! Sixel encoder
//!
//! Protocol: DEC Sixel, as implemented by xterm, mlterm, foot and WezTerm.
//!
//! ```text
//! ESC P q  "1;1;W;H  #0;2;r;g;b ...  #0 <band data> $ #1 <band data> $- ...  ESC \
//! ```
//!
//! Each data character covers one column of a 6-row band: bit `d` is row
//! `band_start + d`, and the character is `value + 63`.

use std::collections::HashMap;
use std::fmt::Write;

use crate::ansi::control;
use crate::color::Color;
use crate::errors::{RenderError, Result};

/// Sixel can address at most 256 color registers
pub const MAX_PALETTE: usize = 256;

/// Rows per sixel band
const BAND_HEIGHT: usize = 6;

/// Runs longer than this are written as `!{count}{char}`
const RLE_THRESHOLD: usize = 3;

/// Quantization palette for a single encode call
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<Color>,
    /// Source color -> register, filled lazily for colors outside the palette
    lookup: HashMap<Color, u8>,
}

impl Palette {
    /// Most frequent colors first, ties in order of first appearance
    pub fn build(pixels: &[Color]) -> Self {
        let mut counts: HashMap<Color, (usize, usize)> = HashMap::new();
        for (position, pixel) in pixels.iter().enumerate() {
            counts
                .entry(pixel.opaque())
                .and_modify(|(count, _)| *count += 1)
                .or_insert((1, position));
        }

        let mut ranked: Vec<(Color, usize, usize)> = counts
            .into_iter()
            .map(|(color, (count, first))| (color, count, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        ranked.truncate(MAX_PALETTE);

        let colors: Vec<Color> = ranked.into_iter().map(|(color, _, _)| color).collect();
        let lookup = colors
            .iter()
            .enumerate()
            .filter_map(|(i, c)| u8::try_from(i).ok().map(|i| (*c, i)))
            .collect();
        Self { colors, lookup }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Register for `color`: exact match, else nearest by squared RGB distance
    pub fn index_of(&mut self, color: Color) -> u8 {
        let color = color.opaque();
        if let Some(&index) = self.lookup.get(&color) {
            return index;
        }
        let nearest = self
            .colors
            .iter()
            .enumerate()
            .min_by_key(|(i, c)| (c.distance_sq(color), *i))
            .and_then(|(i, _)| u8::try_from(i).ok())
            .unwrap_or(0);
        self.lookup.insert(color, nearest);
        nearest
    }
}

/// Rescale an 8-bit channel to Sixel's 0..=100 range
#[inline]
fn percent(channel: u8) -> u32 {
    (u32::from(channel) * 100 + 127) / 255
}

fn checked_area(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(RenderError::invalid_argument(format!(
            "image dimensions must be positive, got {width}x{height}"
        )));
    }
    usize::try_from(u64::from(width) * u64::from(height))
        .map_err(|_| RenderError::invalid_argument("image too large"))
}

/// Encode packed RGB bytes (`width * height * 3`)
pub fn encode_rgb(rgb: &[u8], width: u32, height: u32) -> Result<String> {
    if rgb.is_empty() {
        return Err(RenderError::invalid_argument("empty RGB payload"));
    }
    let area = checked_area(width, height)?;
    if Some(rgb.len()) != area.checked_mul(3) {
        return Err(RenderError::invalid_argument(format!(
            "RGB payload is {} bytes, expected {} for {width}x{height}",
            rgb.len(),
            area.saturating_mul(3)
        )));
    }
    let pixels: Vec<Color> = rgb
        .chunks_exact(3)
        .map(|px| Color::rgb(px[0], px[1], px[2]))
        .collect();
    Ok(encode_pixels(&pixels, width as usize, height as usize))
}

/// Encode a row-major color array (`width * height`)
pub fn encode_colors(pixels: &[Color], width: u32, height: u32) -> Result<String> {
    if pixels.is_empty() {
        return Err(RenderError::invalid_argument("empty pixel array"));
    }
    let area = checked_area(width, height)?;
    if pixels.len() != area {
        return Err(RenderError::invalid_argument(format!(
            "pixel array has {} entries, expected {area} for {width}x{height}",
            pixels.len()
        )));
    }
    Ok(encode_pixels(pixels, width as usize, height as usize))
}

fn encode_pixels(pixels: &[Color], width: usize, height: usize) -> String {
    let mut palette = Palette::build(pixels);
    let indices: Vec<u8> = pixels.iter().map(|&c| palette.index_of(c)).collect();

    let mut out = String::with_capacity(64 + palette.len() * 20 + width * height / 2);
    out.push_str("\x1BPq");
    let _ = write!(out, "\"1;1;{width};{height}");
    for (i, color) in palette.colors().iter().enumerate() {
        let _ = write!(
            out,
            "#{i};2;{};{};{}",
            percent(color.r),
            percent(color.g),
            percent(color.b)
        );
    }

    let bands = height.div_ceil(BAND_HEIGHT);
    let mut present = vec![false; palette.len()];
    for band in 0..bands {
        if band > 0 {
            out.push_str("$-");
        }
        let top = band * BAND_HEIGHT;
        let rows = BAND_HEIGHT.min(height - top);
        let band_pixels = &indices[top * width..(top + rows) * width];

        present.fill(false);
        for &index in band_pixels {
            present[usize::from(index)] = true;
        }

        let mut first = true;
        for (register, _) in present.iter().enumerate().filter(|(_, used)| **used) {
            if !first {
                out.push('$');
            }
            first = false;
            let _ = write!(out, "#{register}");
            encode_band_color(&mut out, band_pixels, width, rows, register);
        }
    }

    out.push_str(control::ST);
    out
}

/// One color's run-length encoded columns within a band
fn encode_band_color(out: &mut String, band: &[u8], width: usize, rows: usize, register: usize) {
    let mut run: Option<(u8, usize)> = None;
    for col in 0..width {
        let mut value = 0u8;
        for d in 0..rows {
            if usize::from(band[d * width + col]) == register {
                value |= 1 << d;
            }
        }
        run = match run {
            Some((current, count)) if current == value => Some((current, count + 1)),
            Some((current, count)) => {
                push_run(out, current, count);
                Some((value, 1))
            }
            None => Some((value, 1)),
        };
    }
    // a trailing empty run draws nothing; the `$`/`-` that follows resets the column
    if let Some((value, count)) = run {
        if value != 0 {
            push_run(out, value, count);
        }
    }
}

fn push_run(out: &mut String, value: u8, count: usize) {
    let ch = char::from(value + 63);
    if count > RLE_THRESHOLD {
        let _ = write!(out, "!{count}{ch}");
    } else {
        for _ in 0..count {
            out.push(ch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(color: Color, width: u32, height: u32) -> Vec<Color> {
        vec![color; (width * height) as usize]
    }

    /// `#i;2;r;g;b` segments; data segments (`#i...`) carry no `;`
    fn palette_entries(seq: &str) -> usize {
        seq.split('#').filter(|s| s.split(';').count() == 5).count()
    }

    #[test]
    fn test_framing() {
        let seq = encode_colors(&solid(Color::RED, 4, 4), 4, 4).unwrap();
        assert!(seq.starts_with("\x1BPq"));
        assert!(seq.ends_with("\x1B\\"));
    }

    #[test]
    fn test_single_red_pixel() {
        let seq = encode_rgb(&[255, 0, 0], 1, 1).unwrap();
        assert_eq!(seq, "\x1BPq\"1;1;1;1#0;2;100;0;0#0@\x1B\\");
    }

    #[test]
    fn test_run_length_threshold() {
        // 4 columns, all bits set in a 6-row band -> one run of '~'
        let seq = encode_colors(&solid(Color::WHITE, 4, 6), 4, 6).unwrap();
        assert!(seq.contains("#0!4~"));

        let seq = encode_colors(&solid(Color::WHITE, 3, 6), 3, 6).unwrap();
        assert!(seq.contains("#0~~~"));
        assert!(!seq.contains('!'));
    }

    #[test]
    fn test_band_separators() {
        for height in 1..=19u32 {
            let seq = encode_colors(&solid(Color::BLUE, 2, height), 2, height).unwrap();
            let expected = (height as usize).div_ceil(6) - 1;
            assert_eq!(seq.matches("$-").count(), expected, "height {height}");
        }
    }

    #[test]
    fn test_bit_order_within_band() {
        // column 0: red on row 0, black on rows 1..6
        let mut pixels = solid(Color::BLACK, 1, 6);
        pixels[0] = Color::RED;
        pixels[5] = Color::RED;
        let seq = encode_colors(&pixels, 1, 6).unwrap();
        // black is more frequent -> register 0, red -> register 1
        // black bits 1..=4 -> 0b011110 = 30 -> '\u{5d}' (93 = ']')
        // red bits 0 and 5 -> 0b100001 = 33 -> '`' (96)
        assert!(seq.contains("#0]$#1`"));
    }

    #[test]
    fn test_palette_size_matches_distinct_colors() {
        let pixels: Vec<Color> = (0..40u8).map(|i| Color::rgb(i, 0, 0)).collect();
        let seq = encode_colors(&pixels, 8, 5).unwrap();
        assert_eq!(palette_entries(&seq), 40);
    }

    #[test]
    fn test_palette_capped_at_256() {
        let pixels: Vec<Color> = (0..300u32)
            .map(|i| Color::rgb((i % 256) as u8, (i / 256) as u8, 7))
            .collect();
        let mut palette = Palette::build(&pixels);
        assert_eq!(palette.len(), MAX_PALETTE);
        // colors dropped from the palette resolve to some existing register
        let index = palette.index_of(Color::rgb(44, 1, 7));
        assert!(usize::from(index) < MAX_PALETTE);
        let seq = encode_colors(&pixels, 30, 10).unwrap();
        assert_eq!(palette_entries(&seq), 256);
    }

    #[test]
    fn test_nearest_color_is_memoized() {
        let pixels = vec![Color::BLACK, Color::BLACK, Color::WHITE];
        let mut palette = Palette::build(&pixels);
        assert_eq!(palette.colors(), &[Color::BLACK, Color::WHITE]);
        assert_eq!(palette.index_of(Color::rgb(10, 10, 10)), 0);
        assert_eq!(palette.index_of(Color::rgb(250, 240, 250)), 1);
        assert_eq!(palette.lookup.len(), 4);
    }

    #[test]
    fn test_percent_scaling() {
        assert_eq!(percent(0), 0);
        assert_eq!(percent(255), 100);
        assert_eq!(percent(128), 50);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(encode_rgb(&[], 1, 1).unwrap_err().is_invalid_argument());
        assert!(encode_rgb(&[0, 0], 1, 1).unwrap_err().is_invalid_argument());
        assert!(encode_rgb(&[0, 0, 0], 0, 1).unwrap_err().is_invalid_argument());
        assert!(encode_colors(&[], 1, 1).unwrap_err().is_invalid_argument());
        assert!(encode_colors(&[Color::RED; 3], 2, 2)
            .unwrap_err()
            .is_invalid_argument());
    }
}

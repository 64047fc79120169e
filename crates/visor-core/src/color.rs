//! Line colours: the fixed palette, a shrinking random allocator, and the
//! complementary colour used for instrument-simulated curves.

use palette::{FromColor, Hsl, Srgb};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// An opaque 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Palette lab curves are drawn from.
pub const LINE_PALETTE: [LineColor; 10] = [
    LineColor::rgb(0xFF, 0x35, 0x00),
    LineColor::rgb(0xFF, 0x89, 0x00),
    LineColor::rgb(0x0C, 0xB0, 0xFF),
    LineColor::rgb(0x00, 0xE1, 0x02),
    LineColor::rgb(0xFF, 0x00, 0xFF),
    LineColor::rgb(0x1D, 0xCE, 0xA8),
    LineColor::rgb(0x78, 0x47, 0xE7),
    LineColor::rgb(0xFF, 0xB6, 0x00),
    LineColor::rgb(0xA5, 0x42, 0x62),
    LineColor::rgb(0x4D, 0xF8, 0xCE),
];

impl LineColor {
    /// Handed out once the palette runs dry.
    pub const FALLBACK: LineColor = LineColor::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Perceived brightness on a 0–255 scale.
    pub fn brightness(&self) -> f64 {
        (self.r as f64 * 299.0 + self.g as f64 * 587.0 + self.b as f64 * 114.0) / 1000.0
    }

    pub fn is_dark(&self) -> bool {
        self.brightness() < 128.0
    }

    /// Colour for the paired instrument curve: dark bases are lightened by
    /// 25 points of HSL lightness, then the hue is rotated half a turn.
    pub fn complementary(&self) -> Self {
        let rgb = Srgb::new(
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        );
        let mut hsl: Hsl = Hsl::from_color(rgb);
        if self.is_dark() {
            hsl.lightness = (hsl.lightness + 0.25).min(1.0);
        }
        hsl.hue = hsl.hue + 180.0;
        let back: Srgb = Srgb::from_color(hsl);
        let out: Srgb<u8> = back.into_format();
        Self::rgb(out.red, out.green, out.blue)
    }
}

impl std::fmt::Display for LineColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Random draw without replacement from its own copy of [`LINE_PALETTE`].
#[derive(Debug, Clone)]
pub struct ColorAllocator {
    available: Vec<LineColor>,
    rng: StdRng,
}

impl ColorAllocator {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic allocator, mostly for tests.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            available: LINE_PALETTE.to_vec(),
            rng,
        }
    }

    /// Take a random palette colour, or [`LineColor::FALLBACK`] once none
    /// are left.
    pub fn allocate(&mut self) -> LineColor {
        if self.available.is_empty() {
            log::debug!("line palette exhausted, using fallback colour");
            return LineColor::FALLBACK;
        }
        let spin = self.rng.gen_range(0..self.available.len());
        self.available.remove(spin)
    }

    /// Return a palette colour to the pool. Colours that did not come from
    /// the palette are ignored.
    pub fn release(&mut self, color: LineColor) {
        if LINE_PALETTE.contains(&color) && !self.available.contains(&color) {
            self.available.push(color);
        }
    }

    pub fn remaining(&self) -> usize {
        self.available.len()
    }
}

impl Default for ColorAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: LineColor, b: LineColor) -> bool {
        (a.r as i16 - b.r as i16).abs() <= 1
            && (a.g as i16 - b.g as i16).abs() <= 1
            && (a.b as i16 - b.b as i16).abs() <= 1
    }

    #[test]
    fn test_hex_roundtrip() {
        let c = LineColor::from_hex("#0CB0FF").unwrap();
        assert_eq!(c, LineColor::rgb(0x0C, 0xB0, 0xFF));
        assert_eq!(c.to_hex(), "#0cb0ff");
        assert!(LineColor::from_hex("#12345").is_none());
        assert!(LineColor::from_hex("zzzzzz").is_none());
    }

    #[test]
    fn test_dark_base_is_lightened_then_spun() {
        let red = LineColor::rgb(255, 0, 0);
        assert!(red.is_dark());
        let comp = red.complementary();
        assert!(close(comp, LineColor::rgb(128, 255, 255)), "{:?}", comp);

        let black = LineColor::FALLBACK;
        assert!(close(black.complementary(), LineColor::rgb(64, 64, 64)));
    }

    #[test]
    fn test_light_base_is_only_spun() {
        let yellow = LineColor::rgb(255, 255, 0);
        assert!(!yellow.is_dark());
        assert!(close(yellow.complementary(), LineColor::rgb(0, 0, 255)));
    }

    #[test]
    fn test_allocator_exhausts_to_fallback() {
        let mut alloc = ColorAllocator::seeded(7);
        let mut seen = Vec::new();
        for _ in 0..LINE_PALETTE.len() {
            let c = alloc.allocate();
            assert!(LINE_PALETTE.contains(&c));
            assert!(!seen.contains(&c), "colour handed out twice");
            seen.push(c);
        }
        assert_eq!(alloc.remaining(), 0);
        assert_eq!(alloc.allocate(), LineColor::FALLBACK);
    }

    #[test]
    fn test_release_returns_colour() {
        let mut alloc = ColorAllocator::seeded(1);
        let c = alloc.allocate();
        assert_eq!(alloc.remaining(), 9);
        alloc.release(c);
        alloc.release(c);
        alloc.release(LineColor::FALLBACK);
        assert_eq!(alloc.remaining(), 10);
    }
}

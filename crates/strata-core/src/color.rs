use serde::{Deserialize, Serialize};

/// An RGB color, used for fills and tints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
    };
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// From a packed `0xRRGGBB` value. Bits above 24 are ignored.
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: (hex >> 16 & 0xFF) as u8,
            g: (hex >> 8 & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }

    pub fn to_hex(&self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// `#rrggbb`.
    pub fn to_hex_string(&self) -> String {
        format!("#{:06x}", self.to_hex())
    }

    /// Normalized `[r, g, b]`, the form tint and color uniforms take.
    pub fn to_rgb(&self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }

    /// From normalized channels; values are clamped to `[0, 1]`.
    pub fn from_rgb(rgb: [f32; 3]) -> Self {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self {
            r: channel(rgb[0]),
            g: channel(rgb[1]),
            b: channel(rgb[2]),
        }
    }

    pub fn to_f32_array(&self, opacity: f32) -> [f32; 4] {
        let [r, g, b] = self.to_rgb();
        [r, g, b, opacity]
    }
}

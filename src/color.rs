//! Pixel colors and screen tones
//!
//! `Color` is the 8-bit RGBA pixel stored in every bitmap. `Tone` is a signed
//! per-channel shift applied to a whole layer when it is composited.

use serde::Deserialize;

/// 8-bit RGBA color, laid out exactly like one bitmap pixel
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, bytemuck::Pod, bytemuck::Zeroable, Deserialize,
)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    pub const fn black() -> Self {
        Color { r: 0, g: 0, b: 0, a: 255 }
    }

    pub const fn transparent() -> Self {
        Color { r: 0, g: 0, b: 0, a: 0 }
    }

    /// Same color with a different alpha
    pub const fn with_alpha(self, a: u8) -> Self {
        Color { a, ..self }
    }

    /// Pack into 0x00RRGGBB (minifb framebuffer format), dropping alpha
    #[inline]
    pub fn to_rgb_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

/// Signed color shift plus gray level, as produced by the day/night service
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Tone {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    #[serde(default)]
    pub gray: f32,
}

impl Tone {
    pub const fn new(red: f32, green: f32, blue: f32, gray: f32) -> Self {
        Tone { red, green, blue, gray }
    }

    /// Positive channel parts only, gray dropped
    pub fn brightening(&self) -> Tone {
        Tone::new(self.red.max(0.0), self.green.max(0.0), self.blue.max(0.0), 0.0)
    }

    /// Magnitudes of the negative channel parts, gray dropped
    pub fn darkening(&self) -> Tone {
        Tone::new(
            -self.red.min(0.0),
            -self.green.min(0.0),
            -self.blue.min(0.0),
            0.0,
        )
    }

    /// Shift an 8-bit channel triple by this tone, saturating at 0 and 255
    #[inline]
    pub fn apply(&self, r: u8, g: u8, b: u8) -> (u8, u8, u8) {
        (
            shift_channel(r, self.red),
            shift_channel(g, self.green),
            shift_channel(b, self.blue),
        )
    }
}

#[inline]
fn shift_channel(value: u8, shift: f32) -> u8 {
    (value as f32 + shift).clamp(0.0, 255.0) as u8
}

//! Owned RGBA pixel surfaces
//!
//! Every surface the lighting engine draws into is a `Bitmap`. Fills replace
//! pixels outright (no blending), so a later layer drawn over an earlier one
//! overwrites its alpha. Blending only happens when layers are composited.

use crate::color::Color;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Integer rectangle in bitmap pixel space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// Row-major RGBA8 surface: index = y * width + x
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl Bitmap {
    /// Create a fully transparent bitmap
    pub fn new(width: usize, height: usize) -> Self {
        Bitmap {
            width,
            height,
            pixels: vec![Color::transparent(); width * height],
        }
    }

    /// Wrap an existing pixel vector. Returns `None` if the length does not match.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Color>) -> Option<Self> {
        (pixels.len() == width * height).then_some(Bitmap { width, height, pixels })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Color] {
        &mut self.pixels
    }

    /// Raw RGBA bytes, 4 per pixel
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn clear(&mut self) {
        self.fill(Color::transparent());
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Replace every pixel of `rect` (clipped to the bitmap) with `color`.
    /// Empty or negative rectangles draw nothing.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return;
        };
        for y in y0..y1 {
            let row = y * self.width;
            self.pixels[row + x0..row + x1].fill(color);
        }
    }

    /// Nearest-neighbour copy of `src_rect` from `src` into `dest` on this bitmap.
    /// Source pixels replace destination pixels.
    pub fn stretch_blt(&mut self, dest: Rect, src: &Bitmap, src_rect: Rect) {
        if dest.is_empty() || src_rect.is_empty() {
            return;
        }
        let Some((x0, y0, x1, y1)) = self.clip(dest) else {
            return;
        };
        for y in y0..y1 {
            let v = (y as i64 - dest.y as i64) * src_rect.height as i64 / dest.height as i64;
            let sy = src_rect.y + v as i32;
            for x in x0..x1 {
                let u = (x as i64 - dest.x as i64) * src_rect.width as i64 / dest.width as i64;
                let sx = src_rect.x + u as i32;
                if let Some(color) = src.get_pixel(sx, sy) {
                    self.pixels[y * self.width + x] = color;
                }
            }
        }
    }

    /// Save as a binary PAM (RGB_ALPHA) image for debugging
    pub fn save_pam(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "P7")?;
        writeln!(out, "WIDTH {}", self.width)?;
        writeln!(out, "HEIGHT {}", self.height)?;
        writeln!(out, "DEPTH 4")?;
        writeln!(out, "MAXVAL 255")?;
        writeln!(out, "TUPLTYPE RGB_ALPHA")?;
        writeln!(out, "ENDHDR")?;
        out.write_all(self.as_bytes())?;
        out.flush()
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    /// Clip a rectangle to the bitmap, returning half-open pixel bounds
    fn clip(&self, rect: Rect) -> Option<(usize, usize, usize, usize)> {
        if rect.is_empty() {
            return None;
        }
        let x0 = (rect.x as i64).max(0);
        let y0 = (rect.y as i64).max(0);
        let x1 = (rect.x as i64 + rect.width as i64).min(self.width as i64);
        let y1 = (rect.y as i64 + rect.height as i64).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }
}

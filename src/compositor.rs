//! Software compositing of a display list into a 0x00RRGGBB framebuffer.
//!
//! This is the host side of the contract: the engine only produces bitmaps
//! and layers, the compositor applies tone, opacity, zoom and blend mode.

use crate::color::Color;
use crate::layer::{BlendMode, DisplayItem, DisplayList};

pub struct Compositor {
    width: usize,
    height: usize,
    buffer: Vec<u32>,
}

impl Compositor {
    pub fn new(width: usize, height: usize) -> Self {
        Compositor { width, height, buffer: vec![0; width * height] }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn buffer(&self) -> &[u32] {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut [u32] {
        &mut self.buffer
    }

    pub fn pixel(&self, x: usize, y: usize) -> Color {
        let v = self.buffer[y * self.width + x];
        Color::rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }

    pub fn fill(&mut self, color: Color) {
        self.buffer.fill(color.to_rgb_u32());
    }

    /// Draw every visible item in list order
    pub fn draw(&mut self, list: &DisplayList<'_>) {
        for item in list.items() {
            if item.layer.visible && item.layer.opacity > 0 {
                self.draw_item(item);
            }
        }
    }

    fn draw_item(&mut self, item: &DisplayItem<'_>) {
        let (bitmap, layer) = (item.bitmap, item.layer);
        let (bw, bh) = (bitmap.width() as f32, bitmap.height() as f32);
        if bw == 0.0 || bh == 0.0 || layer.zoom_x <= 0.0 || layer.zoom_y <= 0.0 {
            return;
        }

        // Screen-space bounds of the zoomed bitmap
        let left = layer.x as f32 - layer.ox as f32 * layer.zoom_x;
        let top = layer.y as f32 - layer.oy as f32 * layer.zoom_y;
        let x0 = left.floor().max(0.0) as usize;
        let y0 = top.floor().max(0.0) as usize;
        let x1 = ((left + bw * layer.zoom_x).ceil().max(0.0) as usize).min(self.width);
        let y1 = ((top + bh * layer.zoom_y).ceil().max(0.0) as usize).min(self.height);

        let opacity = layer.opacity as u32;
        for y in y0..y1 {
            let v = ((y as f32 + 0.5 - top) / layer.zoom_y).floor() as i32;
            for x in x0..x1 {
                let u = ((x as f32 + 0.5 - left) / layer.zoom_x).floor() as i32;
                let Some(src) = bitmap.get_pixel(u, v) else {
                    continue;
                };
                let alpha = src.a as u32 * opacity / 255;
                if alpha == 0 {
                    continue;
                }
                let (r, g, b) = layer.tone.apply(src.r, src.g, src.b);
                let idx = y * self.width + x;
                self.buffer[idx] = blend(self.buffer[idx], (r, g, b), alpha, layer.blend);
            }
        }
    }
}

#[inline]
fn blend(dst: u32, src: (u8, u8, u8), alpha: u32, mode: BlendMode) -> u32 {
    let channel = |shift: u32, s: u8| -> u32 {
        let d = (dst >> shift) & 0xFF;
        let s = s as u32;
        match mode {
            BlendMode::Normal => (d * (255 - alpha) + s * alpha) / 255,
            BlendMode::Add => (d + s * alpha / 255).min(255),
            BlendMode::Subtract => d.saturating_sub(s * alpha / 255),
        }
    };
    (channel(16, src.0) << 16) | (channel(8, src.1) << 8) | channel(0, src.2)
}

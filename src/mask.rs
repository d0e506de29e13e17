//! Darkness mask rasterization
//!
//! The mask starts opaque black and every eligible effect punches a soft hole
//! into it. Each effect is drawn `layers` times, from the largest and most
//! opaque ring down to the smallest, fully transparent core. Fills replace
//! pixels, so each inner ring overwrites the outer one.

use crate::bitmap::{Bitmap, Rect};
use crate::color::Color;
use crate::config::LightingConfig;
use crate::effect::{LightEffect, Shape, Visibility};
use crate::registry::EffectRegistry;

/// Camera offset used to turn map positions into screen positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Camera {
    /// Display origin in map subpixel units
    pub display_x: i32,
    pub display_y: i32,
    pub subpixels: i32,
}

impl Camera {
    pub fn new(display_x: i32, display_y: i32, subpixels: i32) -> Self {
        Camera { display_x, display_y, subpixels: subpixels.max(1) }
    }

    /// Map pixels to screen pixels
    pub fn to_screen(&self, x: i32, y: i32) -> (i32, i32) {
        let sub = self.subpixels.max(1) as f64;
        let ox = (self.display_x as f64 / sub).round() as i32;
        let oy = (self.display_y as f64 / sub).round() as i32;
        (x - ox, y - oy)
    }
}

/// Opacity of layer `j` (1-based) out of `layers`
pub fn layer_opacity(j: u32, layers: u32) -> u8 {
    if layers == 0 || j >= layers {
        return 0;
    }
    (255.0 * (layers - j) as f32 / layers as f32) as u8
}

/// Redraw the whole mask. Returns how many effects were drawn.
///
/// With no tone the mask is left fully transparent and nothing is drawn.
pub fn render_mask(
    bitmap: &mut Bitmap,
    registry: &EffectRegistry,
    visibility: &Visibility<'_>,
    lit: bool,
    camera: &Camera,
    phase: f32,
    config: &LightingConfig,
) -> usize {
    bitmap.clear();
    if !lit {
        return 0;
    }
    bitmap.fill(Color::black());
    if registry.is_empty() {
        return 0;
    }

    let eligible: Vec<&LightEffect> = registry
        .iter()
        .filter(|e| visibility.should_render(e))
        .collect();

    let pulse = phase * config.anim_mult;
    let layers = config.layers.max(1);
    let mut cmult = (1.0 / config.fade_factor).powi(layers as i32 - 1);

    for j in 1..=layers {
        let opacity = layer_opacity(j, layers);
        for effect in &eligible {
            let (sx, sy) = camera.to_screen(effect.x, effect.y);
            let (cx, cy) = (sx + config.padding, sy + config.padding);
            match &effect.shape {
                Shape::Circle { radius } => {
                    let radius = circle_radius(*radius, cmult, pulse, effect.stop_anim, config);
                    draw_circle(bitmap, cx, cy, radius, opacity, config.resolution);
                }
                Shape::Rect { width, height } => {
                    let (w, h) = rect_size(*width, *height, cmult, pulse, effect.stop_anim, config);
                    let rect = Rect::new(
                        cx - w / 2 - config.shape_offset,
                        cy - h / 2 - config.shape_offset,
                        w,
                        h,
                    );
                    if !rect.is_empty() {
                        bitmap.fill_rect(rect, Color::black().with_alpha(opacity));
                    }
                }
                Shape::Image { .. } => {
                    if j > 1 {
                        continue;
                    }
                    let Some(image) = registry.image(effect.id.as_str()) else {
                        continue;
                    };
                    let stretch = if effect.stop_anim { 0.0 } else { pulse };
                    draw_image(
                        bitmap,
                        cx - config.shape_offset,
                        cy - config.shape_offset,
                        image,
                        stretch,
                        config.stretch_cap,
                    );
                }
            }
        }
        cmult *= config.fade_factor;
    }

    eligible.len()
}

/// Circle radius for a layer: grown by `cmult`, then pulsed
pub fn circle_radius(
    radius: i32,
    cmult: f32,
    pulse: f32,
    stop_anim: bool,
    config: &LightingConfig,
) -> i32 {
    if radius <= 0 {
        return 0;
    }
    let cap = config.growth_cap;
    let mut r = (radius as f32 + radius.min(cap) as f32 * (cmult - 1.0)) as i32;
    if !stop_anim {
        r = r.saturating_add((r.min(cap) as f32 * pulse) as i32);
    }
    r.max(0)
}

/// Rectangle size for a layer. Rectangles grow faster than circles across
/// layers and pulse by the same amount on both axes.
pub fn rect_size(
    width: i32,
    height: i32,
    cmult: f32,
    pulse: f32,
    stop_anim: bool,
    config: &LightingConfig,
) -> (i32, i32) {
    if width <= 0 || height <= 0 {
        return (0, 0);
    }
    let cap = config.growth_cap;
    let grow = |size: i32| {
        (size as f32 + size.min(cap) as f32 * (cmult - 1.0) * config.rect_expansion) as i32
    };
    let (mut w, mut h) = (grow(width), grow(height));
    if !stop_anim {
        let extra = (w.min(cap) as f32 * pulse) as i32;
        w += extra;
        h += extra;
    }
    (w.max(0), h.max(0))
}

/// Scan-fill a disc with horizontal spans every `step` rows
pub fn draw_circle(bitmap: &mut Bitmap, cx: i32, cy: i32, radius: i32, opacity: u8, step: i32) {
    if radius <= 0 {
        return;
    }
    let step = step.max(1) as i64;
    let color = Color::black().with_alpha(opacity);
    let (cx, cy, radius) = (cx as i64, cy as i64, radius as i64);
    let (width, height) = (bitmap.width() as i64, bitmap.height() as i64);
    let r2 = (radius * radius) as f64;
    // Only rows that land on the bitmap
    let first = (-radius).max(-cy);
    let last = radius.min(height - 1 - cy);
    for i in first..=last {
        let y = cy + i;
        if y % step != 0 {
            continue;
        }
        let half = (r2 - (i * i) as f64).max(0.0).sqrt();
        let left = (cx as f64 - half) as i64;
        let right = (left + (half * 2.0) as i64).min(width);
        let left = left.max(0);
        if right > left {
            let span = Rect::new(left as i32, y as i32, (right - left) as i32, step as i32);
            bitmap.fill_rect(span, color);
        }
    }
}

/// Clear the stretched target area, then stretch the image into it
pub fn draw_image(bitmap: &mut Bitmap, x: i32, y: i32, image: &Bitmap, stretch: f32, cap: i32) {
    let (bw, bh) = (image.width() as i32, image.height() as i32);
    if bw == 0 || bh == 0 {
        return;
    }
    let sx = (bw.min(cap) as f32 * stretch).abs() as i32;
    let sy = (bh.min(cap) as f32 * stretch).abs() as i32;
    let dest = Rect::new(x - sx, y - sy, bw + sx, bh + sy);
    bitmap.fill_rect(dest, Color::transparent());
    bitmap.stretch_blt(dest, image, Rect::new(0, 0, bw, bh));
}

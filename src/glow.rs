//! Colored glow sprites
//!
//! Every eligible colored effect gets one additive sprite holding a radial
//! gradient in the effect's color. The gradient is synthesized once when the
//! sprite is created; afterwards only position, zoom and opacity change.

use crate::bitmap::Bitmap;
use crate::color::Color;
use crate::config::LightingConfig;
use crate::effect::{EffectId, LightEffect, Visibility};
use crate::layer::{BlendMode, Layer, Sprite};
use crate::mask::Camera;
use crate::registry::EffectRegistry;
use std::collections::{BTreeMap, BTreeSet};

/// Glow sprites sit just above the ground tiles
pub const GLOW_Z: i32 = 2;

/// Gradient alpha at `dist` from the center of a glow of `radius`.
///
/// Plain glows use a root falloff, 255 at the center to 0 at the edge.
/// With `hollow` set the center is faded out as well, so whatever stands in
/// the middle stays visible through its own light.
pub fn gradient_alpha(dist: f32, radius: f32, hollow: Option<f32>) -> u8 {
    if radius <= 0.0 || dist > radius {
        return 0;
    }
    let outer = (1.0 - dist / radius).max(0.0).sqrt();
    let inner = match hollow {
        Some(h) if h > 0.0 => (dist / h).min(1.0),
        _ => 1.0,
    };
    (255.0 * inner * outer) as u8
}

/// Oversized gradient radius that contains the pulsing halo
pub fn glow_extent(radius: i32, oversize: f32) -> i32 {
    if radius <= 0 {
        return 0;
    }
    (radius as f32 * oversize).ceil() as i32
}

/// Build the square gradient bitmap for a glow of `radius`.
/// Returns the bitmap and its center offset.
pub fn synthesize_glow(
    color: Color,
    radius: i32,
    hollow: Option<f32>,
    oversize: f32,
) -> (Bitmap, i32) {
    let real_radius = glow_extent(radius, oversize);
    let diameter = (real_radius * 2) as usize;
    let mut bitmap = Bitmap::new(diameter, diameter);
    if diameter == 0 {
        return (bitmap, 0);
    }

    let rr = real_radius as f32;
    for (y, row) in bitmap.pixels_mut().chunks_mut(diameter).enumerate() {
        let dy = y as f32 - rr;
        for (x, pixel) in row.iter_mut().enumerate() {
            let dx = x as f32 - rr;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist <= rr {
                *pixel = color.with_alpha(gradient_alpha(dist, rr, hollow));
            }
        }
    }
    (bitmap, real_radius)
}

/// Number of sprites dropped and created by one reconcile pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileStats {
    pub removed: usize,
    pub created: usize,
}

/// Glow sprites keyed by effect id
#[derive(Debug)]
pub struct GlowCache {
    sprites: BTreeMap<EffectId, Sprite>,
    visible: bool,
}

impl Default for GlowCache {
    fn default() -> Self {
        Self::new()
    }
}

impl GlowCache {
    pub fn new() -> Self {
        GlowCache { sprites: BTreeMap::new(), visible: true }
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Sprite> {
        self.sprites.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &EffectId> {
        self.sprites.keys()
    }

    pub fn sprites(&self) -> impl Iterator<Item = &Sprite> {
        self.sprites.values()
    }

    /// Drop every sprite and its bitmap
    pub fn clear(&mut self) {
        self.sprites.clear();
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        for sprite in self.sprites.values_mut() {
            sprite.layer.visible = visible;
        }
    }

    /// Bring the cache in line with the registry: drop sprites whose effect
    /// is gone, lost its color or is no longer eligible, move and pulse the
    /// rest, then create sprites for newly eligible colored effects.
    pub fn reconcile(
        &mut self,
        registry: &EffectRegistry,
        visibility: &Visibility<'_>,
        camera: &Camera,
        phase: f32,
        config: &LightingConfig,
    ) -> ReconcileStats {
        let eligible: BTreeSet<&EffectId> = registry
            .iter()
            .filter(|e| e.color.is_some() && visibility.should_render(e))
            .map(|e| &e.id)
            .collect();

        let before = self.sprites.len();
        self.sprites.retain(|id, _| eligible.contains(id));
        let removed = before - self.sprites.len();

        let zoom = 1.0 + config.glow_pulse * phase;
        for (id, sprite) in self.sprites.iter_mut() {
            if let Some(effect) = registry.get(id.as_str()) {
                place(&mut sprite.layer, effect, camera, zoom);
            }
        }

        let mut created = 0;
        for id in eligible {
            if self.sprites.contains_key(id.as_str()) {
                continue;
            }
            let Some(effect) = registry.get(id.as_str()) else {
                continue;
            };
            let Some(color) = effect.color else {
                continue;
            };
            let hollow = (id.as_str() == config.follower_id).then_some(config.follower_hollow);
            let radius = effect.glow_radius(registry.image(id.as_str()));
            let (bitmap, center) = synthesize_glow(color, radius, hollow, config.glow_oversize);

            let mut layer = Layer::new(BlendMode::Add, GLOW_Z);
            layer.ox = center;
            layer.oy = center;
            layer.visible = self.visible;
            place(&mut layer, effect, camera, zoom);

            self.sprites.insert(id.clone(), Sprite::new(bitmap, layer));
            created += 1;
        }

        ReconcileStats { removed, created }
    }
}

fn place(layer: &mut Layer, effect: &LightEffect, camera: &Camera, zoom: f32) {
    let (sx, sy) = camera.to_screen(effect.x, effect.y);
    layer.x = sx;
    layer.y = sy;
    layer.set_zoom(if effect.stop_anim { 1.0 } else { zoom });
    layer.opacity = if effect.is_flickering() { 0 } else { 255 };
}

//! The lighting engine: owns every surface, reacts to map changes and runs
//! the per-frame refresh.
//!
//! Frame order inside `update`: tone, attached positions, glow reconcile,
//! mask, mask layer tone. Everything is drawn before the host reads the
//! display list.

use crate::animation;
use crate::bitmap::Bitmap;
use crate::color::Tone;
use crate::config::{ConfigError, LightingConfig};
use crate::data::{MapPreset, PresetKind};
use crate::effect::{EffectId, EntityId, LightEffect, MapId, Visibility};
use crate::environment::{self, Conditions};
use crate::glow::GlowCache;
use crate::host::{Catalog, World};
use crate::layer::{BlendMode, DisplayList, Layer, Sprite};
use crate::mask::{self, Camera};
use crate::registry::EffectRegistry;

pub const MASK_ADD_Z: i32 = 99997;
pub const MASK_SUB_Z: i32 = 99998;
pub const OVERLAY_Z: i32 = 99999;

/// Surfaces owned by a live engine. Dropping this frees all of them.
#[derive(Debug)]
struct Surfaces {
    mask: Bitmap,
    mask_add: Layer,
    mask_sub: Layer,
    overlay: Sprite,
    glow: GlowCache,
}

impl Surfaces {
    fn new(config: &LightingConfig) -> Self {
        let (w, h) = config.mask_size();
        let origin = -config.padding;
        Surfaces {
            mask: Bitmap::new(w, h),
            mask_add: Layer::new(BlendMode::Normal, MASK_ADD_Z).at(origin, origin),
            mask_sub: Layer::new(BlendMode::Subtract, MASK_SUB_Z).at(origin, origin),
            overlay: Sprite::new(
                Bitmap::new(w, h),
                Layer::new(BlendMode::Normal, OVERLAY_Z).at(origin, origin),
            ),
            glow: GlowCache::new(),
        }
    }

    fn set_visible(&mut self, visible: bool) {
        self.mask_add.visible = visible;
        self.mask_sub.visible = visible;
        self.overlay.layer.visible = visible;
        self.glow.set_visible(visible);
    }
}

/// Dynamic lighting for the current map
#[derive(Debug)]
pub struct Lighting {
    config: LightingConfig,
    map_id: MapId,
    preset: Option<MapPreset>,
    registry: EffectRegistry,
    surfaces: Option<Surfaces>,
    tone: Option<Tone>,
    generation: u64,
}

impl Lighting {
    /// Bind to the world's current map and draw the first frame
    pub fn new(
        config: LightingConfig,
        world: &dyn World,
        catalog: &dyn Catalog,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let surfaces = Surfaces::new(&config);
        let mut lighting = Lighting {
            config,
            map_id: world.map_id(),
            preset: None,
            registry: EffectRegistry::new(),
            surfaces: Some(surfaces),
            tone: None,
            generation: 0,
        };
        lighting.rebuild(world, catalog);
        lighting.update(world, catalog);
        Ok(lighting)
    }

    /// Per-frame entry point. Rebuilds everything when the map changed.
    pub fn update(&mut self, world: &dyn World, catalog: &dyn Catalog) {
        if self.is_disposed() {
            return;
        }
        let current = world.map_id();
        if current != self.map_id {
            log::info!("Lighting: map transition {} -> {}", self.map_id, current);
            self.rebuild(world, catalog);
        }
        if self.preset.is_none() {
            return;
        }
        self.refresh(world);
    }

    /// Tear down and rebuild registry, glow sprites, preset and overlay
    fn rebuild(&mut self, world: &dyn World, catalog: &dyn Catalog) {
        self.setup_map(world, catalog);
        self.setup_effects(world, catalog);
        self.setup_overlay(world);
        self.generation += 1;
    }

    fn setup_map(&mut self, world: &dyn World, catalog: &dyn Catalog) {
        self.map_id = world.map_id();
        self.preset = None;
        self.tone = None;

        let preset = catalog
            .preset(self.map_id)
            .or_else(|| catalog.preset(0))
            .cloned()
            .unwrap_or_else(|| {
                log::warn!("Lighting: no preset for map {} or map 0, using fallback", self.map_id);
                MapPreset::fallback()
            });

        if preset.kind == PresetKind::Custom && !preset.call_spawn {
            log::info!(
                "Lighting: map {} has a custom preset without spawn, staying inactive",
                self.map_id
            );
        } else {
            log::info!("Lighting: map {} loaded (type: {:?})", self.map_id, preset.kind);
            self.preset = Some(preset);
        }

        if let Some(surfaces) = self.surfaces.as_mut() {
            surfaces.mask.clear();
            apply_mask_tone(&mut surfaces.mask_add, &mut surfaces.mask_sub, None);
        }
    }

    fn setup_effects(&mut self, world: &dyn World, catalog: &dyn Catalog) {
        if let Some(surfaces) = self.surfaces.as_mut() {
            surfaces.glow.clear();
        }
        self.registry = EffectRegistry::load(self.map_id, catalog);
        log::debug!(
            "Lighting: night={} outdoor={} effects={}",
            world.is_night(),
            world.is_outdoor(),
            self.registry.len()
        );
    }

    fn setup_overlay(&mut self, world: &dyn World) {
        let Some(surfaces) = self.surfaces.as_mut() else {
            return;
        };
        let overlay = &mut surfaces.overlay;
        overlay.bitmap.clear();
        overlay.layer.blend = BlendMode::Normal;
        let Some(preset) = &self.preset else {
            return;
        };
        let env = Conditions::query(world);
        let resolved = environment::resolve_overlay(preset, &env, self.config.screen_width);
        if let Some((spec, blend)) = resolved {
            environment::draw_overlay(&mut overlay.bitmap, &spec);
            overlay.layer.blend = blend;
        }
    }

    fn refresh(&mut self, world: &dyn World) {
        let (Some(preset), Some(surfaces)) = (&self.preset, self.surfaces.as_mut()) else {
            return;
        };
        let config = &self.config;

        let env = Conditions::query(world);
        self.tone = environment::resolve_tone(preset, &env);
        let visibility = Visibility {
            outdoor: env.outdoor,
            night: env.night,
            follower_id: &config.follower_id,
        };

        if self.tone.is_some() {
            refresh_attached(&mut self.registry, world, &visibility, config);
        }

        let camera = Camera::new(world.display_x(), world.display_y(), config.subpixels);
        let phase = animation::phase(world.frame_count(), world.frame_rate());

        let stats = surfaces.glow.reconcile(&self.registry, &visibility, &camera, phase, config);
        let drawn = mask::render_mask(
            &mut surfaces.mask,
            &self.registry,
            &visibility,
            self.tone.is_some(),
            &camera,
            phase,
            config,
        );
        apply_mask_tone(&mut surfaces.mask_add, &mut surfaces.mask_sub, self.tone);
        self.registry.tick();

        log::trace!(
            "Lighting: frame {} phase {:.2} drew {} effects, glow +{} -{}",
            world.frame_count(),
            phase,
            drawn,
            stats.created,
            stats.removed
        );
    }

    pub fn add_effect(&mut self, effect: LightEffect) {
        if !self.is_disposed() {
            self.registry.add(effect);
        }
    }

    /// Add an image effect together with the bitmap it stretches
    pub fn add_image_effect(&mut self, effect: LightEffect, image: Bitmap) {
        if self.is_disposed() {
            return;
        }
        let id = effect.id.clone();
        self.registry.add(effect);
        self.registry.set_image(id.as_str(), image);
    }

    pub fn remove_effect(&mut self, key: &str) -> Option<LightEffect> {
        if self.is_disposed() {
            return None;
        }
        self.registry.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&LightEffect> {
        self.registry.get(key)
    }

    pub fn attach(&mut self, key: &str, entity: EntityId) {
        if !self.is_disposed() {
            self.registry.attach(key, entity);
        }
    }

    pub fn detach(&mut self, key: &str) {
        if !self.is_disposed() {
            self.registry.detach(key);
        }
    }

    pub fn hide(&mut self, key: &str) {
        if !self.is_disposed() {
            self.registry.hide(key);
        }
    }

    pub fn show(&mut self, key: &str) {
        if !self.is_disposed() {
            self.registry.show(key);
        }
    }

    pub fn flick(&mut self, key: &str) {
        if !self.is_disposed() {
            self.registry.flick(key, self.config.flick_frames);
        }
    }

    pub fn show_all(&mut self) {
        if let Some(surfaces) = self.surfaces.as_mut() {
            surfaces.set_visible(true);
        }
    }

    pub fn hide_all(&mut self) {
        if let Some(surfaces) = self.surfaces.as_mut() {
            surfaces.set_visible(false);
        }
    }

    /// Release every surface and preloaded image. The engine stays inert.
    pub fn dispose(&mut self) {
        if self.surfaces.take().is_some() {
            log::debug!("Lighting: disposed (map {})", self.map_id);
        }
        self.registry = EffectRegistry::new();
        self.preset = None;
        self.tone = None;
    }

    pub fn is_disposed(&self) -> bool {
        self.surfaces.is_none()
    }

    /// Whether a preset is bound and the engine renders
    pub fn is_active(&self) -> bool {
        self.preset.is_some() && !self.is_disposed()
    }

    pub fn map_id(&self) -> MapId {
        self.map_id
    }

    /// Number of full rebuilds so far (one at construction, one per map change)
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tone(&self) -> Option<Tone> {
        self.tone
    }

    pub fn config(&self) -> &LightingConfig {
        &self.config
    }

    pub fn effects(&self) -> impl Iterator<Item = &LightEffect> {
        self.registry.iter()
    }

    pub fn mask(&self) -> Option<&Bitmap> {
        self.surfaces.as_ref().map(|s| &s.mask)
    }

    pub fn overlay(&self) -> Option<&Sprite> {
        self.surfaces.as_ref().map(|s| &s.overlay)
    }

    pub fn mask_layers(&self) -> Option<(&Layer, &Layer)> {
        self.surfaces.as_ref().map(|s| (&s.mask_add, &s.mask_sub))
    }

    pub fn glow(&self) -> Option<&GlowCache> {
        self.surfaces.as_ref().map(|s| &s.glow)
    }

    /// Ids of effects that currently own a glow sprite
    pub fn glow_keys(&self) -> Vec<EffectId> {
        self.glow().map(|g| g.keys().cloned().collect()).unwrap_or_default()
    }

    /// Everything to draw this frame, back to front. Empty once disposed.
    pub fn display_list(&self) -> DisplayList<'_> {
        let mut list = DisplayList::new();
        let Some(surfaces) = &self.surfaces else {
            return list;
        };
        for sprite in surfaces.glow.sprites() {
            list.push(&sprite.bitmap, &sprite.layer);
        }
        list.push(&surfaces.mask, &surfaces.mask_add);
        list.push(&surfaces.mask, &surfaces.mask_sub);
        list.push(&surfaces.overlay.bitmap, &surfaces.overlay.layer);
        list.sorted()
    }
}

/// Move attached effects onto their entity. Effects whose entity cannot be
/// resolved keep their last position.
fn refresh_attached(
    registry: &mut EffectRegistry,
    world: &dyn World,
    visibility: &Visibility<'_>,
    config: &LightingConfig,
) {
    let sub = config.subpixels.max(1) as f64;
    let tile = config.tile_size;
    for effect in registry.iter_mut() {
        let Some(entity) = effect.attachment else {
            continue;
        };
        if !visibility.should_render(effect) {
            continue;
        }
        let Some(place) = world.entity(entity) else {
            log::trace!("Lighting: entity {:?} for {} not found", entity, effect.id);
            continue;
        };
        effect.x = (place.real_x as f64 / sub).round() as i32 + place.width_tiles * tile / 2;
        effect.y = (place.real_y as f64 / sub).round() as i32 + tile - place.sprite_height / 2;
    }
}

/// Split the tone between the normal layer (brightening, gray as opacity)
/// and the subtractive layer (darkening)
fn apply_mask_tone(add: &mut Layer, sub: &mut Layer, tone: Option<Tone>) {
    match tone {
        Some(tone) => {
            add.tone = tone.brightening();
            add.opacity = tone.gray.clamp(0.0, 255.0) as u8;
            sub.tone = tone.darkening();
            sub.opacity = 255;
        }
        None => {
            add.tone = Tone::default();
            sub.tone = Tone::default();
            add.opacity = 0;
            sub.opacity = 0;
        }
    }
}

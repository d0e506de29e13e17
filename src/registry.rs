//! In-memory set of the light effects active on the current map

use crate::bitmap::Bitmap;
use crate::effect::{EffectId, EntityId, LightEffect, MapId};
use crate::host::Catalog;
use std::collections::{BTreeMap, HashMap};

/// Effects keyed by id, plus the bitmaps preloaded for image effects.
/// Iteration order is by id so frames are reproducible.
#[derive(Debug, Default)]
pub struct EffectRegistry {
    effects: BTreeMap<EffectId, LightEffect>,
    images: HashMap<EffectId, Bitmap>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry for `map` from every definition that is unrestricted
    /// or restricted to that map
    pub fn load(map: MapId, catalog: &dyn Catalog) -> Self {
        let mut registry = Self::new();
        for def in catalog.effects().iter().filter(|d| d.applies_to(map)) {
            if let Some(name) = def.image_name() {
                match catalog.load_image(name) {
                    Some(bitmap) => {
                        registry.images.insert(def.id.clone(), bitmap);
                    }
                    None => log::warn!("Light effect {}: image '{}' not found", def.id, name),
                }
            }
            registry.effects.insert(def.id.clone(), LightEffect::from(def));
        }
        log::info!("Loaded {} light effects for map {}", registry.len(), map);
        registry
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Insert or replace an effect
    pub fn add(&mut self, effect: LightEffect) {
        self.effects.insert(effect.id.clone(), effect);
    }

    pub fn remove(&mut self, key: &str) -> Option<LightEffect> {
        self.images.remove(key);
        self.effects.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&LightEffect> {
        self.effects.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut LightEffect> {
        self.effects.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.effects.contains_key(key)
    }

    pub fn attach(&mut self, key: &str, entity: EntityId) {
        if let Some(effect) = self.effects.get_mut(key) {
            effect.attachment = Some(entity);
        }
    }

    pub fn detach(&mut self, key: &str) {
        if let Some(effect) = self.effects.get_mut(key) {
            effect.attachment = None;
        }
    }

    pub fn hide(&mut self, key: &str) {
        if let Some(effect) = self.effects.get_mut(key) {
            effect.hidden = true;
        }
    }

    pub fn show(&mut self, key: &str) {
        if let Some(effect) = self.effects.get_mut(key) {
            effect.hidden = false;
        }
    }

    pub fn flick(&mut self, key: &str, frames: u32) {
        if let Some(effect) = self.effects.get_mut(key) {
            effect.flick(frames);
        }
    }

    /// Advance every running blink by one frame
    pub fn tick(&mut self) {
        self.effects.values_mut().for_each(LightEffect::tick);
    }

    pub fn iter(&self) -> impl Iterator<Item = &LightEffect> {
        self.effects.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LightEffect> {
        self.effects.values_mut()
    }

    pub fn image(&self, key: &str) -> Option<&Bitmap> {
        self.images.get(key)
    }

    /// Attach the bitmap an image effect stretches. Unknown keys are ignored.
    pub fn set_image(&mut self, key: &str, bitmap: Bitmap) {
        if let Some(effect) = self.effects.get(key) {
            self.images.insert(effect.id.clone(), bitmap);
        }
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

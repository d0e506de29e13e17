//! Lighting data tables: per-map presets and per-effect definitions.
//!
//! `LightingData` is the in-memory catalog. It can be built in code or
//! parsed from TOML, and it is the `Catalog` the demo and tests hand to the
//! engine.

use crate::bitmap::Bitmap;
use crate::color::{Color, Tone};
use crate::config::ConfigError;
use crate::effect::{EffectId, LightEffect, MapId, Shape};
use crate::environment::OverlaySpec;
use crate::host::Catalog;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetKind {
    #[default]
    Default,
    /// Tone comes only from the preset; environment defaults are ignored
    Custom,
}

/// Lighting preset of one map
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapPreset {
    pub id: MapId,
    #[serde(default)]
    pub kind: PresetKind,
    #[serde(default)]
    pub tone: Option<Tone>,
    #[serde(default)]
    pub overlay: Option<OverlaySpec>,
    /// Custom presets only activate the engine when this is set
    #[serde(default)]
    pub call_spawn: bool,
}

impl MapPreset {
    /// Fallback used when neither the map nor map 0 has a preset
    pub fn fallback() -> Self {
        MapPreset {
            id: 0,
            kind: PresetKind::Default,
            tone: None,
            overlay: None,
            call_spawn: false,
        }
    }
}

/// Static definition of a light effect
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EffectDef {
    pub id: EffectId,
    pub shape: Shape,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub day: Option<bool>,
    #[serde(default)]
    pub map_id: Option<MapId>,
    #[serde(default)]
    pub stop_anim: bool,
    #[serde(default)]
    pub hide: bool,
}

impl EffectDef {
    /// Whether the definition applies to `map`
    pub fn applies_to(&self, map: MapId) -> bool {
        self.map_id.is_none_or(|m| m == map)
    }

    pub fn image_name(&self) -> Option<&str> {
        match &self.shape {
            Shape::Image { name } => Some(name),
            _ => None,
        }
    }
}

impl From<&EffectDef> for LightEffect {
    fn from(def: &EffectDef) -> Self {
        let mut effect = LightEffect::new(def.id.clone(), def.shape.clone(), def.x, def.y);
        effect.color = def.color;
        effect.day = def.day;
        effect.map_id = def.map_id;
        effect.stop_anim = def.stop_anim;
        effect.hidden = def.hide;
        effect
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LightingData {
    #[serde(default)]
    pub maps: Vec<MapPreset>,
    #[serde(default)]
    pub effects: Vec<EffectDef>,
    #[serde(skip)]
    images: HashMap<String, Bitmap>,
}

impl LightingData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let data: LightingData = toml::from_str(raw)?;
        for preset in &data.maps {
            if let Some(overlay) = &preset.overlay {
                if overlay.radius < 0 {
                    return Err(ConfigError::Invalid(format!(
                        "map {} overlay radius must not be negative",
                        preset.id
                    )));
                }
            }
        }
        Ok(data)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn with_preset(mut self, preset: MapPreset) -> Self {
        self.maps.retain(|p| p.id != preset.id);
        self.maps.push(preset);
        self
    }

    pub fn with_effect(mut self, def: EffectDef) -> Self {
        self.effects.push(def);
        self
    }

    pub fn insert_image(&mut self, name: impl Into<String>, bitmap: Bitmap) {
        self.images.insert(name.into(), bitmap);
    }
}

impl Catalog for LightingData {
    fn preset(&self, map: MapId) -> Option<&MapPreset> {
        self.maps.iter().find(|p| p.id == map)
    }

    fn effects(&self) -> &[EffectDef] {
        &self.effects
    }

    fn load_image(&self, name: &str) -> Option<Bitmap> {
        self.images.get(name).cloned()
    }
}

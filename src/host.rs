//! Interfaces the host game provides to the lighting engine.
//!
//! The engine never owns host objects. It queries them through these traits
//! once per frame and keeps only plain values.

use crate::bitmap::Bitmap;
use crate::color::Tone;
use crate::data::{EffectDef, MapPreset};
use crate::effect::{EntityId, MapId};

/// Biome flags attached to map metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapFlag {
    Cave,
    Forest,
}

/// Where an entity currently stands, in map subpixel units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityPlacement {
    pub real_x: i32,
    pub real_y: i32,
    /// Footprint width in tiles
    pub width_tiles: i32,
    /// Height of the entity's sprite in pixels
    pub sprite_height: i32,
}

/// Read-only game state queried every refresh
pub trait World {
    fn map_id(&self) -> MapId;

    /// Camera offset in map subpixel units
    fn display_x(&self) -> i32;
    fn display_y(&self) -> i32;

    fn is_outdoor(&self) -> bool;
    fn has_flag(&self, flag: MapFlag) -> bool;

    fn is_night(&self) -> bool;
    /// Ambient tone the day/night service wants for outdoor maps right now
    fn daylight_tone(&self) -> Tone;

    fn entity(&self, id: EntityId) -> Option<EntityPlacement>;

    fn frame_count(&self) -> u64;
    fn frame_rate(&self) -> u64;
}

/// Read-only lighting configuration tables
pub trait Catalog {
    fn preset(&self, map: MapId) -> Option<&MapPreset>;
    fn effects(&self) -> &[EffectDef];
    /// Image for bitmap-shaped effects. The engine takes ownership of the copy.
    fn load_image(&self, name: &str) -> Option<Bitmap>;
}

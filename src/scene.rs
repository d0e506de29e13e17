//! Plain-value `World` used by the viewer, the benchmark and the tests

use crate::color::Tone;
use crate::effect::{EntityId, MapId};
use crate::host::{EntityPlacement, MapFlag, World};
use std::collections::HashMap;

/// Night tone used by `Scene::outdoor` when `night` is set
pub const NIGHT_TONE: Tone = Tone::new(-85.0, -85.0, -25.0, 120.0);
/// Day tone used by `Scene::outdoor` otherwise
pub const DAY_TONE: Tone = Tone::new(0.0, 0.0, 0.0, 0.0);

#[derive(Debug, Clone)]
pub struct Scene {
    pub map_id: MapId,
    pub display_x: i32,
    pub display_y: i32,
    pub outdoor: bool,
    pub night: bool,
    pub cave: bool,
    pub forest: bool,
    pub daylight: Tone,
    pub frame_count: u64,
    pub frame_rate: u64,
    entities: HashMap<EntityId, EntityPlacement>,
}

impl Scene {
    pub fn indoor(map_id: MapId) -> Self {
        Scene {
            map_id,
            display_x: 0,
            display_y: 0,
            outdoor: false,
            night: false,
            cave: false,
            forest: false,
            daylight: DAY_TONE,
            frame_count: 0,
            frame_rate: 60,
            entities: HashMap::new(),
        }
    }

    pub fn outdoor(map_id: MapId, night: bool) -> Self {
        let mut scene = Self::indoor(map_id);
        scene.outdoor = true;
        scene.set_night(night);
        scene
    }

    pub fn cave(map_id: MapId) -> Self {
        Scene { cave: true, ..Self::indoor(map_id) }
    }

    /// Switch day/night and the matching outdoor tone
    pub fn set_night(&mut self, night: bool) {
        self.night = night;
        self.daylight = if night { NIGHT_TONE } else { DAY_TONE };
    }

    /// Place a one-tile entity with a 48 px sprite at map subpixel coordinates
    pub fn place_entity(&mut self, id: EntityId, real_x: i32, real_y: i32) {
        self.entities.insert(
            id,
            EntityPlacement { real_x, real_y, width_tiles: 1, sprite_height: 48 },
        );
    }

    pub fn remove_entity(&mut self, id: EntityId) {
        self.entities.remove(&id);
    }

    /// Advance the frame clock by one
    pub fn tick(&mut self) {
        self.frame_count += 1;
    }
}

impl World for Scene {
    fn map_id(&self) -> MapId {
        self.map_id
    }

    fn display_x(&self) -> i32 {
        self.display_x
    }

    fn display_y(&self) -> i32 {
        self.display_y
    }

    fn is_outdoor(&self) -> bool {
        self.outdoor
    }

    fn has_flag(&self, flag: MapFlag) -> bool {
        match flag {
            MapFlag::Cave => self.cave,
            MapFlag::Forest => self.forest,
        }
    }

    fn is_night(&self) -> bool {
        self.night
    }

    fn daylight_tone(&self) -> Tone {
        self.daylight
    }

    fn entity(&self, id: EntityId) -> Option<EntityPlacement> {
        self.entities.get(&id).copied()
    }

    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn frame_rate(&self) -> u64 {
        self.frame_rate
    }
}

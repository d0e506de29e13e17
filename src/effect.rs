//! Light effects: one configured light (or darkness-only) source each

use crate::bitmap::Bitmap;
use crate::color::Color;
use serde::Deserialize;
use std::borrow::Borrow;
use std::fmt;

pub type MapId = u32;

/// Stable key of a light effect
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct EffectId(String);

impl EffectId {
    pub fn new(id: impl Into<String>) -> Self {
        EffectId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EffectId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EffectId {
    fn from(id: &str) -> Self {
        EffectId(id.to_string())
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle of a host entity a light can follow. Never owns the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct EntityId(pub u32);

/// Geometry of a light effect
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Circle { radius: i32 },
    Rect { width: i32, height: i32 },
    /// Stretch-animated bitmap looked up by name in the catalog
    Image { name: String },
}

/// A single light source tracked by the registry
#[derive(Debug, Clone, PartialEq)]
pub struct LightEffect {
    pub id: EffectId,
    pub shape: Shape,
    /// Position in map pixels
    pub x: i32,
    pub y: i32,
    /// `None` means the effect only cuts darkness and gets no glow sprite
    pub color: Option<Color>,
    pub hidden: bool,
    pub stop_anim: bool,
    /// `Some(true)` day-only, `Some(false)` night-only
    pub day: Option<bool>,
    /// Restricts the effect to one map when loaded from the catalog
    pub map_id: Option<MapId>,
    pub attachment: Option<EntityId>,
    flicker: u32,
}

impl LightEffect {
    pub fn new(id: impl Into<EffectId>, shape: Shape, x: i32, y: i32) -> Self {
        LightEffect {
            id: id.into(),
            shape,
            x,
            y,
            color: None,
            hidden: false,
            stop_anim: false,
            day: None,
            map_id: None,
            attachment: None,
            flicker: 0,
        }
    }

    pub fn circle(id: impl Into<EffectId>, x: i32, y: i32, radius: i32) -> Self {
        Self::new(id, Shape::Circle { radius }, x, y)
    }

    pub fn rect(id: impl Into<EffectId>, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(id, Shape::Rect { width, height }, x, y)
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_day(mut self, day: bool) -> Self {
        self.day = Some(day);
        self
    }

    pub fn with_stop_anim(mut self, stop_anim: bool) -> Self {
        self.stop_anim = stop_anim;
        self
    }

    /// Start a one-shot blink lasting `frames` updates
    pub fn flick(&mut self, frames: u32) {
        self.flicker = frames;
    }

    pub fn is_flickering(&self) -> bool {
        self.flicker > 0
    }

    /// Advance the blink by one frame
    pub fn tick(&mut self) {
        self.flicker = self.flicker.saturating_sub(1);
    }

    /// Radius of the glow gradient for this effect.
    /// Image effects need their preloaded bitmap to know their size.
    pub fn glow_radius(&self, image: Option<&Bitmap>) -> i32 {
        match &self.shape {
            Shape::Circle { radius } => *radius,
            Shape::Rect { width, height } => (*width).max(*height) / 2,
            Shape::Image { .. } => image
                .map(|b| (b.width().max(b.height()) / 2) as i32)
                .unwrap_or(0),
        }
    }
}

/// Visibility predicate shared by the mask and the glow sprites
#[derive(Debug, Clone, Copy)]
pub struct Visibility<'a> {
    pub outdoor: bool,
    pub night: bool,
    pub follower_id: &'a str,
}

impl Visibility<'_> {
    pub fn should_render(&self, effect: &LightEffect) -> bool {
        if effect.id.as_str() == self.follower_id {
            return true;
        }
        if effect.hidden {
            return false;
        }
        if self.outdoor && self.night && effect.day == Some(true) {
            return false;
        }
        if self.outdoor && !self.night && effect.day == Some(false) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vis(outdoor: bool, night: bool) -> Visibility<'static> {
        Visibility { outdoor, night, follower_id: "follower_light" }
    }

    #[test]
    fn test_hidden_never_renders() {
        let mut torch = LightEffect::circle("torch", 0, 0, 50);
        torch.hidden = true;
        for (outdoor, night) in [(false, false), (false, true), (true, false), (true, true)] {
            assert!(!vis(outdoor, night).should_render(&torch));
        }
    }

    #[test]
    fn test_follower_always_renders() {
        let mut follower = LightEffect::circle("follower_light", 0, 0, 50).with_day(true);
        follower.hidden = true;
        assert!(vis(true, true).should_render(&follower));
        assert!(vis(true, false).should_render(&follower));
    }

    #[test]
    fn test_day_night_polarity() {
        let day_only = LightEffect::circle("sun", 0, 0, 50).with_day(true);
        let night_only = LightEffect::circle("torch", 0, 0, 50).with_day(false);
        let always = LightEffect::circle("lamp", 0, 0, 50);

        // Outdoors at night: day-only suppressed
        assert!(!vis(true, true).should_render(&day_only));
        assert!(vis(true, true).should_render(&night_only));
        // Outdoors by day: night-only suppressed
        assert!(vis(true, false).should_render(&day_only));
        assert!(!vis(true, false).should_render(&night_only));
        // Indoors the flags are ignored
        for night in [false, true] {
            assert!(vis(false, night).should_render(&day_only));
            assert!(vis(false, night).should_render(&night_only));
        }
        assert!(vis(true, true).should_render(&always));
    }

    #[test]
    fn test_should_render_is_idempotent() {
        let effect = LightEffect::circle("torch", 0, 0, 50).with_day(false);
        let v = vis(true, false);
        let first = v.should_render(&effect);
        for _ in 0..5 {
            assert_eq!(v.should_render(&effect), first);
        }
    }

    #[test]
    fn test_flick_counts_down() {
        let mut effect = LightEffect::circle("torch", 0, 0, 50);
        effect.flick(2);
        assert!(effect.is_flickering());
        effect.tick();
        effect.tick();
        assert!(!effect.is_flickering());
        effect.tick();
        assert!(!effect.is_flickering());
    }

    #[test]
    fn test_glow_radius_per_shape() {
        assert_eq!(LightEffect::circle("a", 0, 0, 40).glow_radius(None), 40);
        assert_eq!(LightEffect::rect("b", 0, 0, 30, 80).glow_radius(None), 40);
        let image = LightEffect::new("c", Shape::Image { name: "beam".into() }, 0, 0);
        assert_eq!(image.glow_radius(None), 0);
        assert_eq!(image.glow_radius(Some(&Bitmap::new(20, 64))), 32);
    }
}

//! Ambient tone and background overlay from map preset and world conditions

use crate::bitmap::{Bitmap, Rect};
use crate::color::{Color, Tone};
use crate::data::{MapPreset, PresetKind};
use crate::host::{MapFlag, World};
use crate::layer::BlendMode;
use serde::Deserialize;

const CAVE_TONE: Tone = Tone::new(0.0, 0.0, 0.0, 150.0);
const CANOPY_TONE: Tone = Tone::new(-60.0, -60.0, -40.0, 0.0);
const CAVE_OVERLAY: Color = Color::new(0, 0, 0, 150);
const CANOPY_OVERLAY: Color = Color::new(15, 38, 0, 200);
const DEFAULT_RINGS: u32 = 12;
const RING_SHRINK: f32 = 0.9;

/// Concentric-ring vignette: base color with `rings` lighter discs inside
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct OverlaySpec {
    pub color: Color,
    pub radius: i32,
    pub rings: u32,
}

/// Snapshot of the environment queries for one refresh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conditions {
    pub outdoor: bool,
    pub night: bool,
    pub cave: bool,
    pub forest: bool,
    pub daylight: Tone,
}

impl Conditions {
    pub fn query(world: &dyn World) -> Self {
        Conditions {
            outdoor: world.is_outdoor(),
            night: world.is_night(),
            cave: world.has_flag(MapFlag::Cave),
            forest: world.has_flag(MapFlag::Forest),
            daylight: world.daylight_tone(),
        }
    }
}

/// First matching rule wins: custom preset, cave, daytime canopy, outdoors.
/// `None` disables illumination for the frame.
pub fn resolve_tone(preset: &MapPreset, env: &Conditions) -> Option<Tone> {
    if preset.kind == PresetKind::Custom {
        preset.tone
    } else if env.cave {
        Some(preset.tone.unwrap_or(CAVE_TONE))
    } else if env.forest && !env.night {
        Some(preset.tone.unwrap_or(CANOPY_TONE))
    } else if env.outdoor {
        Some(env.daylight)
    } else {
        None
    }
}

/// Overlay spec and blend mode, if any applies
pub fn resolve_overlay(
    preset: &MapPreset,
    env: &Conditions,
    screen_width: usize,
) -> Option<(OverlaySpec, BlendMode)> {
    let radius = (screen_width / 2) as i32;
    if let Some(spec) = preset.overlay {
        Some((spec, BlendMode::Normal))
    } else if env.cave {
        Some((
            OverlaySpec { color: CAVE_OVERLAY, radius, rings: DEFAULT_RINGS },
            BlendMode::Normal,
        ))
    } else if env.forest {
        Some((
            OverlaySpec { color: CANOPY_OVERLAY, radius, rings: DEFAULT_RINGS },
            BlendMode::Subtract,
        ))
    } else {
        None
    }
}

/// Alpha of ring `i` (1-based) out of `rings`
pub fn ring_alpha(base_alpha: u8, i: u32, rings: u32) -> u8 {
    if rings == 0 || i > rings {
        return 0;
    }
    (base_alpha as u32 * (rings - i) / rings) as u8
}

/// Paint the vignette centered on the bitmap
pub fn draw_overlay(bitmap: &mut Bitmap, spec: &OverlaySpec) {
    bitmap.fill(spec.color);
    let cx = (bitmap.width() / 2) as i32;
    let cy = (bitmap.height() / 2) as i32;
    let mut radius = spec.radius.max(0);
    for i in 1..=spec.rings {
        let color = spec.color.with_alpha(ring_alpha(spec.color.a, i, spec.rings));
        fill_disc_columns(bitmap, cx, cy, radius, color);
        radius = (radius as f32 * RING_SHRINK).floor() as i32;
    }
}

fn fill_disc_columns(bitmap: &mut Bitmap, cx: i32, cy: i32, radius: i32, color: Color) {
    if radius <= 0 {
        return;
    }
    let (cx, cy, radius) = (cx as i64, cy as i64, radius as i64);
    let height = bitmap.height() as i64;
    let r2 = (radius * radius) as f64;
    // Only columns that land on the bitmap
    let first = (cx - radius).max(0);
    let last = (cx + radius).min(bitmap.width() as i64 - 1);
    for j in first..=last {
        let dx = (j - cx) as f64;
        let half = (r2 - dx * dx).max(0.0).sqrt();
        let top = (cy as f64 - half) as i64;
        let bottom = (top + (half * 2.0) as i64).min(height);
        let top = top.max(0);
        if bottom > top {
            bitmap.fill_rect(Rect::new(j as i32, top as i32, 1, (bottom - top) as i32), color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Conditions {
        Conditions {
            outdoor: false,
            night: false,
            cave: false,
            forest: false,
            daylight: Tone::new(-20.0, -20.0, 10.0, 30.0),
        }
    }

    fn preset(kind: PresetKind, tone: Option<Tone>) -> MapPreset {
        MapPreset { kind, tone, ..MapPreset::fallback() }
    }

    #[test]
    fn test_custom_tone_wins() {
        let custom = Tone::new(5.0, 5.0, 5.0, 5.0);
        let cave = Conditions { cave: true, outdoor: true, ..env() };
        assert_eq!(resolve_tone(&preset(PresetKind::Custom, Some(custom)), &cave), Some(custom));
        // Custom with no tone disables lighting even in a cave
        assert_eq!(resolve_tone(&preset(PresetKind::Custom, None), &cave), None);
    }

    #[test]
    fn test_cave_default_and_override() {
        let cave = Conditions { cave: true, ..env() };
        assert_eq!(resolve_tone(&preset(PresetKind::Default, None), &cave), Some(CAVE_TONE));
        let own = Tone::new(0.0, 0.0, 0.0, 90.0);
        assert_eq!(resolve_tone(&preset(PresetKind::Default, Some(own)), &cave), Some(own));
    }

    #[test]
    fn test_canopy_only_by_day() {
        let p = preset(PresetKind::Default, None);
        let day_forest = Conditions { forest: true, outdoor: true, ..env() };
        assert_eq!(resolve_tone(&p, &day_forest), Some(CANOPY_TONE));

        // At night the forest falls through to the outdoor tone
        let night_forest = Conditions { night: true, ..day_forest };
        assert_eq!(resolve_tone(&p, &night_forest), Some(night_forest.daylight));
    }

    #[test]
    fn test_indoor_without_flags_has_no_tone() {
        assert_eq!(resolve_tone(&preset(PresetKind::Default, None), &env()), None);
        let outside = Conditions { outdoor: true, ..env() };
        let tone = resolve_tone(&preset(PresetKind::Default, None), &outside);
        assert_eq!(tone, Some(outside.daylight));
    }

    #[test]
    fn test_overlay_precedence() {
        let p = preset(PresetKind::Default, None);
        let cave = Conditions { cave: true, forest: true, ..env() };
        let (spec, blend) = resolve_overlay(&p, &cave, 512).unwrap();
        assert_eq!(
            (spec.color, spec.radius, spec.rings, blend),
            (CAVE_OVERLAY, 256, 12, BlendMode::Normal)
        );

        let forest = Conditions { forest: true, ..env() };
        let (spec, blend) = resolve_overlay(&p, &forest, 512).unwrap();
        assert_eq!((spec.color, blend), (CANOPY_OVERLAY, BlendMode::Subtract));

        let explicit = OverlaySpec { color: Color::new(1, 2, 3, 4), radius: 10, rings: 2 };
        let p = MapPreset { overlay: Some(explicit), ..p };
        assert_eq!(resolve_overlay(&p, &cave, 512), Some((explicit, BlendMode::Normal)));

        assert_eq!(resolve_overlay(&preset(PresetKind::Default, None), &env(), 512), None);
    }

    #[test]
    fn test_ring_alpha_falloff() {
        assert_eq!(ring_alpha(150, 1, 12), 137);
        assert_eq!(ring_alpha(150, 6, 12), 75);
        assert_eq!(ring_alpha(150, 12, 12), 0);
        assert_eq!(ring_alpha(150, 1, 0), 0);
    }

    #[test]
    fn test_draw_overlay_vignette() {
        let mut bmp = Bitmap::new(64, 64);
        let spec = OverlaySpec { color: Color::new(0, 0, 0, 200), radius: 30, rings: 4 };
        draw_overlay(&mut bmp, &spec);

        // Corner keeps the base color
        assert_eq!(bmp.get_pixel(0, 0), Some(spec.color));
        // Center lies inside the innermost ring, which is fully transparent
        assert_eq!(bmp.get_pixel(32, 32).map(|c| c.a), Some(0));
        // Alpha never increases toward the center along a row
        let row: Vec<u8> = (0..=32).map(|x| bmp.get_pixel(x, 32).unwrap().a).collect();
        assert!(row.windows(2).all(|w| w[1] <= w[0]), "{row:?}");
    }

    #[test]
    fn test_huge_overlay_radius_is_clipped() {
        let mut bmp = Bitmap::new(16, 16);
        let spec = OverlaySpec { color: Color::new(0, 0, 0, 150), radius: i32::MAX - 1, rings: 1 };
        draw_overlay(&mut bmp, &spec);
        // The single ring covers the whole bitmap with alpha 0
        assert!(bmp.pixels().iter().all(|p| p.a == 0));
    }
}

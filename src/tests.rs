//! End-to-end tests for the lighting engine

use crate::{
    Bitmap, BlendMode, Color, EffectId, EntityId, LightEffect, Lighting, LightingConfig,
    LightingData, MapPreset, PresetKind, Scene, Shape, demo_catalog,
};

fn engine(scene: &Scene, data: &LightingData) -> Lighting {
    Lighting::new(LightingConfig::default(), scene, data).unwrap()
}

fn keys(lighting: &Lighting) -> Vec<String> {
    let mut keys: Vec<String> = lighting.glow_keys().iter().map(|k| k.to_string()).collect();
    keys.sort();
    keys
}

#[test]
fn test_main() {
    crate::main();
}

#[test]
fn test_empty_mask_with_and_without_tone() {
    let data = LightingData::new();

    let night = Scene::outdoor(1, true);
    let lighting = engine(&night, &data);
    assert!(lighting.tone().is_some());
    let mask = lighting.mask().unwrap();
    assert_eq!((mask.width(), mask.height()), (576, 448));
    assert!(mask.pixels().iter().all(|p| *p == Color::black()));

    let indoor = Scene::indoor(1);
    let lighting = engine(&indoor, &data);
    assert!(lighting.tone().is_none());
    assert!(lighting.mask().unwrap().pixels().iter().all(|p| *p == Color::transparent()));
    let (add, sub) = lighting.mask_layers().unwrap();
    assert_eq!((add.opacity, sub.opacity), (0, 0));
}

#[test]
fn test_map_transition_rebuilds_once() {
    let data = demo_catalog().unwrap();
    let mut scene = Scene::outdoor(1, true);
    let mut lighting = engine(&scene, &data);
    assert_eq!(lighting.generation(), 1);
    assert!(keys(&lighting).contains(&"torch1".to_string()));

    scene.map_id = 2;
    scene.cave = true;
    scene.outdoor = false;
    lighting.update(&scene, &data);
    assert_eq!(lighting.generation(), 2);
    assert_eq!(lighting.map_id(), 2);
    assert_eq!(keys(&lighting), vec!["crystal", "follower_light"]);

    // Same map again: no rebuild
    lighting.update(&scene, &data);
    assert_eq!(lighting.generation(), 2);
}

#[test]
fn test_custom_preset_without_spawn_is_inactive() {
    let data = demo_catalog().unwrap();
    let scene = Scene::outdoor(3, true);
    let lighting = engine(&scene, &data);

    assert!(!lighting.is_active());
    assert!(lighting.tone().is_none());
    assert!(lighting.glow_keys().is_empty());
    assert!(lighting.mask().unwrap().pixels().iter().all(|p| p.a == 0));
}

#[test]
fn test_missing_presets_use_fallback() {
    // No preset for the map and none for map 0
    let data = LightingData::new().with_preset(MapPreset {
        id: 7,
        kind: PresetKind::Custom,
        ..MapPreset::fallback()
    });
    let scene = Scene::outdoor(1, true);
    let lighting = engine(&scene, &data);
    assert!(lighting.is_active());
    assert_eq!(lighting.tone(), Some(crate::scene::NIGHT_TONE));
}

#[test]
fn test_dispose_is_inert() {
    let data = demo_catalog().unwrap();
    let scene = Scene::outdoor(1, true);
    let mut lighting = engine(&scene, &data);

    lighting.dispose();
    assert!(lighting.is_disposed());
    assert!(!lighting.is_active());

    lighting.add_effect(LightEffect::circle("late", 0, 0, 40).with_color(Color::rgb(255, 0, 0)));
    lighting.hide("torch1");
    lighting.flick("torch1");
    lighting.update(&scene, &data);
    lighting.dispose();

    assert_eq!(lighting.effects().count(), 0);
    assert!(lighting.mask().is_none());
    assert!(lighting.glow_keys().is_empty());
    assert!(lighting.remove_effect("torch1").is_none());
}

#[test]
fn test_glow_keys_track_eligible_colored_effects() {
    let data = LightingData::new();
    let scene = Scene::outdoor(1, true);
    let mut lighting = engine(&scene, &data);
    let red = Color::rgb(255, 0, 0);

    lighting.add_effect(LightEffect::circle("a", 50, 50, 30).with_color(red));
    lighting.add_effect(LightEffect::rect("b", 90, 50, 20, 40).with_color(red));
    lighting.add_effect(LightEffect::circle("dark_only", 150, 50, 30));
    lighting.update(&scene, &data);
    assert_eq!(keys(&lighting), vec!["a", "b"]);

    lighting.hide("a");
    lighting.update(&scene, &data);
    assert_eq!(keys(&lighting), vec!["b"]);

    lighting.show("a");
    lighting.update(&scene, &data);
    assert_eq!(keys(&lighting), vec!["a", "b"]);

    lighting.remove_effect("b");
    lighting.update(&scene, &data);
    assert_eq!(keys(&lighting), vec!["a"]);

    let sprite = lighting.glow().unwrap().get("a").unwrap();
    // ceil(30 * 1.5) = 45
    assert_eq!((sprite.bitmap.width(), sprite.layer.ox), (90, 45));
    assert_eq!((sprite.layer.x, sprite.layer.y), (50, 50));
}

#[test]
fn test_night_torch_end_to_end() {
    let data = demo_catalog().unwrap();
    let mut scene = Scene::outdoor(1, true);
    let mut lighting = engine(&scene, &data);

    let torch = lighting.get("torch1").unwrap();
    assert_eq!(torch.shape, Shape::Circle { radius: 100 });
    assert_eq!(torch.color, Some(Color::rgb(255, 150, 60)));
    assert!(keys(&lighting).contains(&"torch1".to_string()));

    // Innermost layer leaves the torch center fully lit, the far corner dark
    let mask = lighting.mask().unwrap();
    assert_eq!(mask.get_pixel(160 + 32, 128 + 32).unwrap().a, 0);
    assert_eq!(mask.get_pixel(575, 0).unwrap().a, 255);

    scene.set_night(false);
    scene.tick();
    lighting.update(&scene, &data);
    assert!(!keys(&lighting).contains(&"torch1".to_string()));
    assert_eq!(lighting.mask().unwrap().get_pixel(160 + 32, 128 + 32).unwrap().a, 255);
}

#[test]
fn test_flick_blanks_glow_for_a_few_frames() {
    let data = demo_catalog().unwrap();
    let mut scene = Scene::outdoor(1, true);
    let mut lighting = engine(&scene, &data);
    let opacity = |l: &Lighting| l.glow().unwrap().get("torch1").unwrap().layer.opacity;

    lighting.flick("torch1");
    for _ in 0..6 {
        scene.tick();
        lighting.update(&scene, &data);
        assert_eq!(opacity(&lighting), 0);
    }
    scene.tick();
    lighting.update(&scene, &data);
    assert_eq!(opacity(&lighting), 255);
}

#[test]
fn test_cave_overlay_and_tone() {
    let data = demo_catalog().unwrap();
    let scene = Scene::cave(2);
    let lighting = engine(&scene, &data);

    assert_eq!(lighting.tone().map(|t| t.gray), Some(170.0));
    let overlay = lighting.overlay().unwrap();
    assert_eq!(overlay.bitmap.get_pixel(0, 0), Some(Color::new(0, 0, 0, 150)));
    let center = overlay.bitmap.get_pixel(288, 224).unwrap();
    assert!(center.a < 150);

    let (add, sub) = lighting.mask_layers().unwrap();
    assert_eq!((add.opacity, sub.opacity), (170, 255));
}

#[test]
fn test_image_effect_is_stretched_into_mask() {
    let data = LightingData::new();
    let scene = Scene::outdoor(1, true);
    let mut lighting = engine(&scene, &data);

    let mut image = Bitmap::new(10, 10);
    image.fill(Color::new(0, 0, 0, 40));
    let effect = LightEffect::new("window_beam", Shape::Image { name: "beam".into() }, 100, 100)
        .with_stop_anim(true);
    lighting.add_image_effect(effect, image);
    lighting.update(&scene, &data);

    // Drawn at position + padding - offset
    let mask = lighting.mask().unwrap();
    assert_eq!(mask.get_pixel(120, 120), Some(Color::new(0, 0, 0, 40)));
    assert_eq!(mask.get_pixel(130, 120), Some(Color::black()));
    assert!(lighting.glow_keys().is_empty());
}

#[test]
fn test_follower_light_tracks_player() {
    let data = demo_catalog().unwrap();
    let mut scene = Scene::outdoor(1, false);
    scene.place_entity(EntityId(1), 200 * 4, 100 * 4);
    let mut lighting = engine(&scene, &data);
    lighting.attach("follower_light", EntityId(1));
    lighting.hide("follower_light");
    lighting.update(&scene, &data);

    // Follower ignores hidden and day flags
    let follower = lighting.get("follower_light").unwrap();
    assert_eq!((follower.x, follower.y), (216, 108));
    assert!(lighting.glow_keys().contains(&EffectId::new("follower_light")));
}

#[test]
fn test_switch_to_inactive_map_clears_everything() {
    let data = demo_catalog().unwrap();
    let mut scene = Scene::outdoor(1, true);
    scene.forest = true;
    let mut lighting = engine(&scene, &data);
    assert!(!lighting.glow_keys().is_empty());
    assert!(lighting.overlay().unwrap().bitmap.pixels().iter().any(|p| p.a > 0));

    scene.map_id = 3;
    lighting.update(&scene, &data);

    assert!(!lighting.is_active());
    assert_eq!(lighting.generation(), 2);
    assert!(lighting.glow_keys().is_empty());
    let overlay = lighting.overlay().unwrap();
    assert!(overlay.bitmap.pixels().iter().all(|p| p.a == 0));
    assert_eq!(overlay.layer.blend, BlendMode::Normal);
    let (add, sub) = lighting.mask_layers().unwrap();
    assert_eq!((add.opacity, sub.opacity), (0, 0));
    assert!(lighting.mask().unwrap().pixels().iter().all(|p| p.a == 0));
}

#[test]
fn test_lost_entity_keeps_last_position() {
    let data = LightingData::new();
    let mut scene = Scene::outdoor(1, true);
    scene.place_entity(EntityId(5), 64 * 4, 64 * 4);
    let mut lighting = engine(&scene, &data);
    lighting.add_effect(LightEffect::circle("lantern", 0, 0, 20));
    lighting.attach("lantern", EntityId(5));
    lighting.update(&scene, &data);
    // 64 + 16 and 64 + 32 - 24
    assert_eq!(lighting.get("lantern").map(|e| (e.x, e.y)), Some((80, 72)));

    scene.remove_entity(EntityId(5));
    scene.tick();
    lighting.update(&scene, &data);
    assert_eq!(lighting.get("lantern").map(|e| (e.x, e.y)), Some((80, 72)));
}

#[test]
fn test_engine_keeps_its_config() {
    let config = LightingConfig {
        screen_width: 320,
        screen_height: 240,
        ..LightingConfig::default()
    };
    let scene = Scene::outdoor(1, true);
    let lighting = Lighting::new(config, &scene, &LightingData::new()).unwrap();
    assert_eq!(lighting.config().screen_width, 320);
    let mask = lighting.mask().unwrap();
    assert_eq!((mask.width(), mask.height()), (384, 304));
}

#[test]
fn test_dump_writes_mask_from_data_file() {
    let dir = std::env::temp_dir();
    let data_path = dir.join(format!("tilelight_dump_{}.toml", std::process::id()));
    let out_path = data_path.with_extension("pam");
    std::fs::write(&data_path, "[[maps]]\nid = 0\n").unwrap();

    crate::run_dump(out_path.to_str().unwrap(), data_path.to_str()).unwrap();
    let written = std::fs::read(&out_path).unwrap();
    std::fs::remove_file(&data_path).unwrap();
    std::fs::remove_file(&out_path).unwrap();
    assert!(written.starts_with(b"P7"));

    assert!(crate::run_dump(out_path.to_str().unwrap(), Some("/nonexistent/lights.toml")).is_err());
}

mod animation;
mod bitmap;
mod color;
mod compositor;
mod config;
mod data;
mod effect;
mod engine;
mod environment;
mod glow;
mod host;
mod interactive;
mod layer;
mod mask;
mod registry;
mod scene;

#[cfg(test)]
mod tests;

// Re-export public API
pub use animation::{phase, saw_wave};
pub use bitmap::{Bitmap, Rect};
pub use color::{Color, Tone};
pub use compositor::Compositor;
pub use config::{ConfigError, LightingConfig};
pub use data::{EffectDef, LightingData, MapPreset, PresetKind};
pub use effect::{EffectId, EntityId, LightEffect, MapId, Shape, Visibility};
pub use engine::Lighting;
pub use environment::{Conditions, OverlaySpec, resolve_overlay, resolve_tone};
pub use glow::{GlowCache, gradient_alpha, synthesize_glow};
pub use host::{Catalog, EntityPlacement, MapFlag, World};
pub use interactive::{InteractiveViewer, ViewerConfig, demo_catalog};
pub use layer::{BlendMode, DisplayList, Layer, Sprite};
pub use mask::{Camera, render_mask};
pub use registry::EffectRegistry;
pub use scene::Scene;

fn main() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--interactive" {
        run_interactive();
    } else if args.len() > 1 && args[1] == "--benchmark" {
        run_benchmark();
    } else if args.len() > 2 && args[1] == "--dump" {
        if let Err(e) = run_dump(&args[2], args.get(3).map(String::as_str)) {
            log::error!("Dump failed: {}", e);
        }
    } else {
        println!("Tile Lighting");
        println!("Run with --interactive for minifb viewer");
        println!("Run with --benchmark to test performance");
        println!("Run with --dump <file.pam> [data.toml] to save one night frame's mask");
    }
}

fn run_benchmark() {
    use rayon::prelude::*;
    use std::time::Instant;

    println!("=== Lighting Update Benchmark ===\n");

    let iterations = 30;
    let config = LightingConfig::default();
    let data = LightingData::new();

    for count in [10usize, 50, 200] {
        let mut scene = Scene::outdoor(1, true);
        let mut lighting = match Lighting::new(config.clone(), &scene, &data) {
            Ok(lighting) => lighting,
            Err(e) => {
                log::error!("Failed to create engine: {}", e);
                return;
            }
        };
        for i in 0..count {
            let x = (i * 37 % config.screen_width) as i32;
            let y = (i * 53 % config.screen_height) as i32;
            let radius = 24 + (i % 5) as i32 * 16;
            let mut effect = LightEffect::circle(format!("light{}", i).as_str(), x, y, radius);
            if i % 2 == 0 {
                effect = effect.with_color(Color::rgb(255, 150, 60));
            }
            lighting.add_effect(effect);
        }

        let start = Instant::now();
        for _ in 0..iterations {
            scene.tick();
            lighting.update(&scene, &data);
        }
        let avg_ms = start.elapsed().as_secs_f64() * 1000.0 / iterations as f64;

        println!("Effects: {}", count);
        println!("-----------------------");
        println!("  update: {:.3} ms/frame", avg_ms);
        println!("  max FPS (lighting only): {:.1}", 1000.0 / avg_ms);
        println!();
    }

    // Glow synthesis is the one-time cost when sprites appear, e.g. on a map change
    println!("=== Glow Synthesis (map load) ===\n");
    let radii: Vec<i32> = (0..64).map(|i| 32 + (i % 8) * 16).collect();
    let color = Color::rgb(255, 150, 60);

    let start = Instant::now();
    for _ in 0..iterations {
        let _sprites: Vec<_> = radii
            .iter()
            .map(|&r| synthesize_glow(color, r, None, config.glow_oversize))
            .collect();
    }
    let avg_sequential_ms = start.elapsed().as_secs_f64() * 1000.0 / iterations as f64;

    let start = Instant::now();
    for _ in 0..iterations {
        let _sprites: Vec<_> = radii
            .par_iter()
            .map(|&r| synthesize_glow(color, r, None, config.glow_oversize))
            .collect();
    }
    let avg_parallel_ms = start.elapsed().as_secs_f64() * 1000.0 / iterations as f64;

    println!("{} sprites", radii.len());
    println!("-----------------------");
    println!("  Sequential:     {:.3} ms/iter", avg_sequential_ms);
    println!("  Parallel (rayon): {:.3} ms/iter", avg_parallel_ms);
    println!("  Speedup: {:.2}x", avg_sequential_ms / avg_parallel_ms);
}

fn run_dump(path: &str, data_path: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let data = match data_path {
        Some(data_path) => LightingData::from_file(data_path)?,
        None => demo_catalog()?,
    };
    let mut scene = Scene::outdoor(1, true);
    scene.frame_count = scene.frame_rate / 2;
    let lighting = Lighting::new(LightingConfig::default(), &scene, &data)?;
    match lighting.mask() {
        Some(mask) => {
            mask.save_pam(path)?;
            log::info!("Saved {}x{} mask to {}", mask.width(), mask.height(), path);
        }
        None => log::warn!("Engine has no mask to save"),
    }
    Ok(())
}

fn run_interactive() {
    let config = ViewerConfig::default();

    match InteractiveViewer::new(config) {
        Ok(mut viewer) => {
            if let Err(e) = viewer.run() {
                log::error!("Error: {}", e);
            }
        }
        Err(e) => {
            log::error!("Failed to create viewer: {}", e);
        }
    }
}

//! Interactive lighting viewer - a small tile scene driven by the engine

use crate::bitmap::Bitmap;
use crate::color::Color;
use crate::compositor::Compositor;
use crate::config::{ConfigError, LightingConfig};
use crate::data::LightingData;
use crate::effect::{EntityId, LightEffect};
use crate::engine::Lighting;
use crate::scene::Scene;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use thiserror::Error;

const PLAYER: EntityId = EntityId(1);
const PAN_STEP: i32 = 16;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("window init failed: {0}")]
    WindowInit(String),
    #[error("window update failed: {0}")]
    WindowUpdate(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Configuration for the interactive viewer
#[derive(Clone)]
pub struct ViewerConfig {
    pub lighting: LightingConfig,
    /// First map shown
    pub start_map: u32,
    pub start_night: bool,
    /// Color of torches placed with the mouse
    pub torch_color: Color,
    pub torch_radius: i32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            lighting: LightingConfig::default(),
            start_map: 1,
            start_night: true,
            torch_color: Color::rgb(255, 160, 70), // Warm torch color
            torch_radius: 56,
        }
    }
}

/// Lighting tables used by the demo, with a generated sunbeam image
pub fn demo_catalog() -> Result<LightingData, ConfigError> {
    let mut data = LightingData::from_toml_str(include_str!("demo.toml"))?;
    data.insert_image("beam", beam_image(40, 72));
    Ok(data)
}

/// Vertical beam whose alpha fades from the middle column outwards
fn beam_image(width: usize, height: usize) -> Bitmap {
    let mut bmp = Bitmap::new(width, height);
    let mid = width as f32 / 2.0;
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let t = ((x as f32 + 0.5 - mid).abs() / mid).min(1.0);
            bmp.set_pixel(x, y, Color::new(0, 0, 0, (255.0 * t) as u8));
        }
    }
    bmp
}

/// Interactive viewer for the lighting engine
pub struct InteractiveViewer {
    config: ViewerConfig,
    catalog: LightingData,
    scene: Scene,
    lighting: Lighting,
    compositor: Compositor,
    window: Window,
    torches: u32,
}

impl InteractiveViewer {
    pub fn new(config: ViewerConfig) -> Result<Self, ViewerError> {
        let (w, h) = (config.lighting.screen_width, config.lighting.screen_height);
        let window = Window::new(
            "Tile Lighting - Interactive Viewer (ESC to exit)",
            w,
            h,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| ViewerError::WindowInit(e.to_string()))?;

        let catalog = demo_catalog()?;
        let mut scene = Scene::outdoor(config.start_map, config.start_night);
        scene.place_entity(PLAYER, 0, 0);

        let mut lighting = Lighting::new(config.lighting.clone(), &scene, &catalog)?;
        lighting.attach(&config.lighting.follower_id, PLAYER);

        Ok(Self {
            catalog,
            scene,
            lighting,
            compositor: Compositor::new(w, h),
            window,
            torches: 0,
            config,
        })
    }

    pub fn run(&mut self) -> Result<(), ViewerError> {
        self.window.set_target_fps(self.scene.frame_rate as usize);
        let mut lights_visible = true;

        println!("=== Interactive Lighting Viewer ===");
        println!("Controls:");
        println!("  Mouse      - Move the follower light");
        println!("  Left Click - Place a torch");
        println!("  Arrows     - Pan the camera");
        println!("  N          - Toggle day/night");
        println!("  O          - Toggle outdoor");
        println!("  F          - Toggle forest flag");
        println!("  1/2/3      - Village / cave / inactive map");
        println!("  K          - Flick all torches");
        println!("  H          - Hide/show all lighting layers");
        println!("  ESC        - Exit");
        println!();

        while self.window.is_open() && !self.window.is_key_down(Key::Escape) {
            self.handle_keys(&mut lights_visible);
            self.handle_mouse();

            self.scene.tick();
            self.lighting.update(&self.scene, &self.catalog);
            if self.scene.frame_count % self.scene.frame_rate == 0 {
                self.refresh_title();
            }

            self.draw_tiles();
            let list = self.lighting.display_list();
            self.compositor.draw(&list);

            self.window
                .update_with_buffer(
                    self.compositor.buffer(),
                    self.compositor.width(),
                    self.compositor.height(),
                )
                .map_err(|e| ViewerError::WindowUpdate(e.to_string()))?;
        }

        self.lighting.dispose();
        Ok(())
    }

    fn handle_keys(&mut self, lights_visible: &mut bool) {
        if self.window.is_key_pressed(Key::N, KeyRepeat::No) {
            let night = !self.scene.night;
            self.scene.set_night(night);
            println!("Night: {}", night);
        }
        if self.window.is_key_pressed(Key::O, KeyRepeat::No) {
            self.scene.outdoor = !self.scene.outdoor;
            println!("Outdoor: {}", self.scene.outdoor);
        }
        if self.window.is_key_pressed(Key::F, KeyRepeat::No) {
            self.scene.forest = !self.scene.forest;
            println!("Forest: {}", self.scene.forest);
        }
        for (key, map) in [(Key::Key1, 1), (Key::Key2, 2), (Key::Key3, 3)] {
            if self.window.is_key_pressed(key, KeyRepeat::No) {
                self.switch_map(map);
            }
        }
        if self.window.is_key_pressed(Key::K, KeyRepeat::No) {
            for i in 0..self.torches {
                self.lighting.flick(&format!("torch_user{}", i));
            }
            self.lighting.flick("torch1");
            self.lighting.flick("torch2");
        }
        if self.window.is_key_pressed(Key::H, KeyRepeat::No) {
            *lights_visible = !*lights_visible;
            if *lights_visible {
                self.lighting.show_all();
            } else {
                self.lighting.hide_all();
            }
        }

        let pan = [
            (Key::Left, -PAN_STEP, 0),
            (Key::Right, PAN_STEP, 0),
            (Key::Up, 0, -PAN_STEP),
            (Key::Down, 0, PAN_STEP),
        ];
        let sub = self.lighting.config().subpixels;
        for (key, dx, dy) in pan {
            if self.window.is_key_pressed(key, KeyRepeat::Yes) {
                self.scene.display_x += dx * sub;
                self.scene.display_y += dy * sub;
            }
        }
    }

    fn switch_map(&mut self, map: u32) {
        self.scene.map_id = map;
        self.scene.cave = map == 2;
        self.scene.outdoor = map != 2;
        self.torches = 0;
        // The rebuild happens on the next update; re-attach right after it
        self.lighting.update(&self.scene, &self.catalog);
        let follower = self.lighting.config().follower_id.clone();
        self.lighting.attach(&follower, PLAYER);
        println!("Map {} (active: {})", map, self.lighting.is_active());
    }

    fn handle_mouse(&mut self) {
        let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Clamp) else {
            return;
        };
        let sub = self.lighting.config().subpixels;
        let tile = self.lighting.config().tile_size;
        let map_x = mx as i32 + self.scene.display_x / sub;
        let map_y = my as i32 + self.scene.display_y / sub;

        // Inverse of the attachment offset so the light centers on the cursor
        self.scene.place_entity(PLAYER, (map_x - tile / 2) * sub, (map_y - tile + 24) * sub);

        if self.window.get_mouse_down(MouseButton::Left) {
            let id = format!("torch_user{}", self.torches);
            let last = self.torches.checked_sub(1).map(|i| format!("torch_user{}", i));
            // One torch per press: skip while the cursor stays on the last one
            if let Some(prev) = last.and_then(|k| self.lighting.get(&k).map(|e| (e.x, e.y))) {
                if (prev.0 - map_x).abs() < tile && (prev.1 - map_y).abs() < tile {
                    return;
                }
            }
            self.lighting.add_effect(
                LightEffect::circle(id.as_str(), map_x, map_y, self.config.torch_radius)
                    .with_color(self.config.torch_color),
            );
            self.torches += 1;
        }
    }

    fn refresh_title(&mut self) {
        let glow = self.lighting.glow().map(|g| g.len()).unwrap_or(0);
        let title = format!(
            "Tile Lighting - map {} | {} | {} effects | {} glows",
            self.lighting.map_id(),
            if self.scene.night { "night" } else { "day" },
            self.lighting.effects().count(),
            glow
        );
        self.window.set_title(&title);
    }

    /// Checkerboard tiles scrolled with the camera
    fn draw_tiles(&mut self) {
        let (light, dark) = if self.scene.cave {
            (Color::rgb(96, 88, 80), Color::rgb(72, 66, 60))
        } else {
            (Color::rgb(110, 170, 90), Color::rgb(90, 150, 75))
        };
        let sub = self.lighting.config().subpixels;
        let tile = self.lighting.config().tile_size;
        let (ox, oy) = (self.scene.display_x / sub, self.scene.display_y / sub);
        let width = self.compositor.width();
        let (light, dark) = (light.to_rgb_u32(), dark.to_rgb_u32());

        for (y, row) in self.compositor.buffer_mut().chunks_mut(width).enumerate() {
            let ty = (y as i32 + oy).div_euclid(tile);
            for (x, pixel) in row.iter_mut().enumerate() {
                let tx = (x as i32 + ox).div_euclid(tile);
                *pixel = if (tx + ty) % 2 == 0 { light } else { dark };
            }
        }
    }
}

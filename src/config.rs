//! Engine tunables and configuration errors

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse lighting config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid lighting config: {0}")]
    Invalid(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration for the lighting engine
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Visible screen size in pixels
    pub screen_width: usize,
    pub screen_height: usize,
    /// Extra margin around the mask so camera panning never exposes an edge
    pub padding: i32,
    /// Number of concentric mask layers drawn per effect
    pub layers: u32,
    /// Size ratio between two consecutive layers
    pub fade_factor: f32,
    /// Vertical sampling step of the circle scan fill, in rows
    pub resolution: i32,
    /// Mask pulse amplitude (fraction of the capped size)
    pub anim_mult: f32,
    /// Glow sprite zoom amplitude
    pub glow_pulse: f32,
    /// Growth of shapes across layers is capped at this size
    pub growth_cap: i32,
    /// Image stretch is capped at this size
    pub stretch_cap: i32,
    /// Extra growth multiplier for rectangles
    pub rect_expansion: f32,
    /// Offset applied to rect and image origins
    pub shape_offset: i32,
    /// Glow bitmap radius relative to the effect radius
    pub glow_oversize: f32,
    /// Radius of the transparent hole at the center of the follower glow
    pub follower_hollow: f32,
    /// Effect that is always visible and gets a hollow glow
    pub follower_id: String,
    /// Map coordinate units per screen pixel
    pub subpixels: i32,
    /// Tile size in pixels
    pub tile_size: i32,
    /// Frames a flick keeps the glow dark
    pub flick_frames: u32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            screen_width: 512,
            screen_height: 384,
            padding: 32,
            layers: 3,
            fade_factor: 0.9,
            resolution: 2,
            anim_mult: 0.05,
            glow_pulse: 0.1,
            growth_cap: 160,
            stretch_cap: 96,
            rect_expansion: 2.0,
            shape_offset: 16,
            glow_oversize: 1.5,
            follower_hollow: 16.0,
            follower_id: "follower_light".to_string(),
            subpixels: 4,
            tile_size: 32,
            flick_frames: 6,
        }
    }
}

impl LightingConfig {
    /// Parse and validate a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: LightingConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layers == 0 {
            return Err(ConfigError::Invalid("layers must be at least 1".into()));
        }
        if !(self.fade_factor > 0.0 && self.fade_factor <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "fade_factor must be in (0, 1], got {}",
                self.fade_factor
            )));
        }
        if self.resolution < 1 {
            return Err(ConfigError::Invalid("resolution must be at least 1".into()));
        }
        if self.subpixels < 1 {
            return Err(ConfigError::Invalid("subpixels must be at least 1".into()));
        }
        if self.padding < 0 {
            return Err(ConfigError::Invalid("padding must not be negative".into()));
        }
        Ok(())
    }

    /// Mask and overlay bitmap size: screen plus padding on every side
    pub fn mask_size(&self) -> (usize, usize) {
        let pad = 2 * self.padding as usize;
        (self.screen_width + pad, self.screen_height + pad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LightingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mask_size(), (576, 448));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = LightingConfig::from_toml_str("layers = 4\nscreen_width = 320\n").unwrap();
        assert_eq!(config.layers, 4);
        assert_eq!(config.screen_width, 320);
        assert_eq!(config.padding, 32);
        assert_eq!(config.follower_id, "follower_light");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            LightingConfig::from_toml_str("layers = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            LightingConfig::from_toml_str("fade_factor = 1.5"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            LightingConfig::from_toml_str("layers = \"three\""),
            Err(ConfigError::Parse(_))
        ));
    }
}

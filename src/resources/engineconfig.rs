//! Engine configuration resource.
//!
//! Manages engine settings loaded from an INI configuration file. Provides
//! defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [viewport]
//! width = 1024
//! height = 768
//!
//! [ui]
//! pixel_perfect = false
//!
//! [time]
//! time_scale = 1.0
//!
//! [sheep]
//! instruction_budget = 100000
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

use crate::sheep::vm::DEFAULT_INSTRUCTION_BUDGET;

/// Default safe values for startup
const DEFAULT_VIEWPORT_WIDTH: u32 = 1024;
const DEFAULT_VIEWPORT_HEIGHT: u32 = 768;
const DEFAULT_PIXEL_PERFECT: bool = false;
const DEFAULT_TIME_SCALE: f32 = 1.0;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Engine configuration resource.
///
/// Read once at startup; [`Scene::new`](crate::scene::Scene::new) seeds the
/// viewport and world time from it, and the Sheep VM reads the instruction
/// budget.
#[derive(Resource, Debug, Clone)]
pub struct EngineConfig {
    /// Viewport width in pixels, used as the root UI rect.
    pub viewport_width: u32,
    /// Viewport height in pixels.
    pub viewport_height: u32,
    /// Snap new rect transforms to whole pixels.
    pub pixel_perfect: bool,
    /// Global time multiplier.
    pub time_scale: f32,
    /// Maximum instructions a Sheep thread may run per update before it is
    /// forced to yield.
    pub instruction_budget: u32,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            pixel_perfect: DEFAULT_PIXEL_PERFECT,
            time_scale: DEFAULT_TIME_SCALE,
            instruction_budget: DEFAULT_INSTRUCTION_BUDGET,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [viewport] section
        if let Some(width) = config.getuint("viewport", "width").ok().flatten() {
            self.viewport_width = width as u32;
        }
        if let Some(height) = config.getuint("viewport", "height").ok().flatten() {
            self.viewport_height = height as u32;
        }

        // [ui] section
        if let Some(pixel_perfect) = config.getbool("ui", "pixel_perfect").ok().flatten() {
            self.pixel_perfect = pixel_perfect;
        }

        // [time] section
        if let Some(time_scale) = config.getfloat("time", "time_scale").ok().flatten() {
            self.time_scale = time_scale as f32;
        }

        // [sheep] section
        if let Some(budget) = config.getuint("sheep", "instruction_budget").ok().flatten() {
            self.instruction_budget = budget.max(1) as u32;
        }

        info!(
            "Loaded config: {}x{} viewport, pixel_perfect={}, time_scale={}, sheep budget={}",
            self.viewport_width,
            self.viewport_height,
            self.pixel_perfect,
            self.time_scale,
            self.instruction_budget
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("viewport", "width", Some(self.viewport_width.to_string()));
        config.set("viewport", "height", Some(self.viewport_height.to_string()));
        config.set("ui", "pixel_perfect", Some(self.pixel_perfect.to_string()));
        config.set("time", "time_scale", Some(self.time_scale.to_string()));
        config.set(
            "sheep",
            "instruction_budget",
            Some(self.instruction_budget.to_string()),
        );

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Get the viewport size.
    pub fn viewport_size(&self) -> (u32, u32) {
        (self.viewport_width, self.viewport_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("gengine_{}_{}.ini", name, std::process::id()))
    }

    #[test]
    fn defaults_when_file_missing() {
        let mut config = EngineConfig::with_path(temp_path("missing"));
        assert!(config.load_from_file().is_err());
        assert_eq!(config.viewport_size(), (1024, 768));
        assert_eq!(config.instruction_budget, DEFAULT_INSTRUCTION_BUDGET);
    }

    #[test]
    fn save_then_load_keeps_values() {
        let path = temp_path("roundtrip");
        let mut config = EngineConfig::with_path(&path);
        config.viewport_width = 640;
        config.viewport_height = 480;
        config.pixel_perfect = true;
        config.time_scale = 0.5;
        config.instruction_budget = 42;
        config.save_to_file().unwrap();

        let mut loaded = EngineConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        assert_eq!(loaded.viewport_size(), (640, 480));
        assert!(loaded.pixel_perfect);
        assert!((loaded.time_scale - 0.5).abs() < 1e-6);
        assert_eq!(loaded.instruction_budget, 42);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let path = temp_path("partial");
        std::fs::write(&path, "[viewport]\nwidth = 800\n").unwrap();
        let mut config = EngineConfig::with_path(&path);
        config.load_from_file().unwrap();
        assert_eq!(config.viewport_size(), (800, 768));
        assert!(!config.pixel_perfect);
        let _ = std::fs::remove_file(path);
    }
}

//! Player preferences
//!
//! Persisted separately from the game config as a small JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Silence everything
    pub muted: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,

    // === Visual Effects ===
    /// Jump exhaust particles
    pub particles: bool,

    // === Accessibility ===
    /// Reduced motion (no hyperdrive during planet changes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            muted: false,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,

            particles: true,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults on any problem
    pub fn load(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Using default settings");
                return Self::default();
            }
            Err(e) => {
                log::warn!("Failed to read settings {}: {e}", path.display());
                return Self::default();
            }
        };

        match serde_json::from_str::<Settings>(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings.sanitized()
            }
            Err(e) => {
                log::warn!("Ignoring malformed settings {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Save settings
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Volumes clamped to 0.0 - 1.0
    pub fn sanitized(mut self) -> Self {
        let clamp = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        self.master_volume = clamp(self.master_volume);
        self.sfx_volume = clamp(self.sfx_volume);
        self.music_volume = clamp(self.music_volume);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join("galactic_flappy_settings_test.json");
        let settings = Settings {
            muted: true,
            reduced_motion: true,
            music_volume: 0.25,
            ..Default::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_malformed_falls_back() {
        let path = std::env::temp_dir().join("galactic_flappy_settings_bad_test.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_volumes_are_clamped() {
        let settings: Settings =
            serde_json::from_str(r#"{ "master_volume": 3.0, "sfx_volume": -1.0 }"#).unwrap();
        let settings = settings.sanitized();
        assert_eq!(settings.master_volume, 1.0);
        assert_eq!(settings.sfx_volume, 0.0);
        assert_eq!(settings.music_volume, 0.7);
    }
}

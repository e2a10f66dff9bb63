//! Data-driven game balance
//!
//! Every tuning constant lives in `GameConfig`, loaded from JSON with
//! defaults for anything omitted. `Rules` is the validated form the
//! simulation runs on; building it is the startup validation step.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::{CollisionGeometry, ProfileTable, ProgressionConfig, Tier};

/// Physics for one planet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanetTuning {
    /// Downward acceleration per tick (negative)
    pub gravity: f32,
    /// Absolute upward velocity applied by a jump
    pub jump_impulse: f32,
    /// Obstacle scroll per tick
    pub scroll_speed: f32,
}

impl PlanetTuning {
    pub const MOON: Self = Self {
        gravity: -0.045,
        jump_impulse: 0.11,
        scroll_speed: 0.08,
    };
    pub const EARTH: Self = Self {
        gravity: -0.08,
        jump_impulse: 0.16,
        scroll_speed: 0.12,
    };
    pub const JUPITER: Self = Self {
        gravity: -0.18,
        jump_impulse: 0.28,
        scroll_speed: 0.16,
    };
}

/// Complete tuning for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === Planets ===
    pub moon: PlanetTuning,
    pub earth: PlanetTuning,
    pub jupiter: PlanetTuning,

    // === Spawning ===
    pub base_spawn_rate: f32,
    pub spawn_speed_scale: f32,
    pub gap_min: f32,
    pub gap_max: f32,
    pub gap_spread: f32,
    pub spawn_x: f32,
    pub cleanup_x: f32,
    pub pipe_width: f32,

    // === Physics ===
    pub bird_x: f32,
    pub floor_y: f32,
    pub ceiling_y: f32,
    pub gravity_scale: f32,
    pub collision_tolerance: f32,

    // === Progression ===
    pub score_per_tier: u32,
    pub tier_thresholds: [u32; 2],
    /// Ticks to hold a level transition before resuming on its own (0 = wait for resume)
    pub transition_hold_ticks: u32,

    // === Ambience ===
    pub comet_chance: f32,
    pub background_bird_chance: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            moon: PlanetTuning::MOON,
            earth: PlanetTuning::EARTH,
            jupiter: PlanetTuning::JUPITER,

            base_spawn_rate: PIPE_SPAWN_RATE,
            spawn_speed_scale: SPAWN_SPEED_SCALE,
            gap_min: PIPE_GAP_MIN,
            gap_max: PIPE_GAP_MAX,
            gap_spread: PIPE_GAP_SPREAD,
            spawn_x: PIPE_SPAWN_X,
            cleanup_x: PIPE_CLEANUP_X,
            pipe_width: PIPE_WIDTH,

            bird_x: BIRD_X,
            floor_y: PLAYFIELD_FLOOR,
            ceiling_y: PLAYFIELD_CEILING,
            gravity_scale: GRAVITY_SCALE,
            collision_tolerance: COLLISION_TOLERANCE,

            score_per_tier: PIPES_PER_LEVEL,
            tier_thresholds: [EARTH_THRESHOLD, JUPITER_THRESHOLD],
            transition_hold_ticks: 0,

            comet_chance: COMET_CHANCE,
            background_bird_chance: BACKGROUND_BIRD_CHANCE,
        }
    }
}

impl GameConfig {
    /// Planet tuning for a tier
    pub fn planet(&self, tier: Tier) -> &PlanetTuning {
        match tier {
            Tier::Moon => &self.moon,
            Tier::Earth => &self.earth,
            Tier::Jupiter => &self.jupiter,
        }
    }

    /// Load from a JSON file. A missing file yields the defaults; an unreadable
    /// or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Check every invariant the simulation relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        Rules::new(self.clone()).map(|_| ())
    }

    fn validate_ranges(&self) -> Result<(), ConfigError> {
        let finite = [
            self.gap_min,
            self.gap_max,
            self.gap_spread,
            self.spawn_x,
            self.cleanup_x,
            self.pipe_width,
            self.bird_x,
            self.floor_y,
            self.ceiling_y,
            self.gravity_scale,
            self.collision_tolerance,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::InvalidRange {
                field: "geometry",
                reason: "values must be finite",
            });
        }
        if self.gap_min < 0.0 || self.gap_max < self.gap_min {
            return Err(ConfigError::InvalidRange {
                field: "gap_min/gap_max",
                reason: "gap range must be non-negative and ordered",
            });
        }
        if self.gap_spread < 0.0 {
            return Err(ConfigError::InvalidRange {
                field: "gap_spread",
                reason: "must not be negative",
            });
        }
        if self.floor_y >= self.ceiling_y {
            return Err(ConfigError::InvalidRange {
                field: "floor_y/ceiling_y",
                reason: "floor must be below ceiling",
            });
        }
        if self.cleanup_x >= self.bird_x || self.bird_x >= self.spawn_x {
            return Err(ConfigError::InvalidRange {
                field: "cleanup_x/bird_x/spawn_x",
                reason: "must satisfy cleanup_x < bird_x < spawn_x",
            });
        }
        if self.pipe_width <= 0.0 {
            return Err(ConfigError::InvalidRange {
                field: "pipe_width",
                reason: "must be positive",
            });
        }
        if self.gravity_scale <= 0.0 {
            return Err(ConfigError::InvalidRange {
                field: "gravity_scale",
                reason: "must be positive",
            });
        }
        if self.collision_tolerance < 0.0 {
            return Err(ConfigError::InvalidRange {
                field: "collision_tolerance",
                reason: "must not be negative",
            });
        }
        for (field, value) in [
            ("comet_chance", self.comet_chance),
            ("background_bird_chance", self.background_bird_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidChance { field, value });
            }
        }
        Ok(())
    }
}

/// Validated configuration, ready for the simulation
#[derive(Debug, Clone)]
pub struct Rules {
    pub config: GameConfig,
    pub profiles: ProfileTable,
    pub progression: ProgressionConfig,
    pub geometry: CollisionGeometry,
}

impl Rules {
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate_ranges()?;
        let profiles = ProfileTable::from_config(&config)?;
        let progression = ProgressionConfig::new(config.score_per_tier, config.tier_thresholds)?;
        let geometry = CollisionGeometry::from_config(&config);
        Ok(Self {
            config,
            profiles,
            progression,
            geometry,
        })
    }
}

impl Default for Rules {
    fn default() -> Self {
        let config = GameConfig::default();
        Self {
            profiles: ProfileTable::reference(),
            progression: ProgressionConfig::reference(),
            geometry: CollisionGeometry::from_config(&config),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_monotonic_thresholds() {
        let config = GameConfig {
            tier_thresholds: [40, 20],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonMonotonicThresholds { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_score_per_tier() {
        let config = GameConfig {
            score_per_tier: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidScorePerTier)));
    }

    #[test]
    fn test_rejects_upward_gravity() {
        let mut config = GameConfig::default();
        config.earth.gravity = 0.08;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProfile {
                tier: Tier::Earth,
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_inverted_gap_range() {
        let config = GameConfig {
            gap_min: 8.0,
            gap_max: 4.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRange { .. })));
    }

    #[test]
    fn test_rejects_bad_chance() {
        let config = GameConfig {
            comet_chance: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidChance { .. })));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GameConfig = serde_json::from_str(r#"{ "score_per_tier": 3 }"#).unwrap();
        assert_eq!(config.score_per_tier, 3);
        assert_eq!(config.moon, PlanetTuning::MOON);
        assert_eq!(config.tier_thresholds, [EARTH_THRESHOLD, JUPITER_THRESHOLD]);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let path = std::env::temp_dir().join("galactic_flappy_missing_config_test.json");
        let _ = std::fs::remove_file(&path);
        let config = GameConfig::load(&path).unwrap();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn test_load_malformed_file_is_error() {
        let path = std::env::temp_dir().join("galactic_flappy_malformed_config_test.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(GameConfig::load(&path), Err(ConfigError::Parse { .. })));
        let _ = std::fs::remove_file(&path);
    }
}

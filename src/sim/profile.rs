//! Difficulty profiles per planet tier
//!
//! Pure lookup: a tier maps to the physics and pacing parameters the
//! simulation uses while that tier is active.

use serde::{Deserialize, Serialize};

use crate::config::{GameConfig, PlanetTuning};
use crate::error::ConfigError;

/// Planet the run is currently on. Ordered by difficulty.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Tier {
    #[default]
    Moon,
    Earth,
    Jupiter,
}

/// Music mode hint for the audio layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MusicMode {
    Ambient,
    Melodic,
    Intense,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Moon, Tier::Earth, Tier::Jupiter];

    pub fn index(self) -> usize {
        match self {
            Tier::Moon => 0,
            Tier::Earth => 1,
            Tier::Jupiter => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Moon => "MOON",
            Tier::Earth => "EARTH",
            Tier::Jupiter => "JUPITER",
        }
    }

    pub fn music_mode(self) -> MusicMode {
        match self {
            Tier::Moon => MusicMode::Ambient,
            Tier::Earth => MusicMode::Melodic,
            Tier::Jupiter => MusicMode::Intense,
        }
    }
}

/// Physics and pacing for one tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub gravity: f32,
    pub jump_impulse: f32,
    pub scroll_speed: f32,
    pub spawn_period_ticks: u32,
}

/// Obstacle spawn period: `base / (speed * k)`, floored, at least one tick.
///
/// Faster tiers spawn more often so the spacing between obstacles stays
/// roughly constant in world units.
pub fn spawn_period_ticks(base_spawn_rate: f32, scroll_speed: f32, speed_scale: f32) -> u32 {
    // f64 keeps e.g. 120 / (0.08 * 10) from landing a hair under 150
    let period =
        (base_spawn_rate as f64 / (scroll_speed as f64 * speed_scale as f64) + 1e-6).floor();
    if period.is_finite() && period >= 1.0 {
        period.min(u32::MAX as f64) as u32
    } else {
        1
    }
}

/// One profile per tier, built once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileTable {
    profiles: [DifficultyProfile; 3],
}

impl ProfileTable {
    /// Validate the planet tuning and derive spawn periods
    pub fn from_config(config: &GameConfig) -> Result<Self, ConfigError> {
        if !(config.base_spawn_rate.is_finite() && config.base_spawn_rate > 0.0) {
            return Err(ConfigError::InvalidRange {
                field: "base_spawn_rate",
                reason: "must be positive",
            });
        }
        if !(config.spawn_speed_scale.is_finite() && config.spawn_speed_scale > 0.0) {
            return Err(ConfigError::InvalidRange {
                field: "spawn_speed_scale",
                reason: "must be positive",
            });
        }
        for tier in Tier::ALL {
            validate_tuning(tier, config.planet(tier))?;
        }
        Ok(Self::build(config))
    }

    /// Profiles for the reference tuning
    pub fn reference() -> Self {
        Self::build(&GameConfig::default())
    }

    fn build(config: &GameConfig) -> Self {
        let profile = |tier: Tier| {
            let tuning = config.planet(tier);
            DifficultyProfile {
                gravity: tuning.gravity,
                jump_impulse: tuning.jump_impulse,
                scroll_speed: tuning.scroll_speed,
                spawn_period_ticks: spawn_period_ticks(
                    config.base_spawn_rate,
                    tuning.scroll_speed,
                    config.spawn_speed_scale,
                ),
            }
        };
        Self {
            profiles: [profile(Tier::Moon), profile(Tier::Earth), profile(Tier::Jupiter)],
        }
    }

    /// Total over every tier
    #[inline]
    pub fn profile_for(&self, tier: Tier) -> &DifficultyProfile {
        &self.profiles[tier.index()]
    }
}

fn validate_tuning(tier: Tier, tuning: &PlanetTuning) -> Result<(), ConfigError> {
    let fail = |reason: &'static str| -> Result<(), ConfigError> {
        Err(ConfigError::InvalidProfile { tier, reason })
    };
    if !(tuning.gravity.is_finite() && tuning.gravity < 0.0) {
        return fail("gravity must be negative");
    }
    if !(tuning.jump_impulse.is_finite() && tuning.jump_impulse > 0.0) {
        return fail("jump impulse must be positive");
    }
    if !(tuning.scroll_speed.is_finite() && tuning.scroll_speed > 0.0) {
        return fail("scroll speed must be positive");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_spawn_periods() {
        let table = ProfileTable::reference();
        assert_eq!(table.profile_for(Tier::Moon).spawn_period_ticks, 150);
        assert_eq!(table.profile_for(Tier::Earth).spawn_period_ticks, 100);
        assert_eq!(table.profile_for(Tier::Jupiter).spawn_period_ticks, 75);
    }

    #[test]
    fn test_spawn_period_floors_to_one() {
        assert_eq!(spawn_period_ticks(1.0, 50.0, 10.0), 1);
        assert_eq!(spawn_period_ticks(120.0, 0.07, 10.0), 171);
    }

    #[test]
    fn test_profiles_get_harder() {
        let table = ProfileTable::reference();
        let moon = table.profile_for(Tier::Moon);
        let jupiter = table.profile_for(Tier::Jupiter);
        assert!(jupiter.gravity < moon.gravity);
        assert!(jupiter.scroll_speed > moon.scroll_speed);
        for tier in Tier::ALL {
            let p = table.profile_for(tier);
            assert!(p.gravity < 0.0 && p.jump_impulse > 0.0 && p.scroll_speed > 0.0);
        }
    }

    #[test]
    fn test_music_modes() {
        assert_eq!(Tier::Moon.music_mode(), MusicMode::Ambient);
        assert_eq!(Tier::Earth.music_mode(), MusicMode::Melodic);
        assert_eq!(Tier::Jupiter.music_mode(), MusicMode::Intense);
    }
}

//! Score, multiplier and tier progression

use serde::{Deserialize, Serialize};

use super::profile::Tier;
use crate::consts::{EARTH_THRESHOLD, JUPITER_THRESHOLD, PIPES_PER_LEVEL};
use crate::error::ConfigError;

/// Validated progression rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionConfig {
    score_per_tier: u32,
    /// Scores at which Earth and Jupiter begin
    thresholds: [u32; 2],
}

impl ProgressionConfig {
    pub fn new(score_per_tier: u32, thresholds: [u32; 2]) -> Result<Self, ConfigError> {
        if score_per_tier == 0 {
            return Err(ConfigError::InvalidScorePerTier);
        }
        if thresholds[0] == 0 || thresholds[1] <= thresholds[0] {
            return Err(ConfigError::NonMonotonicThresholds { thresholds });
        }
        Ok(Self {
            score_per_tier,
            thresholds,
        })
    }

    pub fn reference() -> Self {
        Self {
            score_per_tier: PIPES_PER_LEVEL,
            thresholds: [EARTH_THRESHOLD, JUPITER_THRESHOLD],
        }
    }

    pub fn score_per_tier(&self) -> u32 {
        self.score_per_tier
    }

    pub fn thresholds(&self) -> [u32; 2] {
        self.thresholds
    }

    /// Step function of score
    pub fn tier_for_score(&self, score: u32) -> Tier {
        if score >= self.thresholds[1] {
            Tier::Jupiter
        } else if score >= self.thresholds[0] {
            Tier::Earth
        } else {
            Tier::Moon
        }
    }

    #[inline]
    pub fn multiplier_for_score(&self, score: u32) -> u32 {
        score / self.score_per_tier + 1
    }

    /// Count one pass. The returned flag is true when the tier changed.
    pub fn on_obstacle_passed(&self, state: ProgressionState) -> (ProgressionState, bool) {
        let score = state.score.saturating_add(1);
        // Never regress, even if thresholds were swapped mid-run
        let tier = self.tier_for_score(score).max(state.tier);
        let next = ProgressionState {
            score,
            tier,
            multiplier: self.multiplier_for_score(score),
        };
        (next, tier != state.tier)
    }
}

/// Progress of the current run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionState {
    pub score: u32,
    pub tier: Tier,
    pub multiplier: u32,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            score: 0,
            tier: Tier::Moon,
            multiplier: 1,
        }
    }
}

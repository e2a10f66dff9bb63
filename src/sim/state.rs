//! Game state and core simulation types
//!
//! Everything one tick reads or writes lives in `GameState`. Presentation
//! gets a `FrameSnapshot` copy; it never touches the pool directly.

use glam::{Vec2, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::physics::hover_offset;
use super::pool::EntityPool;
use super::profile::{DifficultyProfile, Tier};
use super::progression::ProgressionState;
use crate::config::Rules;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimPhase {
    /// Title screen: bird bobs, backdrop drifts, nothing scores
    Idle,
    /// Active gameplay
    Running,
    /// Planet change: physics and scroll hold, backdrop goes to hyperdrive
    Transition,
    /// Run ended, everything frozen for display
    Terminated,
}

/// Tick counters and the flags derived from the phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationClock {
    /// Ticks spent in `Running` this run (drives spawn cadence)
    pub tick_count: u64,
    /// Every tick, any phase (drives cosmetic animation)
    pub frame_count: u64,
    pub phase: SimPhase,
    /// Physics, scroll and scoring are held
    pub scoring_paused: bool,
    /// Backdrop keeps moving
    pub cosmetic_motion_enabled: bool,
    /// Ticks spent in the current transition
    pub transition_ticks: u32,
}

impl Default for SimulationClock {
    fn default() -> Self {
        let mut clock = Self {
            tick_count: 0,
            frame_count: 0,
            phase: SimPhase::Idle,
            scoring_paused: true,
            cosmetic_motion_enabled: true,
            transition_ticks: 0,
        };
        clock.enter(SimPhase::Idle);
        clock
    }
}

impl SimulationClock {
    /// Switch phase and update both flags
    pub fn enter(&mut self, phase: SimPhase) {
        self.phase = phase;
        let (scoring_paused, cosmetic_motion_enabled) = match phase {
            SimPhase::Idle => (true, true),
            SimPhase::Running => (false, true),
            SimPhase::Transition => (true, true),
            SimPhase::Terminated => (true, false),
        };
        self.scoring_paused = scoring_paused;
        self.cosmetic_motion_enabled = cosmetic_motion_enabled;
        self.transition_ticks = 0;
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase == SimPhase::Running
    }

    /// Cosmetic animation time in milliseconds
    pub fn frame_time_ms(&self) -> f32 {
        self.frame_count as f32 * crate::consts::FRAME_MS
    }
}

/// The player's bird. Its x is fixed by the rules.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlledObject {
    pub position_y: f32,
    pub velocity_y: f32,
    /// Pitch, cosmetic only
    pub rotation: f32,
}

/// A pipe pair with a passable gap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub position_x: f32,
    pub gap_center_y: f32,
    pub gap_height: f32,
    /// Set once when the obstacle crosses the bird's x
    pub passed: bool,
    pub tier_at_spawn: Tier,
}

impl Obstacle {
    /// Lowest y of the top column
    #[inline]
    pub fn gap_top(&self) -> f32 {
        self.gap_center_y + self.gap_height / 2.0
    }

    /// Highest y of the bottom column
    #[inline]
    pub fn gap_bottom(&self) -> f32 {
        self.gap_center_y - self.gap_height / 2.0
    }
}

/// Jump exhaust
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// 0-1, decreases every tick
    pub life: f32,
}

/// Backdrop body types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecorativeKind {
    /// Earth seen from the Moon
    Earth,
    /// Jupiter's moons
    Moon,
    /// Earth sky clouds, scroll with the pipes
    Cloud,
    Comet,
    /// Background bird flock on Earth
    Bird,
}

impl DecorativeKind {
    /// Orbiting bodies loop from one edge to the other instead of leaving
    pub fn wraps(self) -> bool {
        matches!(self, DecorativeKind::Earth | DecorativeKind::Moon)
    }

    /// Spawned by chance, removed once offscreen
    pub fn is_transient(self) -> bool {
        matches!(self, DecorativeKind::Comet | DecorativeKind::Bird)
    }
}

/// A purely cosmetic backdrop body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecorativeBody {
    pub kind: DecorativeKind,
    /// z is scene depth, presentation only
    pub pos: Vec3,
    pub vel: Vec2,
    pub rotation: f32,
    pub rotation_speed: f32,
    pub scale: f32,
}

/// Payload of a pooled entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Obstacle(Obstacle),
    Particle(Particle),
    Decorative(DecorativeBody),
}

/// A pooled entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub kind: EntityKind,
}

/// What ended the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionCause {
    /// Left the vertical playfield
    Boundary,
    /// Hit a pipe
    Obstacle,
}

/// Discrete outward signals, fire-and-forget
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Idle -> Running
    RunStarted { tier: Tier },
    /// A jump impulse was applied
    Jumped,
    ScoreChanged { score: u32 },
    /// Multiplier rose without a planet change
    MultiplierChanged { multiplier: u32 },
    TierChanged { tier: Tier, multiplier: u32 },
    /// Transition -> Running
    Resumed,
    GameOver { final_score: u32, cause: CollisionCause },
    /// Back to Idle with a fresh progression
    Reset,
}

/// Per-tick view for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub phase: SimPhase,
    pub bird_x: f32,
    pub bird: ControlledObject,
    pub progression: ProgressionState,
    pub entities: Vec<Entity>,
    pub star_rotation: f32,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rules: Rules,
    pub(crate) rng: Pcg32,
    pub clock: SimulationClock,
    pub bird: ControlledObject,
    pub pool: EntityPool,
    pub progression: ProgressionState,
    /// Star field spin, cosmetic
    pub star_rotation: f32,
    /// Skip the hyperdrive speed-up during transitions
    pub reduced_motion: bool,
    /// Spawn jump exhaust
    pub exhaust_enabled: bool,
}

impl GameState {
    /// Create an idle game with validated rules
    pub fn new(rules: Rules, seed: u64) -> Self {
        Self {
            seed,
            rules,
            rng: Pcg32::seed_from_u64(seed),
            clock: SimulationClock::default(),
            bird: ControlledObject::default(),
            pool: EntityPool::new(),
            progression: ProgressionState::default(),
            star_rotation: 0.0,
            reduced_motion: false,
            exhaust_enabled: true,
        }
    }

    /// Profile of the current tier
    #[inline]
    pub fn profile(&self) -> DifficultyProfile {
        *self.rules.profiles.profile_for(self.progression.tier)
    }

    #[inline]
    pub fn phase(&self) -> SimPhase {
        self.clock.phase
    }

    /// Idle -> Running. Returns false (and does nothing) from any other phase.
    pub fn start(&mut self) -> bool {
        if self.clock.phase != SimPhase::Idle {
            log::debug!("Ignoring start in {:?}", self.clock.phase);
            return false;
        }
        self.clock.tick_count = 0;
        self.clock.enter(SimPhase::Running);
        log::info!("Run started (seed {})", self.seed);
        true
    }

    /// Transition -> Running
    pub fn resume(&mut self) -> bool {
        if self.clock.phase != SimPhase::Transition {
            log::debug!("Ignoring resume in {:?}", self.clock.phase);
            return false;
        }
        self.clock.enter(SimPhase::Running);
        true
    }

    /// Running -> Transition on a planet change
    pub(crate) fn begin_transition(&mut self) {
        if self.clock.phase == SimPhase::Running {
            self.clock.enter(SimPhase::Transition);
        }
    }

    /// Running -> Terminated
    pub(crate) fn terminate(&mut self) {
        self.clock.enter(SimPhase::Terminated);
        log::info!(
            "Game over: score {} after {} ticks",
            self.progression.score,
            self.clock.tick_count
        );
    }

    /// Back to Idle from any phase: fresh progression, bird at rest, empty pool
    pub fn reset(&mut self) {
        self.progression = ProgressionState::default();
        self.bird = ControlledObject::default();
        self.pool.clear();
        self.clock.tick_count = 0;
        self.clock.enter(SimPhase::Idle);
        self.star_rotation = 0.0;
    }

    /// Copy out everything presentation needs for this frame
    pub fn snapshot(&self) -> FrameSnapshot {
        let mut bird = self.bird;
        // Hover in place between planets; physics keeps the real height
        if self.clock.phase == SimPhase::Transition {
            bird.position_y += hover_offset(self.clock.frame_time_ms());
            bird.rotation = 0.0;
        }
        FrameSnapshot {
            frame: self.clock.frame_count,
            phase: self.clock.phase,
            bird_x: self.rules.config.bird_x,
            bird,
            progression: self.progression,
            entities: self.pool.iter().copied().collect(),
            star_rotation: self.star_rotation,
        }
    }
}

//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One tick per rendered frame
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod physics;
pub mod pool;
pub mod profile;
pub mod progression;
pub mod state;
pub mod tick;

pub use collision::{Aabb, CollisionGeometry, detect_collision, mark_passed, test_collisions};
pub use physics::{apply_jump, hover_offset, idle_bob, integrate, update_pitch};
pub use pool::{EntityPool, StepMotion, should_spawn_obstacle};
pub use profile::{DifficultyProfile, MusicMode, ProfileTable, Tier, spawn_period_ticks};
pub use progression::{ProgressionConfig, ProgressionState};
pub use state::{
    CollisionCause, ControlledObject, DecorativeBody, DecorativeKind, Entity, EntityKind,
    FrameSnapshot, GameEvent, GameState, Obstacle, Particle, SimPhase, SimulationClock,
};
pub use tick::{TickInput, tick};

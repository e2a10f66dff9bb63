//! Galactic Flappy - a planet-hopping flappy arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, spawning, progression)
//! - `session`: Owned loop driver with input latching and lifecycle
//! - `config`: Data-driven game balance with startup validation
//! - `audio`: Audio director (cues and music mode hints)
//! - `highscores`: Leaderboard store and asynchronous client
//! - `settings`: Player preferences

pub mod audio;
pub mod config;
pub mod error;
pub mod highscores;
pub mod session;
pub mod settings;
pub mod sim;

pub use config::GameConfig;
pub use error::{AudioError, ConfigError, LeaderboardError};
pub use highscores::{HighScores, LeaderboardClient, LeaderboardEntry, LocalLeaderboard};
pub use session::{FrameToken, PresentationSink, Session};
pub use settings::Settings;

/// Game configuration constants (reference tuning, overridable through `GameConfig`)
pub mod consts {
    use glam::Vec2;

    /// Display frames per second; one simulation tick per rendered frame
    pub const FRAMES_PER_SECOND: u32 = 60;
    /// Milliseconds represented by one frame (cosmetic animation clock)
    pub const FRAME_MS: f32 = 1000.0 / FRAMES_PER_SECOND as f32;

    /// Base obstacle spawn rate, divided by scroll speed to get the period
    pub const PIPE_SPAWN_RATE: f32 = 120.0;
    /// Coupling constant between scroll speed and spawn period
    pub const SPAWN_SPEED_SCALE: f32 = 10.0;
    /// Gap size range (world units, ~5.5 to ~9 bird heights)
    pub const PIPE_GAP_MIN: f32 = 4.5;
    pub const PIPE_GAP_MAX: f32 = 7.5;
    /// Vertical spread of gap centers, centered on y = 0
    pub const PIPE_GAP_SPREAD: f32 = 6.0;
    /// Obstacles enter here (offscreen right)
    pub const PIPE_SPAWN_X: f32 = 20.0;
    /// Obstacles are retired below this x (offscreen left)
    pub const PIPE_CLEANUP_X: f32 = -15.0;
    /// Obstacle column width
    pub const PIPE_WIDTH: f32 = 2.5;

    /// Fixed x of the controlled object
    pub const BIRD_X: f32 = -3.0;
    /// Bird bounding box relative to its origin (body, beak and folded wings)
    pub const BIRD_BOX_MIN: Vec2 = Vec2::new(-0.5, -0.4);
    pub const BIRD_BOX_MAX: Vec2 = Vec2::new(0.8, 0.4);
    /// Collision box shrink on every side
    pub const COLLISION_TOLERANCE: f32 = 0.3;

    /// Vertical playfield; leaving it is a boundary collision
    pub const PLAYFIELD_FLOOR: f32 = -9.0;
    pub const PLAYFIELD_CEILING: f32 = 12.0;
    /// Gravity integration scale per tick
    pub const GRAVITY_SCALE: f32 = 0.15;

    /// Obstacles per multiplier step
    pub const PIPES_PER_LEVEL: u32 = 5;
    /// Score thresholds for Earth and Jupiter
    pub const EARTH_THRESHOLD: u32 = 20;
    pub const JUPITER_THRESHOLD: u32 = 40;

    /// Jump exhaust
    pub const EXHAUST_COUNT: usize = 3;
    pub const EXHAUST_OFFSET: Vec2 = Vec2::new(-0.4, -0.1);
    pub const EXHAUST_DRIFT_X: f32 = -0.1;
    pub const EXHAUST_DRIFT_Y_RANGE: f32 = 0.1;
    pub const EXHAUST_DECAY: f32 = 0.05;

    /// Per-frame spawn chances for transient decoratives
    pub const COMET_CHANCE: f32 = 0.01;
    pub const BACKGROUND_BIRD_CHANCE: f32 = 0.005;
    /// Transient decoratives are retired below this x
    pub const TRANSIENT_CLEANUP_X: f32 = -30.0;
    /// Orbiting bodies loop between -x and +x
    pub const ORBIT_WRAP_X: f32 = 40.0;
    /// Clouds loop between -x and +x
    pub const CLOUD_WRAP_X: f32 = 20.0;
    /// Clouds scroll at this fraction of the obstacle speed
    pub const CLOUD_PARALLAX: f32 = 0.3;
    /// Decorative speed multiplier during a level transition
    pub const HYPERDRIVE_MULTIPLIER: f32 = 5.0;
    /// Star field spin per frame (normal, transition)
    pub const STAR_SPIN: f32 = 0.002;
    pub const STAR_SPIN_HYPERDRIVE: f32 = 0.05;

    /// Idle bob
    pub const IDLE_BOB_AMPLITUDE: f32 = 0.5;
    pub const IDLE_BOB_RATE: f32 = 0.004;
}

/// Uniform draw in `[min, max)` from a unit sample
#[inline]
pub fn lerp_unit(min: f32, max: f32, unit: f32) -> f32 {
    unit * (max - min) + min
}

/// Milliseconds since the Unix epoch, for leaderboard timestamps
pub fn now_millis() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

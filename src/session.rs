//! Session: the owned loop driver
//!
//! Holds the game state, the latched input slot and the outward services
//! (presentation sink, audio, leaderboard). The host calls `frame` once per
//! display refresh with a token obtained from `frame_token`; tokens from a
//! torn-down or reset session are rejected, so a late callback is a no-op.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::audio::{AudioBackend, AudioDirector};
use crate::config::{GameConfig, Rules};
use crate::error::{AudioError, ConfigError, LeaderboardError};
use crate::highscores::{HighScores, LeaderboardClient, LeaderboardEntry, LeaderboardUpdate};
use crate::settings::Settings;
use crate::sim::{FrameSnapshot, GameEvent, GameState, SimPhase, TickInput, tick};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Receives per-frame state and discrete events
pub trait PresentationSink {
    fn present(&mut self, frame: &FrameSnapshot);
    fn on_event(&mut self, event: &GameEvent);
}

/// Proof that a scheduled frame belongs to the live session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameToken {
    session: u64,
    generation: u64,
}

/// What the leaderboard panel should show
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LeaderboardStatus {
    #[default]
    Idle,
    /// "Retrieving data..."
    Loading,
    Ready,
    Unavailable(String),
    SubmitFailed(String),
}

pub struct Session {
    id: u64,
    generation: u64,
    disposed: bool,
    state: GameState,
    /// Single-slot latch, drained by the next frame
    input: TickInput,
    autopilot: bool,
    audio: AudioDirector,
    sink: Option<Box<dyn PresentationSink>>,
    leaderboard: Option<LeaderboardClient>,
    leaderboard_status: LeaderboardStatus,
    top_scores: Vec<LeaderboardEntry>,
    last_final_score: Option<u32>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("generation", &self.generation)
            .field("disposed", &self.disposed)
            .field("phase", &self.state.phase())
            .field("audio", &self.audio)
            .field("leaderboard_status", &self.leaderboard_status)
            .finish()
    }
}

impl Session {
    /// Validate the config and build an idle session
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        Ok(Self::with_rules(Rules::new(config)?, seed))
    }

    pub fn with_rules(rules: Rules, seed: u64) -> Self {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        log::info!("Session {id} created (seed {seed})");
        Self {
            id,
            generation: 0,
            disposed: false,
            state: GameState::new(rules, seed),
            input: TickInput::default(),
            autopilot: false,
            audio: AudioDirector::new(),
            sink: None,
            leaderboard: None,
            leaderboard_status: LeaderboardStatus::Idle,
            top_scores: Vec::new(),
            last_final_score: None,
        }
    }

    pub fn set_sink(&mut self, sink: Box<dyn PresentationSink>) {
        self.sink = Some(sink);
    }

    pub fn attach_leaderboard(&mut self, client: LeaderboardClient) {
        self.leaderboard = Some(client);
    }

    /// Open the audio output; failure leaves the game silent
    pub fn start_audio<F>(&mut self, open: F)
    where
        F: FnOnce() -> Result<Box<dyn AudioBackend>, AudioError>,
    {
        self.audio.start(open);
    }

    pub fn audio(&self) -> &AudioDirector {
        &self.audio
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.audio.apply_settings(settings);
        self.state.reduced_motion = settings.reduced_motion;
        self.state.exhaust_enabled = settings.particles;
    }

    // === Input (latched until the next frame) ===

    pub fn jump(&mut self) {
        self.input.jump = true;
    }

    pub fn start(&mut self) {
        self.input.start = true;
    }

    pub fn resume(&mut self) {
        self.input.resume = true;
    }

    pub fn set_autopilot(&mut self, enabled: bool) {
        self.autopilot = enabled;
    }

    // === Lifecycle ===

    /// Token for the next scheduled frame
    pub fn frame_token(&self) -> FrameToken {
        FrameToken {
            session: self.id,
            generation: self.generation,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Run one tick. Returns false (doing nothing) for a stale token.
    pub fn frame(&mut self, token: FrameToken) -> bool {
        if self.disposed || token != self.frame_token() {
            log::debug!("Dropping stale frame for session {}", token.session);
            return false;
        }

        let mut input = std::mem::take(&mut self.input);
        input.autopilot = self.autopilot;
        let events = tick(&mut self.state, &input);
        for event in &events {
            self.dispatch(event);
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.present(&self.state.snapshot());
        }
        self.poll_leaderboard();
        true
    }

    /// Back to Idle: fresh progression, empty pool, pending frames invalidated
    pub fn reset(&mut self) {
        if self.disposed {
            return;
        }
        self.generation += 1;
        self.input = TickInput::default();
        self.state.reset();
        self.last_final_score = None;
        log::info!("Session {} reset", self.id);
        self.dispatch(&GameEvent::Reset);
    }

    /// Reset and start a new run on the next frame
    pub fn restart(&mut self) {
        self.reset();
        self.input.start = true;
        log::info!("Session {} restarted", self.id);
    }

    /// Stop for good: pending frames become no-ops, entities and services released
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.generation += 1;
        self.input = TickInput::default();
        self.state.pool.clear();
        self.audio.dispose();
        self.leaderboard = None;
        self.sink = None;
        log::info!("Session {} disposed", self.id);
    }

    fn dispatch(&mut self, event: &GameEvent) {
        self.audio.on_event(event);
        if let Some(sink) = self.sink.as_mut() {
            sink.on_event(event);
        }
        if let GameEvent::GameOver { final_score, .. } = *event {
            self.last_final_score = Some(final_score);
            self.request_top_scores();
        }
    }

    // === Leaderboard ===

    /// Ask for the current table; the answer arrives on a later frame
    pub fn request_top_scores(&mut self) {
        let Some(client) = self.leaderboard.as_ref() else {
            return;
        };
        self.leaderboard_status = match client.request_top_scores() {
            Ok(()) => LeaderboardStatus::Loading,
            Err(e) => {
                log::warn!("Leaderboard fetch failed: {e}");
                LeaderboardStatus::Unavailable(e.to_string())
            }
        };
    }

    /// Submit the last final score under `name`
    pub fn submit_score(&mut self, name: &str) -> Result<(), LeaderboardError> {
        let score = self.last_final_score.ok_or(LeaderboardError::NoFinalScore)?;
        let client = self
            .leaderboard
            .as_ref()
            .ok_or_else(|| LeaderboardError::Unavailable("no leaderboard attached".into()))?;
        client.submit_score(name, score)?;
        self.leaderboard_status = LeaderboardStatus::Loading;
        Ok(())
    }

    /// Apply whatever the leaderboard worker has delivered
    pub fn poll_leaderboard(&mut self) -> Vec<LeaderboardUpdate> {
        let Some(client) = self.leaderboard.as_ref() else {
            return Vec::new();
        };
        let updates = client.poll();
        for update in &updates {
            match update {
                LeaderboardUpdate::TopScores(entries) => {
                    self.top_scores = entries.clone();
                    // Keep a submit error visible over the refreshed table
                    if !matches!(self.leaderboard_status, LeaderboardStatus::SubmitFailed(_)) {
                        self.leaderboard_status = LeaderboardStatus::Ready;
                    }
                }
                LeaderboardUpdate::Submitted { name, score, rank } => {
                    log::info!("Submitted {score} for {name} (rank {rank:?})");
                }
                LeaderboardUpdate::FetchFailed(e) => {
                    self.leaderboard_status = LeaderboardStatus::Unavailable(e.clone());
                }
                LeaderboardUpdate::SubmitFailed(e) => {
                    self.leaderboard_status = LeaderboardStatus::SubmitFailed(e.clone());
                }
            }
        }
        updates
    }

    pub fn leaderboard_status(&self) -> &LeaderboardStatus {
        &self.leaderboard_status
    }

    pub fn top_scores(&self) -> &[LeaderboardEntry] {
        &self.top_scores
    }

    /// Whether the last run earns a place in the fetched table
    pub fn final_score_qualifies(&self) -> bool {
        let table = HighScores {
            entries: self.top_scores.clone(),
        };
        self.last_final_score.is_some_and(|s| table.qualifies(s))
    }

    pub fn last_final_score(&self) -> Option<u32> {
        self.last_final_score
    }

    // === Views ===

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> SimPhase {
        self.state.phase()
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        self.state.snapshot()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::LeaderboardStore;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct Recorder {
        events: Rc<RefCell<Vec<GameEvent>>>,
        frames: Rc<RefCell<u32>>,
    }

    impl PresentationSink for Recorder {
        fn present(&mut self, _frame: &FrameSnapshot) {
            *self.frames.borrow_mut() += 1;
        }

        fn on_event(&mut self, event: &GameEvent) {
            self.events.borrow_mut().push(*event);
        }
    }

    fn session() -> (Session, Recorder) {
        let mut session = Session::new(GameConfig::default(), 42).unwrap();
        let recorder = Recorder::default();
        session.set_sink(Box::new(recorder.clone()));
        (session, recorder)
    }

    #[test]
    fn test_invalid_config_refuses_to_start() {
        let config = GameConfig {
            tier_thresholds: [30, 10],
            ..Default::default()
        };
        assert!(Session::new(config, 1).is_err());
    }

    #[test]
    fn test_latched_jumps_collapse() {
        let (mut session, recorder) = session();
        session.start();
        session.frame(session.frame_token());
        recorder.events.borrow_mut().clear();

        session.jump();
        session.jump();
        session.jump();
        session.frame(session.frame_token());
        assert_eq!(*recorder.events.borrow(), vec![GameEvent::Jumped]);

        // Latch is drained
        session.frame(session.frame_token());
        assert_eq!(recorder.events.borrow().len(), 1);
        assert_eq!(*recorder.frames.borrow(), 3);
    }

    #[test]
    fn test_stale_token_is_noop() {
        let (mut session, recorder) = session();
        let token = session.frame_token();
        session.reset();
        assert!(!session.frame(token));
        assert!(session.frame(session.frame_token()));

        let token = session.frame_token();
        session.dispose();
        assert!(!session.frame(token));
        assert!(!session.frame(session.frame_token()));
        assert!(session.state().pool.is_empty());
        assert_eq!(*recorder.frames.borrow(), 1);
    }

    #[test]
    fn test_tokens_are_per_session() {
        let (a, _) = session();
        let (mut b, _) = session();
        assert!(!b.frame(a.frame_token()));
    }

    #[test]
    fn test_restart_runs_again() {
        let (mut session, _) = session();
        session.start();
        session.frame(session.frame_token());
        while session.phase() == SimPhase::Running {
            session.frame(session.frame_token());
        }
        assert_eq!(session.phase(), SimPhase::Terminated);
        assert_eq!(session.last_final_score(), Some(0));

        session.restart();
        assert_eq!(session.phase(), SimPhase::Idle);
        session.frame(session.frame_token());
        assert_eq!(session.phase(), SimPhase::Running);
        assert_eq!(session.state().progression.score, 0);
    }

    #[test]
    fn test_submit_without_run_or_board() {
        let (mut session, _) = session();
        assert!(matches!(session.submit_score("ACE"), Err(LeaderboardError::NoFinalScore)));
        session.last_final_score = Some(4);
        assert!(matches!(
            session.submit_score("ACE"),
            Err(LeaderboardError::Unavailable(_))
        ));
    }

    #[test]
    fn test_settings_reach_simulation() {
        let (mut session, _) = session();
        session.apply_settings(&Settings {
            particles: false,
            reduced_motion: true,
            ..Default::default()
        });
        session.start();
        session.frame(session.frame_token());
        assert!(session.state().reduced_motion);
        assert_eq!(session.state().pool.particles().count(), 0);
    }

    struct SlowStore;

    impl LeaderboardStore for SlowStore {
        fn fetch_top_scores(&mut self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(Vec::new())
        }

        fn submit_score(&mut self, _: &str, _: u32) -> Result<Option<usize>, LeaderboardError> {
            Ok(None)
        }
    }

    #[test]
    fn test_dispose_does_not_block_on_leaderboard() {
        let (mut session, _) = session();
        session.attach_leaderboard(LeaderboardClient::spawn(SlowStore).unwrap());
        session.request_top_scores();
        session.request_top_scores();
        assert_eq!(*session.leaderboard_status(), LeaderboardStatus::Loading);

        let started = std::time::Instant::now();
        session.dispose();
        assert!(started.elapsed() < Duration::from_millis(250));
        assert!(session.is_disposed());
    }
}

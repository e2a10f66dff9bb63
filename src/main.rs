//! Galactic Flappy headless runner
//!
//! Loads the config and settings, lets the autopilot fly one run, then
//! submits the result to the local leaderboard and prints the table.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use galactic_flappy::audio::{AudioBackend, LogBackend};
use galactic_flappy::session::LeaderboardStatus;
use galactic_flappy::sim::{FrameSnapshot, GameEvent, SimPhase};
use galactic_flappy::{
    GameConfig, LeaderboardClient, LocalLeaderboard, PresentationSink, Session, Settings,
};

/// Hard stop so a perfect autopilot run still ends
const MAX_FRAMES: u64 = 60 * 60 * 10;
const LEADERBOARD_TIMEOUT: Duration = Duration::from_secs(5);

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var_os(key)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

/// Logs the discrete events a renderer would react to
struct LogSink;

impl PresentationSink for LogSink {
    fn present(&mut self, frame: &FrameSnapshot) {
        if frame.frame % 600 == 0 {
            log::debug!(
                "frame {} {:?} y={:.2} score={} entities={}",
                frame.frame,
                frame.phase,
                frame.bird.position_y,
                frame.progression.score,
                frame.entities.len()
            );
        }
    }

    fn on_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Jumped => {}
            GameEvent::ScoreChanged { score } => log::debug!("score {score}"),
            other => log::info!("{other:?}"),
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let config_path = env_path("GALACTIC_FLAPPY_CONFIG", "galactic_flappy.json");
    let settings_path = env_path("GALACTIC_FLAPPY_SETTINGS", "galactic_flappy_settings.json");
    let scores_path = env_path("GALACTIC_FLAPPY_SCORES", "galactic_flappy_scores.json");
    let pilot = std::env::var("GALACTIC_FLAPPY_PILOT").unwrap_or_else(|_| "PILOT".to_string());

    let config = match GameConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let seed = galactic_flappy::now_millis() as u64;
    let mut session = match Session::new(config, seed) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Refusing to start: {e}");
            return ExitCode::FAILURE;
        }
    };

    let settings = Settings::load(&settings_path);
    session.apply_settings(&settings);
    session.start_audio(|| Ok(Box::new(LogBackend) as Box<dyn AudioBackend>));
    session.set_sink(Box::new(LogSink));
    match LeaderboardClient::spawn(LocalLeaderboard::new(&scores_path)) {
        Ok(client) => session.attach_leaderboard(client),
        Err(e) => log::warn!("Leaderboard disabled: {e}"),
    }

    session.set_autopilot(true);
    session.start();
    let mut frames = 0;
    while frames < MAX_FRAMES {
        match session.phase() {
            SimPhase::Terminated => break,
            SimPhase::Transition => session.resume(),
            _ => {}
        }
        session.frame(session.frame_token());
        frames += 1;
    }

    let progression = session.state().progression;
    println!(
        "Final score {} on {} (x{}) after {} frames",
        progression.score,
        progression.tier.as_str(),
        progression.multiplier,
        frames
    );

    // Game over already asked for the table
    wait_for_leaderboard(&mut session);
    if session.final_score_qualifies() {
        match session.submit_score(&pilot) {
            Ok(()) => wait_for_leaderboard(&mut session),
            Err(e) => log::warn!("Could not submit score: {e}"),
        }
    }

    match session.leaderboard_status() {
        LeaderboardStatus::Ready => {
            for (i, entry) in session.top_scores().iter().enumerate() {
                println!("{:>2}. {:<5} {:>4}", i + 1, entry.name, entry.score);
            }
        }
        LeaderboardStatus::Idle => {}
        other => println!("Leaderboard: {other:?}"),
    }

    session.dispose();
    ExitCode::SUCCESS
}

/// Pump leaderboard updates until the pending request settles
fn wait_for_leaderboard(session: &mut Session) {
    let deadline = Instant::now() + LEADERBOARD_TIMEOUT;
    while *session.leaderboard_status() == LeaderboardStatus::Loading {
        if Instant::now() >= deadline {
            log::warn!("Leaderboard timed out");
            return;
        }
        session.poll_leaderboard();
        std::thread::sleep(Duration::from_millis(10));
    }
}

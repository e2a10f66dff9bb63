//! End-to-end runs through the public API

use std::cell::RefCell;
use std::rc::Rc;

use galactic_flappy::config::Rules;
use galactic_flappy::sim::{
    CollisionCause, EntityKind, FrameSnapshot, GameEvent, GameState, Obstacle, ProgressionState,
    SimPhase, TickInput, Tier, tick,
};
use galactic_flappy::{GameConfig, PresentationSink, Session};

#[derive(Clone, Default)]
struct EventLog(Rc<RefCell<Vec<GameEvent>>>);

impl PresentationSink for EventLog {
    fn present(&mut self, _frame: &FrameSnapshot) {}

    fn on_event(&mut self, event: &GameEvent) {
        self.0.borrow_mut().push(*event);
    }
}

fn autopilot() -> TickInput {
    TickInput {
        autopilot: true,
        ..Default::default()
    }
}

#[test]
fn no_input_falls_to_game_over() {
    let mut session = Session::new(GameConfig::default(), 1).unwrap();
    let log = EventLog::default();
    session.set_sink(Box::new(log.clone()));

    session.start();
    let mut frames = 0;
    while session.phase() != SimPhase::Terminated {
        session.frame(session.frame_token());
        frames += 1;
        assert!(frames < 1000, "bird never hit the floor");
    }

    let events = log.0.borrow();
    let game_overs: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, GameEvent::GameOver { .. }))
        .collect();
    assert_eq!(
        game_overs,
        vec![&GameEvent::GameOver {
            final_score: 0,
            cause: CollisionCause::Boundary,
        }]
    );
    // Only the implicit lift-off jump
    assert_eq!(events.iter().filter(|e| **e == GameEvent::Jumped).count(), 1);
    assert!(session.state().bird.position_y < session.state().rules.config.floor_y);

    // Frozen afterwards
    for _ in 0..10 {
        session.frame(session.frame_token());
    }
    assert_eq!(
        log.0.borrow().iter().filter(|e| matches!(e, GameEvent::GameOver { .. })).count(),
        1
    );
}

#[test]
fn obstacle_passes_after_travel_time() {
    let mut state = GameState::new(Rules::default(), 77);
    tick(
        &mut state,
        &TickInput {
            start: true,
            autopilot: true,
            ..Default::default()
        },
    );
    while state.pool.obstacles().count() == 0 {
        tick(&mut state, &autopilot());
        assert_eq!(state.phase(), SimPhase::Running);
    }

    let config = &state.rules.config;
    let speed = state.profile().scroll_speed;
    let expected = ((config.spawn_x - config.bird_x) as f64 / speed as f64).ceil() as u32;
    assert_eq!(expected, 288);

    let mut ticks = 0;
    while !state.pool.obstacles().any(|o| o.passed) {
        assert_eq!(state.progression.score, 0);
        tick(&mut state, &autopilot());
        ticks += 1;
        assert_eq!(state.phase(), SimPhase::Running);
        assert!(ticks <= expected);
    }
    assert_eq!(ticks, expected);
    assert_eq!(state.progression.score, 1);
}

fn stage_free_pass(state: &mut GameState) {
    let bird_x = state.rules.config.bird_x;
    state.pool.stage(EntityKind::Obstacle(Obstacle {
        position_x: bird_x - 0.5,
        gap_center_y: 0.0,
        gap_height: 100.0,
        passed: false,
        tier_at_spawn: state.progression.tier,
    }));
}

#[test]
fn tier_changes_exactly_at_thresholds() {
    let mut state = GameState::new(Rules::default(), 5);
    tick(
        &mut state,
        &TickInput {
            start: true,
            ..Default::default()
        },
    );

    let mut changes = Vec::new();
    while state.progression.score < 45 {
        let input = if state.phase() == SimPhase::Transition {
            TickInput {
                resume: true,
                autopilot: true,
                ..Default::default()
            }
        } else {
            stage_free_pass(&mut state);
            autopilot()
        };
        let before = state.progression.score;
        for event in tick(&mut state, &input) {
            if let GameEvent::TierChanged { tier, multiplier } = event {
                changes.push((before, state.progression.score, tier, multiplier));
            }
        }
        assert_ne!(state.phase(), SimPhase::Terminated);
    }

    assert_eq!(
        changes,
        vec![(19, 20, Tier::Earth, 5), (39, 40, Tier::Jupiter, 9)]
    );
}

#[test]
fn reset_twice_is_idempotent() {
    let mut session = Session::new(GameConfig::default(), 9).unwrap();
    session.set_autopilot(true);
    session.start();
    for _ in 0..400 {
        session.frame(session.frame_token());
    }
    assert!(!session.state().pool.is_empty());

    session.reset();
    let first = (session.state().progression, session.state().pool.len());
    session.reset();
    let second = (session.state().progression, session.state().pool.len());

    assert_eq!(first, (ProgressionState::default(), 0));
    assert_eq!(first, second);
    assert_eq!(session.phase(), SimPhase::Idle);
    let pool = &session.state().pool;
    assert_eq!(pool.spawned_count(), pool.removed_count());
}

#[test]
fn same_seed_same_run() {
    let run = |seed| {
        let mut session = Session::new(GameConfig::default(), seed).unwrap();
        session.set_autopilot(true);
        session.start();
        let mut frames = Vec::new();
        for i in 0..1500 {
            if i % 97 == 0 {
                session.jump();
            }
            if session.phase() == SimPhase::Transition {
                session.resume();
            }
            session.frame(session.frame_token());
            frames.push(session.snapshot());
        }
        frames
    };
    assert_eq!(run(1234), run(1234));
    assert_ne!(run(1234), run(4321));
}

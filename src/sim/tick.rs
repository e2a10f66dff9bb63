//! Fixed-cadence simulation tick
//!
//! One call per rendered frame. Inputs are edge-triggered and applied at the
//! start of the tick, never mid-integration.

use super::collision::{detect_collision, mark_passed};
use super::physics::{apply_jump, idle_bob, integrate, sanitize_bird, update_pitch};
use super::pool::{StepMotion, should_spawn_obstacle};
use super::state::{GameEvent, GameState, SimPhase};
use crate::consts::*;

/// Commands for a single tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Flap (any input source)
    pub jump: bool,
    /// Leave the title screen
    pub start: bool,
    /// Continue after a planet change
    pub resume: bool,
    /// Let the simulation fly the bird
    pub autopilot: bool,
}

/// Keep the bird level with the next gap
const AUTOPILOT_MARGIN: f32 = 0.8;

/// Advance the game state by one tick and return what happened
pub fn tick(state: &mut GameState, input: &TickInput) -> Vec<GameEvent> {
    let mut events = Vec::new();
    state.clock.frame_count += 1;

    if input.start && state.start() {
        state.bird = Default::default();
        events.push(GameEvent::RunStarted {
            tier: state.progression.tier,
        });
    }
    if input.resume && state.resume() {
        events.push(GameEvent::Resumed);
    }

    let tier = state.progression.tier;
    state.pool.ensure_backdrop(&mut state.rng, tier);
    advance_cosmetics(state);

    match state.clock.phase {
        SimPhase::Idle => {
            idle_bob(&mut state.bird, state.clock.frame_time_ms());
            state.pool.step_and_cull(&StepMotion {
                scroll_speed: None,
                cosmetic_speed: Some(1.0),
                cleanup_x: state.rules.config.cleanup_x,
            });
        }
        SimPhase::Transition => {
            // Level out; the hover itself is drawn by `snapshot`
            state.bird.rotation = 0.0;
            state.pool.step_and_cull(&StepMotion {
                scroll_speed: None,
                cosmetic_speed: Some(hyperdrive(state)),
                cleanup_x: state.rules.config.cleanup_x,
            });
            state.clock.transition_ticks += 1;
            let hold = state.rules.config.transition_hold_ticks;
            if hold > 0 && state.clock.transition_ticks >= hold && state.resume() {
                events.push(GameEvent::Resumed);
            }
        }
        SimPhase::Terminated => {
            state.pool.step_and_cull(&StepMotion {
                scroll_speed: None,
                cosmetic_speed: None,
                cleanup_x: state.rules.config.cleanup_x,
            });
        }
        SimPhase::Running => run_tick(state, input, &mut events),
    }

    events
}

fn run_tick(state: &mut GameState, input: &TickInput, events: &mut Vec<GameEvent>) {
    state.clock.tick_count += 1;
    let profile = state.profile();
    let config = &state.rules.config;

    let mut input = input.clone();
    if input.autopilot {
        input.jump |= autopilot_wants_jump(state);
    }

    // First running tick lifts off on its own
    if input.jump || state.clock.tick_count == 1 {
        apply_jump(&mut state.bird, &profile);
        if state.exhaust_enabled {
            let origin = glam::Vec2::new(config.bird_x, state.bird.position_y);
            state.pool.spawn_exhaust(&mut state.rng, origin);
        }
        events.push(GameEvent::Jumped);
    }

    integrate(&mut state.bird, &profile, config.gravity_scale);
    update_pitch(&mut state.bird);
    sanitize_bird(&mut state.bird);

    if should_spawn_obstacle(state.clock.tick_count, &profile) {
        let tier = state.progression.tier;
        state.pool.spawn_obstacle(&mut state.rng, config, tier);
    }

    state.pool.step_and_cull(&StepMotion {
        scroll_speed: Some(profile.scroll_speed),
        cosmetic_speed: Some(1.0),
        cleanup_x: config.cleanup_x,
    });

    // Pass and collision checks are independent; both may fire this tick
    let passes = mark_passed(&mut state.pool, config.bird_x);
    let mut tier_changed = false;
    for _ in 0..passes {
        let before = state.progression;
        let (next, changed) = state.rules.progression.on_obstacle_passed(before);
        state.progression = next;
        events.push(GameEvent::ScoreChanged { score: next.score });
        if changed {
            tier_changed = true;
            log::info!(
                "Tier changed to {} (multiplier x{})",
                next.tier.as_str(),
                next.multiplier
            );
            events.push(GameEvent::TierChanged {
                tier: next.tier,
                multiplier: next.multiplier,
            });
        } else if next.multiplier > before.multiplier {
            events.push(GameEvent::MultiplierChanged {
                multiplier: next.multiplier,
            });
        }
    }

    if let Some(cause) = detect_collision(&state.rules.geometry, &state.bird, &state.pool) {
        state.terminate();
        log::info!(
            "Game over ({cause:?}) with score {} after {} ticks",
            state.progression.score,
            state.clock.tick_count
        );
        events.push(GameEvent::GameOver {
            final_score: state.progression.score,
            cause,
        });
    } else if tier_changed {
        state.begin_transition();
        let tier = state.progression.tier;
        state.pool.ensure_backdrop(&mut state.rng, tier);
    }
}

/// Star spin and chance-spawned backdrop traffic
fn advance_cosmetics(state: &mut GameState) {
    if !state.clock.cosmetic_motion_enabled {
        return;
    }
    let hyper = state.clock.phase == SimPhase::Transition && !state.reduced_motion;
    state.star_rotation += if hyper { STAR_SPIN_HYPERDRIVE } else { STAR_SPIN };

    let tier = state.progression.tier;
    state.pool.spawn_ambient(&mut state.rng, &state.rules.config, tier);
}

fn hyperdrive(state: &GameState) -> f32 {
    if state.reduced_motion {
        1.0
    } else {
        HYPERDRIVE_MULTIPLIER
    }
}

/// Jump when below the next gap and not already climbing
fn autopilot_wants_jump(state: &GameState) -> bool {
    let geometry = &state.rules.geometry;
    let clear_x = geometry.bird_box(&state.bird).min.x;
    // Nearest pipe whose columns have not fully cleared the bird
    let target = state
        .pool
        .obstacles()
        .filter(|o| o.position_x + geometry.pipe_half_width >= clear_x)
        .min_by(|a, b| a.position_x.total_cmp(&b.position_x))
        .map(|o| o.gap_center_y)
        .unwrap_or(0.0);
    state.bird.position_y < target - AUTOPILOT_MARGIN && state.bird.velocity_y <= 0.0
}

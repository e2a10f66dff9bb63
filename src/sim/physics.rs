//! Bird physics
//!
//! Vertical motion only. Gravity is integrated once per tick; a jump replaces
//! the velocity outright.

use super::profile::DifficultyProfile;
use super::state::ControlledObject;
use crate::consts::{IDLE_BOB_AMPLITUDE, IDLE_BOB_RATE};

/// Pitch floor while falling
const PITCH_MIN: f32 = -0.8;
/// Pitch lost per tick
const PITCH_STEP: f32 = 0.03;
/// Nose-up pitch after a jump
const PITCH_CLIMB: f32 = 0.5;

/// Absolute impulse: prior velocity is discarded
#[inline]
pub fn apply_jump(bird: &mut ControlledObject, profile: &DifficultyProfile) {
    bird.velocity_y = profile.jump_impulse;
}

/// One tick of semi-implicit Euler
#[inline]
pub fn integrate(bird: &mut ControlledObject, profile: &DifficultyProfile, gravity_scale: f32) {
    bird.velocity_y += profile.gravity * gravity_scale;
    bird.position_y += bird.velocity_y;
}

/// Cosmetic pitch; collision ignores it
pub fn update_pitch(bird: &mut ControlledObject) {
    if bird.rotation > PITCH_MIN {
        bird.rotation -= PITCH_STEP;
    } else if bird.velocity_y > 0.0 {
        bird.rotation = PITCH_CLIMB;
    }
}

/// Hover height at a given animation time
#[inline]
pub fn hover_offset(frame_ms: f32) -> f32 {
    (frame_ms * IDLE_BOB_RATE).sin() * IDLE_BOB_AMPLITUDE
}

/// Title-screen hover
pub fn idle_bob(bird: &mut ControlledObject, frame_ms: f32) {
    bird.position_y = hover_offset(frame_ms);
    bird.velocity_y = 0.0;
    bird.rotation = 0.0;
}

/// Replace non-finite values so rendering and collision stay defined
pub fn sanitize_bird(bird: &mut ControlledObject) {
    if !bird.position_y.is_finite() || !bird.velocity_y.is_finite() {
        log::error!(
            "Bird state went non-finite (y={}, vy={}), clamping",
            bird.position_y,
            bird.velocity_y
        );
        if !bird.position_y.is_finite() {
            bird.position_y = 0.0;
        }
        bird.velocity_y = 0.0;
    }
    if !bird.rotation.is_finite() {
        bird.rotation = 0.0;
    }
}

//! Entity pool
//!
//! Owns every transient entity: obstacles, jump exhaust and backdrop bodies.
//! New entities are staged and only join the live set at the end of
//! `step_and_cull`, so nothing is advanced on the tick it appears and nothing
//! is advanced twice. Removal is collect-then-remove.

use glam::{Vec2, Vec3};
use rand::Rng;

use super::profile::{DifficultyProfile, Tier};
use super::state::{DecorativeBody, DecorativeKind, Entity, EntityKind, Obstacle, Particle};
use crate::config::GameConfig;
use crate::consts::*;
use crate::lerp_unit;

/// How far things move this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepMotion {
    /// Obstacle scroll; `None` holds obstacles, exhaust and clouds in place
    pub scroll_speed: Option<f32>,
    /// Backdrop speed multiplier; `None` freezes the backdrop
    pub cosmetic_speed: Option<f32>,
    /// Obstacles left of this are retired
    pub cleanup_x: f32,
}

/// Whether an obstacle is due on this running tick
#[inline]
pub fn should_spawn_obstacle(tick_count: u64, profile: &DifficultyProfile) -> bool {
    tick_count > 0 && tick_count % u64::from(profile.spawn_period_ticks.max(1)) == 0
}

#[derive(Debug, Clone)]
pub struct EntityPool {
    live: Vec<Entity>,
    staged: Vec<Entity>,
    next_id: u32,
    spawned_total: u64,
    removed_total: u64,
    /// Tier the current backdrop was built for
    backdrop: Option<Tier>,
}

impl Default for EntityPool {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityPool {
    pub fn new() -> Self {
        Self {
            live: Vec::new(),
            staged: Vec::new(),
            next_id: 1,
            spawned_total: 0,
            removed_total: 0,
            backdrop: None,
        }
    }

    /// Tracked entities, staged ones included
    pub fn len(&self) -> usize {
        self.live.len() + self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty() && self.staged.is_empty()
    }

    /// Entities ever spawned into this pool
    pub fn spawned_count(&self) -> u64 {
        self.spawned_total
    }

    /// Entities ever removed from this pool
    pub fn removed_count(&self) -> u64 {
        self.removed_total
    }

    pub fn backdrop_tier(&self) -> Option<Tier> {
        self.backdrop
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.live.iter().chain(self.staged.iter())
    }

    pub fn obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.iter().filter_map(|e| match &e.kind {
            EntityKind::Obstacle(o) => Some(o),
            _ => None,
        })
    }

    pub(crate) fn obstacles_mut(&mut self) -> impl Iterator<Item = &mut Obstacle> {
        self.live
            .iter_mut()
            .chain(self.staged.iter_mut())
            .filter_map(|e| match &mut e.kind {
                EntityKind::Obstacle(o) => Some(o),
                _ => None,
            })
    }

    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.iter().filter_map(|e| match &e.kind {
            EntityKind::Particle(p) => Some(p),
            _ => None,
        })
    }

    pub fn decoratives(&self) -> impl Iterator<Item = &DecorativeBody> {
        self.iter().filter_map(|e| match &e.kind {
            EntityKind::Decorative(d) => Some(d),
            _ => None,
        })
    }

    /// Queue an entity; it goes live at the end of the next step
    pub fn stage(&mut self, kind: EntityKind) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.staged.push(Entity { id, kind });
        self.spawned_total += 1;
        id
    }

    /// New pipe pair at the spawn x with a random gap
    pub fn spawn_obstacle<R: Rng>(&mut self, rng: &mut R, config: &GameConfig, tier: Tier) -> u32 {
        let gap_height = lerp_unit(config.gap_min, config.gap_max, rng.random::<f32>());
        let gap_center_y = rng.random::<f32>() * config.gap_spread - config.gap_spread / 2.0;
        self.stage(EntityKind::Obstacle(Obstacle {
            position_x: config.spawn_x,
            gap_center_y,
            gap_height,
            passed: false,
            tier_at_spawn: tier,
        }))
    }

    /// Jump exhaust behind the bird
    pub fn spawn_exhaust<R: Rng>(&mut self, rng: &mut R, bird_pos: Vec2) {
        for _ in 0..EXHAUST_COUNT {
            let drift_y = (rng.random::<f32>() - 0.5) * EXHAUST_DRIFT_Y_RANGE;
            self.stage(EntityKind::Particle(Particle {
                pos: bird_pos + EXHAUST_OFFSET,
                vel: Vec2::new(EXHAUST_DRIFT_X, drift_y),
                life: 1.0,
            }));
        }
    }

    /// Per-frame chance of a comet (Moon, Jupiter) or a bird flock (Earth)
    pub fn spawn_ambient<R: Rng>(&mut self, rng: &mut R, config: &GameConfig, tier: Tier) {
        match tier {
            Tier::Moon | Tier::Jupiter => {
                if rng.random::<f32>() < config.comet_chance {
                    let y = rng.random::<f32>() * 20.0 - 5.0;
                    let z = -10.0 - rng.random::<f32>() * 10.0;
                    self.stage_decorative(
                        DecorativeKind::Comet,
                        Vec3::new(20.0, y, z),
                        Vec2::new(-0.5, -0.2),
                        0.0,
                        1.0,
                    );
                }
            }
            Tier::Earth => {
                if rng.random::<f32>() < config.background_bird_chance {
                    let y = rng.random::<f32>() * 10.0;
                    let z = -5.0 - rng.random::<f32>() * 5.0;
                    let speed_x = -0.1 - rng.random::<f32>() * 0.1;
                    self.stage_decorative(
                        DecorativeKind::Bird,
                        Vec3::new(20.0, y, z),
                        Vec2::new(speed_x, 0.0),
                        0.0,
                        1.0,
                    );
                }
            }
        }
    }

    /// Rebuild the backdrop if it was built for another tier (or not at all)
    pub fn ensure_backdrop<R: Rng>(&mut self, rng: &mut R, tier: Tier) {
        if self.backdrop == Some(tier) {
            return;
        }
        self.remove_where(|e| matches!(e.kind, EntityKind::Decorative(_)));

        match tier {
            Tier::Moon => {
                self.stage_decorative(
                    DecorativeKind::Earth,
                    Vec3::new(10.0, 5.0, -30.0),
                    Vec2::new(-0.005, 0.001),
                    0.002,
                    4.0,
                );
            }
            Tier::Earth => {
                for _ in 0..6 {
                    let x = rng.random::<f32>() * 40.0 - 10.0;
                    let y = rng.random::<f32>() * 10.0 + 5.0;
                    let z = -10.0 - rng.random::<f32>() * 10.0;
                    let scale = 2.0 + rng.random::<f32>();
                    self.stage_decorative(
                        DecorativeKind::Cloud,
                        Vec3::new(x, y, z),
                        Vec2::ZERO,
                        0.0,
                        scale,
                    );
                }
            }
            Tier::Jupiter => {
                let moons = [
                    (Vec3::new(5.0, 8.0, -20.0), 1.5, 0.02),
                    (Vec3::new(-8.0, -5.0, -25.0), 1.2, 0.015),
                    (Vec3::new(12.0, -8.0, -15.0), 0.8, 0.03),
                ];
                for (i, (pos, scale, speed)) in moons.into_iter().enumerate() {
                    let dir = if i % 2 == 0 { 1.0 } else { -1.0 };
                    self.stage_decorative(
                        DecorativeKind::Moon,
                        pos,
                        Vec2::new(speed * dir, 0.0),
                        0.01,
                        scale,
                    );
                }
            }
        }
        self.backdrop = Some(tier);
        log::debug!("Backdrop rebuilt for {}", tier.as_str());
    }

    fn stage_decorative(
        &mut self,
        kind: DecorativeKind,
        pos: Vec3,
        vel: Vec2,
        rotation_speed: f32,
        scale: f32,
    ) -> u32 {
        self.stage(EntityKind::Decorative(DecorativeBody {
            kind,
            pos,
            vel,
            rotation: 0.0,
            rotation_speed,
            scale,
        }))
    }

    /// Advance every live entity once, retire the expired ones, then commit
    /// staged entities. Returns how many were removed.
    pub fn step_and_cull(&mut self, motion: &StepMotion) -> usize {
        let mut keep = Vec::with_capacity(self.live.len());
        for entity in &mut self.live {
            keep.push(step_entity(&mut entity.kind, motion));
        }

        let before = self.live.len();
        let mut flags = keep.into_iter();
        self.live.retain(|_| flags.next().unwrap_or(true));
        let removed = before - self.live.len();
        self.removed_total += removed as u64;

        self.live.append(&mut self.staged);
        for entity in &mut self.live {
            sanitize_entity(entity, motion.cleanup_x);
        }
        removed
    }

    /// Release everything (reset, teardown)
    pub fn clear(&mut self) {
        self.removed_total += self.len() as u64;
        self.live.clear();
        self.staged.clear();
        self.backdrop = None;
    }

    fn remove_where(&mut self, pred: impl Fn(&Entity) -> bool) {
        let before = self.len();
        self.live.retain(|e| !pred(e));
        self.staged.retain(|e| !pred(e));
        self.removed_total += (before - self.len()) as u64;
    }
}

/// Move one entity; false means retire it
fn step_entity(kind: &mut EntityKind, motion: &StepMotion) -> bool {
    match kind {
        EntityKind::Obstacle(obstacle) => match motion.scroll_speed {
            Some(speed) => {
                obstacle.position_x -= speed;
                obstacle.position_x >= motion.cleanup_x
            }
            None => true,
        },
        EntityKind::Particle(particle) => {
            if motion.scroll_speed.is_none() {
                return true;
            }
            particle.pos += particle.vel;
            particle.life -= EXHAUST_DECAY;
            particle.life > 0.0
        }
        EntityKind::Decorative(body) => step_decorative(body, motion),
    }
}

fn step_decorative(body: &mut DecorativeBody, motion: &StepMotion) -> bool {
    if body.kind == DecorativeKind::Cloud {
        if let Some(speed) = motion.scroll_speed {
            body.pos.x -= speed * CLOUD_PARALLAX;
            if body.pos.x < -CLOUD_WRAP_X {
                body.pos.x = CLOUD_WRAP_X;
            }
        }
        return true;
    }

    let Some(mult) = motion.cosmetic_speed else {
        return true;
    };
    body.pos.x += body.vel.x * mult;
    body.pos.y += body.vel.y * mult;
    body.rotation += body.rotation_speed;

    if body.kind.wraps() {
        if body.pos.x < -ORBIT_WRAP_X {
            body.pos.x = ORBIT_WRAP_X;
        } else if body.pos.x > ORBIT_WRAP_X {
            body.pos.x = -ORBIT_WRAP_X;
        }
        true
    } else if body.kind.is_transient() {
        body.pos.x >= TRANSIENT_CLEANUP_X
    } else {
        true
    }
}

/// Clamp values that should never occur to something the renderer and the
/// collision tests can survive
fn sanitize_entity(entity: &mut Entity, cleanup_x: f32) {
    match &mut entity.kind {
        EntityKind::Obstacle(o) => {
            if !o.gap_height.is_finite() || o.gap_height < 0.0 {
                log::error!("Obstacle {} had invalid gap {}, clamping", entity.id, o.gap_height);
                o.gap_height = if o.gap_height.is_finite() { 0.0 } else { PIPE_GAP_MIN };
            }
            if !o.gap_center_y.is_finite() {
                log::error!("Obstacle {} had non-finite gap center, clamping", entity.id);
                o.gap_center_y = 0.0;
            }
            if !o.position_x.is_finite() {
                log::error!("Obstacle {} had non-finite x, retiring offscreen", entity.id);
                o.position_x = cleanup_x;
            }
        }
        EntityKind::Particle(p) => {
            if !p.pos.is_finite() {
                log::error!("Particle {} had non-finite position, expiring", entity.id);
                p.pos = Vec2::ZERO;
                p.life = 0.0;
            }
        }
        EntityKind::Decorative(d) => {
            if !d.pos.is_finite() {
                log::error!("Decorative {} had non-finite position, resetting", entity.id);
                d.pos = Vec3::new(ORBIT_WRAP_X, 0.0, d.pos.z.clamp(-50.0, 0.0));
            }
        }
    }
}

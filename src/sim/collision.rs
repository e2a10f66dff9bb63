//! Collision detection between the bird and pipe pairs
//!
//! Everything is axis-aligned. A pipe pair is two solid spans that reach
//! to infinity above and below its gap; the bird is a fixed box shrunk by
//! the tolerance margin. Touching edges count as a hit.

use glam::Vec2;

use super::pool::EntityPool;
use super::state::{CollisionCause, ControlledObject, Obstacle};
use crate::config::GameConfig;
use crate::consts::{BIRD_BOX_MAX, BIRD_BOX_MIN};

/// Axis-aligned box, inclusive on every edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Whether `other` lies entirely inside this box
    #[inline]
    pub fn contains(&self, other: &Aabb) -> bool {
        other.min.x >= self.min.x
            && other.max.x <= self.max.x
            && other.min.y >= self.min.y
            && other.max.y <= self.max.y
    }

    /// Shrink on every side, never past the center
    pub fn shrink(&self, margin: f32) -> Aabb {
        let center = (self.min + self.max) * 0.5;
        let min = (self.min + Vec2::splat(margin)).min(center);
        let max = (self.max - Vec2::splat(margin)).max(center);
        Aabb { min, max }
    }

    #[inline]
    pub fn translate(&self, offset: Vec2) -> Aabb {
        Aabb {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

/// Fixed shapes derived from the config once at startup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionGeometry {
    pub bird_x: f32,
    /// Bird box relative to its origin, tolerance already applied
    pub bird_box: Aabb,
    pub pipe_half_width: f32,
    pub floor_y: f32,
    pub ceiling_y: f32,
}

impl CollisionGeometry {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            bird_x: config.bird_x,
            bird_box: Aabb::new(BIRD_BOX_MIN, BIRD_BOX_MAX).shrink(config.collision_tolerance),
            pipe_half_width: config.pipe_width / 2.0,
            floor_y: config.floor_y,
            ceiling_y: config.ceiling_y,
        }
    }

    /// World-space box of the bird at its current height
    pub fn bird_box(&self, bird: &ControlledObject) -> Aabb {
        self.bird_box.translate(Vec2::new(self.bird_x, bird.position_y))
    }

    /// Bottom and top solid spans of a pipe pair
    pub fn obstacle_spans(&self, obstacle: &Obstacle) -> [Aabb; 2] {
        let left = obstacle.position_x - self.pipe_half_width;
        let right = obstacle.position_x + self.pipe_half_width;
        [
            Aabb::new(
                Vec2::new(left, f32::NEG_INFINITY),
                Vec2::new(right, obstacle.gap_bottom()),
            ),
            Aabb::new(
                Vec2::new(left, obstacle.gap_top()),
                Vec2::new(right, f32::INFINITY),
            ),
        ]
    }

    /// Whether the obstacle's columns overlap the bird's x-range
    #[inline]
    pub fn overlaps_bird_x(&self, bird_box: &Aabb, obstacle: &Obstacle) -> bool {
        obstacle.position_x - self.pipe_half_width <= bird_box.max.x
            && obstacle.position_x + self.pipe_half_width >= bird_box.min.x
    }

    /// Whether the bird has left the vertical playfield
    #[inline]
    pub fn out_of_bounds(&self, bird: &ControlledObject) -> bool {
        bird.position_y < self.floor_y || bird.position_y > self.ceiling_y
    }
}

/// Any solid span overlapping the bird's box, using this tick's positions
pub fn test_collisions<'a>(
    geometry: &CollisionGeometry,
    bird: &ControlledObject,
    obstacles: impl IntoIterator<Item = &'a Obstacle>,
) -> bool {
    let bird_box = geometry.bird_box(bird);
    obstacles
        .into_iter()
        .filter(|o| geometry.overlaps_bird_x(&bird_box, o))
        .any(|o| {
            geometry
                .obstacle_spans(o)
                .iter()
                .any(|span| span.intersects(&bird_box))
        })
}

/// Boundary first, then pipes
pub fn detect_collision(
    geometry: &CollisionGeometry,
    bird: &ControlledObject,
    pool: &EntityPool,
) -> Option<CollisionCause> {
    if geometry.out_of_bounds(bird) {
        Some(CollisionCause::Boundary)
    } else if test_collisions(geometry, bird, pool.obstacles()) {
        Some(CollisionCause::Obstacle)
    } else {
        None
    }
}

/// Flag obstacles that reached the bird's x. Each counts once.
pub fn mark_passed(pool: &mut EntityPool, bird_x: f32) -> u32 {
    let mut passed = 0;
    for obstacle in pool.obstacles_mut() {
        if !obstacle.passed && obstacle.position_x <= bird_x {
            obstacle.passed = true;
            passed += 1;
        }
    }
    passed
}

//! 2D geometry shared by motion and collision code
//!
//! Vectors are `glam::Vec2` values. Direction math always goes through
//! `normalize_or_zero`, so a degenerate direction yields `Vec2::ZERO`
//! instead of NaNs.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Rectangular play field spanning `[0, width] x [0, height]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 760.0,
        }
    }
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Clamp a circle so it stays fully inside the arena.
    ///
    /// A radius larger than half the arena pins the circle to the center
    /// line instead of producing an inverted range.
    pub fn clamp_circle(&self, pos: Vec2, radius: f32) -> Vec2 {
        let rx = radius.min(self.width / 2.0).max(0.0);
        let ry = radius.min(self.height / 2.0).max(0.0);
        Vec2::new(
            pos.x.clamp(rx, self.width - rx),
            pos.y.clamp(ry, self.height - ry),
        )
    }

    /// True if the point lies inside the arena grown by `margin`
    pub fn contains(&self, pos: Vec2, margin: f32) -> bool {
        pos.x >= -margin
            && pos.y >= -margin
            && pos.x <= self.width + margin
            && pos.y <= self.height + margin
    }

    /// Total boundary length
    pub fn perimeter(&self) -> f32 {
        2.0 * (self.width + self.height)
    }

    /// Point on the boundary at arc-length `t` (wraps), walking
    /// top → right → bottom → left
    pub fn boundary_point(&self, t: f32) -> Vec2 {
        let t = t.rem_euclid(self.perimeter().max(f32::EPSILON));
        if t < self.width {
            Vec2::new(t, 0.0)
        } else if t < self.width + self.height {
            Vec2::new(self.width, t - self.width)
        } else if t < 2.0 * self.width + self.height {
            Vec2::new(self.width - (t - self.width - self.height), self.height)
        } else {
            Vec2::new(0.0, self.height - (t - 2.0 * self.width - self.height))
        }
    }

    /// The arena corner farthest from `pos`
    pub fn farthest_corner(&self, pos: Vec2) -> Vec2 {
        let x = if pos.x < self.width / 2.0 { self.width } else { 0.0 };
        let y = if pos.y < self.height / 2.0 { self.height } else { 0.0 };
        Vec2::new(x, y)
    }
}

/// Circle-circle overlap: `|p1 - p2| < r1 + r2`
#[inline]
pub fn circles_overlap(p1: Vec2, r1: f32, p2: Vec2, r2: f32) -> bool {
    let reach = r1 + r2;
    p1.distance_squared(p2) < reach * reach
}

/// Unit vector from `from` toward `to` (zero when they coincide)
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Unit vector for an angle in radians
#[inline]
pub fn from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` library for planar robot pose geometry."]
#![doc = ""]
#![doc = "This crate provides the pose of a simulated robot in the arena frame,"]
#![doc = "heading helpers, and the wall/ray geometry behind the simulated rangefinder."]

use core::f64::consts::PI;
use core::fmt;
use libm::{atan2, sqrt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod error;
pub mod ray;

pub use error::KinematicsError;
pub use ray::{Segment, cast_ray};

/// A 2‑D pose `(x, y, θ)` in arena units and radians (θ measured
/// counter‑clockwise from the x‑axis in the arena frame).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// Arena‑frame x position.
    pub x: f64,
    /// Arena‑frame y position.
    pub y: f64,
    /// Heading (rad), normalized to `[-PI, PI)`.
    pub theta: f64,
}

impl Pose {
    /// Pose at `(x, y)` facing `theta` radians.
    pub const fn new(x: f64, y: f64, theta: f64) -> Self {
        Pose { x, y, theta }
    }

    /// Wraps `angle` into `[-PI, PI)`; `PI` itself maps to `-PI`.
    pub fn normalize_angle(angle: f64) -> f64 {
        let wrapped = angle % (2.0 * PI);
        if wrapped >= PI {
            wrapped - 2.0 * PI
        } else if wrapped < -PI {
            wrapped + 2.0 * PI
        } else {
            wrapped
        }
    }

    /// Returns a copy of this pose shifted by `(dx, dy)`; the heading is kept.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Pose {
            x: self.x + dx,
            y: self.y + dy,
            theta: self.theta,
        }
    }

    /// Euclidean distance from this pose's position to `(x, y)`.
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        let dx = x - self.x;
        let dy = y - self.y;
        sqrt(dx * dx + dy * dy)
    }

    /// Returns this pose with its heading turned toward `target` by at most
    /// `max_step` radians, taking the shorter way around.
    ///
    /// # Arguments
    ///
    /// * `target`: Desired heading in radians (any range).
    /// * `max_step`: Largest allowed heading change, in radians. Negative values are treated as zero.
    pub fn turned_toward(&self, target: f64, max_step: f64) -> Self {
        let error = Self::normalize_angle(target - self.theta);
        let step = error.clamp(-max_step.max(0.0), max_step.max(0.0));
        Pose {
            x: self.x,
            y: self.y,
            theta: Self::normalize_angle(self.theta + step),
        }
    }
}

/// Heading (rad) of the displacement `(dx, dy)`, or `None` for a zero displacement.
pub fn heading_of(dx: f64, dy: f64) -> Option<f64> {
    if dx == 0.0 && dy == 0.0 {
        None
    } else {
        Some(Pose::normalize_angle(atan2(dy, dx)))
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}) facing {:.2} rad", self.x, self.y, self.theta)
    }
}

//! Wall segments and ray casting for the simulated rangefinder.

use libm::{cos, fabs, sin, sqrt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{KinematicsError, Pose};

/// Determinants smaller than this are treated as parallel lines.
const PARALLEL_EPSILON: f64 = 1e-12;

/// A straight wall between two points of the arena frame.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    start: (f64, f64),
    end: (f64, f64),
}

impl Segment {
    /// Construct a wall from `start` to `end`.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::NonFiniteCoordinate)` if any coordinate is `NaN` or infinite.
    /// Returns `Err(KinematicsError::DegenerateSegment)` if both endpoints are the same point.
    pub fn new(start: (f64, f64), end: (f64, f64)) -> Result<Self, KinematicsError> {
        let coords = [start.0, start.1, end.0, end.1];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(KinematicsError::NonFiniteCoordinate("segment endpoints must be finite"));
        }
        if start == end {
            return Err(KinematicsError::DegenerateSegment("endpoints must differ"));
        }
        Ok(Segment { start, end })
    }

    /// Returns the start point.
    pub fn start(&self) -> (f64, f64) {
        self.start
    }

    /// Returns the end point.
    pub fn end(&self) -> (f64, f64) {
        self.end
    }

    /// Length of the wall.
    pub fn length(&self) -> f64 {
        let dx = self.end.0 - self.start.0;
        let dy = self.end.1 - self.start.1;
        sqrt(dx * dx + dy * dy)
    }

    /// Distance along the ray `origin + t·(dx, dy)` at which it crosses this
    /// wall, if it does so at `t >= 0`.
    fn intersect(&self, origin: (f64, f64), dir: (f64, f64)) -> Option<f64> {
        let ex = self.end.0 - self.start.0;
        let ey = self.end.1 - self.start.1;
        let denom = cross(dir.0, dir.1, ex, ey);
        if fabs(denom) < PARALLEL_EPSILON {
            return None;
        }
        let wx = self.start.0 - origin.0;
        let wy = self.start.1 - origin.1;
        let t = cross(wx, wy, ex, ey) / denom;
        let u = cross(wx, wy, dir.0, dir.1) / denom;
        if t >= 0.0 && (0.0..=1.0).contains(&u) {
            Some(t)
        } else {
            None
        }
    }
}

fn cross(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}

/// Casts a ray from `pose` along its heading and returns the distance to the
/// nearest wall, or `max_range` when nothing is closer.
///
/// # Errors
///
/// Returns `Err(KinematicsError::InvalidRange)` if `max_range` is not positive and finite.
pub fn cast_ray(pose: &Pose, walls: &[Segment], max_range: f64) -> Result<f64, KinematicsError> {
    if !(max_range.is_finite() && max_range > 0.0) {
        return Err(KinematicsError::InvalidRange("max range must be positive and finite"));
    }
    let dir = (cos(pose.theta), sin(pose.theta));
    let nearest = walls
        .iter()
        .filter_map(|wall| wall.intersect((pose.x, pose.y), dir))
        .fold(max_range, f64::min);
    Ok(nearest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;
    const EPSILON: f64 = 1e-6;

    fn square(half: f64) -> [Segment; 4] {
        [
            Segment::new((-half, -half), (half, -half)).unwrap(),
            Segment::new((half, -half), (half, half)).unwrap(),
            Segment::new((half, half), (-half, half)).unwrap(),
            Segment::new((-half, half), (-half, -half)).unwrap(),
        ]
    }

    #[test]
    fn test_segment_constructor() {
        let wall = Segment::new((0.0, 0.0), (3.0, 4.0)).unwrap();
        assert_eq!(wall.start(), (0.0, 0.0));
        assert_eq!(wall.end(), (3.0, 4.0));
        assert!((wall.length() - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_segment_invalid() {
        let result = Segment::new((1.0, 1.0), (1.0, 1.0));
        assert!(matches!(result, Err(KinematicsError::DegenerateSegment("endpoints must differ"))));
        let result = Segment::new((f64::NAN, 0.0), (1.0, 1.0));
        assert!(matches!(result, Err(KinematicsError::NonFiniteCoordinate(_))));
    }

    #[test]
    fn test_cast_ray_hits_facing_wall() {
        let walls = square(10.0);
        // At origin facing +x, the right wall is 10 away
        let range = cast_ray(&Pose::new(0.0, 0.0, 0.0), &walls, 100.0).unwrap();
        assert!((range - 10.0).abs() < EPSILON);

        // From (0, 4) facing -y, the bottom wall is 14 away
        let range = cast_ray(&Pose::new(0.0, 4.0, -PI / 2.0), &walls, 100.0).unwrap();
        assert!((range - 14.0).abs() < EPSILON);
    }

    #[test]
    fn test_cast_ray_diagonal() {
        let walls = square(10.0);
        // Aiming at (10, 5) hits the right wall at distance sqrt(125)
        let heading = 5.0_f64.atan2(10.0);
        let range = cast_ray(&Pose::new(0.0, 0.0, heading), &walls, 100.0).unwrap();
        assert!((range - 125.0_f64.sqrt()).abs() < EPSILON);
    }

    #[test]
    fn test_cast_ray_capped_at_max_range() {
        let walls = square(10.0);
        let range = cast_ray(&Pose::new(0.0, 0.0, 0.0), &walls, 4.0).unwrap();
        assert!((range - 4.0).abs() < EPSILON);

        // No walls at all
        let range = cast_ray(&Pose::new(0.0, 0.0, 0.0), &[], 25.0).unwrap();
        assert!((range - 25.0).abs() < EPSILON);
    }

    #[test]
    fn test_cast_ray_ignores_walls_behind() {
        let wall = [Segment::new((-5.0, -1.0), (-5.0, 1.0)).unwrap()];
        let range = cast_ray(&Pose::new(0.0, 0.0, 0.0), &wall, 50.0).unwrap();
        assert!((range - 50.0).abs() < EPSILON);
    }

    #[test]
    fn test_cast_ray_invalid_range() {
        let result = cast_ray(&Pose::default(), &[], 0.0);
        assert!(matches!(result, Err(KinematicsError::InvalidRange(_))));
        let result = cast_ray(&Pose::default(), &[], f64::INFINITY);
        assert!(matches!(result, Err(KinematicsError::InvalidRange(_))));
    }
}

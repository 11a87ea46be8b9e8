use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use tagsim_kinematics::{Pose, Segment, cast_ray, heading_of};
use tagsim_navigation::MoveCommand;

use crate::config::RobotSettings;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaserReading {
    pub timestamp: f64,
    pub range: f64,
}

/// Kinematic model of the simulated robot.
///
/// Moves are discrete jumps along the arena axes. The heading follows the
/// direction of the last move, turning at most `turn_step` per
/// [`RobotSim::refresh_state`] call. The laser points along the heading.
pub struct RobotSim {
    pose: Pose,
    desired_heading: f64,
    step_size: f64,
    turn_step: f64,
    walls: Vec<Segment>,
    laser_max_range: f64,
    laser_noise: f64,
    rng: StdRng,
    last_laser: Option<LaserReading>,
}

impl RobotSim {
    pub fn from_settings(settings: &RobotSettings, walls: Vec<Segment>) -> Result<Self> {
        let pose = Pose::new(
            settings.start_x,
            settings.start_y,
            Pose::normalize_angle(settings.start_heading),
        );
        // Probe once so a bad range is a startup error, not a silent fallback later
        cast_ray(&pose, &walls, settings.laser_max_range).map_err(|e| AppError::InvalidSetting {
            key: "robot.laser_max_range",
            reason: e.to_string(),
        })?;
        Ok(Self {
            pose,
            desired_heading: pose.theta,
            step_size: settings.step_size,
            turn_step: settings.turn_step,
            walls,
            laser_max_range: settings.laser_max_range,
            laser_noise: settings.laser_noise,
            rng: StdRng::seed_from_u64(settings.laser_seed),
            last_laser: None,
        })
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn last_laser(&self) -> Option<LaserReading> {
        self.last_laser
    }

    /// Moves `delta` unit steps along x.
    pub fn move_x(&mut self, delta: f64) {
        self.translate(delta * self.step_size, 0.0);
    }

    /// Moves `delta` unit steps along y.
    pub fn move_y(&mut self, delta: f64) {
        self.translate(0.0, delta * self.step_size);
    }

    pub fn apply(&mut self, command: MoveCommand) {
        match command {
            MoveCommand::Hold => {}
            MoveCommand::MoveX(delta) => self.move_x(delta),
            MoveCommand::MoveY(delta) => self.move_y(delta),
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.pose = self.pose.translated(dx, dy);
        if let Some(heading) = heading_of(dx, dy) {
            self.desired_heading = heading;
        }
    }

    /// Advances the heading toward the direction of travel by one turn step.
    pub fn refresh_state(&mut self) {
        self.pose = self.pose.turned_toward(self.desired_heading, self.turn_step);
    }

    /// Samples the laser at time `now` and returns a one-line summary.
    pub fn log_laser_value(&mut self, now: f64) -> String {
        let exact = cast_ray(&self.pose, &self.walls, self.laser_max_range).unwrap_or(self.laser_max_range);
        let noise = if self.laser_noise > 0.0 {
            self.rng.random_range(-self.laser_noise..=self.laser_noise)
        } else {
            0.0
        };
        let range = (exact + noise).clamp(0.0, self.laser_max_range);
        self.last_laser = Some(LaserReading { timestamp: now, range });
        debug!(range, exact, now, "Laser sampled");
        format!("Laser: {:6.1} at {:.2}s from {}", range, now, self.pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    const EPSILON: f64 = 1e-9;

    fn quiet_settings() -> RobotSettings {
        RobotSettings {
            laser_noise: 0.0,
            ..RobotSettings::default()
        }
    }

    fn box_walls(half: f64) -> Vec<Segment> {
        let c = [(-half, -half), (half, -half), (half, half), (-half, half)];
        (0..4).map(|i| Segment::new(c[i], c[(i + 1) % 4]).unwrap()).collect()
    }

    #[test]
    fn test_scenario_moves() {
        let mut robot = RobotSim::from_settings(&quiet_settings(), vec![]).unwrap();
        assert_eq!(robot.pose(), Pose::new(0.0, 0.0, 0.0));
        robot.move_x(1.0);
        robot.move_y(1.0);
        robot.move_x(-1.0);
        assert_eq!((robot.pose().x, robot.pose().y), (0.0, 1.0));
    }

    #[test]
    fn test_position_is_vector_sum_of_moves() {
        let moves: [(char, f64); 6] = [('x', 2.0), ('y', -1.0), ('x', -5.0), ('y', 4.0), ('y', 1.0), ('x', 3.0)];
        let (sum_x, sum_y) = moves.iter().fold((0.0, 0.0), |(sx, sy), (axis, d)| match axis {
            'x' => (sx + d, sy),
            _ => (sx, sy + d),
        });

        // Forward and reversed order reach the same point
        for order in [moves.to_vec(), moves.iter().rev().copied().collect()] {
            let mut robot = RobotSim::from_settings(&quiet_settings(), vec![]).unwrap();
            for (axis, d) in order {
                match axis {
                    'x' => robot.move_x(d),
                    _ => robot.move_y(d),
                }
            }
            assert_eq!((robot.pose().x, robot.pose().y), (sum_x, sum_y));
        }
    }

    #[test]
    fn test_step_size_scales_moves() {
        let settings = RobotSettings {
            step_size: 2.5,
            ..quiet_settings()
        };
        let mut robot = RobotSim::from_settings(&settings, vec![]).unwrap();
        robot.move_y(-2.0);
        assert!((robot.pose().y - (-5.0)).abs() < EPSILON);
        assert!((robot.step_size() - 2.5).abs() < EPSILON);
    }

    #[test]
    fn test_apply_hold_is_noop() {
        let mut robot = RobotSim::from_settings(&quiet_settings(), vec![]).unwrap();
        robot.apply(MoveCommand::Hold);
        assert_eq!(robot.pose(), Pose::default());
        robot.apply(MoveCommand::MoveX(0.5));
        assert!((robot.pose().x - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_refresh_turns_toward_travel() {
        let mut robot = RobotSim::from_settings(&quiet_settings(), vec![]).unwrap();
        robot.move_y(1.0);
        // Heading only changes on refresh
        assert!(robot.pose().theta.abs() < EPSILON);
        robot.refresh_state();
        assert!((robot.pose().theta - 0.2).abs() < EPSILON);
        for _ in 0..20 {
            robot.refresh_state();
        }
        assert!((robot.pose().theta - PI / 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_laser_reads_wall_distance() {
        let mut robot = RobotSim::from_settings(&quiet_settings(), box_walls(50.0)).unwrap();
        robot.move_x(10.0);
        let summary = robot.log_laser_value(2.5);
        let reading = robot.last_laser().unwrap();
        assert_eq!(reading.timestamp, 2.5);
        assert!((reading.range - 40.0).abs() < EPSILON);
        assert!(summary.starts_with("Laser:   40.0 at 2.50s"));
    }

    #[test]
    fn test_laser_noise_is_bounded_and_seeded() {
        let settings = RobotSettings {
            laser_noise: 0.5,
            ..RobotSettings::default()
        };
        let mut a = RobotSim::from_settings(&settings, box_walls(50.0)).unwrap();
        let mut b = RobotSim::from_settings(&settings, box_walls(50.0)).unwrap();
        for i in 0..10 {
            a.log_laser_value(i as f64);
            b.log_laser_value(i as f64);
            let ra = a.last_laser().unwrap().range;
            assert!((ra - 50.0).abs() <= 0.5);
            assert_eq!(ra, b.last_laser().unwrap().range);
        }
    }

    #[test]
    fn test_invalid_laser_range_rejected() {
        let settings = RobotSettings {
            laser_max_range: -1.0,
            ..quiet_settings()
        };
        let result = RobotSim::from_settings(&settings, vec![]);
        assert!(matches!(
            result,
            Err(AppError::InvalidSetting { key: "robot.laser_max_range", .. })
        ));
    }
}

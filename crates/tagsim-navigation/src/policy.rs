use tagsim_kinematics::Pose;
use tracing::debug;

use crate::error::NavigationError;
use crate::point_types::WorldPoint;

/// One move for the robot, expressed in unit steps along a single axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveCommand {
    /// Stay put. Issued when there is no target or the target has been reached.
    Hold,
    /// Move along the x-axis by the given number of unit steps.
    MoveX(f64),
    /// Move along the y-axis by the given number of unit steps.
    MoveY(f64),
}

impl MoveCommand {
    /// `true` for [`MoveCommand::Hold`].
    pub fn is_hold(&self) -> bool {
        matches!(self, MoveCommand::Hold)
    }
}

/// Greedy axis-aligned waypoint follower.
///
/// Each call to [`AutoPolicy::step`] closes the larger of the two axis errors
/// by at most `max_steps` unit steps, so the robot walks a staircase toward
/// the target and never overshoots it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoPolicy {
    /// Arena units covered by one unit step of the robot.
    unit_step: f64,
    /// Largest move, in unit steps, issued per call.
    max_steps: f64,
    /// Distance (arena units) at which the target counts as reached.
    arrival_tolerance: f64,
}

impl AutoPolicy {
    /// Creates a new policy.
    ///
    /// # Arguments
    /// * `unit_step` - Arena units per unit step (the robot's step size)
    /// * `max_steps` - Upper bound on the magnitude of each issued move, in unit steps
    /// * `arrival_tolerance` - Distance below which the policy holds position
    ///
    /// # Returns
    /// * `Result<Self, NavigationError>` - The policy or an error if a parameter is invalid
    pub fn new(unit_step: f64, max_steps: f64, arrival_tolerance: f64) -> Result<Self, NavigationError> {
        if !(unit_step.is_finite() && unit_step > 0.0) {
            return Err(NavigationError::InvalidStepSize("unit step must be positive"));
        }
        if !(max_steps.is_finite() && max_steps > 0.0) {
            return Err(NavigationError::InvalidMoveBound("max steps must be positive"));
        }
        if !(arrival_tolerance.is_finite() && arrival_tolerance >= 0.0) {
            return Err(NavigationError::InvalidTolerance("tolerance must be non-negative"));
        }
        Ok(Self {
            unit_step,
            max_steps,
            arrival_tolerance,
        })
    }

    /// Computes the next move toward `target`.
    ///
    /// Returns [`MoveCommand::Hold`] when `target` is `None` or already within
    /// the arrival tolerance. Otherwise the axis with the larger error is
    /// chosen (x wins ties) and the move is saturated to `max_steps`.
    pub fn step(&self, pose: &Pose, target: Option<WorldPoint>) -> MoveCommand {
        let Some(target) = target else {
            return MoveCommand::Hold;
        };

        let dx = target.x - pose.x;
        let dy = target.y - pose.y;
        if pose.distance_to(target.x, target.y) <= self.arrival_tolerance {
            return MoveCommand::Hold;
        }

        let command = if dx.abs() >= dy.abs() {
            MoveCommand::MoveX(self.saturate(dx))
        } else {
            MoveCommand::MoveY(self.saturate(dy))
        };
        debug!(?command, dx, dy, target = %target, "Computed autonomous move");
        command
    }

    fn saturate(&self, error: f64) -> f64 {
        (error / self.unit_step).clamp(-self.max_steps, self.max_steps)
    }
}

/// Picks the waypoint the robot should head for from the coordinator's list.
///
/// The coordinator pushes its remaining waypoints in visiting order, so the
/// head of the list is the active target.
pub fn select_target(waypoints: &[WorldPoint]) -> Option<WorldPoint> {
    waypoints.first().copied()
}

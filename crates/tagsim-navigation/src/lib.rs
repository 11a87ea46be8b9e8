//! Waypoint following for the simulated robot.
//!
//! The autonomous policy turns the robot's pose and the coordinator's current
//! waypoint into one bounded axis-aligned move per autonomous tick.

pub mod error;
pub mod point_types;
pub mod policy;

pub use error::NavigationError;
pub use point_types::WorldPoint;
pub use policy::{AutoPolicy, MoveCommand, select_target};

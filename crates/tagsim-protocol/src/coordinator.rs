//! Coordinator stream decoding.
//!
//! The coordinator writes one JSON object per line. A line may carry a
//! rangefinder reading (`"f"` front, `"b"` back), a waypoint list (`"w"`), or
//! both. Any other keys are ignored.

use serde::Deserialize;
use tagsim_navigation::WorldPoint;

use crate::error::{ProtocolError, Result};

/// Front/back distances reported for the robot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeReading {
    /// Distance to the nearest obstacle ahead of the robot.
    pub front: f64,
    /// Distance to the nearest obstacle behind the robot.
    pub back: f64,
}

/// The content of one coordinator line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoordinatorUpdate {
    /// Rangefinder reading, if the line carried `"f"` and `"b"`.
    pub sensor: Option<RangeReading>,
    /// Waypoints in visiting order, if the line carried `"w"`.
    pub waypoints: Option<Vec<WorldPoint>>,
}

#[derive(Deserialize)]
struct RawUpdate {
    f: Option<f64>,
    b: Option<f64>,
    w: Option<Vec<[f64; 2]>>,
}

/// Decodes one line of the coordinator stream.
///
/// # Errors
///
/// * [`ProtocolError::Json`] if the line is not a JSON object of the expected shape
/// * [`ProtocolError::IncompleteSensor`] if only one of `"f"`/`"b"` is present
/// * [`ProtocolError::Empty`] if the line carries neither kind of update
pub fn decode_update(line: &str) -> Result<CoordinatorUpdate> {
    let raw: RawUpdate = serde_json::from_str(line.trim())?;

    let sensor = match (raw.f, raw.b) {
        (Some(front), Some(back)) => Some(RangeReading { front, back }),
        (None, None) => None,
        _ => return Err(ProtocolError::IncompleteSensor),
    };
    let waypoints = raw
        .w
        .map(|points| points.into_iter().map(WorldPoint::from).collect::<Vec<_>>());

    if sensor.is_none() && waypoints.is_none() {
        return Err(ProtocolError::Empty);
    }
    Ok(CoordinatorUpdate { sensor, waypoints })
}

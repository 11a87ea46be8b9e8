use parking_lot::RwLock;
use std::sync::Arc;

use tagsim_navigation::WorldPoint;
use tagsim_protocol::CoordinatorUpdate;

/// Last rangefinder reading pushed by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub timestamp: f64,
    pub front: f64,
    pub back: f64,
}

/// Last waypoint list pushed by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointList {
    pub timestamp: f64,
    pub points: Vec<WorldPoint>,
}

/// Everything the coordinator has told us so far. `None` means no reading yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorSnapshot {
    pub sensor: Option<SensorReading>,
    pub waypoints: Option<WaypointList>,
}

impl SensorSnapshot {
    /// Returns a new snapshot with `update` applied, stamped with `now`.
    /// Parts the update does not carry are kept from `self`.
    pub fn with_update(&self, update: CoordinatorUpdate, now: f64) -> Self {
        let sensor = match update.sensor {
            Some(r) => Some(SensorReading {
                timestamp: now,
                front: r.front,
                back: r.back,
            }),
            None => self.sensor,
        };
        let waypoints = match update.waypoints {
            Some(points) => Some(WaypointList { timestamp: now, points }),
            None => self.waypoints.clone(),
        };
        SensorSnapshot { sensor, waypoints }
    }

    pub fn sensor_line(&self) -> String {
        match &self.sensor {
            Some(s) => format!("Sensor: {:4} f {:.0} b {:.0}", whole_seconds(s.timestamp), s.front, s.back),
            None => "Sensor: << no reading >>".to_string(),
        }
    }

    pub fn waypoint_line(&self) -> String {
        match &self.waypoints {
            Some(w) => {
                let points: Vec<String> = w.points.iter().map(|p| p.to_string()).collect();
                format!("Waypoints: {:4} [{}]", whole_seconds(w.timestamp), points.join(", "))
            }
            None => "Waypoints: << no reading >>".to_string(),
        }
    }
}

/// Display timestamps are whole seconds, truncated.
fn whole_seconds(timestamp: f64) -> i64 {
    timestamp.trunc() as i64
}

/// Single-slot cell holding the latest snapshot. Writers swap in a whole new
/// `Arc`, so a reader never observes a half-applied update.
pub type Blackboard = Arc<RwLock<Arc<SensorSnapshot>>>;

pub fn snapshot(bb: &Blackboard) -> Arc<SensorSnapshot> {
    Arc::clone(&bb.read())
}

pub fn apply_update(bb: &Blackboard, update: CoordinatorUpdate, now: f64) {
    let mut slot = bb.write();
    let next = slot.with_update(update, now);
    *slot = Arc::new(next);
}

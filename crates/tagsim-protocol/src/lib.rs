//! Wire formats between the simulated robot and the waypoint coordinator.
//!
//! Two directions, two formats:
//!
//! - **Tag messages** (robot → coordinator, UDP): one compact JSON object per
//!   datagram, in the layout a camera-side tag streamer produces.
//! - **Coordinator updates** (coordinator → robot, TCP): newline-delimited
//!   JSON objects carrying rangefinder readings and waypoint lists.
//!
//! ```text
//! tag datagram : {"t":12.5,"tags":[{"i":4,"p":[[x,y],[x,y],[x,y],[x,y]]},...]}
//! stream line  : {"f":120,"b":43}            sensor reading
//!                {"w":[[10,20],[40,-5]]}     waypoint push
//! ```

#![warn(missing_docs)]

pub mod coordinator;
pub mod error;
pub mod tag;

pub use coordinator::{CoordinatorUpdate, RangeReading, decode_update};
pub use error::ProtocolError;
pub use tag::{CornerTag, TagEncoder, TagMessage, TagObservation, decode_tag_message};

/// Coordinator UDP port for tag messages (0xB00).
pub const TAG_DATA_PORT: u16 = 0x0B00;

/// Coordinator TCP port for the sensor/waypoint stream (0xBAA).
pub const WAYPOINT_MSG_PORT: u16 = 0x0BAA;

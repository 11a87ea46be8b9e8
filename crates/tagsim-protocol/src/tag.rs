//! Tag message encoding.
//!
//! # Wire Format
//!
//! One UTF-8 JSON object per datagram, compact, no trailing newline, with
//! fields in this order:
//!
//! ```text
//! {"t":<f64 seconds>,"tags":[{"i":<u32 id>,"p":[[x,y],[x,y],[x,y],[x,y]]}, ...]}
//! ```
//!
//! The robot's own tag comes first, followed by the fixed arena corner tags.
//! Each tag is a square of side `tag_size` centred on the tag position. Its
//! corners are listed in tag-frame order `(-h,-h) (h,-h) (h,h) (-h,h)`, rotated
//! by the tag's heading, so the first edge points along the heading.

use serde::{Deserialize, Serialize};
use tagsim_kinematics::Pose;

use crate::error::{ProtocolError, Result};

/// Corner order of a tag square in its own frame, in units of the half side.
const CORNER_SIGNS: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

/// One decoded or to-be-encoded tag message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagMessage {
    /// Emission time (seconds since simulator start).
    pub t: f64,
    /// Observed tags, robot first.
    pub tags: Vec<TagObservation>,
}

/// A single tag sighting: its id and its four corners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagObservation {
    /// Tag id.
    #[serde(rename = "i")]
    pub id: u32,
    /// Corner points in tag-frame order.
    #[serde(rename = "p")]
    pub corners: [[f64; 2]; 4],
}

impl TagObservation {
    /// Recovers the tag pose: centroid of the corners, heading along the first edge.
    pub fn pose(&self) -> Pose {
        let cx = self.corners.iter().map(|c| c[0]).sum::<f64>() / 4.0;
        let cy = self.corners.iter().map(|c| c[1]).sum::<f64>() / 4.0;
        let [p0, p1, ..] = self.corners;
        let theta = (p1[1] - p0[1]).atan2(p1[0] - p0[0]);
        Pose::new(cx, cy, Pose::normalize_angle(theta))
    }
}

impl TagMessage {
    /// Looks up a tag by id.
    pub fn find(&self, id: u32) -> Option<&TagObservation> {
        self.tags.iter().find(|tag| tag.id == id)
    }
}

/// A fixed reference tag marking the arena.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerTag {
    /// Tag id, distinct from the robot's.
    pub id: u32,
    /// Arena-frame x of the tag centre.
    pub x: f64,
    /// Arena-frame y of the tag centre.
    pub y: f64,
}

/// Turns robot poses into tag messages.
#[derive(Debug, Clone)]
pub struct TagEncoder {
    robot_tag_id: u32,
    half_size: f64,
    corner_tags: Vec<TagObservation>,
}

impl TagEncoder {
    /// Creates an encoder for the robot tag `robot_tag_id` with side `tag_size`.
    ///
    /// Corner tag geometry never changes, so it is computed once here.
    pub fn new(robot_tag_id: u32, tag_size: f64, corner_tags: &[CornerTag]) -> Result<Self> {
        if !(tag_size.is_finite() && tag_size > 0.0) {
            return Err(ProtocolError::InvalidTagSize(tag_size));
        }
        let half_size = tag_size / 2.0;
        let corner_tags = corner_tags
            .iter()
            .map(|tag| TagObservation {
                id: tag.id,
                corners: square(&Pose::new(tag.x, tag.y, 0.0), half_size),
            })
            .collect();
        Ok(Self {
            robot_tag_id,
            half_size,
            corner_tags,
        })
    }

    /// Returns the robot's tag id.
    pub fn robot_tag_id(&self) -> u32 {
        self.robot_tag_id
    }

    /// Builds the message for `pose` at time `t`.
    pub fn message(&self, pose: &Pose, t: f64) -> Result<TagMessage> {
        if !(pose.x.is_finite() && pose.y.is_finite() && pose.theta.is_finite()) {
            return Err(ProtocolError::NonFinitePose {
                x: pose.x,
                y: pose.y,
                theta: pose.theta,
            });
        }
        let mut tags = Vec::with_capacity(1 + self.corner_tags.len());
        tags.push(TagObservation {
            id: self.robot_tag_id,
            corners: square(pose, self.half_size),
        });
        tags.extend(self.corner_tags.iter().cloned());
        Ok(TagMessage { t, tags })
    }

    /// Encodes `pose` at time `t` into datagram bytes.
    ///
    /// Identical inputs always produce identical bytes.
    pub fn encode(&self, pose: &Pose, t: f64) -> Result<Vec<u8>> {
        let message = self.message(pose, t)?;
        Ok(serde_json::to_vec(&message)?)
    }
}

/// Reference decoder for tag datagrams, as run by the coordinator.
pub fn decode_tag_message(bytes: &[u8]) -> Result<TagMessage> {
    Ok(serde_json::from_slice(bytes)?)
}

fn square(pose: &Pose, half_size: f64) -> [[f64; 2]; 4] {
    let (s, c) = pose.theta.sin_cos();
    CORNER_SIGNS.map(|(sx, sy)| {
        let ux = sx * half_size;
        let uy = sy * half_size;
        [pose.x + ux * c - uy * s, pose.y + ux * s + uy * c]
    })
}

//! Errors raised by the wire codecs.

use thiserror::Error;

/// Errors produced while encoding or decoding coordinator traffic.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The bytes are not JSON of the expected shape.
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Only one of `"f"`/`"b"` was present.
    #[error("Sensor reading needs both front and back distances")]
    IncompleteSensor,

    /// Neither a sensor reading nor waypoints.
    #[error("Message carries neither a sensor reading nor waypoints")]
    Empty,

    /// Tag side length is zero, negative or not finite.
    #[error("Tag size must be positive and finite, got {0}")]
    InvalidTagSize(f64),

    /// The pose to encode contains `NaN` or an infinity.
    #[error("Pose is not finite: ({x}, {y}, {theta})")]
    NonFinitePose {
        /// Offending x.
        x: f64,
        /// Offending y.
        y: f64,
        /// Offending heading.
        theta: f64,
    },
}

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

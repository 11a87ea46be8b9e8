#![warn(missing_docs)]

//! Error types for the kinematics library.
//!
//! This module defines error types that can occur while building arena
//! geometry and sampling it.

use core::fmt;

/// Errors that can occur in arena geometry calculations.
#[derive(Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// Error for a degenerate wall.
    /// This variant is returned when a segment's endpoints coincide.
    DegenerateSegment(&'static str),
    /// Error for an invalid sensor range.
    /// This variant is returned when a maximum range is not a positive, finite number.
    InvalidRange(&'static str),
    /// Error for non-finite coordinates.
    /// This variant is returned when a point contains `NaN` or an infinity.
    NonFiniteCoordinate(&'static str),
}

impl core::fmt::Display for KinematicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KinematicsError::DegenerateSegment(msg) => write!(f, "Degenerate segment: {}", msg),
            KinematicsError::InvalidRange(msg) => write!(f, "Invalid range: {}", msg),
            KinematicsError::NonFiniteCoordinate(msg) => write!(f, "Non-finite coordinate: {}", msg),
        }
    }
}

impl core::error::Error for KinematicsError {}

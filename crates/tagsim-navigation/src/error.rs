//! This module defines the error types used by the `tagsim-navigation` crate.

#![warn(missing_docs)]

/// Error type for navigation operations.
///
/// This enum encapsulates the errors that can occur while configuring the
/// autonomous policy.
#[derive(Debug, PartialEq)]
pub enum NavigationError {
    /// Error for an invalid unit step.
    /// This variant is returned when the robot's unit step is not positive and finite.
    InvalidStepSize(&'static str),
    /// Error for an invalid per-tick move bound.
    /// This variant is returned when the move bound is not positive and finite.
    InvalidMoveBound(&'static str),
    /// Error for an invalid arrival tolerance.
    /// This variant is returned when the tolerance is negative or not finite.
    InvalidTolerance(&'static str),
}

impl core::fmt::Display for NavigationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NavigationError::InvalidStepSize(msg) => write!(f, "Invalid step size: {}", msg),
            NavigationError::InvalidMoveBound(msg) => write!(f, "Invalid move bound: {}", msg),
            NavigationError::InvalidTolerance(msg) => write!(f, "Invalid arrival tolerance: {}", msg),
        }
    }
}

impl core::error::Error for NavigationError {}

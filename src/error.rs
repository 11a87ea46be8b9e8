use std::io;

use config::ConfigError;
use tagsim_kinematics::KinematicsError;
use tagsim_navigation::NavigationError;
use tagsim_protocol::ProtocolError;
use thiserror::Error;

/// Startup errors. Anything returned from here ends the process.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid setting `{key}`: {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    #[error("Invalid arena wall #{index}: {source}")]
    Wall {
        index: usize,
        #[source]
        source: KinematicsError,
    },

    #[error("Autonomy settings rejected: {0}")]
    Navigation(#[from] NavigationError),

    #[error("Tag encoder settings rejected: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Cannot resolve coordinator address {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("No usable address for coordinator host {0}")]
    NoAddress(String),

    #[error("Failed to bind outbound UDP socket: {0}")]
    Bind(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

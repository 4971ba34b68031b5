//! Error types for crewmen operations.
//!
//! Defines the error types surfaced while running a task container:
//! - Task configuration parsing
//! - Container engine calls (pull, create, start, logs, remove)

use thiserror::Error;

/// Errors that can occur while building a task configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid port specification '{0}': expected PORT or PORT/PROTOCOL")]
    InvalidPort(String),

    #[error("Unsupported port protocol '{0}': must be 'tcp', 'udp' or 'sctp'")]
    InvalidProtocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors that can occur during container engine operations.
#[derive(Debug, Error)]
pub enum DockerError {
    #[error("Docker daemon not available: {0}")]
    DaemonUnavailable(String),

    #[error("Failed to pull image '{image}': {reason}")]
    PullFailed { image: String, reason: String },

    #[error("Failed to create container from image '{image}': {reason}")]
    CreateFailed { image: String, reason: String },

    #[error("Failed to start container '{id}': {reason}")]
    StartFailed { id: String, reason: String },

    #[error("Failed to read logs of container '{id}': {reason}")]
    LogStreamFailed { id: String, reason: String },

    #[error("Failed to remove container '{id}': {reason}")]
    RemoveFailed { id: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

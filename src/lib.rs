//! crewmen: run a single task container against a Docker engine.
//!
//! This library builds a task configuration, pulls its image, creates and
//! starts the container, and streams its logs to stdout/stderr.

pub mod cli;
pub mod error;
pub mod execution;
pub mod runner;

// Re-export commonly used error types
pub use error::{ConfigError, DockerError};

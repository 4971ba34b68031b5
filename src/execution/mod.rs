//! Container engine layer for crewmen tasks.
//!
//! This module defines the engine operations a run needs and implements them
//! with the bollard crate.
//!
//! # Example
//!
//! ```ignore
//! use crewmen::execution::{ContainerEngine, CreateRequest, DockerClient};
//! use crewmen::runner::Config;
//!
//! let client = DockerClient::new()?;
//! let config = Config::new("task-123", "alpine:3.19");
//!
//! let id = client.create_container(CreateRequest::from_config(&config)).await?;
//! client.start_container(&id).await?;
//! ```

pub mod docker_client;
pub mod engine;
pub mod resources;

pub use docker_client::DockerClient;
pub use engine::{ContainerEngine, CreateRequest, HostSettings, LogChunk, LogStream, PullStream};
pub use resources::ResourceLimits;

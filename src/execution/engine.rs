//! The container engine operations a run depends on.
//!
//! [`ContainerEngine`] is the subset of the engine API the runner uses.
//! [`DockerClient`](super::DockerClient) implements it against a real daemon;
//! tests substitute a fake.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::DockerError;
use crate::execution::resources::ResourceLimits;
use crate::runner::config::{Config, RestartPolicy};

/// Image pull progress, one serialized status message per item.
pub type PullStream = BoxStream<'static, Result<String, DockerError>>;

/// Demultiplexed container log frames.
pub type LogStream = BoxStream<'static, Result<LogChunk, DockerError>>;

/// One frame of a container's combined log stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogChunk {
    Stdout(Vec<u8>),
    Stderr(Vec<u8>),
    Stdin(Vec<u8>),
    /// Raw output of a TTY container, which has no separate streams.
    Console(Vec<u8>),
}

/// Host-side settings of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSettings {
    pub resources: ResourceLimits,
    pub restart_policy: RestartPolicy,
    /// Publish every exposed port to a random host port.
    pub publish_all_ports: bool,
}

/// Everything the engine needs to create one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    /// Container name.
    pub name: String,
    pub image: String,
    pub env: Vec<String>,
    pub host: HostSettings,
}

impl CreateRequest {
    /// Builds the create request for a task configuration.
    ///
    /// All ports the image exposes are always published. The command
    /// override, exposed ports and attach flags of the config are not sent.
    pub fn from_config(config: &Config) -> Self {
        Self {
            name: config.name.clone(),
            image: config.image.clone(),
            env: config.env.clone(),
            host: HostSettings {
                resources: ResourceLimits::from_config(config),
                restart_policy: config.restart_policy.clone(),
                publish_all_ports: true,
            },
        }
    }
}

/// Container engine operations used to run a task.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Starts pulling `image`, returning its progress stream.
    async fn pull_image(&self, image: &str) -> Result<PullStream, DockerError>;

    /// Creates a container and returns its engine-assigned ID.
    async fn create_container(&self, request: CreateRequest) -> Result<String, DockerError>;

    /// Starts a created container.
    async fn start_container(&self, id: &str) -> Result<(), DockerError>;

    /// Opens the combined stdout/stderr log stream of a container.
    async fn container_logs(&self, id: &str) -> Result<LogStream, DockerError>;

    /// Force-removes a container.
    async fn remove_container(&self, id: &str) -> Result<(), DockerError>;
}

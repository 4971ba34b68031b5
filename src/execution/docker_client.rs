//! Docker API wrapper using the bollard crate.
//!
//! Implements [`ContainerEngine`] against a local Docker daemon.

use async_trait::async_trait;
use bollard::container::{
    Config as ContainerBody, CreateContainerOptions, LogOutput, LogsOptions,
    RemoveContainerOptions, StartContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::{HostConfig, RestartPolicy as EngineRestartPolicy, RestartPolicyNameEnum};
use bollard::Docker;
use futures::StreamExt;

use crate::error::DockerError;
use crate::execution::engine::{
    ContainerEngine, CreateRequest, LogChunk, LogStream, PullStream,
};
use crate::runner::config::RestartPolicy;

/// Docker client wrapper for container operations.
pub struct DockerClient {
    docker: Docker,
}

impl DockerClient {
    /// Creates a new Docker client connecting to the local Docker daemon.
    ///
    /// Honors `DOCKER_HOST`, falling back to the platform's default socket.
    ///
    /// # Errors
    ///
    /// Returns `DockerError::DaemonUnavailable` if the client cannot be configured.
    pub fn new() -> Result<Self, DockerError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| DockerError::DaemonUnavailable(format!("Failed to connect: {e}")))?;

        Ok(Self { docker })
    }
}

/// Maps a restart policy onto the engine's policy names. Names the engine does
/// not define fail the create call.
fn restart_policy_name(request: &CreateRequest) -> Result<RestartPolicyNameEnum, DockerError> {
    match &request.host.restart_policy {
        RestartPolicy::Unset => Ok(RestartPolicyNameEnum::EMPTY),
        RestartPolicy::No => Ok(RestartPolicyNameEnum::NO),
        RestartPolicy::Always => Ok(RestartPolicyNameEnum::ALWAYS),
        RestartPolicy::OnFailure => Ok(RestartPolicyNameEnum::ON_FAILURE),
        RestartPolicy::UnlessStopped => Ok(RestartPolicyNameEnum::UNLESS_STOPPED),
        RestartPolicy::Other(name) => Err(DockerError::CreateFailed {
            image: request.image.clone(),
            reason: format!("invalid restart policy '{name}'"),
        }),
    }
}

/// Translates a create request into the body of a Docker create call.
fn container_body(request: &CreateRequest) -> Result<ContainerBody<String>, DockerError> {
    let host_config = HostConfig {
        memory: Some(request.host.resources.memory),
        restart_policy: Some(EngineRestartPolicy {
            name: Some(restart_policy_name(request)?),
            maximum_retry_count: None,
        }),
        publish_all_ports: Some(request.host.publish_all_ports),
        ..Default::default()
    };

    Ok(ContainerBody {
        image: Some(request.image.clone()),
        env: if request.env.is_empty() {
            None
        } else {
            Some(request.env.clone())
        },
        host_config: Some(host_config),
        ..Default::default()
    })
}

fn log_chunk(output: LogOutput) -> LogChunk {
    match output {
        LogOutput::StdOut { message } => LogChunk::Stdout(message.to_vec()),
        LogOutput::StdErr { message } => LogChunk::Stderr(message.to_vec()),
        LogOutput::StdIn { message } => LogChunk::Stdin(message.to_vec()),
        LogOutput::Console { message } => LogChunk::Console(message.to_vec()),
    }
}

#[async_trait]
impl ContainerEngine for DockerClient {
    /// Pulls a Docker image from a registry.
    ///
    /// Each progress message is re-serialized to a JSON line.
    async fn pull_image(&self, image: &str) -> Result<PullStream, DockerError> {
        let options = CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        };

        let image = image.to_string();
        let stream = self
            .docker
            .create_image(Some(options), None, None)
            .map(move |result| {
                let info = result.map_err(|e| DockerError::PullFailed {
                    image: image.clone(),
                    reason: e.to_string(),
                })?;
                serde_json::to_string(&info).map_err(|e| DockerError::PullFailed {
                    image: image.clone(),
                    reason: e.to_string(),
                })
            });

        Ok(stream.boxed())
    }

    async fn create_container(&self, request: CreateRequest) -> Result<String, DockerError> {
        let options = CreateContainerOptions {
            name: request.name.clone(),
            platform: None,
        };

        let body = container_body(&request)?;
        let response = self
            .docker
            .create_container(Some(options), body)
            .await
            .map_err(|e| DockerError::CreateFailed {
                image: request.image.clone(),
                reason: e.to_string(),
            })?;

        for warning in &response.warnings {
            tracing::warn!(container_id = %response.id, warning = %warning, "Engine warning on create");
        }

        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<(), DockerError> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| DockerError::StartFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })
    }

    /// Gets the stdout and stderr logs of a container.
    ///
    /// No follow flag is set: the stream ends once the engine has sent the
    /// logs it holds.
    async fn container_logs(&self, id: &str) -> Result<LogStream, DockerError> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            ..Default::default()
        };

        let owned_id = id.to_string();
        let stream = self
            .docker
            .logs(id, Some(options))
            .map(move |result| {
                result.map(log_chunk).map_err(|e| DockerError::LogStreamFailed {
                    id: owned_id.clone(),
                    reason: e.to_string(),
                })
            });

        Ok(stream.boxed())
    }

    async fn remove_container(&self, id: &str) -> Result<(), DockerError> {
        let options = RemoveContainerOptions {
            force: true,
            v: true, // Remove anonymous volumes
            ..Default::default()
        };

        self.docker
            .remove_container(id, Some(options))
            .await
            .map_err(|e| DockerError::RemoveFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::config::{Config, ExposedPort, Protocol};

    fn body_for(config: &Config) -> ContainerBody<String> {
        container_body(&CreateRequest::from_config(config)).expect("known restart policy")
    }

    #[test]
    fn test_container_body_host_config() {
        let config = Config::new("web", "nginx:1.25")
            .with_memory(128 * 1024 * 1024)
            .with_cpu(2.0)
            .with_disk(5 * 1024 * 1024 * 1024)
            .with_restart_policy(RestartPolicy::UnlessStopped);

        let host = body_for(&config).host_config.expect("host config is always set");

        assert_eq!(host.memory, Some(134_217_728));
        assert_eq!(host.publish_all_ports, Some(true));
        assert_eq!(
            host.restart_policy.and_then(|p| p.name),
            Some(RestartPolicyNameEnum::UNLESS_STOPPED)
        );
        // CPU and disk are never forwarded.
        assert_eq!(host.nano_cpus, None);
        assert_eq!(host.cpu_shares, None);
        assert_eq!(host.cpu_quota, None);
        assert_eq!(host.storage_opt, None);
    }

    #[test]
    fn test_container_body_sends_image_and_env_only() {
        let config = Config::new("dns", "coredns/coredns")
            .with_cmd(vec!["sleep".to_string(), "1".to_string()])
            .with_exposed_port(ExposedPort::new(53, Protocol::Udp))
            .with_exposed_port(ExposedPort::tcp(9999))
            .with_attach(true, true, true)
            .with_env("LOG=debug");

        let body = body_for(&config);

        assert_eq!(body.image.as_deref(), Some("coredns/coredns"));
        assert_eq!(body.env, Some(vec!["LOG=debug".to_string()]));
        assert_eq!(body.cmd, None);
        assert_eq!(body.exposed_ports, None);
        assert_eq!(body.attach_stdin, None);
        assert_eq!(body.attach_stdout, None);
        assert_eq!(body.attach_stderr, None);
    }

    #[test]
    fn test_container_body_defaults() {
        let body = body_for(&Config::default());
        assert_eq!(body.env, None);

        let host = body.host_config.expect("host config is always set");
        assert_eq!(host.publish_all_ports, Some(true));
        assert_eq!(
            host.restart_policy.and_then(|p| p.name),
            Some(RestartPolicyNameEnum::EMPTY)
        );
    }

    #[test]
    fn test_unknown_restart_policy_fails_create() {
        let config = Config::new("web", "nginx:1.25")
            .with_restart_policy(RestartPolicy::Other("sometimes".to_string()));

        let err = container_body(&CreateRequest::from_config(&config)).unwrap_err();

        assert!(matches!(err, DockerError::CreateFailed { .. }));
        assert!(err.to_string().contains("sometimes"));
    }

    #[test]
    fn test_log_chunk_mapping() {
        let out = log_chunk(LogOutput::StdOut {
            message: "hello\n".into(),
        });
        assert_eq!(out, LogChunk::Stdout(b"hello\n".to_vec()));

        let err = log_chunk(LogOutput::StdErr {
            message: "oops\n".into(),
        });
        assert_eq!(err, LogChunk::Stderr(b"oops\n".to_vec()));
    }
}

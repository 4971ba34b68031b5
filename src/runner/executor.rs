//! Task runner - pulls, creates, starts and streams one container.

use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{error, info, warn};

use super::config::{Config, PullFailurePolicy};
use super::result::{PullOutcome, RunResult};
use crate::error::DockerError;
use crate::execution::{ContainerEngine, CreateRequest, LogChunk};

/// Runs one task container against a container engine.
///
/// The engine is borrowed; its lifetime is managed by the caller.
pub struct Runner<'a, E: ContainerEngine + ?Sized> {
    engine: &'a E,
    config: Config,
    container_id: Option<String>,
}

impl<'a, E: ContainerEngine + ?Sized> Runner<'a, E> {
    /// Creates a new runner for the given engine and configuration.
    pub fn new(engine: &'a E, config: Config) -> Self {
        Self {
            engine,
            config,
            container_id: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the engine-assigned ID once the container has started.
    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    /// Runs the task, writing pull progress and container output to the
    /// process's stdout and stderr.
    pub async fn run(&mut self) -> RunResult {
        let mut stdout = tokio::io::stdout();
        let mut stderr = tokio::io::stderr();
        self.run_with_output(&mut stdout, &mut stderr).await
    }

    /// Runs the task: pull, create, start, then stream logs until the engine
    /// closes the stream.
    ///
    /// Create, start and log failures end the run with a failure result. A
    /// container that was created but failed to start is only removed when
    /// `remove_on_failure` is set.
    pub async fn run_with_output<O, R>(&mut self, stdout: &mut O, stderr: &mut R) -> RunResult
    where
        O: AsyncWrite + Unpin + ?Sized,
        R: AsyncWrite + Unpin + ?Sized,
    {
        info!(name = %self.config.name, image = %self.config.image, "Running task container");

        if let PullOutcome::Fatal(e) = self.pull(stdout).await {
            return RunResult::failure(e);
        }

        let request = CreateRequest::from_config(&self.config);
        let id = match self.engine.create_container(request).await {
            Ok(id) => id,
            Err(e) => {
                error!(image = %self.config.image, error = %e, "Error creating container");
                return RunResult::failure(e);
            }
        };

        if let Err(e) = self.engine.start_container(&id).await {
            error!(container_id = %id, error = %e, "Error starting container");
            self.discard_unstarted(&id).await;
            return RunResult::failure(e);
        }

        self.container_id = Some(id.clone());

        if let Err(e) = self.stream_logs(&id, stdout, stderr).await {
            error!(container_id = %id, error = %e, "Error getting logs for container");
            return RunResult::failure(e);
        }

        info!(container_id = %id, "Container log stream closed");
        RunResult::success(id)
    }

    /// Pulls the configured image, copying its progress to `stdout`.
    ///
    /// A failure becomes a warning or a fatal outcome depending on the
    /// configured [`PullFailurePolicy`].
    pub async fn pull<O>(&self, stdout: &mut O) -> PullOutcome
    where
        O: AsyncWrite + Unpin + ?Sized,
    {
        let e = match self.drain_pull(stdout).await {
            Ok(()) => return PullOutcome::Pulled,
            Err(e) => e,
        };

        match self.config.pull_failure {
            PullFailurePolicy::Warn => {
                warn!(image = %self.config.image, error = %e, "Error pulling image, continuing with local image");
                PullOutcome::Warning(e)
            }
            PullFailurePolicy::Abort => {
                error!(image = %self.config.image, error = %e, "Error pulling image");
                PullOutcome::Fatal(e)
            }
        }
    }

    async fn drain_pull<O>(&self, stdout: &mut O) -> Result<(), DockerError>
    where
        O: AsyncWrite + Unpin + ?Sized,
    {
        let mut progress = self.engine.pull_image(&self.config.image).await?;
        while let Some(line) = progress.next().await {
            let line = line?;
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.flush().await?;
        Ok(())
    }

    async fn stream_logs<O, R>(
        &self,
        id: &str,
        stdout: &mut O,
        stderr: &mut R,
    ) -> Result<(), DockerError>
    where
        O: AsyncWrite + Unpin + ?Sized,
        R: AsyncWrite + Unpin + ?Sized,
    {
        let mut logs = self.engine.container_logs(id).await?;
        while let Some(chunk) = logs.next().await {
            match chunk? {
                LogChunk::Stdout(bytes) | LogChunk::Console(bytes) => {
                    stdout.write_all(&bytes).await?
                }
                LogChunk::Stderr(bytes) => stderr.write_all(&bytes).await?,
                LogChunk::Stdin(_) => {}
            }
        }
        stdout.flush().await?;
        stderr.flush().await?;
        Ok(())
    }

    async fn discard_unstarted(&self, id: &str) {
        if !self.config.remove_on_failure {
            warn!(container_id = %id, "Leaving created container behind");
            return;
        }

        match self.engine.remove_container(id).await {
            Ok(()) => info!(container_id = %id, "Removed container that failed to start"),
            Err(e) => warn!(container_id = %id, error = %e, "Failed to remove container"),
        }
    }
}

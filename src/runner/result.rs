//! Outcome records of a task run.

use std::fmt;

use crate::error::DockerError;

/// Action label reported by a successful run.
pub const ACTION_START: &str = "Start";

/// Result label reported by a successful run.
pub const RESULT_SUCCESS: &str = "success";

/// Outcome of one [`Runner::run`](super::Runner::run) call.
///
/// On failure only `error` is set; the other fields keep their empty values.
#[derive(Debug, Default)]
pub struct RunResult {
    pub error: Option<DockerError>,
    pub action: String,
    pub container_id: String,
    pub result: String,
}

impl RunResult {
    /// Creates a successful result for a started container.
    pub fn success(container_id: impl Into<String>) -> Self {
        Self {
            error: None,
            action: ACTION_START.to_string(),
            container_id: container_id.into(),
            result: RESULT_SUCCESS.to_string(),
        }
    }

    /// Creates a failed result carrying only the error.
    pub fn failure(error: DockerError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(e) => write!(f, "failed: {e}"),
            None => write!(f, "{} {}: {}", self.action, self.container_id, self.result),
        }
    }
}

/// What became of the image pull step.
#[derive(Debug)]
pub enum PullOutcome {
    /// The image was pulled.
    Pulled,
    /// The pull failed and the run continues.
    Warning(DockerError),
    /// The pull failed and the run stops.
    Fatal(DockerError),
}

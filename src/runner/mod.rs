//! Task runner for a single container.
//!
//! # Architecture
//!
//! ```text
//! Config → Runner → pull → create → start → stream logs → RunResult
//! ```
//!
//! The runner:
//! 1. Pulls the image, copying progress to stdout (failures are non-fatal by default)
//! 2. Creates the container with memory limit, restart policy and all ports published
//! 3. Starts it and records the engine-assigned ID
//! 4. Streams its stdout/stderr logs until the engine closes the stream
//!
//! # Example
//!
//! ```ignore
//! use crewmen::execution::DockerClient;
//! use crewmen::runner::{Config, Runner};
//!
//! let client = DockerClient::new()?;
//! let config = Config::new("test", "strm/helloworld-http");
//!
//! let mut runner = Runner::new(&client, config);
//! let result = runner.run().await;
//! println!("{result}");
//! ```

pub mod config;
pub mod executor;
pub mod result;

pub use config::{Config, ExposedPort, Protocol, PullFailurePolicy, RestartPolicy};
pub use executor::Runner;
pub use result::{PullOutcome, RunResult, ACTION_START, RESULT_SUCCESS};

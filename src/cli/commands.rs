//! CLI command definitions for crewmen.
//!
//! A task configuration comes from an optional YAML file, with command-line
//! flags layered on top. With neither, the built-in defaults are used.

use std::path::PathBuf;

use clap::{Args, Parser};
use tracing::{error, info};

use crate::execution::DockerClient;
use crate::runner::{Config, ExposedPort, PullFailurePolicy, RestartPolicy, Runner};

/// Run a task container: pull its image, create and start it, stream its logs.
#[derive(Parser, Debug)]
#[command(name = "crewmen")]
#[command(about = "Run a task container and stream its logs")]
#[command(version)]
#[command(
    long_about = "crewmen pulls an image, creates a container with a memory limit and restart policy, starts it and streams its logs to stdout/stderr.\n\nThe Docker daemon is located through DOCKER_HOST or the default local socket.\n\nExample usage:\n  crewmen run --name web --image nginx:1.25 --memory 268435456 --restart-policy always"
)]
pub struct Cli {
    /// The subcommand to execute. Defaults to `run` with no overrides.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Pull, create, start and stream the logs of one task container.
    Run(RunArgs),

    /// Print the resolved task configuration as YAML without running it.
    #[command(name = "show-config")]
    ShowConfig(RunArgs),
}

/// Task configuration arguments shared by `run` and `show-config`.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// YAML file with the task configuration.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Task name, also used as the container name.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Image to run.
    #[arg(short, long)]
    pub image: Option<String>,

    /// Environment entry in KEY=VALUE form (repeatable).
    #[arg(short, long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Exposed port as PORT or PORT/PROTOCOL (repeatable). Recorded only, not sent to the engine.
    #[arg(short, long = "port", value_name = "PORT[/PROTO]")]
    pub ports: Vec<ExposedPort>,

    /// Memory limit in bytes.
    #[arg(long, allow_negative_numbers = true)]
    pub memory: Option<i64>,

    /// CPU share. Recorded only, not sent to the engine.
    #[arg(long, allow_negative_numbers = true)]
    pub cpu: Option<f64>,

    /// Disk limit in bytes. Recorded only, not sent to the engine.
    #[arg(long, allow_negative_numbers = true)]
    pub disk: Option<i64>,

    /// Restart policy: "", no, always, on-failure, unless-stopped. Other names are rejected by the engine.
    #[arg(long)]
    pub restart_policy: Option<RestartPolicy>,

    /// Set the stdin attach flag. Recorded only, not sent to the engine.
    #[arg(long)]
    pub attach_stdin: bool,

    /// Set the stdout attach flag. Recorded only.
    #[arg(long)]
    pub attach_stdout: bool,

    /// Set the stderr attach flag. Recorded only.
    #[arg(long)]
    pub attach_stderr: bool,

    /// Stop the run when the image pull fails instead of trying a local image.
    #[arg(long)]
    pub abort_on_pull_failure: bool,

    /// Remove the container if it was created but failed to start.
    #[arg(long)]
    pub remove_on_failure: bool,

    /// Command override, given after `--`. Recorded only, not sent to the engine.
    #[arg(last = true, value_name = "CMD")]
    pub cmd: Vec<String>,
}

impl RunArgs {
    /// Resolves the task configuration: defaults, then the YAML file, then flags.
    pub fn build_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_yaml_file(path)
                .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", path.display(), e))?,
            None => Config::default(),
        };

        if let Some(name) = &self.name {
            config.name = name.clone();
        }
        if let Some(image) = &self.image {
            config.image = image.clone();
        }
        config.env.extend(self.env.iter().cloned());
        config.exposed_ports.extend(self.ports.iter().copied());
        if let Some(memory) = self.memory {
            config.memory = memory;
        }
        if let Some(cpu) = self.cpu {
            config.cpu = cpu;
        }
        if let Some(disk) = self.disk {
            config.disk = disk;
        }
        if let Some(policy) = &self.restart_policy {
            config.restart_policy = policy.clone();
        }
        config.attach_stdin |= self.attach_stdin;
        config.attach_stdout |= self.attach_stdout;
        config.attach_stderr |= self.attach_stderr;
        if self.abort_on_pull_failure {
            config.pull_failure = PullFailurePolicy::Abort;
        }
        config.remove_on_failure |= self.remove_on_failure;
        if !self.cmd.is_empty() {
            config.cmd = Some(self.cmd.clone());
        }

        Ok(config)
    }
}

/// Parse CLI arguments without running any command.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI with the parsed arguments.
///
/// A failed run is logged but does not make this return an error; only
/// configuration and client setup problems do.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Run(args)) => run_task_command(args).await,
        Some(Commands::ShowConfig(args)) => show_config_command(args),
        None => run_task_command(RunArgs::default()).await,
    }
}

async fn run_task_command(args: RunArgs) -> anyhow::Result<()> {
    let config = args.build_config()?;
    let client = DockerClient::new()?;

    let mut runner = Runner::new(&client, config);
    let result = runner.run().await;

    match &result.error {
        None => info!(
            container_id = %result.container_id,
            action = %result.action,
            result = %result.result,
            "Task finished"
        ),
        Some(e) => error!(name = %runner.config().name, error = %e, "Task failed"),
    }

    Ok(())
}

fn show_config_command(args: RunArgs) -> anyhow::Result<()> {
    let config = args.build_config()?;
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}

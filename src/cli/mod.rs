//! Command-line interface for crewmen.
//!
//! Provides the `run` command and a `show-config` command that prints the
//! resolved task configuration.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli, Commands, RunArgs};

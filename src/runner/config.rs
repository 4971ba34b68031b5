//! Configuration for a task container run.

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default task name, used when none is configured.
pub const DEFAULT_NAME: &str = "test";

/// Default image, used when none is configured.
pub const DEFAULT_IMAGE: &str = "strm/helloworld-http";

/// Transport protocol of an exposed port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    Sctp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
            Protocol::Sctp => write!(f, "sctp"),
        }
    }
}

impl FromStr for Protocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            "sctp" => Ok(Protocol::Sctp),
            other => Err(ConfigError::InvalidProtocol(other.to_string())),
        }
    }
}

/// A container port with its protocol, written as `80/tcp`.
///
/// A bare port number defaults to TCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExposedPort {
    pub port: u16,
    pub protocol: Protocol,
}

impl ExposedPort {
    pub fn new(port: u16, protocol: Protocol) -> Self {
        Self { port, protocol }
    }

    pub fn tcp(port: u16) -> Self {
        Self::new(port, Protocol::Tcp)
    }
}

impl fmt::Display for ExposedPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol)
    }
}

impl FromStr for ExposedPort {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (port, protocol) = match s.trim().split_once('/') {
            Some((port, proto)) => (port, proto.parse()?),
            None => (s.trim(), Protocol::Tcp),
        };
        let port = port
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(s.to_string()))?;
        Ok(Self { port, protocol })
    }
}

impl TryFrom<String> for ExposedPort {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExposedPort> for String {
    fn from(port: ExposedPort) -> Self {
        port.to_string()
    }
}

/// What the engine should do when the container exits.
///
/// Names outside the known set are kept as [`RestartPolicy::Other`] and left
/// for the engine to reject at create time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RestartPolicy {
    /// Empty policy name; the engine applies its own default.
    #[default]
    Unset,
    No,
    Always,
    OnFailure,
    UnlessStopped,
    Other(String),
}

impl RestartPolicy {
    /// Returns the policy name as understood by the engine.
    pub fn as_str(&self) -> &str {
        match self {
            RestartPolicy::Unset => "",
            RestartPolicy::No => "no",
            RestartPolicy::Always => "always",
            RestartPolicy::OnFailure => "on-failure",
            RestartPolicy::UnlessStopped => "unless-stopped",
            RestartPolicy::Other(name) => name,
        }
    }
}

impl fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RestartPolicy {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "" => RestartPolicy::Unset,
            "no" => RestartPolicy::No,
            "always" => RestartPolicy::Always,
            "on-failure" => RestartPolicy::OnFailure,
            "unless-stopped" => RestartPolicy::UnlessStopped,
            other => RestartPolicy::Other(other.to_string()),
        })
    }
}

impl From<String> for RestartPolicy {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(policy) => policy,
            Err(never) => match never {},
        }
    }
}

impl From<RestartPolicy> for String {
    fn from(policy: RestartPolicy) -> Self {
        policy.as_str().to_string()
    }
}

/// How a failed image pull affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullFailurePolicy {
    /// Log the failure and continue; a locally cached image may still satisfy create.
    #[default]
    Warn,
    /// Stop the run with a failure result.
    Abort,
}

/// Description of the container to run for one task.
///
/// Values are passed to the engine as-is; the engine is the only validator.
/// Only name, image, env, memory and restart policy reach the engine. The
/// attach flags, exposed ports, command override, `cpu` and `disk` are
/// carried for the calling system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identifies the task to the calling system; also the container name.
    pub name: String,
    pub attach_stdin: bool,
    pub attach_stdout: bool,
    pub attach_stderr: bool,
    pub exposed_ports: BTreeSet<ExposedPort>,
    /// Command override. `None` keeps the image's default command.
    pub cmd: Option<Vec<String>>,
    /// Image the container runs.
    pub image: String,
    /// CPU share.
    pub cpu: f64,
    /// Memory limit in bytes.
    pub memory: i64,
    /// Disk limit in bytes.
    pub disk: i64,
    /// Environment entries in `KEY=VALUE` form.
    pub env: Vec<String>,
    pub restart_policy: RestartPolicy,
    pub pull_failure: PullFailurePolicy,
    /// Remove a container that was created but failed to start.
    pub remove_on_failure: bool,
}

impl Config {
    /// Creates a new configuration with the given name and image.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attach_stdin: false,
            attach_stdout: false,
            attach_stderr: false,
            exposed_ports: BTreeSet::new(),
            cmd: None,
            image: image.into(),
            cpu: 0.0,
            memory: 0,
            disk: 0,
            env: Vec::new(),
            restart_policy: RestartPolicy::Unset,
            pull_failure: PullFailurePolicy::Warn,
            remove_on_failure: false,
        }
    }

    /// Loads a configuration from a YAML file. Missing fields take their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parses a configuration from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Sets the stdin/stdout/stderr attach flags.
    pub fn with_attach(mut self, stdin: bool, stdout: bool, stderr: bool) -> Self {
        self.attach_stdin = stdin;
        self.attach_stdout = stdout;
        self.attach_stderr = stderr;
        self
    }

    pub fn with_exposed_port(mut self, port: ExposedPort) -> Self {
        self.exposed_ports.insert(port);
        self
    }

    /// Sets the command to run in the container.
    pub fn with_cmd(mut self, cmd: Vec<String>) -> Self {
        self.cmd = Some(cmd);
        self
    }

    pub fn with_cpu(mut self, cpu: f64) -> Self {
        self.cpu = cpu;
        self
    }

    /// Sets the memory limit in bytes.
    pub fn with_memory(mut self, bytes: i64) -> Self {
        self.memory = bytes;
        self
    }

    /// Sets the disk limit in bytes.
    pub fn with_disk(mut self, bytes: i64) -> Self {
        self.disk = bytes;
        self
    }

    /// Appends a `KEY=VALUE` environment entry.
    pub fn with_env(mut self, entry: impl Into<String>) -> Self {
        self.env.push(entry.into());
        self
    }

    pub fn with_restart_policy(mut self, policy: RestartPolicy) -> Self {
        self.restart_policy = policy;
        self
    }

    pub fn with_pull_failure(mut self, policy: PullFailurePolicy) -> Self {
        self.pull_failure = policy;
        self
    }

    pub fn with_remove_on_failure(mut self, remove: bool) -> Self {
        self.remove_on_failure = remove;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_NAME, DEFAULT_IMAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.name, "test");
        assert_eq!(config.image, "strm/helloworld-http");
        assert_eq!(config.memory, 0);
        assert!(config.cmd.is_none());
        assert!(config.exposed_ports.is_empty());
        assert_eq!(config.restart_policy, RestartPolicy::Unset);
        assert_eq!(config.pull_failure, PullFailurePolicy::Warn);
        assert!(!config.remove_on_failure);
    }

    #[test]
    fn test_config_builder() {
        let config = Config::new("web", "nginx:1.25")
            .with_attach(false, true, true)
            .with_exposed_port(ExposedPort::tcp(80))
            .with_cmd(vec!["nginx".to_string(), "-g".to_string()])
            .with_cpu(0.5)
            .with_memory(64 * 1024 * 1024)
            .with_disk(1 << 30)
            .with_env("FOO=bar")
            .with_env("BAZ=qux")
            .with_restart_policy(RestartPolicy::OnFailure);

        assert_eq!(config.name, "web");
        assert!(config.attach_stdout && config.attach_stderr && !config.attach_stdin);
        assert_eq!(config.exposed_ports.len(), 1);
        assert_eq!(config.cmd.as_ref().map(Vec::len), Some(2));
        assert_eq!(config.memory, 67_108_864);
        assert_eq!(config.env, vec!["FOO=bar", "BAZ=qux"]);
        assert_eq!(config.restart_policy.as_str(), "on-failure");
    }

    #[test]
    fn test_exposed_port_parsing() {
        assert_eq!("80/tcp".parse::<ExposedPort>().unwrap(), ExposedPort::tcp(80));
        assert_eq!(
            "53/UDP".parse::<ExposedPort>().unwrap(),
            ExposedPort::new(53, Protocol::Udp)
        );
        assert_eq!("8080".parse::<ExposedPort>().unwrap(), ExposedPort::tcp(8080));
        assert_eq!(ExposedPort::new(53, Protocol::Udp).to_string(), "53/udp");

        assert!(matches!(
            "http/tcp".parse::<ExposedPort>(),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            "70000".parse::<ExposedPort>(),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            "80/quic".parse::<ExposedPort>(),
            Err(ConfigError::InvalidProtocol(_))
        ));
    }

    #[test]
    fn test_restart_policy_parsing() {
        assert_eq!("".parse::<RestartPolicy>().unwrap(), RestartPolicy::Unset);
        assert_eq!("always".parse::<RestartPolicy>().unwrap(), RestartPolicy::Always);
        assert_eq!(
            "unless-stopped".parse::<RestartPolicy>().unwrap(),
            RestartPolicy::UnlessStopped
        );

        for policy in [
            RestartPolicy::Unset,
            RestartPolicy::No,
            RestartPolicy::Always,
            RestartPolicy::OnFailure,
            RestartPolicy::UnlessStopped,
        ] {
            assert_eq!(policy.as_str().parse::<RestartPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn test_unknown_restart_policy_passes_through() {
        let policy = "sometimes".parse::<RestartPolicy>().unwrap();
        assert_eq!(policy, RestartPolicy::Other("sometimes".to_string()));
        assert_eq!(policy.as_str(), "sometimes");
        assert_eq!(String::from(policy), "sometimes");
    }

    #[test]
    fn test_negative_limits_pass_through() {
        let config = Config::default().with_memory(-1).with_cpu(-2.0).with_disk(-3);
        assert_eq!(config.memory, -1);
        assert_eq!(config.cpu, -2.0);
        assert_eq!(config.disk, -3);
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = r#"
name: worker
image: alpine:3.19
cmd: ["sh", "-c", "echo hi"]
memory: 134217728
env:
  - MODE=batch
exposed_ports:
  - "8080/tcp"
  - "9000/udp"
restart_policy: unless-stopped
pull_failure: abort
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.name, "worker");
        assert_eq!(config.image, "alpine:3.19");
        assert_eq!(config.cmd.unwrap()[2], "echo hi");
        assert_eq!(config.memory, 134_217_728);
        assert_eq!(config.env, vec!["MODE=batch"]);
        assert!(config.exposed_ports.contains(&ExposedPort::new(9000, Protocol::Udp)));
        assert_eq!(config.restart_policy, RestartPolicy::UnlessStopped);
        assert_eq!(config.pull_failure, PullFailurePolicy::Abort);
        assert!(!config.remove_on_failure);
    }

    #[test]
    fn test_from_yaml_keeps_unknown_restart_policy() {
        let config = Config::from_yaml_str("restart_policy: sometimes\n").unwrap();
        assert_eq!(
            config.restart_policy,
            RestartPolicy::Other("sometimes".to_string())
        );
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task.yaml");
        std::fs::write(&path, "image: busybox\nmemory: 1024\n").unwrap();

        let config = Config::from_yaml_file(&path).unwrap();
        assert_eq!(config.name, DEFAULT_NAME);
        assert_eq!(config.image, "busybox");
        assert_eq!(config.memory, 1024);

        let missing = Config::from_yaml_file(dir.path().join("missing.yaml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}

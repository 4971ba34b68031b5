//! Resource limits forwarded to the container engine.

use crate::runner::Config;

/// Resource limits applied to a created container.
///
/// Only memory is forwarded. The CPU share and disk limit of a [`Config`]
/// stay with the calling system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceLimits {
    /// Memory limit in bytes. Zero means unlimited to the engine.
    pub memory: i64,
}

impl ResourceLimits {
    pub fn new(memory: i64) -> Self {
        Self { memory }
    }

    /// Extracts the forwarded limits from a task configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.memory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_keeps_memory_only() {
        let config = Config::default()
            .with_memory(512 * 1024 * 1024)
            .with_cpu(4.0)
            .with_disk(10 * 1024 * 1024 * 1024);

        let limits = ResourceLimits::from_config(&config);
        assert_eq!(limits, ResourceLimits::new(536_870_912));
    }

    #[test]
    fn test_from_config_ignores_invalid_cpu_and_disk() {
        for (cpu, disk) in [(0.0, 0), (-1.0, -1), (f64::MAX, i64::MIN)] {
            let config = Config::default().with_memory(256).with_cpu(cpu).with_disk(disk);
            assert_eq!(ResourceLimits::from_config(&config).memory, 256);
        }
    }
}

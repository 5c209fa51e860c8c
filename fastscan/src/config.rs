use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;

use crate::errors::{ScanError, ScanResult};

/// Tuning knobs for the scan coordinator.
///
/// Both thresholds are performance tunables, not correctness boundaries;
/// any value produces the same offsets. The configuration can be loaded
/// from a YAML file, e.g.:
///
/// ```yaml
/// # Worker threads for parallel scans (default: cores - 1)
/// thread_count: 4
///
/// # Region size in bytes below which the scan stays single-threaded
/// parallel_threshold: 262144
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Number of worker threads used for parallel scans
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Region size below which the scan runs on the calling thread
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_thread_count() -> NonZeroUsize {
    // One core is left to the host runtime's other work.
    NonZeroUsize::new(num_cpus::get().saturating_sub(1).max(1)).unwrap()
}

fn default_parallel_threshold() -> usize {
    256 * 1024
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            thread_count: default_thread_count(),
            parallel_threshold: default_parallel_threshold(),
            log_level: default_log_level(),
        }
    }
}

impl ScanConfig {
    /// Loads configuration from a YAML file.
    pub fn load_from(path: impl AsRef<Path>) -> ScanResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ScanError::open_failed(path, e))?;
        serde_yaml::from_str(&raw).map_err(|e| {
            ScanError::invalid_arg(format!("invalid config {}: {}", path.display(), e))
        })
    }

    /// Builder method to set the number of worker threads
    pub fn with_thread_count(mut self, count: NonZeroUsize) -> Self {
        self.thread_count = count;
        self
    }

    /// Builder method to set the parallel threshold
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = ScanConfig::default();
        assert!(config.thread_count.get() >= 1);
        assert_eq!(config.parallel_threshold, 256 * 1024);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let config_content = r#"
            thread_count: 4
            parallel_threshold: 1048576
            log_level: "debug"
        "#;

        let mut file = File::create(&config_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        let config = ScanConfig::load_from(&config_path).unwrap();
        assert_eq!(config.thread_count, NonZeroUsize::new(4).unwrap());
        assert_eq!(config.parallel_threshold, 1048576);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        std::fs::write(&config_path, "log_level: \"trace\"\n").unwrap();

        let config = ScanConfig::load_from(&config_path).unwrap();
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.parallel_threshold, 256 * 1024);
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        std::fs::write(&config_path, "thread_count: \"invalid\"\n").unwrap();

        let result = ScanConfig::load_from(&config_path);
        assert!(matches!(result, Err(ScanError::InvalidArg(_))));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ScanConfig::load_from(Path::new("nonexistent.yaml"));
        assert!(matches!(result, Err(ScanError::OpenFailed { .. })));
    }

    #[test]
    fn test_builder_methods() {
        let config = ScanConfig::default()
            .with_thread_count(NonZeroUsize::new(2).unwrap())
            .with_parallel_threshold(0);
        assert_eq!(config.thread_count.get(), 2);
        assert_eq!(config.parallel_threshold, 0);
    }
}

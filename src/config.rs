//! Configuration Module
//!
//! This module defines the batching configuration for a `MicroBatcher`.
//! Configuration can be built in code or loaded from TOML files and parsed using serde.

use crate::BatcherError;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Batch creation configuration
///
/// Controls when pending items are flushed into a batch. Immutable for the
/// lifetime of one coordinator.
///
/// # Fields
/// - `flush_interval`: How often the ticker flushes a partial batch
///   (`flush_interval_ms` in TOML)
/// - `max_batch_size`: Number of pending items that triggers an immediate flush
///
/// # Example TOML
/// ```toml
/// [batch]
/// flush_interval_ms = 1000
/// max_batch_size = 100
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BatchConfig {
    #[serde(rename = "flush_interval_ms", deserialize_with = "duration_from_millis")]
    pub flush_interval: Duration,
    pub max_batch_size: usize,
}

fn duration_from_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

/// Layout of a configuration file; the batcher settings live under `[batch]`
#[derive(Debug, Deserialize)]
struct ConfigFile {
    batch: BatchConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(1),
            max_batch_size: 100,
        }
    }
}

impl BatchConfig {
    pub fn new(flush_interval: Duration, max_batch_size: usize) -> Self {
        Self {
            flush_interval,
            max_batch_size,
        }
    }

    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Returns
    /// * `Ok(BatchConfig)` if the file was successfully loaded, parsed and validated
    /// * `Err` if the file couldn't be read, the TOML is invalid, or a value is out of range
    ///
    /// # Example
    /// ```no_run
    /// # fn main() -> anyhow::Result<()> {
    /// let config = microbatch::BatchConfig::load("config/default.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        // Read the file contents as a string
        let content = fs::read_to_string(path)?;

        // Parse the TOML into our file layout
        let file: ConfigFile = toml::from_str(&content)?;

        file.batch.validate()?;
        Ok(file.batch)
    }

    /// Reject values the coordinator cannot run with
    pub fn validate(&self) -> Result<(), BatcherError> {
        if self.max_batch_size == 0 {
            return Err(BatcherError::InvalidConfig(
                "max_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.flush_interval.is_zero() {
            return Err(BatcherError::InvalidConfig(
                "flush_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_reads_batch_section() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[batch]\nflush_interval_ms = 250\nmax_batch_size = 3").unwrap();

        let config = BatchConfig::load(file.path()).unwrap();

        assert_eq!(config.max_batch_size, 3);
        assert_eq!(config.flush_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_load_rejects_zero_batch_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[batch]\nflush_interval_ms = 250\nmax_batch_size = 0").unwrap();

        let err = BatchConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("max_batch_size"));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = BatchConfig::new(Duration::ZERO, 10);
        assert!(matches!(config.validate(), Err(BatcherError::InvalidConfig(_))));
    }

    #[test]
    fn test_load_rejects_zero_interval() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[batch]\nflush_interval_ms = 0\nmax_batch_size = 5").unwrap();

        let err = BatchConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("flush_interval"));
    }

    #[test]
    fn test_sub_millisecond_interval_is_kept() {
        let config = BatchConfig::new(Duration::from_micros(500), 10);

        assert_eq!(config.flush_interval, Duration::from_micros(500));
        assert!(config.validate().is_ok());

        let config = BatchConfig::new(Duration::from_micros(1900), 10);
        assert_eq!(config.flush_interval, Duration::from_micros(1900));
    }

    #[test]
    fn test_default_is_valid() {
        assert!(BatchConfig::default().validate().is_ok());
    }
}

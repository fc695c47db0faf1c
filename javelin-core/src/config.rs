use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path, time::Duration};

use crate::error::ConfigError;

/// Shortest time budget an engine accepts.
pub const MIN_TIMEOUT: Duration = Duration::from_millis(500);
/// Longest time budget an engine accepts.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for [`Engine`](crate::engine::Engine) and the one-shot
/// [`evaluate`](crate::evaluate).
///
/// Every field has a default, so `{}` is a valid configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_timeout", with = "duration_ms")]
    pub timeout: Duration,

    /// Characters of console output kept per run.
    #[serde(default = "default_max_output_len")]
    pub max_output_len: usize,

    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,

    /// Longest string a program may build, in bytes. Longer ones raise
    /// `OutOfMemoryError`.
    #[serde(default = "default_max_string_len")]
    pub max_string_len: usize,

    /// Compiled programs kept by the engine.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Stack size in bytes for the threads that run programs.
    #[serde(default = "default_worker_stack_size")]
    pub worker_stack_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            max_output_len: default_max_output_len(),
            max_call_depth: default_max_call_depth(),
            max_string_len: default_max_string_len(),
            cache_capacity: default_cache_capacity(),
            workers: default_workers(),
            worker_stack_size: default_worker_stack_size(),
        }
    }
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: EngineConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = clamp_timeout(timeout);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.max_call_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_call_depth must be at least 1".to_string(),
            ));
        }
        if self.worker_stack_size < MIN_WORKER_STACK_SIZE {
            return Err(ConfigError::Invalid(format!(
                "worker_stack_size must be at least {} bytes",
                MIN_WORKER_STACK_SIZE
            )));
        }
        Ok(())
    }
}

const MIN_WORKER_STACK_SIZE: usize = 1024 * 1024;

/// Keeps a time budget inside [`MIN_TIMEOUT`]..=[`MAX_TIMEOUT`].
pub fn clamp_timeout(timeout: Duration) -> Duration {
    timeout.clamp(MIN_TIMEOUT, MAX_TIMEOUT)
}

fn default_timeout() -> Duration {
    Duration::from_millis(5000)
}
fn default_max_output_len() -> usize {
    10_000
}
fn default_max_call_depth() -> usize {
    512
}
fn default_max_string_len() -> usize {
    16 * 1024 * 1024
}
fn default_cache_capacity() -> usize {
    256
}
fn default_workers() -> usize {
    1
}
fn default_worker_stack_size() -> usize {
    128 * 1024 * 1024
}

pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.timeout, Duration::from_millis(5000));
        assert_eq!(config.max_call_depth, 512);
        assert_eq!(config.max_string_len, 16 * 1024 * 1024);
    }

    #[test]
    fn test_timeout_is_milliseconds() {
        let config = EngineConfig::from_json(r#"{"timeout": 1500, "workers": 2}"#).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.workers, 2);

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["timeout"], 1500);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"workers": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"timeout": "soon"}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_output_len": 42}}"#).unwrap();
        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_output_len, 42);

        let missing = EngineConfig::from_file("/nonexistent/javelin.json");
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_clamp_timeout() {
        assert_eq!(clamp_timeout(Duration::from_millis(10)), MIN_TIMEOUT);
        assert_eq!(clamp_timeout(Duration::from_secs(60)), MAX_TIMEOUT);
        assert_eq!(
            clamp_timeout(Duration::from_millis(2000)),
            Duration::from_millis(2000)
        );
        assert_eq!(
            EngineConfig::default()
                .with_timeout(Duration::from_millis(1))
                .timeout,
            MIN_TIMEOUT
        );
    }
}

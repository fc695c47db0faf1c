use javelin_core::{EngineConfig, result::TestCase};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON parsing error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config: {0}")]
    Config(#[from] javelin_core::error::ConfigError),

    #[error("Invalid binding: {0}")]
    Binding(String),

    #[error("Failed to start engine: {0}")]
    Engine(#[from] javelin_core::Error),
}

pub type CliResult<T> = Result<T, CliError>;

pub fn read_source(path: &Path) -> CliResult<String> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> CliResult<T> {
    let text = read_source(path)?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Engine settings.
/// Sources (in order of precedence):
/// - `--timeout-ms` (or `JAVELIN_TIMEOUT_MS`, by clap)
/// - the file given with `--config`
/// - built-in defaults
pub fn load_engine_config(
    path: Option<&Path>,
    timeout_ms: Option<u64>,
) -> CliResult<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(ms) = timeout_ms {
        config = config.with_timeout(Duration::from_millis(ms));
    }
    Ok(config)
}

/// Test cases as a JSON array of `{"name"?, "input"?, "expected"}`.
pub fn load_test_cases(path: &Path) -> CliResult<Vec<TestCase>> {
    read_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_timeout_override_is_clamped() {
        let config = load_engine_config(None, Some(50)).unwrap();
        assert_eq!(config.timeout, javelin_core::config::MIN_TIMEOUT);

        let config = load_engine_config(None, None).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_config_file_then_override() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"timeout": 2000, "max_output_len": 80}}"#).unwrap();

        let config = load_engine_config(Some(file.path()), None).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(2000));
        assert_eq!(config.max_output_len, 80);

        let config = load_engine_config(Some(file.path()), Some(3000)).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(3000));
    }

    #[test]
    fn test_load_test_cases() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"input": "2", "expected": "4"}}, {{"name": "empty", "expected": "0"}}]"#
        )
        .unwrap();
        let cases = load_test_cases(file.path()).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[1].name, "empty");
        assert_eq!(cases[1].input, "");

        let missing = load_test_cases(Path::new("/nonexistent/cases.json"));
        assert!(matches!(missing, Err(CliError::Io { .. })));
    }
}

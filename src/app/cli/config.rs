//! TOML configuration loading and merging with command-line arguments
//!
//! ```toml
//! [channel]
//! name = "orders"
//! capacity = 256
//! partitions = 8
//!
//! [workload]
//! messages = 10000
//! keys = 64
//! latency_ms = 1
//! fail_every = 0
//!
//! [logging]
//! level = "info"
//! format = "ext"
//! ```
//!
//! Precedence is command line, then file, then built-in defaults. Without
//! `--config-file`, `<config dir>/Partichan/partichan.toml` is used if it
//! exists.

use super::args::{Args, RunArgs};
use crate::channel::{PartitionedChannelConfig, DEFAULT_CAPACITY, DEFAULT_PARTITIONS};
use crate::core::error_handling::ContextualError;
use crate::core::logging::LogFormat;
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

pub const DEFAULT_CHANNEL_NAME: &str = "workload";
pub const DEFAULT_MESSAGES: u64 = 10_000;
pub const DEFAULT_KEYS: u64 = 64;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            ConfigError::Parse { .. } | ConfigError::Invalid { .. }
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::Parse { message, .. } | ConfigError::Invalid { message } => Some(message),
            _ => None,
        }
    }
}

/// `[channel]` section; every field may be overridden on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChannelSection {
    pub name: Option<String>,
    pub capacity: Option<usize>,
    pub partitions: Option<usize>,
}

/// `[workload]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkloadSection {
    pub messages: Option<u64>,
    pub keys: Option<u64>,
    pub latency_ms: Option<u64>,
    pub fail_every: Option<u64>,
}

/// `[logging]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
    pub file: Option<PathBuf>,
    pub color: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub channel: ChannelSection,
    pub workload: WorkloadSection,
    pub logging: LoggingSection,
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("Partichan").join("partichan.toml"))
    }

    /// Load the explicit file, else the default file if present, else defaults
    pub async fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match config_file {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    log::debug!("No configuration file found; using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
        Self::from_toml(&contents).map_err(|e| ConfigError::Parse {
            path,
            message: e.to_string(),
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

/// Workload parameters after merging arguments, file and defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkloadConfig {
    pub messages: u64,
    pub keys: u64,
    pub latency_ms: u64,
    pub fail_every: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            messages: DEFAULT_MESSAGES,
            keys: DEFAULT_KEYS,
            latency_ms: 0,
            fail_every: 0,
        }
    }
}

/// Everything the `run` command needs, fully resolved and validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub channel: PartitionedChannelConfig,
    pub workload: WorkloadConfig,
}

impl RunSettings {
    pub fn resolve(config: &AppConfig, args: &RunArgs) -> Result<Self, ConfigError> {
        let channel = PartitionedChannelConfig::new(
            args.name
                .clone()
                .or_else(|| config.channel.name.clone())
                .unwrap_or_else(|| DEFAULT_CHANNEL_NAME.to_string()),
            args.capacity
                .or(config.channel.capacity)
                .unwrap_or(DEFAULT_CAPACITY),
            args.partitions
                .or(config.channel.partitions)
                .unwrap_or(DEFAULT_PARTITIONS),
        );
        channel.validate().map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
        })?;

        let defaults = WorkloadConfig::default();
        let section = &config.workload;
        let workload = WorkloadConfig {
            messages: args.messages.or(section.messages).unwrap_or(defaults.messages),
            keys: args.keys.or(section.keys).unwrap_or(defaults.keys),
            latency_ms: args
                .latency_ms
                .or(section.latency_ms)
                .unwrap_or(defaults.latency_ms),
            fail_every: args
                .fail_every
                .or(section.fail_every)
                .unwrap_or(defaults.fail_every),
        };
        if workload.keys == 0 {
            return Err(ConfigError::Invalid {
                message: "workload key count must be greater than zero".to_string(),
            });
        }

        Ok(Self { channel, workload })
    }
}

/// Logging parameters after merging arguments, file and defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
    pub color: bool,
}

impl LoggingSettings {
    pub fn resolve(config: &AppConfig, args: &Args) -> Self {
        let section = &config.logging;
        let color = if args.no_color {
            false
        } else if args.color {
            true
        } else {
            section
                .color
                .unwrap_or_else(|| std::io::stderr().is_terminal())
        };
        Self {
            level: args
                .log_level
                .clone()
                .or_else(|| section.level.clone())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            format: args.log_format.or(section.format).unwrap_or_default(),
            file: args.log_file.clone().or_else(|| section.file.clone()),
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::cli::args::Command;
    use clap::Parser;
    use std::io::Write;

    const SAMPLE: &str = r#"
[channel]
name = "orders"
capacity = 32
partitions = 8

[workload]
messages = 1000
keys = 10
fail_every = 7

[logging]
level = "debug"
format = "json"
"#;

    fn run_args(argv: &[&str]) -> (Args, RunArgs) {
        let mut full = vec!["partichan"];
        full.extend_from_slice(argv);
        let args = Args::try_parse_from(full).unwrap();
        let Command::Run(run) = args.command.clone();
        (args, run)
    }

    #[test]
    fn test_parse_sample() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.channel.name.as_deref(), Some("orders"));
        assert_eq!(config.channel.partitions, Some(8));
        assert_eq!(config.workload.fail_every, Some(7));
        assert_eq!(config.workload.latency_ms, None);
        assert_eq!(config.logging.format, Some(LogFormat::Json));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(AppConfig::from_toml("[channel]\nsize = 3\n").is_err());
        assert!(AppConfig::from_toml("[metrics]\nenabled = true\n").is_err());
    }

    #[test]
    fn test_file_values_used_when_args_absent() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        let (_, run) = run_args(&["run"]);
        let settings = RunSettings::resolve(&config, &run).unwrap();

        assert_eq!(settings.channel, PartitionedChannelConfig::new("orders", 32, 8));
        assert_eq!(settings.workload.messages, 1000);
        assert_eq!(settings.workload.keys, 10);
        assert_eq!(settings.workload.latency_ms, 0);
        assert_eq!(settings.workload.fail_every, 7);
    }

    #[test]
    fn test_args_override_file() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        let (args, run) = run_args(&[
            "--log-level",
            "warn",
            "--no-color",
            "run",
            "--partitions",
            "2",
            "--latency-ms",
            "3",
        ]);
        let settings = RunSettings::resolve(&config, &run).unwrap();
        assert_eq!(settings.channel.partitions, 2);
        assert_eq!(settings.channel.capacity, 32);
        assert_eq!(settings.workload.latency_ms, 3);

        let logging = LoggingSettings::resolve(&config, &args);
        assert_eq!(logging.level, "warn");
        assert_eq!(logging.format, LogFormat::Json);
        assert!(!logging.color);
    }

    #[test]
    fn test_defaults_without_file() {
        let (_, run) = run_args(&["run"]);
        let settings = RunSettings::resolve(&AppConfig::default(), &run).unwrap();
        assert_eq!(settings.channel.name, DEFAULT_CHANNEL_NAME);
        assert_eq!(settings.channel.capacity, DEFAULT_CAPACITY);
        assert_eq!(settings.channel.partitions, DEFAULT_PARTITIONS);
        assert_eq!(settings.workload, WorkloadConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let (_, run) = run_args(&["run", "--partitions", "0"]);
        let err = RunSettings::resolve(&AppConfig::default(), &run).unwrap_err();
        assert!(err.is_user_actionable());
        assert!(err.user_message().unwrap().contains("partition count"));

        let (_, run) = run_args(&["run", "--keys", "0"]);
        assert!(matches!(
            RunSettings::resolve(&AppConfig::default(), &run),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = AppConfig::load(Some(file.path())).await.unwrap();
        assert_eq!(config.channel.capacity, Some(32));
    }

    #[tokio::test]
    async fn test_load_reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            AppConfig::load(Some(&missing)).await,
            Err(ConfigError::NotFound { .. })
        ));

        let malformed = dir.path().join("bad.toml");
        std::fs::write(&malformed, "[channel\nname = 1").unwrap();
        let err = AppConfig::load(Some(&malformed)).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.is_user_actionable());
    }
}

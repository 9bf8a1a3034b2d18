//! Configuration module for tiny-http-server.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values.

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the HTTP server
#[derive(Parser, Debug)]
#[command(name = "tiny-http-server")]
#[command(author = "tiny-http-server authors")]
#[command(version = "0.1.0")]
#[command(about = "A minimal HTTP/1.1 server", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 0.0.0.0:4221)
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Root directory served under /files/
    #[arg(short = 'd', long)]
    pub directory: Option<PathBuf>,

    /// Number of worker threads (defaults to number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Maximum number of concurrent connections
    #[arg(long)]
    pub max_connections: Option<usize>,

    /// Idle read timeout in milliseconds before a read is re-armed
    #[arg(long)]
    pub read_timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Number of worker threads
    pub workers: Option<usize>,
    /// Maximum number of concurrent connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Idle read timeout in milliseconds
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            workers: None,
            max_connections: default_max_connections(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

/// File endpoint configuration
#[derive(Debug, Deserialize, Default)]
pub struct FilesConfig {
    /// Root directory for `/files/<name>`
    pub directory: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:4221".to_string()
}

fn default_max_connections() -> usize {
    10_000
}

fn default_read_timeout_ms() -> u64 {
    5_000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: String,
    pub directory: Option<PathBuf>,
    pub workers: Option<usize>,
    pub max_connections: usize,
    pub read_timeout: Duration,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = CliArgs::parse();

        // Load TOML config if specified
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        Self::merge(cli, toml_config)
    }

    /// Merge CLI args with TOML config (CLI takes precedence)
    fn merge(cli: CliArgs, toml_config: TomlConfig) -> Result<Self, ConfigError> {
        let config = Config {
            listen: cli.listen.unwrap_or(toml_config.server.listen),
            directory: cli.directory.or(toml_config.files.directory),
            workers: cli.workers.or(toml_config.server.workers),
            max_connections: cli
                .max_connections
                .unwrap_or(toml_config.server.max_connections),
            read_timeout: Duration::from_millis(
                cli.read_timeout_ms
                    .unwrap_or(toml_config.server.read_timeout_ms),
            ),
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                toml_config.logging.level
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == Some(0) {
            return Err(ConfigError::Invalid("workers must be at least 1"));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid("max_connections must be at least 1"));
        }
        if self.read_timeout.is_zero() {
            return Err(ConfigError::Invalid("read_timeout_ms must be at least 1"));
        }
        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    Invalid(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::Invalid(reason) => write!(f, "Invalid configuration: {}", reason),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TomlConfig::default();
        assert_eq!(config.server.listen, "0.0.0.0:4221");
        assert_eq!(config.server.max_connections, 10_000);
        assert_eq!(config.server.read_timeout_ms, 5_000);
        assert!(config.files.directory.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
            [server]
            listen = "127.0.0.1:8080"
            workers = 4
            read_timeout_ms = 250

            [files]
            directory = "/tmp/www"

            [logging]
            level = "debug"
        "#;

        let config: TomlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:8080");
        assert_eq!(config.server.workers, Some(4));
        assert_eq!(config.server.max_connections, 10_000);
        assert_eq!(config.server.read_timeout_ms, 250);
        assert_eq!(config.files.directory, Some(PathBuf::from("/tmp/www")));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_directory_flag() {
        let cli = CliArgs::try_parse_from(["tiny-http-server", "--directory", "/srv/files"]).unwrap();
        let config = Config::merge(cli, TomlConfig::default()).unwrap();

        assert_eq!(config.directory, Some(PathBuf::from("/srv/files")));
        assert_eq!(config.listen, "0.0.0.0:4221");
        assert_eq!(config.read_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_cli_overrides_toml() {
        let toml_config: TomlConfig = toml::from_str(
            r#"
            [server]
            listen = "127.0.0.1:9000"
            max_connections = 16

            [files]
            directory = "/from/toml"

            [logging]
            level = "warn"
            "#,
        )
        .unwrap();

        let cli = CliArgs::try_parse_from([
            "tiny-http-server",
            "-l",
            "127.0.0.1:4221",
            "-d",
            "/from/cli",
            "--log-level",
            "trace",
        ])
        .unwrap();
        let config = Config::merge(cli, toml_config).unwrap();

        assert_eq!(config.listen, "127.0.0.1:4221");
        assert_eq!(config.directory, Some(PathBuf::from("/from/cli")));
        assert_eq!(config.max_connections, 16);
        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn test_toml_level_used_when_cli_default() {
        let toml_config: TomlConfig = toml::from_str("[logging]\nlevel = \"warn\"\n").unwrap();
        let cli = CliArgs::try_parse_from(["tiny-http-server"]).unwrap();
        let config = Config::merge(cli, toml_config).unwrap();

        assert_eq!(config.log_level, "warn");
        assert!(config.directory.is_none());
    }

    #[test]
    fn test_zero_values_rejected() {
        let cli = CliArgs::try_parse_from(["tiny-http-server", "--read-timeout-ms", "0"]).unwrap();
        assert!(matches!(
            Config::merge(cli, TomlConfig::default()),
            Err(ConfigError::Invalid(_))
        ));

        let cli = CliArgs::try_parse_from(["tiny-http-server", "--max-connections", "0"]).unwrap();
        assert!(matches!(
            Config::merge(cli, TomlConfig::default()),
            Err(ConfigError::Invalid(_))
        ));

        let cli = CliArgs::try_parse_from(["tiny-http-server", "-w", "0"]).unwrap();
        assert!(matches!(
            Config::merge(cli, TomlConfig::default()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_zero_timeout_in_toml_rejected() {
        let toml_config: TomlConfig = toml::from_str("[server]\nread_timeout_ms = 0\n").unwrap();
        let cli = CliArgs::try_parse_from(["tiny-http-server"]).unwrap();

        let err = Config::merge(cli, toml_config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: read_timeout_ms must be at least 1"
        );
    }
}

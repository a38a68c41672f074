//! Server Configuration
//!
//! Command-line flags are parsed with clap into a [`Cli`], then validated into
//! a [`Config`]. The registry core only ever sees [`RegistryConfig`]; the rest
//! (bind address, log level) belongs to the binary.

use crate::{DEFAULT_HOST, DEFAULT_PORT};
use clap::Parser;

/// One megabyte, the unit of `--max-file-size-mb`.
pub const MB: u64 = 1 << 20;

/// Default file expiration in minutes.
pub const DEFAULT_EXPIRATION_MINUTES: i64 = 10;

/// Default upload size cap in megabytes.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 1024;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "temp-file-registry")]
#[command(about = "temp-file-registry is temporary file registry provided through an HTTP web API.")]
#[command(version)]
pub struct Cli {
    /// Host to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Default file expiration (minutes)
    #[arg(short, long, default_value_t = DEFAULT_EXPIRATION_MINUTES)]
    pub expiration_minutes: i64,

    /// Max file size (MB)
    #[arg(short, long = "max-file-size-mb", default_value_t = DEFAULT_MAX_FILE_SIZE_MB)]
    pub max_file_size_mb: u64,

    /// Log level (0:Error, 1:Info, 2:Debug)
    #[arg(short, long, default_value_t = 2)]
    pub log_level: u8,
}

impl Cli {
    /// Validates the parsed flags.
    pub fn into_config(self) -> Result<Config, ConfigError> {
        if self.max_file_size_mb == 0 {
            return Err(ConfigError::ZeroUploadLimit);
        }

        let max_upload_bytes = self
            .max_file_size_mb
            .checked_mul(MB)
            .and_then(|bytes| usize::try_from(bytes).ok())
            .ok_or(ConfigError::UploadLimitTooLarge(self.max_file_size_mb))?;

        Ok(Config {
            host: self.host,
            port: self.port,
            log_level: LogLevel::try_from(self.log_level)?,
            registry: RegistryConfig {
                default_expiration_minutes: self.expiration_minutes,
                max_upload_bytes,
            },
        })
    }
}

/// Validated server configuration, fixed at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: LogLevel,
    pub registry: RegistryConfig,
}

impl Config {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The values the upload and download handlers consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Expiry applied when an upload carries no parseable `expiryTimeMinutes`
    pub default_expiration_minutes: i64,
    /// Cap on the whole upload request body
    pub max_upload_bytes: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_expiration_minutes: DEFAULT_EXPIRATION_MINUTES,
            max_upload_bytes: (DEFAULT_MAX_FILE_SIZE_MB * MB) as usize,
        }
    }
}

/// Log verbosity selected by `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Info,
    Debug,
}

impl LogLevel {
    /// The tracing filter directive for this level.
    pub fn directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl TryFrom<u8> for LogLevel {
    type Error = ConfigError;

    fn try_from(level: u8) -> Result<Self, ConfigError> {
        match level {
            0 => Ok(LogLevel::Error),
            1 => Ok(LogLevel::Info),
            2 => Ok(LogLevel::Debug),
            other => Err(ConfigError::InvalidLogLevel(other)),
        }
    }
}

/// Errors raised while validating configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid log level {0} (expected 0:Error, 1:Info or 2:Debug)")]
    InvalidLogLevel(u8),

    #[error("max file size must be at least 1 MB")]
    ZeroUploadLimit,

    #[error("max file size of {0} MB does not fit in memory on this platform")]
    UploadLimitTooLarge(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, ConfigError> {
        let mut argv = vec!["temp-file-registry"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().into_config()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).unwrap();

        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, 8888);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.registry, RegistryConfig::default());
        assert_eq!(config.registry.default_expiration_minutes, 10);
        assert_eq!(config.registry.max_upload_bytes, 1024 * 1024 * 1024);
    }

    #[test]
    fn test_short_flags() {
        let config = parse(&["-p", "9000", "-e", "30", "-m", "5", "-l", "1"]).unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.registry.default_expiration_minutes, 30);
        assert_eq!(config.registry.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
    }

    #[test]
    fn test_long_flags() {
        let config = parse(&[
            "--host",
            "127.0.0.1",
            "--port",
            "8080",
            "--expiration-minutes",
            "1",
            "--max-file-size-mb",
            "2",
            "--log-level",
            "0",
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.registry.default_expiration_minutes, 1);
        assert_eq!(config.registry.max_upload_bytes, 2 * 1024 * 1024);
        assert_eq!(config.log_level, LogLevel::Error);
    }

    #[test]
    fn test_invalid_log_level() {
        assert_eq!(parse(&["-l", "3"]), Err(ConfigError::InvalidLogLevel(3)));
    }

    #[test]
    fn test_zero_upload_limit() {
        assert_eq!(parse(&["-m", "0"]), Err(ConfigError::ZeroUploadLimit));
    }

    #[test]
    fn test_upload_limit_overflow() {
        let huge = u64::MAX.to_string();
        assert_eq!(
            parse(&["-m", huge.as_str()]),
            Err(ConfigError::UploadLimitTooLarge(u64::MAX))
        );
    }

    #[test]
    fn test_log_level_directives() {
        assert_eq!(LogLevel::Error.directive(), "error");
        assert_eq!(LogLevel::Info.directive(), "info");
        assert_eq!(LogLevel::Debug.directive(), "debug");
    }
}

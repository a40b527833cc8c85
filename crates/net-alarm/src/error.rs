//! Error types for the watchdog
//!
//! Only two failure classes ever surface as `Err`: bad configuration and
//! output hardware failures. Probe and heartbeat failures are absorbed where
//! they happen and only show up in the logs.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for watchdog operations
pub type AlarmResult<T> = Result<T, AlarmError>;

/// Top-level error for the watchdog library
#[derive(Error, Debug)]
pub enum AlarmError {
    /// Static configuration could not be loaded or is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An output line could not be commanded (fatal)
    #[error(transparent)]
    Output(#[from] OutputError),

    /// HTTP client could not be constructed
    #[error("HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Installing the signal handlers failed
    #[error("Signal handler setup failed: {0}")]
    Signal(std::io::Error),
}

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// An environment override could not be parsed
    #[error("Invalid value for {var}: {value}")]
    Env { var: String, value: String },

    /// Semantic validation failed
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    /// Create a validation error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Errors raised by an output driver
#[derive(Error, Debug)]
pub enum OutputError {
    /// The hardware layer itself is unavailable
    #[error("Output hardware unavailable at {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A specific line could not be commanded or read
    #[error("Output {name} (pin {pin}) failed during {operation}: {source}")]
    Line {
        name: String,
        pin: u32,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The line read back a value that is neither 0 nor 1
    #[error("Output {name} (pin {pin}) reported unreadable state {raw:?}")]
    UnreadableState { name: String, pin: u32, raw: String },

    /// `set` was called on a pin that `configure` never declared
    #[error("Output {name} (pin {pin}) was not configured")]
    NotConfigured { name: String, pin: u32 },

    /// `configure` was called twice
    #[error("Outputs are already configured")]
    AlreadyConfigured,
}

impl OutputError {
    /// Create a per-line IO error
    pub fn line(
        name: impl Into<String>,
        pin: u32,
        operation: &'static str,
        source: std::io::Error,
    ) -> Self {
        Self::Line {
            name: name.into(),
            pin,
            operation,
            source,
        }
    }
}

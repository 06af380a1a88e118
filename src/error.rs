//! Error types for port owner resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for port-owner operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Connection table error: {0}")]
    Table(#[from] TableError),

    #[error("Interface error: {0}")]
    Interface(#[from] InterfaceError),

    #[error("Identity lookup error: {0}")]
    Identity(#[from] IdentityError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to the settings file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    NoConfigDir,

    #[error("Failed to read config file at {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Identity key '{0}' is not a numeric owner credential")]
    InvalidCredential(String),
}

/// Errors raised while reading a kernel connection table.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Connection table {path} is unavailable: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to host interface enumeration.
#[derive(Error, Debug)]
pub enum InterfaceError {
    #[error("Failed to enumerate network interfaces: {0}")]
    EnumerationFailed(#[source] std::io::Error),

    #[error("Platform not supported")]
    #[allow(dead_code)] // Used in #[cfg(not(unix))] branch
    PlatformNotSupported,
}

/// Errors reported by an identity service.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Identity service failed: {0}")]
    Lookup(String),
}

/// Errors raised when mutating an application descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("Origin URL is already set to '{0}'")]
    OriginAlreadySet(String),
}

pub type Result<T> = std::result::Result<T, Error>;

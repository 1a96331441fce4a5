//! Application error types using thiserror
//!
//! Error hierarchy:
//! - VersionParseError: malformed version strings (recovered locally)
//! - CacheError: persisted cache store failures
//! - ResolutionError: EOL data lookups (recovered at the resolver boundary)
//! - CollectError: manifest and build-tool output collection
//! - ConfigError: CLI and project configuration problems
//! - IoError: file system failures outside the cache
//!
//! Only `AppError` reaches the binary; everything below the resolver boundary
//! degrades to an UNKNOWN result instead of aborting the run.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Fatal, run-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Cache store could not be opened or managed
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Dependency collection errors that prevent any result
    #[error(transparent)]
    Collect(#[from] CollectError),

    /// IO related errors
    #[error(transparent)]
    Io(#[from] IoError),
}

/// A version string with no leading numeric component
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unparseable version '{input}'")]
pub struct VersionParseError {
    pub input: String,
}

impl VersionParseError {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Errors raised by the persisted cache store
#[derive(Error, Debug)]
pub enum CacheError {
    /// SQLite failure
    #[error("cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A connection mutex was poisoned by a panicking holder
    #[error("cache connection lock poisoned")]
    LockPoisoned,

    /// Value could not be encoded for storage
    #[error("failed to encode cache value: {0}")]
    Encode(#[from] serde_json::Error),

    /// Cache directory could not be created
    #[error("failed to prepare cache directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors encountered while resolving EOL data for one product
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// Network request failed
    #[error("failed to fetch '{product}' from endoflife.date: {message}")]
    Network { product: String, message: String },

    /// Request or task exceeded its deadline
    #[error("timeout while resolving '{product}' after {after:?}")]
    Timeout { product: String, after: Duration },

    /// Rate limit exceeded
    #[error("rate limit exceeded while fetching '{product}'")]
    RateLimitExceeded { product: String },

    /// Payload could not be decoded
    #[error("invalid response for '{product}': {message}")]
    InvalidResponse { product: String, message: String },

    /// Cache read or write failed
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Errors related to dependency collection
#[derive(Error, Debug)]
pub enum CollectError {
    /// Failed to read a project file
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing error (package.json, npm ls output)
    #[error("failed to parse JSON in {path}: {message}")]
    JsonParseError { path: PathBuf, message: String },

    /// TOML parsing error (pyproject.toml)
    #[error("failed to parse TOML in {path}: {message}")]
    TomlParseError { path: PathBuf, message: String },

    /// XML parsing error (pom.xml)
    #[error("failed to parse XML in {path}: {message}")]
    XmlParseError { path: PathBuf, message: String },

    /// External build tool failed or is missing
    #[error("command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid duration format
    #[error("invalid duration format '{value}': expected format like '1d', '12h', '30m', '1d12h'")]
    InvalidDuration { value: String },

    /// Conflicting options
    #[error("conflicting options: {message}")]
    ConflictingOptions { message: String },

    /// Ignore file could not be read
    #[error("failed to read ignore file {path}: {source}")]
    IgnoreFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Project configuration file is malformed
    #[error("invalid config file {path}: {message}")]
    ConfigFile { path: PathBuf, message: String },

    /// No usable cache directory could be determined
    #[error("could not determine a cache directory; pass --cache-dir")]
    NoCacheDir,
}

/// Errors related to IO operations
#[derive(Error, Debug)]
pub enum IoError {
    /// Directory not found
    #[error("project path '{path}' does not exist")]
    DirectoryNotFound { path: PathBuf },

    /// Generic IO error
    #[error("IO error at {path}: {source}")]
    Generic {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ResolutionError {
    /// Creates a new Network error
    pub fn network(product: impl Into<String>, message: impl Into<String>) -> Self {
        ResolutionError::Network {
            product: product.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(product: impl Into<String>, message: impl Into<String>) -> Self {
        ResolutionError::InvalidResponse {
            product: product.into(),
            message: message.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(product: impl Into<String>, after: Duration) -> Self {
        ResolutionError::Timeout {
            product: product.into(),
            after,
        }
    }
}

impl CollectError {
    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CollectError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new JsonParseError
    pub fn json_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        CollectError::JsonParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new TomlParseError
    pub fn toml_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        CollectError::TomlParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new XmlParseError
    pub fn xml_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        CollectError::XmlParseError {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl IoError {
    /// Creates a new DirectoryNotFound error
    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        IoError::DirectoryNotFound { path: path.into() }
    }

    /// Creates a new Generic IO error
    pub fn generic(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::Generic {
            path: path.into(),
            source,
        }
    }
}

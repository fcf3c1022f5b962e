//! # Error Handling
//!
//! This module defines the centralized error type for `git-get`. It uses the
//! `thiserror` library to describe every failure that can end a run, with
//! enough context (paths, URLs, provider names) to act on the message.
//!
//! Only fatal conditions travel through `Error`. Failures of individual git
//! subcommands are recorded in the owning repository's
//! [`RepositoryStatus`](crate::status::RepositoryStatus) and logged; they never
//! surface here. Provider existence checks are advisory and collapse any lookup
//! error into "does not exist".
//!
//! Fatal conditions include:
//!
//! - Missing or unreadable configuration files.
//! - Directories that cannot be created under the working directory.
//! - Unknown provider tags and missing provider credentials.
//! - Destination namespaces that do not exist on GitLab.
//! - Provider API failures while creating a mirror destination.

use thiserror::Error;

/// Main error type for git-get operations
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration file passed on the command line does not exist.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// A configuration or ignore file could not be parsed.
    #[error("Configuration parsing error in {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// A directory required by every job could not be created.
    #[error("Cannot create directory {path}: {message}")]
    CreateDirectory { path: String, message: String },

    /// An external command could not be started at all.
    #[error("Failed to run '{command}': {message}")]
    CommandSpawn { command: String, message: String },

    /// The provider tag does not name a supported hosting provider.
    #[error("Unknown git provider '{0}' (expected gitlab, github or bitbucket)")]
    UnknownProvider(String),

    /// A credential required by a provider is not set in the environment.
    #[error("Environment variable {variable} not found (required by {provider})")]
    MissingCredential {
        provider: &'static str,
        variable: &'static str,
    },

    /// GitLab has no user or group matching the destination path.
    #[error("Group '{namespace}' does not exist, please ensure it is created for mirrors")]
    NamespaceNotFound { namespace: String },

    /// The provider answered with an unsuccessful HTTP status.
    #[error("{provider} API error: {status} {url} - {message}")]
    Api {
        provider: &'static str,
        status: u16,
        url: String,
        message: String,
    },

    /// The provider could not be reached.
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// The mirror visibility mode is not one of the supported values.
    #[error("Unknown visibility mode '{0}' (expected private, internal or public)")]
    InvalidVisibility(String),

    /// A repository URL has no owner/path component.
    #[error("Invalid repository URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// The concurrency level must admit at least one job.
    #[error("Invalid concurrency level {0}: must be at least 1")]
    InvalidConcurrency(usize),

    /// The worker pool backing the scheduler could not be built.
    #[error("Scheduler error: {message}")]
    Scheduler { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

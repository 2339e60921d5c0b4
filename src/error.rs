use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by [`crate::index::Index`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("duplicate command: {name}")]
    DuplicateName { name: String },

    #[error("command not found: {name}")]
    NotFound { name: String },
}

/// Validation failures for the data model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid command '{name}': {source}")]
    InvalidCommand {
        name: String,
        #[source]
        source: Box<ModelError>,
    },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{}': {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("validation failed in '{}': {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("failed to load data file '{file}': {source}")]
    BatchLoad {
        file: String,
        #[source]
        source: Box<LoadError>,
    },

    #[error("load task for '{file}' did not complete: {source}")]
    Join {
        file: String,
        #[source]
        source: tokio::task::JoinError,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to render markdown")]
    Format(#[from] std::fmt::Error),
}

/// Top-level error surfaced by [`crate::service::CommandService`].
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("service has no data source to reload from")]
    NoDataSource,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

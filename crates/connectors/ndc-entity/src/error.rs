//! Errors surfaced by the connector.

use thiserror::Error;

use ndc_entity_configuration::error::{MakeRuntimeConfigurationError, ParseConfigurationError};
use query_engine_execution::error as execution;
use query_engine_translation::translation::error as translation;

/// An error resolving a request.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Translation(#[from] translation::Error),
    #[error("{0}")]
    Execution(#[from] execution::Error),
    #[error("field '{field}' of '{entity}' expects exactly one instance, the query returned {rows}")]
    CardinalityViolation {
        entity: String,
        field: String,
        rows: usize,
    },
}

/// An error reading the configuration directory.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("{0}")]
    Parse(#[from] ParseConfigurationError),
    #[error("{0}")]
    Validate(#[from] MakeRuntimeConfigurationError),
}

/// State initialization error.
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("error initializing metrics: {0}")]
    MetricsError(prometheus::Error),
    #[error("unable to read the data file {}: {error}", .file_path.display())]
    DataFile {
        file_path: std::path::PathBuf,
        error: std::io::Error,
    },
    #[error("unable to load the data file: {0}")]
    Store(query_engine_execution::error::Error),
}

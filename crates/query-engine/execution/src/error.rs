//! Errors for query execution.

use thiserror::Error;

/// A type for execution errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("entity '{0}' is not stored")]
    EntityNotFound(String),
    #[error("entity '{entity}' has no attribute '{attribute}'")]
    AttributeNotFound { entity: String, attribute: String },
    #[error("alias {0} is not bound in this query")]
    UnboundAlias(String),
    #[error("{0} is not an entity instance")]
    NotAnInstance(String),
    #[error("invalid data for entity '{entity}': {message}")]
    InvalidData { entity: String, message: String },
    #[error("unable to decode the data file: {0}")]
    DataFile(#[from] serde_json::Error),
    #[error("'{entity}' with id {id} refers to missing '{target}' with id {target_id}")]
    DanglingReference {
        entity: String,
        id: String,
        target: String,
        target_id: String,
    },
    #[error("fetching '{attribute}' of '{entity}' with id {id} yields more than one instance")]
    NonUniqueFetch {
        entity: String,
        attribute: String,
        id: String,
    },
}

//! Errors that can be thrown when processing configuration.

use std::path::PathBuf;

/// The errors that can be thrown when parsing a configuration directory.
#[derive(Debug, thiserror::Error)]
pub enum ParseConfigurationError {
    #[error("parse error on {}:{line}:{column}: {message}", .file_path.display())]
    ParseError {
        file_path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("did not find the expected version tag in {}", .0.display())]
    DidNotFindExpectedVersionTag(PathBuf),
    #[error("unsupported configuration version {found} in {}, expected {expected}", .file_path.display())]
    UnsupportedVersion {
        file_path: PathBuf,
        found: serde_json::Value,
        expected: u32,
    },
    #[error("I/O error: {0}")]
    IoErrorButStringified(String),
}

/// The errors that can be thrown when writing a configuration directory.
#[derive(Debug, thiserror::Error)]
pub enum WriteParsedConfigurationError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The errors that can be thrown when turning a parsed configuration into a runtime one.
#[derive(Debug, thiserror::Error)]
pub enum MakeRuntimeConfigurationError {
    #[error("invalid metadata: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    InvalidMetadata(Vec<MetadataError>),
}

/// A single inconsistency in the entity model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("entity '{entity}' has no id attribute '{id_attribute}'")]
    MissingIdAttribute { entity: String, id_attribute: String },
    #[error("the id attribute '{id_attribute}' of entity '{entity}' must be a basic attribute")]
    InvalidIdAttribute { entity: String, id_attribute: String },
    #[error("attribute '{attribute}' of entity '{entity}' targets unknown entity '{target}'")]
    UnknownAssociationTarget {
        entity: String,
        attribute: String,
        target: String,
    },
    #[error("attribute '{attribute}' of entity '{entity}' uses unknown enum type '{enum_type}'")]
    UnknownEnumType {
        entity: String,
        attribute: String,
        enum_type: String,
    },
    #[error(
        "attribute '{attribute}' of entity '{entity}' is mapped by '{mapped_by}', which is not an association of '{target}' back to '{entity}'"
    )]
    InvalidMappedBy {
        entity: String,
        attribute: String,
        target: String,
        mapped_by: String,
    },
}

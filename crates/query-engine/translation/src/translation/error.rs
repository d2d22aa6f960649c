//! Errors for translation.

/// A type for translation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    ModelResolution(#[from] ModelResolutionError),
    #[error("{0}")]
    Coercion(#[from] CoercionError),
}

/// A name in the request does not resolve against the entity model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelResolutionError {
    #[error("Entity '{0}' not found.")]
    EntityNotFound(String),
    #[error("Attribute '{attribute}' not found in entity '{entity}'.")]
    AttributeNotFound { entity: String, attribute: String },
    #[error("Attribute '{attribute}' of entity '{entity}' is not an association.")]
    NotAnAssociation { entity: String, attribute: String },
    #[error("Enum type '{0}' not found.")]
    EnumTypeNotFound(String),
}

/// A literal in the request cannot be turned into a typed value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoercionError {
    #[error("Variable '{0}' is not bound.")]
    UnboundVariable(String),
    #[error("Cannot resolve enum value for argument '{argument}': entity '{entity}' has no such attribute.")]
    EnumAttributeNotFound { entity: String, argument: String },
    #[error("Attribute '{attribute}' of entity '{entity}' is not of an enum type.")]
    NotAnEnum { entity: String, attribute: String },
    #[error("'{constant}' is not a constant of enum type '{enum_type}'.")]
    UnknownEnumConstant { enum_type: String, constant: String },
    #[error("Argument '{argument}' expects a uuid, got '{value}'.")]
    InvalidUuid { argument: String, value: String },
    #[error("Argument '{argument}' expects one of {expected}, got {value}.")]
    InvalidDirective {
        argument: String,
        value: String,
        expected: String,
    },
    #[error("Unsupported JSON value: {0}")]
    UnsupportedJsonValue(serde_json::Value),
}

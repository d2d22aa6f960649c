//! Metadata information regarding the entity model: entities, their attributes and enum types.

use std::collections::BTreeMap;
use std::fmt;

use enum_iterator::Sequence;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The scalar types an attribute may hold.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Sequence, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Boolean,
    Smallint,
    Integer,
    Bigint,
    Real,
    #[serde(rename = "double precision")]
    DoublePrecision,
    Numeric,
    #[serde(rename = "character varying")]
    CharacterVarying,
    Text,
    Date,
    Timestamp,
    Uuid,
}

impl ScalarType {
    /// Values of this type are whole numbers.
    pub fn is_integral(self) -> bool {
        matches!(self, Self::Smallint | Self::Integer | Self::Bigint)
    }

    /// Values of this type are floating point numbers.
    pub fn is_fractional(self) -> bool {
        matches!(self, Self::Real | Self::DoublePrecision | Self::Numeric)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::DoublePrecision => write!(f, "double precision"),
            ScalarType::CharacterVarying => write!(f, "character varying"),
            _ => write!(f, "{}", format!("{self:?}").to_lowercase()),
        }
    }
}

/// Mapping from an entity name to its information.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct EntitiesInfo(pub BTreeMap<String, EntityInfo>);

impl EntitiesInfo {
    pub fn empty() -> Self {
        EntitiesInfo(BTreeMap::new())
    }
}

/// Information about a mapped entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntityInfo {
    /// The attribute holding the entity's identity.
    pub id_attribute: String,
    pub attributes: BTreeMap<String, AttributeInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Information about a single attribute of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttributeInfo {
    #[serde(flatten)]
    pub r#type: AttributeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The shape of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AttributeType {
    /// A single scalar value.
    #[serde(rename_all = "camelCase")]
    Basic { scalar_type: ScalarType },
    /// A single constant of a named enum type.
    #[serde(rename_all = "camelCase")]
    Enum { enum_type: String },
    /// A collection of non-entity values.
    ElementCollection { element: ElementType },
    /// A reference to one or more instances of another entity.
    #[serde(rename_all = "camelCase")]
    Association {
        target: String,
        association: AssociationType,
        /// The attribute of the target entity which owns this association.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mapped_by: Option<String>,
    },
}

/// The element type of an element collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ElementType {
    #[serde(rename_all = "camelCase")]
    Basic { scalar_type: ScalarType },
    #[serde(rename_all = "camelCase")]
    Enum { enum_type: String },
}

/// The kinds of association between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Sequence, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum AssociationType {
    ManyToOne,
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl AttributeType {
    /// The scalar type of the attribute or of its elements, if there is one.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            AttributeType::Basic { scalar_type }
            | AttributeType::ElementCollection {
                element: ElementType::Basic { scalar_type },
            } => Some(*scalar_type),
            _ => None,
        }
    }

    /// The enum type of the attribute or of its elements, if there is one.
    pub fn enum_type(&self) -> Option<&str> {
        match self {
            AttributeType::Enum { enum_type }
            | AttributeType::ElementCollection {
                element: ElementType::Enum { enum_type },
            } => Some(enum_type),
            _ => None,
        }
    }
}

/// Mapping from an enum type name to its constants.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct EnumTypes(pub BTreeMap<String, EnumTypeInfo>);

impl EnumTypes {
    pub fn empty() -> Self {
        EnumTypes(BTreeMap::new())
    }
}

/// The constants of an enum type, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EnumTypeInfo {
    pub constants: Vec<String>,
}

impl EnumTypeInfo {
    pub fn contains(&self, constant: &str) -> bool {
        self.constants.iter().any(|c| c == constant)
    }
}

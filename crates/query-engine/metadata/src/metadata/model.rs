//! Navigation over the entity model.
//!
//! The query compiler never looks at the raw metadata directly. It asks an [`EntityModel`]
//! about entities, attributes and the relationship an association attribute describes.

use super::database::{AssociationType, AttributeInfo, AttributeType, EntityInfo, EnumTypeInfo};
use super::Metadata;

/// Whether an attribute holds one value or many.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Singular,
    Plural,
}

/// An attribute of an entity, as described by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDescriptor<'a> {
    pub entity: &'a str,
    pub name: &'a str,
    pub info: &'a AttributeInfo,
}

impl<'a> AttributeDescriptor<'a> {
    pub fn cardinality(&self) -> Cardinality {
        match &self.info.r#type {
            AttributeType::Basic { .. }
            | AttributeType::Enum { .. }
            | AttributeType::Association {
                association: AssociationType::ManyToOne | AssociationType::OneToOne,
                ..
            } => Cardinality::Singular,
            AttributeType::ElementCollection { .. }
            | AttributeType::Association {
                association: AssociationType::OneToMany | AssociationType::ManyToMany,
                ..
            } => Cardinality::Plural,
        }
    }

    pub fn is_association(&self) -> bool {
        matches!(self.info.r#type, AttributeType::Association { .. })
    }

    pub fn attribute_type(&self) -> &'a AttributeType {
        &self.info.r#type
    }
}

/// How many target instances a relationship yields for one source instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipCardinality {
    ToOne,
    ToMany,
}

/// Which side of a relationship holds the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ownership {
    /// The source entity holds a direct reference to the target.
    Owning,
    /// The target holds the reference, in the named attribute.
    MappedBy(String),
    /// The reference is kept in an association between the two entities.
    Association,
}

/// A relationship between two entity types, seen from the source side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipDescriptor {
    pub source: String,
    pub attribute: String,
    pub target: String,
    pub cardinality: RelationshipCardinality,
    pub ownership: Ownership,
}

/// Read access to the entity model.
pub trait EntityModel {
    fn entity(&self, name: &str) -> Option<&EntityInfo>;

    fn attribute(&self, entity: &str, name: &str) -> Option<AttributeDescriptor<'_>>;

    fn enum_type(&self, name: &str) -> Option<&EnumTypeInfo>;

    /// Classify an association attribute. Returns `None` for anything that is not an association.
    fn relationship(&self, attribute: &AttributeDescriptor<'_>) -> Option<RelationshipDescriptor> {
        let AttributeType::Association {
            target,
            association,
            mapped_by,
        } = &attribute.info.r#type
        else {
            return None;
        };

        let (cardinality, ownership) = match (association, mapped_by) {
            (AssociationType::ManyToOne | AssociationType::OneToOne, None) => {
                (RelationshipCardinality::ToOne, Ownership::Owning)
            }
            (AssociationType::ManyToOne | AssociationType::OneToOne, Some(mapped_by)) => (
                RelationshipCardinality::ToOne,
                Ownership::MappedBy(mapped_by.clone()),
            ),
            (AssociationType::OneToMany, Some(mapped_by)) => (
                RelationshipCardinality::ToMany,
                Ownership::MappedBy(mapped_by.clone()),
            ),
            (AssociationType::OneToMany, None) | (AssociationType::ManyToMany, _) => {
                (RelationshipCardinality::ToMany, Ownership::Association)
            }
        };

        Some(RelationshipDescriptor {
            source: attribute.entity.to_string(),
            attribute: attribute.name.to_string(),
            target: target.clone(),
            cardinality,
            ownership,
        })
    }
}

impl EntityModel for Metadata {
    fn entity(&self, name: &str) -> Option<&EntityInfo> {
        self.entities.0.get(name)
    }

    fn attribute(&self, entity: &str, name: &str) -> Option<AttributeDescriptor<'_>> {
        let (entity, info) = self.entities.0.get_key_value(entity)?;
        let (name, info) = info.attributes.get_key_value(name)?;
        Some(AttributeDescriptor { entity, name, info })
    }

    fn enum_type(&self, name: &str) -> Option<&EnumTypeInfo> {
        self.enum_types.0.get(name)
    }
}

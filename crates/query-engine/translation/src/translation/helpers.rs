//! Helpers for processing requests and building query plans.

use std::collections::BTreeMap;

use ndc_entity_configuration::FetchSettings;
use query_engine_metadata::metadata::{
    AttributeDescriptor, EntityInfo, EntityModel, EnumTypeInfo, RelationshipDescriptor,
};
use query_engine_sql::sql;

use super::error::{Error, ModelResolutionError};

/// Static information from the entity model and the configuration.
pub struct Env<'a> {
    model: &'a dyn EntityModel,
    pub fetch_settings: &'a FetchSettings,
}

/// Stateful information changed throughout the translation process.
#[derive(Debug, Default)]
pub struct State {
    global_table_index: TableAliasIndex,
}

#[derive(Debug, Default)]
struct TableAliasIndex(u64);

/// The values available to a request besides its literals.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Request variables, by name.
    pub variables: BTreeMap<String, sql::ast::Value>,
    /// Arguments of the root field, already coerced to their declared types.
    pub arguments: BTreeMap<String, sql::ast::Value>,
    /// The instance owning the field being resolved, for nested invocations.
    pub source: Option<sql::ast::EntityRef>,
}

/// For an entity in the query, We'd like to track what is its reference in the query
/// (the name we can use to address it, an alias we generate), and what is its name in the
/// model (so we can get its information such as which attributes are available).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNameAndReference {
    /// Entity name for attribute lookup
    pub name: String,
    /// Alias to query from
    pub reference: sql::ast::TableAlias,
}

impl<'a> Env<'a> {
    /// Create a new Env by supplying the entity model and fetch settings.
    pub fn new(model: &'a dyn EntityModel, fetch_settings: &'a FetchSettings) -> Env<'a> {
        Env {
            model,
            fetch_settings,
        }
    }

    /// Lookup an entity's information in the model.
    pub fn lookup_entity(&self, entity: &str) -> Result<&'a EntityInfo, Error> {
        self.model
            .entity(entity)
            .ok_or_else(|| ModelResolutionError::EntityNotFound(entity.to_string()).into())
    }

    /// Lookup an attribute of an entity.
    pub fn lookup_attribute(
        &self,
        entity: &str,
        attribute: &str,
    ) -> Result<AttributeDescriptor<'a>, Error> {
        self.model.attribute(entity, attribute).ok_or_else(|| {
            ModelResolutionError::AttributeNotFound {
                entity: entity.to_string(),
                attribute: attribute.to_string(),
            }
            .into()
        })
    }

    /// Lookup the relationship described by an attribute. `None` when it is not an association.
    pub fn lookup_relationship(
        &self,
        attribute: &AttributeDescriptor<'_>,
    ) -> Option<RelationshipDescriptor> {
        self.model.relationship(attribute)
    }

    /// Lookup the relationship described by an attribute, failing when it is not an association.
    pub fn lookup_association(
        &self,
        attribute: &AttributeDescriptor<'_>,
    ) -> Result<RelationshipDescriptor, Error> {
        self.lookup_relationship(attribute).ok_or_else(|| {
            ModelResolutionError::NotAnAssociation {
                entity: attribute.entity.to_string(),
                attribute: attribute.name.to_string(),
            }
            .into()
        })
    }

    /// Lookup an enum type.
    pub fn lookup_enum_type(&self, enum_type: &str) -> Result<&'a EnumTypeInfo, Error> {
        self.model
            .enum_type(enum_type)
            .ok_or_else(|| ModelResolutionError::EnumTypeNotFound(enum_type.to_string()).into())
    }
}

impl State {
    /// Build a new state.
    pub fn new() -> State {
        State::default()
    }

    /// Create a table alias for an entity or attribute. Every alias in a plan is distinct.
    pub fn make_table_alias(&mut self, name: &str) -> sql::ast::TableAlias {
        sql::helpers::make_table_alias(self.global_table_index.next(), name)
    }
}

impl TableAliasIndex {
    fn next(&mut self) -> u64 {
        let index = self.0;
        self.0 += 1;
        index
    }
}

impl RequestContext {
    /// A context for resolving a field of `source`.
    #[must_use]
    pub fn with_source(mut self, source: sql::ast::EntityRef) -> RequestContext {
        self.source = Some(source);
        self
    }
}

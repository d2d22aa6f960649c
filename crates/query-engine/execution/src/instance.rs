//! Entity instances returned by a query, together with the associations loaded alongside them.

use indexmap::IndexMap;
use query_engine_sql::sql;

/// A persisted entity instance.
///
/// Scalar attributes and element collections are always present. An association is only
/// present when the query that produced the instance fetched it.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub entity: String,
    pub id: String,
    pub fields: IndexMap<String, FieldData>,
}

/// The data held for one attribute of an instance.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    Value(sql::ast::Value),
    Reference(Option<Box<Instance>>),
    Collection(Vec<Instance>),
}

impl Instance {
    pub fn entity_ref(&self) -> sql::ast::EntityRef {
        sql::ast::EntityRef {
            entity: self.entity.clone(),
            id: self.id.clone(),
        }
    }

    /// Whether the association `attribute` was loaded with this instance.
    pub fn is_loaded(&self, attribute: &str) -> bool {
        matches!(
            self.fields.get(attribute),
            Some(FieldData::Reference(_) | FieldData::Collection(_))
        )
    }

    pub fn get(&self, attribute: &str) -> Option<&FieldData> {
        self.fields.get(attribute)
    }

    /// The value of a scalar attribute or element collection.
    pub fn value(&self, attribute: &str) -> Option<&sql::ast::Value> {
        match self.fields.get(attribute) {
            Some(FieldData::Value(value)) => Some(value),
            _ => None,
        }
    }
}

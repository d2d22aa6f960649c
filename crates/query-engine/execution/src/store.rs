//! An in-memory entity store.
//!
//! Instances are loaded from JSON against the entity model. Each row keeps the decoded value
//! of every attribute: scalars are typed by the attribute's scalar type, enums are checked
//! against their constants, and associations hold references to the target instances.
//! Attributes mapped by the other side of a relationship are derived from the owning side
//! when the data is loaded.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use query_engine_metadata::metadata::{
    AttributeType, ElementType, EntityModel, Metadata, RelationshipCardinality,
    RelationshipDescriptor, ScalarType,
};
use query_engine_sql::sql;

use crate::error::Error;
use crate::evaluation;
use crate::instance::{FieldData, Instance};
use crate::query::QueryTransport;

type Row = BTreeMap<String, sql::ast::Value>;

#[derive(Debug, Default)]
struct EntityTable {
    rows: IndexMap<String, Row>,
}

/// The targets referring back to each source instance through a mapped attribute.
struct DerivedAttribute {
    entity: String,
    attribute: String,
    cardinality: RelationshipCardinality,
    referrers: BTreeMap<String, Vec<sql::ast::Value>>,
}

/// Entity instances held in memory, immutable once loaded.
#[derive(Debug)]
pub struct MemoryStore {
    metadata: Metadata,
    tables: BTreeMap<String, EntityTable>,
}

impl MemoryStore {
    /// A store with every entity of the model and no instances.
    pub fn empty(metadata: Metadata) -> Self {
        let tables = metadata
            .entities
            .0
            .keys()
            .map(|entity| (entity.clone(), EntityTable::default()))
            .collect();
        MemoryStore { metadata, tables }
    }

    /// Load instances from a JSON object mapping entity names to lists of records.
    pub fn from_json(metadata: Metadata, data: &str) -> Result<Self, Error> {
        let records: BTreeMap<String, Vec<serde_json::Map<String, serde_json::Value>>> =
            serde_json::from_str(data)?;

        let mut tables: BTreeMap<String, EntityTable> = BTreeMap::new();
        for (entity, entity_records) in records {
            let table = tables.entry(entity.clone()).or_default();
            for record in entity_records {
                let (id, row) = decode_record(&metadata, &entity, record)?;
                if table.rows.insert(id.clone(), row).is_some() {
                    return Err(Error::InvalidData {
                        entity,
                        message: format!("duplicate id {id}"),
                    });
                }
            }
        }
        for entity in metadata.entities.0.keys() {
            tables.entry(entity.clone()).or_default();
        }

        let mut store = MemoryStore { metadata, tables };
        store.derive_mapped_attributes()?;
        store.check_references()?;

        tracing::debug!(
            entities = store.tables.len(),
            instances = store.tables.values().map(|table| table.rows.len()).sum::<usize>(),
            "Loaded entity store"
        );
        Ok(store)
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// References to every instance of `entity`, in load order.
    pub fn entity_refs(&self, entity: &str) -> Result<Vec<sql::ast::EntityRef>, Error> {
        let table = self.table(entity)?;
        Ok(table
            .rows
            .keys()
            .map(|id| sql::ast::EntityRef {
                entity: entity.to_string(),
                id: id.clone(),
            })
            .collect())
    }

    /// The instance a reference points to, with its scalar attributes and element collections.
    pub fn instance(&self, entity_ref: &sql::ast::EntityRef) -> Result<Instance, Error> {
        let row = self.row(entity_ref)?;
        let info = self
            .metadata
            .entity(&entity_ref.entity)
            .ok_or_else(|| Error::EntityNotFound(entity_ref.entity.clone()))?;

        let fields = info
            .attributes
            .iter()
            .filter(|(_, attribute)| !matches!(attribute.r#type, AttributeType::Association { .. }))
            .map(|(name, _)| {
                let value = row.get(name).cloned().unwrap_or(sql::ast::Value::Null);
                (name.clone(), FieldData::Value(value))
            })
            .collect();

        Ok(Instance {
            entity: entity_ref.entity.clone(),
            id: entity_ref.id.clone(),
            fields,
        })
    }

    /// The value of an attribute of a bound instance. An unbound binding has no attributes.
    pub fn attribute(
        &self,
        binding: &sql::ast::Value,
        attribute: &str,
    ) -> Result<sql::ast::Value, Error> {
        match binding {
            sql::ast::Value::Null => Ok(sql::ast::Value::Null),
            sql::ast::Value::Entity(entity_ref) => {
                let row = self.row(entity_ref)?;
                row.get(attribute)
                    .cloned()
                    .ok_or_else(|| Error::AttributeNotFound {
                        entity: entity_ref.entity.clone(),
                        attribute: attribute.to_string(),
                    })
            }
            other => Err(Error::NotAnInstance(format!("{other:?}"))),
        }
    }

    /// Everything an attribute of a bound instance leads to: the element of a scalar, the
    /// elements of a collection, or the targets of an association.
    pub fn navigate(
        &self,
        binding: &sql::ast::Value,
        attribute: &str,
    ) -> Result<Vec<sql::ast::Value>, Error> {
        Ok(match self.attribute(binding, attribute)? {
            sql::ast::Value::Null => vec![],
            sql::ast::Value::Array(items) => items,
            value => vec![value],
        })
    }

    /// The relationship described by an association attribute.
    pub fn relationship(
        &self,
        entity: &str,
        attribute: &str,
    ) -> Result<Option<RelationshipDescriptor>, Error> {
        let descriptor =
            self.metadata
                .attribute(entity, attribute)
                .ok_or_else(|| Error::AttributeNotFound {
                    entity: entity.to_string(),
                    attribute: attribute.to_string(),
                })?;
        Ok(self.metadata.relationship(&descriptor))
    }

    /// The position of a constant in its enum type's declaration.
    pub fn enum_position(&self, enum_type: &str, constant: &str) -> Option<usize> {
        self.metadata
            .enum_type(enum_type)
            .and_then(|info| info.constants.iter().position(|c| c == constant))
    }

    fn table(&self, entity: &str) -> Result<&EntityTable, Error> {
        self.tables
            .get(entity)
            .ok_or_else(|| Error::EntityNotFound(entity.to_string()))
    }

    fn row(&self, entity_ref: &sql::ast::EntityRef) -> Result<&Row, Error> {
        self.table(&entity_ref.entity)?
            .rows
            .get(&entity_ref.id)
            .ok_or_else(|| Error::InvalidData {
                entity: entity_ref.entity.clone(),
                message: format!("no instance with id {}", entity_ref.id),
            })
    }

    /// Fill in the attributes whose relationship is held by the target entity.
    fn derive_mapped_attributes(&mut self) -> Result<(), Error> {
        let mut derived: Vec<DerivedAttribute> = vec![];

        for (entity, info) in &self.metadata.entities.0 {
            for (name, attribute) in &info.attributes {
                let AttributeType::Association {
                    target,
                    mapped_by: Some(mapped_by),
                    ..
                } = &attribute.r#type
                else {
                    continue;
                };
                let Some(relationship) = self.relationship(entity, name)? else {
                    continue;
                };

                let mut referrers: BTreeMap<String, Vec<sql::ast::Value>> = BTreeMap::new();
                for (target_id, target_row) in &self.table(target)?.rows {
                    let owners = match target_row.get(mapped_by) {
                        Some(sql::ast::Value::Array(items)) => items.clone(),
                        Some(sql::ast::Value::Null) | None => vec![],
                        Some(value) => vec![value.clone()],
                    };
                    for owner in owners {
                        if let sql::ast::Value::Entity(owner) = owner {
                            if owner.entity == *entity {
                                referrers.entry(owner.id).or_default().push(
                                    sql::ast::Value::Entity(sql::ast::EntityRef {
                                        entity: target.clone(),
                                        id: target_id.clone(),
                                    }),
                                );
                            }
                        }
                    }
                }

                derived.push(DerivedAttribute {
                    entity: entity.clone(),
                    attribute: name.clone(),
                    cardinality: relationship.cardinality,
                    referrers,
                });
            }
        }

        for DerivedAttribute {
            entity,
            attribute,
            cardinality,
            mut referrers,
        } in derived
        {
            let Some(table) = self.tables.get_mut(&entity) else {
                continue;
            };
            for (id, row) in &mut table.rows {
                let mut targets = referrers.remove(id).unwrap_or_default();
                let value = match cardinality {
                    RelationshipCardinality::ToMany => sql::ast::Value::Array(targets),
                    RelationshipCardinality::ToOne => match targets.len() {
                        0 => sql::ast::Value::Null,
                        1 => targets.remove(0),
                        _ => sql::ast::Value::Array(targets),
                    },
                };
                row.insert(attribute.clone(), value);
            }
        }
        Ok(())
    }

    /// Every stored reference must point to a stored instance.
    fn check_references(&self) -> Result<(), Error> {
        for (entity, table) in &self.tables {
            for (id, row) in &table.rows {
                for value in row.values() {
                    let references = match value {
                        sql::ast::Value::Entity(target) => vec![target],
                        sql::ast::Value::Array(items) => items
                            .iter()
                            .filter_map(|item| match item {
                                sql::ast::Value::Entity(target) => Some(target),
                                _ => None,
                            })
                            .collect(),
                        _ => vec![],
                    };
                    for target in references {
                        let exists = self
                            .tables
                            .get(&target.entity)
                            .is_some_and(|table| table.rows.contains_key(&target.id));
                        if !exists {
                            return Err(Error::DanglingReference {
                                entity: entity.clone(),
                                id: id.clone(),
                                target: target.entity.clone(),
                                target_id: target.id.clone(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl QueryTransport for MemoryStore {
    fn execute(&self, plan: &sql::execution_plan::ExecutionPlan) -> Result<Vec<Instance>, Error> {
        evaluation::execute(self, plan)
    }
}

/// The textual form of an id, shared by numeric and string ids.
fn canonical_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Number(number) => Some(number.to_string()),
        serde_json::Value::String(string) => Some(string.clone()),
        _ => None,
    }
}

fn decode_record(
    metadata: &Metadata,
    entity: &str,
    mut record: serde_json::Map<String, serde_json::Value>,
) -> Result<(String, Row), Error> {
    let info = metadata
        .entity(entity)
        .ok_or_else(|| Error::EntityNotFound(entity.to_string()))?;
    let invalid = |message: String| Error::InvalidData {
        entity: entity.to_string(),
        message,
    };

    let id = record
        .get(&info.id_attribute)
        .and_then(canonical_id)
        .ok_or_else(|| invalid(format!("record without a valid '{}'", info.id_attribute)))?;

    if let Some(unknown) = record.keys().find(|key| !info.attributes.contains_key(*key)) {
        return Err(invalid(format!("unknown attribute '{unknown}' on id {id}")));
    }

    let mut row = Row::new();
    for (name, attribute) in &info.attributes {
        let value = record.remove(name).unwrap_or(serde_json::Value::Null);
        let decoded = match &attribute.r#type {
            AttributeType::Basic { scalar_type } => decode_scalar(*scalar_type, &value),
            AttributeType::Enum { enum_type } => decode_enum(metadata, enum_type, &value),
            AttributeType::ElementCollection { element } => decode_elements(metadata, element, &value),
            // derived from the owning side
            AttributeType::Association {
                mapped_by: Some(_), ..
            } => continue,
            AttributeType::Association { target, .. } => decode_references(target, &value),
        }
        .map_err(|message| invalid(format!("attribute '{name}' of id {id}: {message}")))?;
        row.insert(name.clone(), decoded);
    }

    Ok((id, row))
}

fn decode_scalar(
    scalar_type: ScalarType,
    value: &serde_json::Value,
) -> Result<sql::ast::Value, String> {
    let mismatch = || format!("expected {scalar_type}, found {value}");
    match value {
        serde_json::Value::Null => Ok(sql::ast::Value::Null),
        serde_json::Value::Bool(b) if scalar_type == ScalarType::Boolean => {
            Ok(sql::ast::Value::Bool(*b))
        }
        serde_json::Value::Number(number) if scalar_type.is_integral() => number
            .as_i64()
            .map(sql::ast::Value::Int8)
            .ok_or_else(mismatch),
        serde_json::Value::Number(number) if scalar_type.is_fractional() => number
            .as_f64()
            .map(sql::ast::Value::Float8)
            .ok_or_else(mismatch),
        serde_json::Value::String(string) if scalar_type == ScalarType::Uuid => {
            uuid::Uuid::parse_str(string)
                .map(sql::ast::Value::Uuid)
                .map_err(|err| format!("{mismatch}: {err}", mismatch = mismatch()))
        }
        serde_json::Value::String(string)
            if matches!(
                scalar_type,
                ScalarType::Text
                    | ScalarType::CharacterVarying
                    | ScalarType::Date
                    | ScalarType::Timestamp
            ) =>
        {
            Ok(sql::ast::Value::String(string.clone()))
        }
        _ => Err(mismatch()),
    }
}

fn decode_enum(
    metadata: &Metadata,
    enum_type: &str,
    value: &serde_json::Value,
) -> Result<sql::ast::Value, String> {
    match value {
        serde_json::Value::Null => Ok(sql::ast::Value::Null),
        serde_json::Value::String(constant)
            if metadata
                .enum_type(enum_type)
                .is_some_and(|info| info.contains(constant)) =>
        {
            Ok(sql::ast::Value::Enum {
                enum_type: enum_type.to_string(),
                constant: constant.clone(),
            })
        }
        _ => Err(format!("{value} is not a constant of {enum_type}")),
    }
}

fn decode_elements(
    metadata: &Metadata,
    element: &ElementType,
    value: &serde_json::Value,
) -> Result<sql::ast::Value, String> {
    let items = match value {
        serde_json::Value::Null => return Ok(sql::ast::Value::Array(vec![])),
        serde_json::Value::Array(items) => items,
        _ => return Err(format!("expected a list, found {value}")),
    };
    items
        .iter()
        .map(|item| match element {
            ElementType::Basic { scalar_type } => decode_scalar(*scalar_type, item),
            ElementType::Enum { enum_type } => decode_enum(metadata, enum_type, item),
        })
        .collect::<Result<Vec<_>, String>>()
        .map(sql::ast::Value::Array)
}

/// A single id becomes a reference, a list of ids a list of references.
fn decode_references(target: &str, value: &serde_json::Value) -> Result<sql::ast::Value, String> {
    let reference = |id: &serde_json::Value| {
        canonical_id(id)
            .map(|id| {
                sql::ast::Value::Entity(sql::ast::EntityRef {
                    entity: target.to_string(),
                    id,
                })
            })
            .ok_or_else(|| format!("{id} is not an id of {target}"))
    };
    match value {
        serde_json::Value::Null => Ok(sql::ast::Value::Null),
        serde_json::Value::Array(ids) => ids
            .iter()
            .map(reference)
            .collect::<Result<Vec<_>, String>>()
            .map(sql::ast::Value::Array),
        id => reference(id),
    }
}

//! Resolve a field to the instances it selects.
//!
//! A root field runs its own query. A nested field first looks at what the query of its parent
//! already loaded, and only runs a secondary query, restricted to the parent, when the
//! association wasn't fetched.
//!
//! A singular field resolves to its instance or to nothing. A filtered singular field must match
//! exactly one instance, and more than one match is always a cardinality violation.

use std::collections::BTreeMap;

use query_engine_execution::instance::{FieldData, Instance};
use query_engine_execution::metrics::Metrics;
use query_engine_execution::query::QueryTransport;
use query_engine_metadata::metadata::RelationshipCardinality;
use query_engine_sql::sql;
use query_engine_translation::translation::helpers::{Env, RequestContext};
use query_engine_translation::translation::query;
use query_engine_translation::translation::request::SelectionNode;

use crate::error::Error;

/// Everything a field is resolved with, besides the field itself.
pub struct ExecutionContext<'a> {
    pub variables: &'a BTreeMap<String, sql::ast::Value>,
    /// Arguments of the field being resolved, already coerced to their declared types.
    pub arguments: BTreeMap<String, sql::ast::Value>,
    /// The instance owning the field, for nested fields.
    pub source: Option<&'a Instance>,
    pub transport: &'a dyn QueryTransport,
}

/// What a field resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    List(Vec<Instance>),
    Object(Option<Instance>),
}

/// Fetches the instances of one entity type.
pub struct DataFetcher<'a, 'e> {
    env: &'a Env<'e>,
    metrics: &'a Metrics,
    entity: &'a str,
}

impl<'a, 'e> DataFetcher<'a, 'e> {
    pub fn new(env: &'a Env<'e>, metrics: &'a Metrics, entity: &'a str) -> Self {
        DataFetcher {
            env,
            metrics,
            entity,
        }
    }

    /// Resolve `field`. A root field resolves to a list. A nested field resolves to what its
    /// association yields for the source instance.
    pub fn get(
        &self,
        field: &SelectionNode,
        context: &ExecutionContext,
    ) -> Result<FieldValue, Error> {
        let request_context = RequestContext {
            variables: context.variables.clone(),
            arguments: context.arguments.clone(),
            source: None,
        };

        let Some(source) = context.source else {
            let plan = query::translate(self.env, &request_context, self.entity, field)?;
            self.metrics.record_query();
            return Ok(FieldValue::List(context.transport.execute(&plan)?));
        };

        if !field.has_filter_arguments() {
            if let Some(loaded) = self.loaded(source, field) {
                return Ok(loaded);
            }
        }

        let attribute = self.env.lookup_attribute(&source.entity, &field.name)?;
        let relationship = self.env.lookup_association(&attribute)?;

        let plan = query::translate(
            self.env,
            &request_context.with_source(source.entity_ref()),
            self.entity,
            field,
        )?;
        self.metrics.record_secondary_query();
        let mut instances = context.transport.execute(&plan)?;

        match relationship.cardinality {
            RelationshipCardinality::ToMany => Ok(FieldValue::List(instances)),
            RelationshipCardinality::ToOne if instances.len() == 1 => {
                Ok(FieldValue::Object(instances.pop()))
            }
            // an absent reference, the same as the load state reports it
            RelationshipCardinality::ToOne
                if instances.is_empty() && !field.has_filter_arguments() =>
            {
                Ok(FieldValue::Object(None))
            }
            RelationshipCardinality::ToOne => {
                self.metrics.record_cardinality_violation();
                Err(Error::CardinalityViolation {
                    entity: source.entity.clone(),
                    field: field.name.clone(),
                    rows: instances.len(),
                })
            }
        }
    }

    /// The association as fetched with the source, if it was.
    fn loaded(&self, source: &Instance, field: &SelectionNode) -> Option<FieldValue> {
        let value = match source.get(&field.name)? {
            FieldData::Reference(reference) => FieldValue::Object(reference.as_deref().cloned()),
            FieldData::Collection(instances) => FieldValue::List(instances.clone()),
            FieldData::Value(_) => return None,
        };

        tracing::debug!(
            entity = source.entity,
            id = source.id,
            field = field.name,
            "Resolved field from the load state"
        );
        self.metrics.record_load_state_hit();
        Some(value)
    }
}

//! Walk a request over the instances its fields resolve to and build the result tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ndc_entity_configuration::Configuration;
use query_engine_execution::instance::Instance;
use query_engine_execution::metrics::Metrics;
use query_engine_execution::query::{self as execution, QueryTransport};
use query_engine_metadata::metadata::ScalarType;
use query_engine_sql::sql;
use query_engine_translation::translation::helpers::{Env, RequestContext};
use query_engine_translation::translation::query::{self, values};
use query_engine_translation::translation::request::{self, SelectionNode};

use crate::error::Error;
use crate::fetcher::{DataFetcher, ExecutionContext, FieldValue};

/// The type name reported for `__typename` on the root of a request.
pub const QUERY_TYPENAME: &str = "Query";

/// A request: the root fields, each naming the entity it selects, and the variables
/// the fields refer to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: Vec<SelectionNode>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, serde_json::Value>,
}

/// The result of a request: the result tree, and the fields that failed to resolve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

/// A field whose resolution failed. Its value in the result tree is null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub message: String,
    /// The response keys and list indices leading to the field.
    pub path: Vec<PathSegment>,
}

/// A step in the path to a field of the result tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Where the walk over the result tree is, and what went wrong so far.
struct Resolution<'v> {
    variables: &'v BTreeMap<String, sql::ast::Value>,
    path: Vec<PathSegment>,
    errors: Vec<FieldError>,
}

/// Resolves requests against a transport.
pub struct Executor<'a> {
    env: Env<'a>,
    metrics: &'a Metrics,
    transport: &'a dyn QueryTransport,
}

impl<'a> Executor<'a> {
    pub fn new(
        configuration: &'a Configuration,
        metrics: &'a Metrics,
        transport: &'a dyn QueryTransport,
    ) -> Self {
        Executor {
            env: Env::new(&configuration.metadata, &configuration.fetch_settings),
            metrics,
            transport,
        }
    }

    /// Resolve every root field of the request into a JSON object keyed by response key.
    ///
    /// A field violating its cardinality resolves to null and is reported in the errors of the
    /// response. Any other error fails the whole request.
    pub fn execute(&self, request: &QueryRequest) -> Result<QueryResponse, Error> {
        let variables = translate_variables(&request.variables)?;
        let mut resolution = Resolution {
            variables: &variables,
            path: vec![],
            errors: vec![],
        };

        let mut data = serde_json::Map::new();
        for field in &request.query {
            resolution
                .path
                .push(PathSegment::Key(field.response_key().to_string()));
            let value = if field.is_typename() {
                serde_json::Value::String(QUERY_TYPENAME.to_string())
            } else {
                let context = ExecutionContext {
                    variables: &variables,
                    arguments: self.bind_arguments(&field.name, field, &variables),
                    source: None,
                    transport: self.transport,
                };
                self.fetch(&field.name, field, &context, &mut resolution)?
            };
            resolution.path.pop();
            data.insert(field.response_key().to_string(), value);
        }

        Ok(QueryResponse {
            data: serde_json::Value::Object(data),
            errors: resolution.errors,
        })
    }

    /// Render the plan of every root field of the request, keyed by response key.
    pub fn explain(&self, request: &QueryRequest) -> Result<BTreeMap<String, String>, Error> {
        let variables = translate_variables(&request.variables)?;

        request
            .query
            .iter()
            .filter(|field| !field.is_typename())
            .map(|field| -> Result<_, Error> {
                let context = RequestContext {
                    arguments: self.bind_arguments(&field.name, field, &variables),
                    variables: variables.clone(),
                    source: None,
                };
                let plan = query::translate(&self.env, &context, &field.name, field)?;
                Ok((field.response_key().to_string(), execution::explain(&plan)))
            })
            .collect()
    }

    /// Fetch the instances of `entity` that `field` selects and resolve them.
    fn fetch(
        &self,
        entity: &str,
        field: &SelectionNode,
        context: &ExecutionContext,
        resolution: &mut Resolution,
    ) -> Result<serde_json::Value, Error> {
        match DataFetcher::new(&self.env, self.metrics, entity).get(field, context) {
            Ok(fetched) => self.resolve_value(fetched, field, resolution),
            Err(err @ Error::CardinalityViolation { .. }) => {
                tracing::error!(
                    meta.signal_type = "log",
                    event.domain = "ndc",
                    event.name = "Field error",
                    name = "Field error",
                    body = %err,
                    path = ?resolution.path,
                    error = true,
                );
                resolution.errors.push(FieldError {
                    message: err.to_string(),
                    path: resolution.path.clone(),
                });
                Ok(serde_json::Value::Null)
            }
            Err(err) => Err(err),
        }
    }

    fn resolve_value(
        &self,
        fetched: FieldValue,
        field: &SelectionNode,
        resolution: &mut Resolution,
    ) -> Result<serde_json::Value, Error> {
        match fetched {
            FieldValue::List(instances) => {
                let mut items = Vec::with_capacity(instances.len());
                for (index, instance) in instances.iter().enumerate() {
                    resolution.path.push(PathSegment::Index(index));
                    items.push(self.resolve_instance(instance, field, resolution)?);
                    resolution.path.pop();
                }
                Ok(serde_json::Value::Array(items))
            }
            FieldValue::Object(Some(instance)) => {
                self.resolve_instance(&instance, field, resolution)
            }
            FieldValue::Object(None) => Ok(serde_json::Value::Null),
        }
    }

    /// Resolve the sub-selections of `field` on one instance.
    fn resolve_instance(
        &self,
        instance: &Instance,
        field: &SelectionNode,
        resolution: &mut Resolution,
    ) -> Result<serde_json::Value, Error> {
        let mut object = serde_json::Map::new();

        for selection in &field.selections {
            resolution
                .path
                .push(PathSegment::Key(selection.response_key().to_string()));
            let value = if selection.is_typename() {
                serde_json::Value::String(instance.entity.clone())
            } else {
                let attribute = self.env.lookup_attribute(&instance.entity, &selection.name)?;
                match self.env.lookup_relationship(&attribute) {
                    Some(relationship) => {
                        let context = ExecutionContext {
                            variables: resolution.variables,
                            arguments: BTreeMap::new(),
                            source: Some(instance),
                            transport: self.transport,
                        };
                        self.fetch(&relationship.target, selection, &context, resolution)?
                    }
                    None => instance
                        .value(&selection.name)
                        .map_or(serde_json::Value::Null, value_to_json),
                }
            };
            resolution.path.pop();
            object.insert(selection.response_key().to_string(), value);
        }

        Ok(serde_json::Value::Object(object))
    }

    /// Coerce the root arguments that compare a uuid attribute, the way a typed front end
    /// would. Values that don't parse are left to the translator.
    fn bind_arguments(
        &self,
        entity: &str,
        field: &SelectionNode,
        variables: &BTreeMap<String, sql::ast::Value>,
    ) -> BTreeMap<String, sql::ast::Value> {
        field
            .filter_arguments()
            .filter_map(|argument| {
                let attribute = self.env.lookup_attribute(entity, &argument.name).ok()?;
                if attribute.attribute_type().scalar_type() != Some(ScalarType::Uuid) {
                    return None;
                }
                let text = match &argument.value {
                    request::Value::String(text) => text.as_str(),
                    request::Value::Variable(name) => match variables.get(name)? {
                        sql::ast::Value::String(text) => text.as_str(),
                        _ => return None,
                    },
                    _ => return None,
                };
                let uuid = uuid::Uuid::parse_str(text).ok()?;
                Some((argument.name.clone(), sql::ast::Value::Uuid(uuid)))
            })
            .collect()
    }
}

fn translate_variables(
    variables: &BTreeMap<String, serde_json::Value>,
) -> Result<BTreeMap<String, sql::ast::Value>, Error> {
    variables
        .iter()
        .map(|(name, value)| -> Result<_, Error> {
            Ok((name.clone(), values::translate_json_value(value)?))
        })
        .collect()
}

/// The JSON form of an attribute value in the result tree.
pub fn value_to_json(value: &sql::ast::Value) -> serde_json::Value {
    match value {
        sql::ast::Value::Null => serde_json::Value::Null,
        sql::ast::Value::Bool(b) => serde_json::Value::Bool(*b),
        sql::ast::Value::Int8(int) => serde_json::Value::Number((*int).into()),
        sql::ast::Value::Float8(float) => serde_json::Number::from_f64(*float)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        sql::ast::Value::String(string) => serde_json::Value::String(string.clone()),
        sql::ast::Value::Uuid(uuid) => serde_json::Value::String(uuid.to_string()),
        sql::ast::Value::Enum { constant, .. } => serde_json::Value::String(constant.clone()),
        sql::ast::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(value_to_json).collect())
        }
        sql::ast::Value::Entity(entity_ref) => serde_json::Value::String(entity_ref.id.clone()),
    }
}

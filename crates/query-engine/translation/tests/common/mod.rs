use std::collections::BTreeMap;
use std::path::PathBuf;

use ndc_entity_configuration::Configuration;
use query_engine_sql::sql;
use query_engine_translation::translation::error::Error;
use query_engine_translation::translation::helpers::{Env, RequestContext};
use query_engine_translation::translation::query;
use query_engine_translation::translation::request::{SelectionNode, Value};

/// Load the runtime configuration the translation tests run against.
pub async fn starwars_configuration() -> anyhow::Result<Configuration> {
    let directory = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../../static/starwars");
    let parsed_configuration = ndc_entity_configuration::parse_configuration(&directory).await?;
    Ok(ndc_entity_configuration::make_runtime_configuration(
        parsed_configuration,
        &directory,
    )?)
}

/// Translate a root field selecting instances of `entity`.
pub fn translate(
    configuration: &Configuration,
    context: &RequestContext,
    entity: &str,
    field: &SelectionNode,
) -> Result<sql::execution_plan::ExecutionPlan, Error> {
    let env = Env::new(&configuration.metadata, &configuration.fetch_settings);
    query::translate(&env, context, entity, field)
}

/// Translate a root field and render it.
pub fn translate_sql(
    configuration: &Configuration,
    context: &RequestContext,
    entity: &str,
    field: &SelectionNode,
) -> sql::string::SQL {
    translate(configuration, context, entity, field)
        .unwrap()
        .query_sql()
}

pub fn field(name: &str) -> SelectionNode {
    SelectionNode::field(name)
}

pub fn string(value: &str) -> Value {
    Value::String(value.to_string())
}

pub fn enum_value(value: &str) -> Value {
    Value::Enum(value.to_string())
}

pub fn entity_ref(entity: &str, id: &str) -> sql::ast::EntityRef {
    sql::ast::EntityRef {
        entity: entity.to_string(),
        id: id.to_string(),
    }
}

pub fn nested_context(entity: &str, id: &str) -> RequestContext {
    RequestContext::default().with_source(entity_ref(entity, id))
}

pub fn variables(
    bindings: impl IntoIterator<Item = (&'static str, sql::ast::Value)>,
) -> BTreeMap<String, sql::ast::Value> {
    bindings
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

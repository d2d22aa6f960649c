//! Translate a selection into a query plan.

pub mod fields;
pub mod filtering;
pub mod relationships;
pub mod sorting;
pub mod values;

use query_engine_sql::sql;

use crate::translation::error::Error;
use crate::translation::helpers::{Env, RequestContext, State, TableNameAndReference};
use crate::translation::request;

/// Translate a field selecting instances of `entity` into a plan returning them.
///
/// The plan loads the root instances together with every association the selection lets us
/// fetch eagerly. When the context has a source, the root is further restricted to the
/// instances `field` of that source refers to.
pub fn translate(
    env: &Env,
    context: &RequestContext,
    entity: &str,
    field: &request::SelectionNode,
) -> Result<sql::execution_plan::ExecutionPlan, Error> {
    env.lookup_entity(entity)?;

    let mut state = State::new();
    let root = TableNameAndReference {
        name: entity.to_string(),
        reference: state.make_table_alias(entity),
    };

    let selection = fields::translate_joins(
        env,
        &mut state,
        context,
        &root,
        field,
        fields::Level::root(),
    )?;

    let (argument_joins, mut predicates) =
        filtering::translate_root_arguments(env, &mut state, context, &root, field)?;

    if let Some(source) = &context.source {
        predicates.push(relationships::translate_parent_predicate(
            env, &mut state, source, field, &root,
        )?);
    }

    let mut select = sql::helpers::simple_select(entity, root.reference);
    select.distinct = true;
    select.joins = selection.joins.into_iter().chain(argument_joins).collect();
    select.where_ = sql::ast::Where(sql::helpers::conjunction(predicates));
    select.order_by = sorting::make_order_by(selection.order_by);

    let plan = sql::execution_plan::ExecutionPlan::new(entity, select);

    // log and return
    tracing::info!(
        entity,
        field = field.name,
        generated_sql = plan.query_sql().sql,
        "Translated query"
    );
    Ok(plan)
}

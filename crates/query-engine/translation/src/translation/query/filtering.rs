//! Translate filter arguments into predicates.

use query_engine_metadata::metadata::Cardinality;
use query_engine_sql::sql;

use super::values::{self, ArgumentScope};
use crate::translation::error::Error;
use crate::translation::helpers::{Env, RequestContext, State, TableNameAndReference};
use crate::translation::request;

/// Compare a path with a value: equality for singular attributes, membership for plural
/// attributes and for list values.
pub fn make_comparison(
    path: sql::ast::Expression,
    cardinality: Cardinality,
    value: sql::ast::Value,
) -> sql::ast::Expression {
    match (cardinality, value) {
        (_, sql::ast::Value::Array(values)) => sql::helpers::in_values(path, values),
        (Cardinality::Plural, value) => sql::helpers::in_values(path, vec![value]),
        (Cardinality::Singular, value) => {
            sql::helpers::equals(path, sql::ast::Expression::Value(value))
        }
    }
}

/// Translate the filter arguments of a joined field into a predicate over the join's alias.
/// Returns `None` when the field has no filter arguments.
pub fn translate_join_arguments(
    env: &Env,
    context: &RequestContext,
    target: &TableNameAndReference,
    field: &request::SelectionNode,
) -> Result<Option<sql::ast::Expression>, Error> {
    let scope = ArgumentScope {
        entity: &target.name,
        bound_arguments: None,
    };

    let predicates = field
        .filter_arguments()
        .map(|argument| {
            let value = values::translate_argument_value(env, context, scope, argument)?;
            let attribute = env.lookup_attribute(&target.name, &argument.name)?;
            Ok(make_comparison(
                sql::helpers::make_column(&target.reference, &argument.name),
                attribute.cardinality(),
                value,
            ))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(if predicates.is_empty() {
        None
    } else {
        Some(sql::helpers::conjunction(predicates))
    })
}

/// Translate the filter arguments of the root field into predicates over the root.
///
/// A plural attribute can't be compared in place, so it gets its own left join and the
/// predicate is on the joined element instead. These joins are returned alongside.
pub fn translate_root_arguments(
    env: &Env,
    state: &mut State,
    context: &RequestContext,
    root: &TableNameAndReference,
    field: &request::SelectionNode,
) -> Result<(Vec<sql::ast::Join>, Vec<sql::ast::Expression>), Error> {
    let scope = ArgumentScope {
        entity: &root.name,
        bound_arguments: Some(&context.arguments),
    };

    let mut joins = vec![];
    let mut predicates = vec![];

    for argument in field.filter_arguments() {
        let value = values::translate_argument_value(env, context, scope, argument)?;
        let attribute = env.lookup_attribute(&root.name, &argument.name)?;

        let path = match attribute.cardinality() {
            Cardinality::Singular => sql::helpers::make_column(&root.reference, &argument.name),
            Cardinality::Plural => {
                let alias = state.make_table_alias(&argument.name);
                joins.push(sql::helpers::simple_join(
                    &argument.name,
                    alias.clone(),
                    sql::ast::JoinType::Left,
                ));
                sql::ast::Expression::TableReference(alias)
            }
        };

        predicates.push(make_comparison(path, attribute.cardinality(), value));
    }

    Ok((joins, predicates))
}

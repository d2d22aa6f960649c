//! Restrict a query to the instances related to the parent of a nested field.

use query_engine_metadata::metadata::Ownership;
use query_engine_sql::sql;

use crate::translation::error::Error;
use crate::translation::helpers::{Env, State, TableNameAndReference};
use crate::translation::request;

/// Build the predicate selecting the instances that `field` of `source` refers to.
///
/// When the target owns the relationship it's a comparison of the owning attribute with the
/// source. Otherwise the relationship is only navigable from the source, and the predicate is
/// membership in a subquery that follows the association from the source.
///
/// Fails if `field` isn't an association of the source's entity.
pub fn translate_parent_predicate(
    env: &Env,
    state: &mut State,
    source: &sql::ast::EntityRef,
    field: &request::SelectionNode,
    root: &TableNameAndReference,
) -> Result<sql::ast::Expression, Error> {
    let attribute = env.lookup_attribute(&source.entity, &field.name)?;
    let relationship = env.lookup_association(&attribute)?;

    let source_value = sql::ast::Expression::Value(sql::ast::Value::Entity(source.clone()));

    Ok(match relationship.ownership {
        Ownership::MappedBy(owner) => sql::helpers::equals(
            sql::helpers::make_column(&root.reference, &owner),
            source_value,
        ),
        Ownership::Owning | Ownership::Association => sql::helpers::in_subquery(
            sql::ast::Expression::TableReference(root.reference.clone()),
            translate_association_subquery(state, source, &field.name, source_value),
        ),
    })
}

/// `SELECT joined FROM <source entity> parent INNER JOIN parent.<attribute> joined WHERE parent = source`
fn translate_association_subquery(
    state: &mut State,
    source: &sql::ast::EntityRef,
    attribute: &str,
    source_value: sql::ast::Expression,
) -> sql::ast::Select {
    let parent_alias = state.make_table_alias(&source.entity);
    let joined_alias = state.make_table_alias(attribute);

    let mut select = sql::helpers::simple_select(&source.entity, parent_alias.clone());
    select.select_list = joined_alias.clone();
    select.joins = vec![sql::helpers::simple_join(
        attribute,
        joined_alias,
        sql::ast::JoinType::Inner,
    )];
    select.where_ = sql::ast::Where(sql::helpers::equals(
        sql::ast::Expression::TableReference(parent_alias),
        source_value,
    ));
    select
}

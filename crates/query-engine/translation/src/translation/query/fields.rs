//! Translate the selected associations of a field into joins and fetches.

use query_engine_metadata::metadata::RelationshipCardinality;
use query_engine_sql::sql;

use super::filtering;
use super::sorting::{self, LeveledOrderByElement};
use crate::translation::error::Error;
use crate::translation::helpers::{Env, RequestContext, State, TableNameAndReference};
use crate::translation::request;

/// The joins of a selection level and the orderings collected beneath it.
#[derive(Debug, Default)]
pub struct SelectionJoins {
    pub joins: Vec<sql::ast::Join>,
    pub order_by: Vec<LeveledOrderByElement>,
}

/// Where a selection level sits in the plan.
#[derive(Debug, Clone, Copy)]
pub struct Level {
    /// The instances of this level are loaded by the query: the root, or a fetch.
    pub fetched: bool,
    pub depth: usize,
}

impl Level {
    pub fn root() -> Level {
        Level {
            fetched: true,
            depth: 0,
        }
    }
}

/// Walk the sub-selections of `field`, an instance of `current`, and produce the joins
/// its associations need.
///
/// A to-one association directly below a loaded level and without filter arguments is
/// fetched with its parent when eager fetching is on. Other to-one associations are joined.
/// A to-many association is joined only when it selects sub-fields; it's otherwise left
/// to be resolved on its own.
pub fn translate_joins(
    env: &Env,
    state: &mut State,
    context: &RequestContext,
    current: &TableNameAndReference,
    field: &request::SelectionNode,
    level: Level,
) -> Result<SelectionJoins, Error> {
    let mut order_by = if level.fetched {
        sorting::translate_order_by(env, current, field, level.depth)?
    } else {
        if field
            .attribute_selections()
            .any(|child| child.argument(request::ORDER_BY_ARGUMENT).is_some())
        {
            tracing::debug!(
                entity = current.name,
                field = field.name,
                "Ignoring ordering below a level that is not loaded"
            );
        }
        vec![]
    };
    let mut joins = vec![];

    for child in field.attribute_selections() {
        let attribute = env.lookup_attribute(&current.name, &child.name)?;
        let join_type = child
            .join_type()?
            .unwrap_or(env.fetch_settings.default_join_type);

        let Some(relationship) = env.lookup_relationship(&attribute) else {
            continue;
        };

        let kind = match relationship.cardinality {
            RelationshipCardinality::ToOne
                if level.fetched
                    && env.fetch_settings.eager_fetch_to_one
                    && !child.has_filter_arguments() =>
            {
                sql::ast::JoinKind::Fetch
            }
            RelationshipCardinality::ToOne => sql::ast::JoinKind::Join,
            RelationshipCardinality::ToMany if child.has_selections() => sql::ast::JoinKind::Join,
            RelationshipCardinality::ToMany => {
                tracing::debug!(
                    entity = current.name,
                    attribute = child.name,
                    "Not joining a collection without sub-selections"
                );
                continue;
            }
        };

        let target = TableNameAndReference {
            name: relationship.target,
            reference: state.make_table_alias(&child.name),
        };

        let nested = translate_joins(
            env,
            state,
            context,
            &target,
            child,
            Level {
                fetched: kind == sql::ast::JoinKind::Fetch,
                depth: level.depth + 1,
            },
        )?;

        let mut join = sql::ast::Join {
            attribute: child.name.clone(),
            alias: target.reference.clone(),
            kind,
            join_type,
            on: None,
            joins: nested.joins,
        };
        if let Some(predicate) =
            filtering::translate_join_arguments(env, context, &target, child)?
        {
            join = join.and_on(predicate);
        }

        order_by.extend(nested.order_by);
        joins.push(join);
    }

    Ok(SelectionJoins { joins, order_by })
}

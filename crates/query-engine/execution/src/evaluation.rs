//! Evaluate a query plan over a [`MemoryStore`].
//!
//! A row binds every alias of the plan to a value: an entity instance, the element of a
//! collection, or null for an outer join without a match. Joins expand the rows of the
//! enclosing level, then the `WHERE` predicate filters them, the `ORDER BY` list sorts them,
//! and the bindings of the select list are projected.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use query_engine_metadata::metadata::RelationshipCardinality;
use query_engine_sql::sql;

use crate::error::Error;
use crate::instance::{FieldData, Instance};
use crate::store::MemoryStore;

type Bindings = BTreeMap<u64, sql::ast::Value>;

/// Run a plan and materialize the root instances with their fetched associations.
pub fn execute(
    store: &MemoryStore,
    plan: &sql::execution_plan::ExecutionPlan,
) -> Result<Vec<Instance>, Error> {
    let roots = select(store, &plan.query)?;

    tracing::debug!(
        entity = plan.root_entity,
        instances = roots.len(),
        "Evaluated query"
    );

    roots
        .iter()
        .map(|root| materialize(store, root, &plan.query.joins))
        .collect()
}

/// The projected bindings of a select, in order.
fn select(store: &MemoryStore, select: &sql::ast::Select) -> Result<Vec<sql::ast::Value>, Error> {
    let mut rows: Vec<Bindings> = store
        .entity_refs(&select.from.entity.0)?
        .into_iter()
        .map(|entity_ref| {
            Bindings::from([(
                select.from.alias.unique_index,
                sql::ast::Value::Entity(entity_ref),
            )])
        })
        .collect();

    for join in &select.joins {
        rows = expand_join(store, rows, &select.from.alias, join)?;
    }

    let mut kept = vec![];
    for row in rows {
        if is_true(&evaluate(store, &row, &select.where_.0)?) {
            kept.push(row);
        }
    }

    let kept = sort_rows(store, kept, &select.order_by)?;

    let mut projected: Vec<sql::ast::Value> = vec![];
    for row in &kept {
        let value = binding(row, &select.select_list)?;
        if !select.distinct || !projected.contains(value) {
            projected.push(value.clone());
        }
    }
    Ok(projected)
}

/// Bind the alias of `join` in every row, following its attribute from the `source` binding.
///
/// A LEFT join keeps a row without matches, binding the alias to null. INNER and RIGHT joins
/// drop it: the rows of a right join that match no source carry no root to project.
fn expand_join(
    store: &MemoryStore,
    rows: Vec<Bindings>,
    source: &sql::ast::TableAlias,
    join: &sql::ast::Join,
) -> Result<Vec<Bindings>, Error> {
    let mut expanded = vec![];

    for row in rows {
        let targets = store.navigate(binding(&row, source)?, &join.attribute)?;
        let mut matched = false;

        for target in targets {
            let mut candidate = row.clone();
            candidate.insert(join.alias.unique_index, target);
            if let Some(on) = &join.on {
                if !is_true(&evaluate(store, &candidate, on)?) {
                    continue;
                }
            }
            matched = true;
            expanded.push(candidate);
        }

        if !matched && join.join_type == sql::ast::JoinType::Left {
            let mut unmatched = row;
            unmatched.insert(join.alias.unique_index, sql::ast::Value::Null);
            expanded.push(unmatched);
        }
    }

    for nested in &join.joins {
        expanded = expand_join(store, expanded, &join.alias, nested)?;
    }

    Ok(expanded)
}

fn binding<'a>(
    row: &'a Bindings,
    alias: &sql::ast::TableAlias,
) -> Result<&'a sql::ast::Value, Error> {
    row.get(&alias.unique_index)
        .ok_or_else(|| Error::UnboundAlias(format!("{}_{}", alias.name, alias.unique_index)))
}

fn is_true(value: &sql::ast::Value) -> bool {
    matches!(value, sql::ast::Value::Bool(true))
}

fn evaluate(
    store: &MemoryStore,
    row: &Bindings,
    expression: &sql::ast::Expression,
) -> Result<sql::ast::Value, Error> {
    match expression {
        sql::ast::Expression::And { left, right } => Ok(sql::ast::Value::Bool(
            is_true(&evaluate(store, row, left)?) && is_true(&evaluate(store, row, right)?),
        )),
        sql::ast::Expression::BinaryOperator {
            left,
            operator: sql::ast::BinaryOperator::Equals,
            right,
        } => {
            let left = evaluate(store, row, left)?;
            let right = evaluate(store, row, right)?;
            Ok(sql::ast::Value::Bool(values_equal(&left, &right)))
        }
        sql::ast::Expression::BinaryArrayOperator {
            left,
            operator: sql::ast::BinaryArrayOperator::In,
            right,
        } => {
            let left = evaluate(store, row, left)?;
            let mut found = false;
            for candidate in right {
                if values_equal(&left, &evaluate(store, row, candidate)?) {
                    found = true;
                    break;
                }
            }
            Ok(sql::ast::Value::Bool(found))
        }
        sql::ast::Expression::InSubquery { left, select: query } => {
            let left = evaluate(store, row, left)?;
            let projected = select(store, query)?;
            Ok(sql::ast::Value::Bool(
                projected.iter().any(|value| values_equal(&left, value)),
            ))
        }
        sql::ast::Expression::ColumnReference(column) => {
            store.attribute(binding(row, &column.table)?, &column.attribute)
        }
        sql::ast::Expression::TableReference(alias) => binding(row, alias).cloned(),
        sql::ast::Expression::Value(value) => Ok(value.clone()),
    }
}

/// Equality as a predicate sees it. Null equals nothing, a collection equals anything one of
/// its elements equals, and numbers compare across integral and fractional types.
#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
fn values_equal(left: &sql::ast::Value, right: &sql::ast::Value) -> bool {
    match (left, right) {
        (sql::ast::Value::Null, _) | (_, sql::ast::Value::Null) => false,
        (sql::ast::Value::Array(items), other) | (other, sql::ast::Value::Array(items)) => {
            items.iter().any(|item| values_equal(item, other))
        }
        (sql::ast::Value::Int8(int), sql::ast::Value::Float8(float))
        | (sql::ast::Value::Float8(float), sql::ast::Value::Int8(int)) => *int as f64 == *float,
        (sql::ast::Value::Enum { constant, .. }, sql::ast::Value::String(string))
        | (sql::ast::Value::String(string), sql::ast::Value::Enum { constant, .. }) => {
            constant == string
        }
        (sql::ast::Value::Uuid(uuid), sql::ast::Value::String(string))
        | (sql::ast::Value::String(string), sql::ast::Value::Uuid(uuid)) => {
            uuid::Uuid::parse_str(string).is_ok_and(|parsed| parsed == *uuid)
        }
        (left, right) => left == right,
    }
}

/// Sort rows by the keys of the `ORDER BY` list. Nulls sort after every other value.
fn sort_rows(
    store: &MemoryStore,
    rows: Vec<Bindings>,
    order_by: &sql::ast::OrderBy,
) -> Result<Vec<Bindings>, Error> {
    if order_by.elements.is_empty() {
        return Ok(rows);
    }

    let mut keyed = rows
        .into_iter()
        .map(|row| -> Result<_, Error> {
            let keys = order_by
                .elements
                .iter()
                .map(|element| evaluate(store, &row, &element.target))
                .collect::<Result<Vec<_>, Error>>()?;
            Ok((keys, row))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    keyed.sort_by(|(left, _), (right, _)| {
        for ((element, left), right) in order_by.elements.iter().zip(left).zip(right) {
            let ordering = compare_values(store, left, right);
            let ordering = match element.direction {
                sql::ast::OrderByDirection::Asc => ordering,
                sql::ast::OrderByDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

#[allow(clippy::cast_precision_loss)]
fn compare_values(store: &MemoryStore, left: &sql::ast::Value, right: &sql::ast::Value) -> Ordering {
    match (left, right) {
        (sql::ast::Value::Null, sql::ast::Value::Null) => Ordering::Equal,
        (sql::ast::Value::Null, _) => Ordering::Greater,
        (_, sql::ast::Value::Null) => Ordering::Less,
        (sql::ast::Value::Bool(left), sql::ast::Value::Bool(right)) => left.cmp(right),
        (sql::ast::Value::Int8(left), sql::ast::Value::Int8(right)) => left.cmp(right),
        (sql::ast::Value::Float8(left), sql::ast::Value::Float8(right)) => {
            left.partial_cmp(right).unwrap_or(Ordering::Equal)
        }
        (sql::ast::Value::Int8(left), sql::ast::Value::Float8(right)) => {
            (*left as f64).partial_cmp(right).unwrap_or(Ordering::Equal)
        }
        (sql::ast::Value::Float8(left), sql::ast::Value::Int8(right)) => {
            left.partial_cmp(&(*right as f64)).unwrap_or(Ordering::Equal)
        }
        (sql::ast::Value::String(left), sql::ast::Value::String(right)) => left.cmp(right),
        (sql::ast::Value::Uuid(left), sql::ast::Value::Uuid(right)) => left.cmp(right),
        (
            sql::ast::Value::Enum {
                enum_type,
                constant: left,
            },
            sql::ast::Value::Enum {
                constant: right, ..
            },
        ) => store
            .enum_position(enum_type, left)
            .cmp(&store.enum_position(enum_type, right)),
        (sql::ast::Value::Entity(left), sql::ast::Value::Entity(right)) => left.cmp(right),
        _ => Ordering::Equal,
    }
}

/// Build the instance a root binding refers to and load the associations its fetch joins name.
fn materialize(
    store: &MemoryStore,
    binding: &sql::ast::Value,
    joins: &[sql::ast::Join],
) -> Result<Instance, Error> {
    let sql::ast::Value::Entity(entity_ref) = binding else {
        return Err(Error::NotAnInstance(format!("{binding:?}")));
    };
    let mut instance = store.instance(entity_ref)?;

    for join in joins
        .iter()
        .filter(|join| join.kind == sql::ast::JoinKind::Fetch)
    {
        let Some(relationship) = store.relationship(&instance.entity, &join.attribute)? else {
            return Err(Error::NotAnInstance(format!(
                "{}.{}",
                instance.entity, join.attribute
            )));
        };

        let mut targets: Vec<sql::ast::Value> = vec![];
        for target in store.navigate(binding, &join.attribute)? {
            if let Some(on) = &join.on {
                let row = Bindings::from([(join.alias.unique_index, target.clone())]);
                if !is_true(&evaluate(store, &row, on)?) {
                    continue;
                }
            }
            if !targets.contains(&target) {
                targets.push(target);
            }
        }

        let loaded = targets
            .iter()
            .map(|target| materialize(store, target, &join.joins))
            .collect::<Result<Vec<_>, Error>>()?;

        let data = match relationship.cardinality {
            RelationshipCardinality::ToOne if loaded.len() > 1 => {
                return Err(Error::NonUniqueFetch {
                    entity: instance.entity.clone(),
                    attribute: join.attribute.clone(),
                    id: instance.id.clone(),
                })
            }
            RelationshipCardinality::ToOne => {
                FieldData::Reference(loaded.into_iter().next().map(Box::new))
            }
            RelationshipCardinality::ToMany => FieldData::Collection(loaded),
        };
        instance.fields.insert(join.attribute.clone(), data);
    }

    Ok(instance)
}

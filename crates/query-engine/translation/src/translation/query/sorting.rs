//! Translate ordering directives into an ORDER BY clause.

use query_engine_sql::sql;

use crate::translation::error::Error;
use crate::translation::helpers::{Env, TableNameAndReference};
use crate::translation::request;

/// An ORDER BY element and the depth of the selection level it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LeveledOrderByElement {
    pub depth: usize,
    pub element: sql::ast::OrderByElement,
}

/// Collect the ordering directives of the scalar attributes selected at a loaded level.
pub fn translate_order_by(
    env: &Env,
    table: &TableNameAndReference,
    field: &request::SelectionNode,
    depth: usize,
) -> Result<Vec<LeveledOrderByElement>, Error> {
    let mut elements = vec![];

    for child in field.attribute_selections() {
        let Some(direction) = child.order_direction()? else {
            continue;
        };

        let attribute = env.lookup_attribute(&table.name, &child.name)?;
        if attribute.is_association() {
            tracing::debug!(
                entity = table.name,
                attribute = child.name,
                "Ignoring ordering on an association"
            );
            continue;
        }

        elements.push(LeveledOrderByElement {
            depth,
            element: sql::ast::OrderByElement {
                target: sql::helpers::make_column(&table.reference, &child.name),
                direction,
            },
        });
    }

    Ok(elements)
}

/// Build the ORDER BY clause: shallower levels first, selection order within a level.
pub fn make_order_by(mut elements: Vec<LeveledOrderByElement>) -> sql::ast::OrderBy {
    elements.sort_by_key(|leveled| leveled.depth);
    sql::ast::OrderBy {
        elements: elements
            .into_iter()
            .map(|leveled| leveled.element)
            .collect(),
    }
}

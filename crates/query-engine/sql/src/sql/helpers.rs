//! Helpers for building sql::ast types in certain shapes and patterns.

use super::ast::*;

// Empty clauses //

/// An empty `WHERE` clause.
pub fn empty_where() -> Expression {
    Expression::Value(Value::Bool(true))
}

/// An empty `ORDER BY` clause.
pub fn empty_order_by() -> OrderBy {
    OrderBy { elements: vec![] }
}

/// A `true` expression.
pub fn true_expr() -> Expression {
    Expression::Value(Value::Bool(true))
}

// Aliasing //

/// Create table aliases using this function so we build everything in one place.
pub fn make_table_alias(unique_index: u64, name: &str) -> TableAlias {
    TableAlias {
        unique_index,
        name: name.to_string(),
    }
}

/// Reference an attribute of an aliased binding.
pub fn make_column(table: &TableAlias, attribute: &str) -> Expression {
    Expression::ColumnReference(ColumnReference {
        table: table.clone(),
        attribute: attribute.to_string(),
    })
}

// Predicates //

/// `left = right`
pub fn equals(left: Expression, right: Expression) -> Expression {
    Expression::BinaryOperator {
        left: Box::new(left),
        operator: BinaryOperator::Equals,
        right: Box::new(right),
    }
}

/// `left IN (values...)`
pub fn in_values(left: Expression, values: Vec<Value>) -> Expression {
    Expression::BinaryArrayOperator {
        left: Box::new(left),
        operator: BinaryArrayOperator::In,
        right: values.into_iter().map(Expression::Value).collect(),
    }
}

/// `left IN (SELECT ...)`
pub fn in_subquery(left: Expression, select: Select) -> Expression {
    Expression::InSubquery {
        left: Box::new(left),
        select: Box::new(select),
    }
}

/// Combine two predicates with AND, dropping trivially true sides.
pub fn and(left: Expression, right: Expression) -> Expression {
    if left == true_expr() {
        right
    } else if right == true_expr() {
        left
    } else {
        Expression::And {
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// Combine a list of predicates with AND. An empty list is `true`.
pub fn conjunction(predicates: impl IntoIterator<Item = Expression>) -> Expression {
    predicates.into_iter().fold(true_expr(), and)
}

// SELECTs //

/// Build a simple select of an entity with the rest of the clauses empty.
pub fn simple_select(entity: &str, alias: TableAlias) -> Select {
    Select {
        distinct: false,
        select_list: alias.clone(),
        from: From {
            entity: EntityName(entity.to_string()),
            alias,
        },
        joins: vec![],
        where_: Where(empty_where()),
        order_by: empty_order_by(),
    }
}

/// A plain join along an attribute without an ON condition.
pub fn simple_join(attribute: &str, alias: TableAlias, join_type: JoinType) -> Join {
    Join {
        attribute: attribute.to_string(),
        alias,
        kind: JoinKind::Join,
        join_type,
        on: None,
        joins: vec![],
    }
}

impl Join {
    /// Add a predicate to the join's ON condition, keeping any existing one.
    #[must_use]
    pub fn and_on(mut self, predicate: Expression) -> Join {
        self.on = Some(match self.on.take() {
            None => predicate,
            Some(existing) => and(existing, predicate),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_is(alias: &TableAlias, name: &str) -> Expression {
        equals(
            make_column(alias, "name"),
            Expression::Value(Value::String(name.to_string())),
        )
    }

    #[test]
    fn conjunction_of_nothing_is_true() {
        assert_eq!(conjunction(Vec::<Expression>::new()), true_expr());
    }

    #[test]
    fn conjunction_of_one_is_itself() {
        let alias = make_table_alias(0, "Person");
        assert_eq!(
            conjunction(vec![name_is(&alias, "Han Solo")]),
            name_is(&alias, "Han Solo")
        );
    }

    #[test]
    fn and_on_keeps_the_existing_condition() {
        let alias = make_table_alias(1, "friends");
        let join = simple_join("friends", alias.clone(), JoinType::Left)
            .and_on(name_is(&alias, "Luke Skywalker"))
            .and_on(name_is(&alias, "Leia Organa"));

        assert_eq!(
            join.on,
            Some(Expression::And {
                left: Box::new(name_is(&alias, "Luke Skywalker")),
                right: Box::new(name_is(&alias, "Leia Organa")),
            })
        );
    }
}

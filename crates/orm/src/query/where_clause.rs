//! Query Builder WHERE clause operations
//!
//! Positional calls append a predicate (AND unless stated otherwise);
//! `where_map` replaces every predicate at once. Operator and connector
//! tokens are parsed against fixed allow-lists before they are kept.

use super::builder::QueryBuilder;
use super::types::*;
use crate::security;
use crate::value::Value;

impl<M> QueryBuilder<M> {
    fn push_where(mut self, column: Option<&str>, condition: WhereCondition) -> Self {
        if let Some(column) = column {
            if let Err(message) = security::validate_identifier(column) {
                return self.issue(message);
            }
        }
        self.where_conditions.push(condition);
        self
    }

    fn push_comparison(
        self,
        connector: LogicalOperator,
        column: &str,
        operator: &str,
        value: Value,
    ) -> Self {
        let operator: QueryOperator = match operator.parse() {
            Ok(operator) => operator,
            Err(message) => return self.issue(message),
        };

        let condition = match operator {
            QueryOperator::IsNull | QueryOperator::IsNotNull => WhereCondition::Null {
                connector,
                column: column.to_string(),
                negated: operator == QueryOperator::IsNotNull,
            },
            op if op.is_binary() => WhereCondition::Compare {
                connector,
                column: column.to_string(),
                operator: op,
                value,
            },
            op => {
                return self.issue(format!(
                    "operator '{}' needs its dedicated builder method (where_in, where_between, where_exists)",
                    op
                ))
            }
        };
        self.push_where(Some(column), condition)
    }

    /// Add `column <operator> value`, joined with AND
    pub fn where_op<T: Into<Value>>(self, column: &str, operator: &str, value: T) -> Self {
        self.push_comparison(LogicalOperator::And, column, operator, value.into())
    }

    /// Add `column <operator> value`, joined with OR
    pub fn or_where_op<T: Into<Value>>(self, column: &str, operator: &str, value: T) -> Self {
        self.push_comparison(LogicalOperator::Or, column, operator, value.into())
    }

    /// Add a predicate with an explicit connector (`WHERE`, `AND` or `OR`)
    pub fn where_with<T: Into<Value>>(
        self,
        connector: &str,
        column: &str,
        operator: &str,
        value: T,
    ) -> Self {
        match connector.parse::<LogicalOperator>() {
            Ok(connector) => self.push_comparison(connector, column, operator, value.into()),
            Err(message) => self.issue(message),
        }
    }

    /// Add WHERE condition with equality
    pub fn where_eq<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.where_op(column, "=", value)
    }

    /// Add an equality predicate joined with OR
    pub fn or_where<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.or_where_op(column, "=", value)
    }

    /// Add WHERE condition with not equal
    pub fn where_ne<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.where_op(column, "!=", value)
    }

    /// Add WHERE condition with LIKE
    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.where_op(column, "LIKE", pattern)
    }

    /// Replace every predicate with `column = value` pairs joined by AND
    pub fn where_map<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.where_conditions.clear();
        for (column, value) in pairs {
            self = self.where_eq(column.as_ref(), value);
        }
        self
    }

    fn push_in<I, T>(self, connector: LogicalOperator, column: &str, negated: bool, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return self.issue(format!("IN list for column '{}' is empty", column));
        }
        self.push_where(
            Some(column),
            WhereCondition::In {
                connector,
                column: column.to_string(),
                negated,
                values,
            },
        )
    }

    /// Add WHERE column IN (...); an empty set is a configuration error
    pub fn where_in<I, T>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.push_in(LogicalOperator::And, column, false, values)
    }

    /// Add OR column IN (...)
    pub fn or_where_in<I, T>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.push_in(LogicalOperator::Or, column, false, values)
    }

    /// Add WHERE column NOT IN (...)
    pub fn where_not_in<I, T>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.push_in(LogicalOperator::And, column, true, values)
    }

    /// Add WHERE column BETWEEN low AND high
    pub fn where_between<L: Into<Value>, H: Into<Value>>(self, column: &str, low: L, high: H) -> Self {
        self.push_where(
            Some(column),
            WhereCondition::Between {
                connector: LogicalOperator::And,
                column: column.to_string(),
                low: low.into(),
                high: high.into(),
            },
        )
    }

    /// Add WHERE column IS NULL
    pub fn where_null(self, column: &str) -> Self {
        self.push_where(
            Some(column),
            WhereCondition::Null {
                connector: LogicalOperator::And,
                column: column.to_string(),
                negated: false,
            },
        )
    }

    /// Add WHERE column IS NOT NULL
    pub fn where_not_null(self, column: &str) -> Self {
        self.push_where(
            Some(column),
            WhereCondition::Null {
                connector: LogicalOperator::And,
                column: column.to_string(),
                negated: true,
            },
        )
    }

    fn push_exists<R>(mut self, negated: bool, subquery: QueryBuilder<R>) -> Self {
        let subquery = subquery.into_untyped();
        if !subquery.issues.is_empty() {
            self.issues.extend(subquery.issues.iter().cloned());
            return self;
        }
        self.push_where(
            None,
            WhereCondition::Exists {
                connector: LogicalOperator::And,
                negated,
                subquery: Box::new(subquery),
            },
        )
    }

    /// Add WHERE EXISTS (subquery); the subquery's values are bound in place
    pub fn where_exists<R>(self, subquery: QueryBuilder<R>) -> Self {
        self.push_exists(false, subquery)
    }

    /// Add WHERE NOT EXISTS (subquery)
    pub fn where_not_exists<R>(self, subquery: QueryBuilder<R>) -> Self {
        self.push_exists(true, subquery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disallowed_operator_is_recorded() {
        let query = QueryBuilder::table("users").where_op("age", "=>", 18);
        assert_eq!(query.issues().len(), 1);
        assert!(query.where_conditions.is_empty());
    }

    #[test]
    fn test_empty_in_set_is_recorded() {
        let query = QueryBuilder::table("users").where_in("id", Vec::<i64>::new());
        assert!(query.issues()[0].contains("empty"));
    }

    #[test]
    fn test_set_operators_need_dedicated_methods() {
        let query = QueryBuilder::table("users").where_op("id", "IN", 3);
        assert_eq!(query.issues().len(), 1);
    }

    #[test]
    fn test_is_null_through_where_op() {
        let query = QueryBuilder::table("users").where_op("deleted_at", "is null", Value::Null);
        assert!(matches!(
            query.where_conditions[0],
            WhereCondition::Null { negated: false, .. }
        ));
    }

    #[test]
    fn test_where_map_overwrites() {
        let query = QueryBuilder::table("users")
            .where_eq("status", "banned")
            .where_map([("role", "admin"), ("active", "1")]);
        assert_eq!(query.where_conditions.len(), 2);
        assert!(matches!(
            &query.where_conditions[0],
            WhereCondition::Compare { column, .. } if column == "role"
        ));
    }

    #[test]
    fn test_bad_connector_is_recorded() {
        let query = QueryBuilder::table("users").where_with("XOR", "id", "=", 1);
        assert_eq!(query.issues().len(), 1);
    }
}

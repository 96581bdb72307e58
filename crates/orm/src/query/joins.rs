//! Query Builder JOIN operations
//!
//! Every join takes exactly three ON arguments: left column, comparison
//! operator and right column. Join tables are used as written.

use super::builder::QueryBuilder;
use super::types::*;
use crate::security;

impl<M> QueryBuilder<M> {
    fn push_join(mut self, join_type: JoinType, table: &str, on: &[&str]) -> Self {
        let [left, operator, right] = on else {
            return self.issue(format!(
                "join on '{}' needs exactly three ON arguments (left, operator, right), got {}",
                table,
                on.len()
            ));
        };

        let operator: QueryOperator = match operator.parse() {
            Ok(op) if QueryOperator::is_binary(&op) => op,
            Ok(op) => return self.issue(format!("operator '{}' cannot be used in a join condition", op)),
            Err(message) => return self.issue(message),
        };
        for identifier in [table, *left, *right] {
            if let Err(message) = security::validate_identifier(identifier) {
                return self.issue(message);
            }
        }

        self.joins.push(JoinClause {
            join_type,
            table: table.to_string(),
            left: left.to_string(),
            operator,
            right: right.to_string(),
        });
        self
    }

    /// Add INNER JOIN to the query
    pub fn join(self, table: &str, on: &[&str]) -> Self {
        self.push_join(JoinType::Inner, table, on)
    }

    /// Add LEFT JOIN to the query
    pub fn left_join(self, table: &str, on: &[&str]) -> Self {
        self.push_join(JoinType::Left, table, on)
    }

    /// Add RIGHT JOIN to the query
    pub fn right_join(self, table: &str, on: &[&str]) -> Self {
        self.push_join(JoinType::Right, table, on)
    }
}

//! Query Builder ORDER BY operations

use super::builder::QueryBuilder;
use super::types::*;
use crate::security;

impl<M> QueryBuilder<M> {
    /// Add ORDER BY clause; repeated calls accumulate
    pub fn order_by(mut self, column: &str, direction: OrderDirection) -> Self {
        if let Err(message) = security::validate_identifier(column) {
            return self.issue(message);
        }
        self.order_by.push(OrderClause {
            column: column.to_string(),
            direction,
        });
        self
    }

    /// Add ORDER BY clause with a textual direction (`ASC` or `DESC`)
    pub fn order_by_str(self, column: &str, direction: &str) -> Self {
        match direction.parse::<OrderDirection>() {
            Ok(direction) => self.order_by(column, direction),
            Err(message) => self.issue(message),
        }
    }

    /// Add ORDER BY clause (descending)
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, OrderDirection::Desc)
    }
}

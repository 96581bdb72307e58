//! Query Builder DML operations (INSERT, UPDATE, DELETE)
//!
//! These only shape the query; the statements run through the terminal
//! calls in `execution`.

use super::builder::QueryBuilder;
use super::types::*;
use crate::security;
use crate::value::Value;

impl<M> QueryBuilder<M> {
    /// Turn the query into an INSERT of the set values
    pub fn as_insert(mut self) -> Self {
        self.query_type = QueryType::Insert;
        self
    }

    /// Turn the query into an UPDATE of the set values
    pub fn as_update(mut self) -> Self {
        self.query_type = QueryType::Update;
        self
    }

    /// Turn the query into a DELETE
    pub fn as_delete(mut self) -> Self {
        self.query_type = QueryType::Delete;
        self
    }

    /// Turn the query into a single-column aggregate
    pub fn as_aggregate(mut self, function: AggregateFunction, column: &str) -> Self {
        if let Err(message) = security::validate_column(column) {
            return self.issue(message);
        }
        self.query_type = QueryType::Aggregate {
            function,
            column: column.to_string(),
        };
        self
    }

    /// Set a column value (for INSERT/UPDATE); a repeated column keeps the last value
    pub fn set<T: Into<Value>>(mut self, column: &str, value: T) -> Self {
        if let Err(message) = security::validate_identifier(column) {
            return self.issue(message);
        }
        let value = value.into();
        match self.set_clauses.iter_mut().find(|clause| clause.column == column) {
            Some(clause) => clause.value = value,
            None => self.set_clauses.push(SetClause {
                column: column.to_string(),
                value,
            }),
        }
        self
    }

    /// Set multiple values at once
    pub fn set_values<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (column, value) in values {
            self = self.set(column.as_ref(), value);
        }
        self
    }

    /// Ask an INSERT to return the generated value of `column` where supported
    pub fn returning(mut self, column: &str) -> Self {
        if let Err(message) = security::validate_identifier(column) {
            return self.issue(message);
        }
        self.returning = Some(column.to_string());
        self
    }
}

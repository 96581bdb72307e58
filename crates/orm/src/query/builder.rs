//! Query Builder - Core builder implementation
//!
//! A `QueryBuilder` is a value: every fluent call consumes it and returns
//! the next state, and the terminal call consumes it for good. Mistakes
//! made while building (a disallowed operator, a bad identifier, an empty
//! IN set) are recorded as issues instead of panicking; the terminal call
//! reports them through the `ErrorPolicy`.

use std::marker::PhantomData;

use super::types::*;
use crate::database::Target;
use crate::security;

/// Query builder for constructing database queries
#[derive(Debug)]
pub struct QueryBuilder<M = ()> {
    pub(crate) query_type: QueryType,
    pub(crate) table: String,
    pub(crate) select_fields: Vec<String>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) where_conditions: Vec<WhereCondition>,
    pub(crate) order_by: Vec<OrderClause>,
    pub(crate) limit_count: Option<u64>,
    pub(crate) offset_value: Option<u64>,
    pub(crate) set_clauses: Vec<SetClause>,
    pub(crate) returning: Option<String>,
    pub(crate) target: Target,
    pub(crate) issues: Vec<String>,
    _phantom: PhantomData<M>,
}

impl<M> Clone for QueryBuilder<M> {
    fn clone(&self) -> Self {
        Self {
            query_type: self.query_type.clone(),
            table: self.table.clone(),
            select_fields: self.select_fields.clone(),
            joins: self.joins.clone(),
            where_conditions: self.where_conditions.clone(),
            order_by: self.order_by.clone(),
            limit_count: self.limit_count,
            offset_value: self.offset_value,
            set_clauses: self.set_clauses.clone(),
            returning: self.returning.clone(),
            target: self.target.clone(),
            issues: self.issues.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<M> Default for QueryBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    /// Untyped builder over `table`
    pub fn table(table: &str) -> Self {
        Self::new().from(table)
    }
}

impl<M> QueryBuilder<M> {
    /// Create a new query builder
    pub fn new() -> Self {
        Self {
            query_type: QueryType::Select,
            table: String::new(),
            select_fields: Vec::new(),
            joins: Vec::new(),
            where_conditions: Vec::new(),
            order_by: Vec::new(),
            limit_count: None,
            offset_value: None,
            set_clauses: Vec::new(),
            returning: None,
            target: Target::Default,
            issues: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// Record a configuration mistake for the terminal call to report
    pub(crate) fn issue(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::debug!(issue = %message, "query configuration issue recorded");
        self.issues.push(message);
        self
    }

    /// Set the base table (the configured prefix is added when rendering)
    pub fn from(mut self, table: &str) -> Self {
        if let Err(message) = security::validate_identifier(table) {
            return self.issue(message);
        }
        self.table = table.to_string();
        self
    }

    /// Choose the selected columns; `*` when never called
    pub fn select(mut self, fields: &[&str]) -> Self {
        for field in fields {
            if let Err(message) = security::validate_select_expression(field) {
                return self.issue(message);
            }
        }
        self.select_fields = fields.iter().map(|f| f.trim().to_string()).collect();
        self
    }

    /// Run against another connector or explicit credentials
    pub fn on(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// Drop the model type, keeping every clause
    pub fn into_untyped(self) -> QueryBuilder {
        QueryBuilder {
            query_type: self.query_type,
            table: self.table,
            select_fields: self.select_fields,
            joins: self.joins,
            where_conditions: self.where_conditions,
            order_by: self.order_by,
            limit_count: self.limit_count,
            offset_value: self.offset_value,
            set_clauses: self.set_clauses,
            returning: self.returning,
            target: self.target,
            issues: self.issues,
            _phantom: PhantomData,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Configuration mistakes recorded so far
    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    /// Values compared in predicates, used to describe a missing row
    pub(crate) fn key_hint(&self) -> Option<String> {
        let values: Vec<String> = self
            .where_conditions
            .iter()
            .filter_map(|condition| match condition {
                WhereCondition::Compare { value, .. } => Some(value.to_string()),
                _ => None,
            })
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(","))
        }
    }
}

//! Relationships Module - one-shot relation resolvers and junction writes
//!
//! A relation captures the key value it needs from the parent when it is
//! built and issues one query when resolved. Nothing is cached.

pub mod belongs_to_many;
pub mod has_many;
pub mod has_one;
pub mod related;

pub use belongs_to_many::BelongsToMany;
pub use has_many::HasMany;
pub use has_one::HasOne;
pub use related::{plan_sync, LinkKey, Related, SyncPlan};

use crate::query::QueryBuilder;
use crate::value::Value;

/// Keys and the parent-side value a relation filters on
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipMeta {
    pub foreign_key: String,
    /// Column the foreign key points at
    pub local_key: String,
    pub value: Value,
    /// Set when the parent could not supply `value`
    pub issue: Option<String>,
}

impl RelationshipMeta {
    pub(crate) fn new(foreign_key: &str, local_key: &str, value: Value) -> Self {
        Self {
            foreign_key: foreign_key.to_string(),
            local_key: local_key.to_string(),
            value,
            issue: None,
        }
    }

    pub(crate) fn broken(foreign_key: &str, local_key: &str, issue: String) -> Self {
        Self {
            foreign_key: foreign_key.to_string(),
            local_key: local_key.to_string(),
            value: Value::Null,
            issue: Some(issue),
        }
    }

    /// Add `column = value`, or carry the issue into the query
    pub(crate) fn constrain<M>(&self, query: QueryBuilder<M>, column: &str) -> QueryBuilder<M> {
        match &self.issue {
            Some(issue) => query.issue(issue.clone()),
            None => query.where_eq(column, self.value.clone()),
        }
    }
}

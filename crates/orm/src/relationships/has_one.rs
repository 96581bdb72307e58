//! HasOne Relationship - the parent holds the foreign key

use std::marker::PhantomData;

use crate::database::Database;
use crate::error::OrmResult;
use crate::model::Model;
use crate::query::QueryBuilder;
use crate::value::Value;

use super::RelationshipMeta;

/// One related record whose primary key equals the parent's foreign key
#[derive(Debug, Clone)]
pub struct HasOne<R> {
    meta: RelationshipMeta,
    _related: PhantomData<fn() -> R>,
}

impl<R: Model> HasOne<R> {
    pub fn new<P: Model>(parent: &P, foreign_key: &str) -> Self {
        let meta = match parent.get_attribute(foreign_key) {
            Some(value) => RelationshipMeta::new(foreign_key, R::primary_key_name(), value),
            None => RelationshipMeta::broken(
                foreign_key,
                R::primary_key_name(),
                format!("{} has no column '{}'", P::NAME, foreign_key),
            ),
        };
        Self {
            meta,
            _related: PhantomData,
        }
    }

    pub fn meta(&self) -> &RelationshipMeta {
        &self.meta
    }

    /// `SELECT * FROM related WHERE related.pk = ?`
    pub fn query(&self) -> QueryBuilder<R> {
        self.meta
            .constrain(R::query(), R::primary_key_name())
    }

    /// Fetch the related record; a null foreign key means there is none
    pub async fn resolve(self, db: &Database) -> OrmResult<Option<R>> {
        if matches!(self.meta.value, Value::Null) && self.meta.issue.is_none() {
            tracing::debug!(related = R::NAME, foreign_key = %self.meta.foreign_key, "null foreign key, nothing to load");
            return Ok(None);
        }
        self.query().find(db).await
    }
}

//! HasMany Relationship - the related rows hold the foreign key

use std::marker::PhantomData;

use crate::collection::Collection;
use crate::database::Database;
use crate::error::OrmResult;
use crate::model::Model;
use crate::query::QueryBuilder;

use super::RelationshipMeta;

/// Every related record whose foreign key equals the parent's primary key
#[derive(Debug, Clone)]
pub struct HasMany<R> {
    meta: RelationshipMeta,
    _related: PhantomData<fn() -> R>,
}

impl<R: Model> HasMany<R> {
    pub fn new<P: Model>(parent: &P, foreign_key: &str) -> Self {
        let meta = match parent.primary_key() {
            Some(value) => RelationshipMeta::new(foreign_key, P::primary_key_name(), value),
            None => RelationshipMeta::broken(
                foreign_key,
                P::primary_key_name(),
                format!("{} has no '{}' value to relate from", P::NAME, P::primary_key_name()),
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

    /// `SELECT * FROM related WHERE related.fk = ?`
    pub fn query(&self) -> QueryBuilder<R> {
        let foreign_key = self.meta.foreign_key.clone();
        self.meta.constrain(R::query(), &foreign_key)
    }

    pub async fn resolve(self, db: &Database) -> OrmResult<Collection<R>> {
        self.query().find_all(db).await
    }
}

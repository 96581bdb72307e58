//! BelongsToMany Relationship - related records linked through a junction table
//!
//! ```sql
//! SELECT tags.* FROM tags
//! INNER JOIN post_tag ON post_tag.tag_id = tags.id
//! WHERE post_tag.post_id = ?
//! ```

use std::marker::PhantomData;

use crate::collection::Collection;
use crate::database::{Database, Target};
use crate::error::OrmResult;
use crate::model::Model;
use crate::query::QueryBuilder;

use super::RelationshipMeta;

#[derive(Debug, Clone)]
pub struct BelongsToMany<R> {
    meta: RelationshipMeta,
    junction: String,
    second_key: String,
    _related: PhantomData<fn() -> R>,
}

impl<R: Model> BelongsToMany<R> {
    /// `first_key` points at the parent, `second_key` at the related record
    pub fn new<P: Model>(parent: &P, junction: &str, first_key: &str, second_key: &str) -> Self {
        let meta = match parent.primary_key() {
            Some(value) => RelationshipMeta::new(first_key, P::primary_key_name(), value),
            None => RelationshipMeta::broken(
                first_key,
                P::primary_key_name(),
                format!("{} has no '{}' value to relate from", P::NAME, P::primary_key_name()),
            ),
        };
        Self {
            meta,
            junction: junction.to_string(),
            second_key: second_key.to_string(),
            _related: PhantomData,
        }
    }

    pub fn meta(&self) -> &RelationshipMeta {
        &self.meta
    }

    /// Query with table names qualified by `prefix`
    ///
    /// Joined tables are not prefixed at render time, so both names are
    /// spelled out here.
    pub fn query(&self, prefix: &str) -> QueryBuilder<R> {
        let related = format!("{}{}", prefix, R::table_name());
        let junction = format!("{}{}", prefix, self.junction);
        let columns = format!("{}.*", related);
        let left = format!("{}.{}", junction, self.second_key);
        let right = format!("{}.{}", related, R::primary_key_name());
        let query = R::query()
            .select(&[columns.as_str()])
            .join(&junction, &[left.as_str(), "=", right.as_str()]);
        let first_key = format!("{}.{}", junction, self.meta.foreign_key);
        self.meta.constrain(query, &first_key)
    }

    pub async fn resolve(self, db: &Database) -> OrmResult<Collection<R>> {
        let prefix = match db.prefix(&Target::Default) {
            Ok(prefix) => prefix,
            Err(err) => {
                db.policy().raise_or_log(err)?;
                return Ok(Collection::default());
            }
        };
        self.query(&prefix).find_all(db).await
    }
}

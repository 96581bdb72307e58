//! Query Methods - table-wide aggregates and single-column lookups
//!
//! Every aggregate comes back as a number: `count` as an integer, the
//! others as floats, with NULL (no rows) read as zero.

use crate::collection::Collection;
use crate::database::Database;
use crate::error::OrmResult;
use crate::model::core_trait::Model;
use crate::value::Value;

/// Trait providing query operations for model collections
#[allow(async_fn_in_trait)]
pub trait QueryMethods: Model {
    /// Number of rows in the table
    async fn count(db: &Database) -> OrmResult<i64> {
        Self::query().count(db, "*").await
    }

    async fn sum(db: &Database, column: &str) -> OrmResult<f64> {
        Self::query().sum(db, column).await
    }

    async fn max(db: &Database, column: &str) -> OrmResult<f64> {
        Self::query().max(db, column).await
    }

    async fn min(db: &Database, column: &str) -> OrmResult<f64> {
        Self::query().min(db, column).await
    }

    async fn avg(db: &Database, column: &str) -> OrmResult<f64> {
        Self::query().avg(db, column).await
    }

    /// First record whose `column` equals `value`
    async fn find_by(db: &Database, column: &str, value: impl Into<Value>) -> OrmResult<Option<Self>> {
        Self::query().where_eq(column, value).find(db).await
    }

    /// Every record whose `column` equals `value`
    async fn find_all_by(db: &Database, column: &str, value: impl Into<Value>) -> OrmResult<Collection<Self>> {
        Self::query().where_eq(column, value).find_all(db).await
    }

    /// Number of records whose `column` equals `value`
    async fn count_by(db: &Database, column: &str, value: impl Into<Value>) -> OrmResult<i64> {
        Self::query().where_eq(column, value).count(db, "*").await
    }
}

impl<M: Model> QueryMethods for M {}

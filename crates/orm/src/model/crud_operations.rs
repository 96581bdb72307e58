//! CRUD Operations - Create, Read, Update, Delete operations for models
//!
//! Reads go through `Model::query()`; writes either take explicit column
//! data (`create`, `update`) or flush the instance's pending buffer
//! (`save`). Instance operations address their row by primary key.

use crate::collection::Collection;
use crate::database::Database;
use crate::error::{OrmError, OrmResult};
use crate::model::core_trait::Model;
use crate::value::Value;

fn missing_key<M: Model>(operation: &str) -> OrmError {
    OrmError::configuration(format!(
        "cannot {} a {} record without a '{}' value",
        operation,
        M::NAME,
        M::primary_key_name()
    ))
}

/// Trait providing CRUD operations for models
#[allow(async_fn_in_trait)]
pub trait CrudOperations: Model {
    /// Zero or one record; a null `id` fetches the first row of the table
    async fn find(db: &Database, id: impl Into<Value>) -> OrmResult<Option<Self>> {
        let id = id.into();
        let query = Self::query();
        let query = if id.is_null() {
            query
        } else {
            query.where_eq(Self::primary_key_name(), id)
        };
        query.find(db).await
    }

    /// Like `find`, but a missing row is a `NotFound` error
    async fn find_or_fail(db: &Database, id: impl Into<Value>) -> OrmResult<Self> {
        let id = id.into();
        let query = Self::query();
        let query = if id.is_null() {
            query
        } else {
            query.where_eq(Self::primary_key_name(), id)
        };
        query.find_or_fail(db).await
    }

    /// Every row of the table
    async fn find_all(db: &Database) -> OrmResult<Collection<Self>> {
        Self::query().find_all(db).await
    }

    /// INSERT one row; returns the generated id when there is one
    async fn create<I, K, V>(db: &Database, data: I) -> OrmResult<Option<i64>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        Self::query().create(db, data).await
    }

    /// Flush pending writes
    ///
    /// A record obtained from a single-row fetch is updated by primary key;
    /// anything else is inserted, after which it carries its new key and
    /// counts as loaded. Nothing pending means nothing to do.
    async fn save(&mut self, db: &Database) -> OrmResult<()> {
        if !self.record().has_pending() {
            tracing::debug!(model = Self::NAME, "save skipped, nothing pending");
            return Ok(());
        }
        let pending = self.record().pending().to_vec();

        if self.record().is_loaded() {
            let Some(key) = self.primary_key() else {
                return db.policy().raise_or_log(missing_key::<Self>("update"));
            };
            let outcome = Self::query()
                .where_eq(Self::primary_key_name(), key)
                .set_values(pending)
                .as_update()
                .execute(db)
                .await?;
            let Some(outcome) = outcome else {
                return Ok(());
            };
            self.record_mut().record_row_count(outcome.rows_affected);
        } else {
            let outcome = Self::query().set_values(pending).as_insert().execute(db).await?;
            let Some(outcome) = outcome else {
                return Ok(());
            };
            if let Some(id) = outcome.last_insert_id {
                self.set_attribute(Self::primary_key_name(), Value::Int(id))?;
            }
            self.record_mut().mark_loaded();
            self.record_mut().record_row_count(outcome.rows_affected);
        }

        self.record_mut().clear_pending();
        Ok(())
    }

    /// UPDATE this record's row with `data` directly, bypassing the buffer
    async fn update<I, K, V>(&mut self, db: &Database, data: I) -> OrmResult<Option<u64>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let Some(key) = self.primary_key() else {
            db.policy().raise_or_log(missing_key::<Self>("update"))?;
            return Ok(None);
        };
        let affected = Self::query()
            .where_eq(Self::primary_key_name(), key)
            .update(db, data)
            .await?;
        if let Some(count) = affected {
            self.record_mut().record_row_count(count);
        }
        Ok(affected)
    }

    /// DELETE this record's row
    async fn delete(&mut self, db: &Database) -> OrmResult<Option<u64>> {
        let Some(key) = self.primary_key() else {
            db.policy().raise_or_log(missing_key::<Self>("delete"))?;
            return Ok(None);
        };
        let affected = Self::query()
            .where_eq(Self::primary_key_name(), key)
            .delete(db)
            .await?;
        if let Some(count) = affected {
            self.record_mut().record_row_count(count);
        }
        Ok(affected)
    }

    /// Reload every column from the database, dropping pending writes
    async fn refresh(&mut self, db: &Database) -> OrmResult<()> {
        let Some(key) = self.primary_key() else {
            return db.policy().raise_or_log(missing_key::<Self>("refresh"));
        };
        let fresh = Self::query()
            .where_eq(Self::primary_key_name(), key)
            .find_or_fail(db)
            .await?;

        for column in Self::columns() {
            if let Some(value) = fresh.get_attribute(column) {
                self.set_attribute(column, value)?;
            }
        }
        self.record_mut().clear_pending();
        self.record_mut().mark_loaded();
        Ok(())
    }
}

impl<M: Model> CrudOperations for M {}

//! Model Extensions - instance helpers
//!
//! Mass assignment, row counting and the relation entry points.

use crate::error::OrmResult;
use crate::model::core_trait::Model;
use crate::relationships::{BelongsToMany, HasMany, HasOne, Related};
use crate::value::Value;

/// Extension trait for models with additional utility methods
pub trait ModelExtensions: Model {
    /// Assign and buffer `data`, keeping only fillable columns
    ///
    /// Each value passes through `Model::mutate` first. Columns that are not
    /// fillable are skipped.
    fn fill<I, K, V>(&mut self, data: I) -> OrmResult<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (column, value) in data {
            let column = column.as_ref();
            if !Self::fillable().contains(&column) {
                tracing::debug!(model = Self::NAME, column, "skipping non-fillable column");
                continue;
            }
            let value = self.mutate(column, value.into());
            self.set(column, value)?;
        }
        Ok(self)
    }

    /// Assign one column and buffer it for `save`
    fn set(&mut self, column: &str, value: impl Into<Value>) -> OrmResult<()> {
        let value = value.into();
        self.set_attribute(column, value.clone())?;
        self.record_mut().stage(column, value);
        Ok(())
    }

    /// Opt in to (or out of) affected-row counts from writes
    fn run_row_count(&mut self, enabled: bool) -> &mut Self {
        self.record_mut().set_count_rows(enabled);
        self
    }

    /// Rows affected by the last write, when counting is enabled
    fn row_count(&self) -> Option<u64> {
        self.record().row_count()
    }

    /// Related record whose primary key equals this record's `foreign_key`
    fn has_one<R: Model>(&self, foreign_key: &str) -> HasOne<R> {
        HasOne::new(self, foreign_key)
    }

    /// Related records whose `foreign_key` equals this record's primary key
    fn has_many<R: Model>(&self, foreign_key: &str) -> HasMany<R> {
        HasMany::new(self, foreign_key)
    }

    /// Related records linked through `junction`
    fn belongs_to_many<R: Model>(&self, junction: &str, first_key: &str, second_key: &str) -> BelongsToMany<R> {
        BelongsToMany::new(self, junction, first_key, second_key)
    }

    /// Junction-table writes (attach / sync) for this record
    fn related(&self, junction: &str, first_key: &str, second_key: &str) -> Related {
        Related::new(self, junction, first_key, second_key)
    }
}

impl<M: Model> ModelExtensions for M {}

//! Core Model Trait - Base definition for database entities
//!
//! A model is a typed record with a known column list. Attributes are read
//! and written by column name so the query layer can move values in and
//! out without knowing the concrete type; the `model!` macro generates the
//! per-column plumbing.

use std::fmt::Debug;

use crate::error::OrmResult;
use crate::model::naming;
use crate::model::record_state::RecordState;
use crate::query::QueryBuilder;
use crate::row::Row;
use crate::value::Value;

/// Core trait for database models
pub trait Model: Default + Debug + Send + Sync + 'static {
    /// Simple type name, used to derive the table name
    const NAME: &'static str;

    /// Explicit table name, bypassing derivation
    fn table_override() -> Option<&'static str> {
        None
    }

    /// Table name without the connector prefix
    ///
    /// The prefix is added when the query is rendered, since it depends on
    /// the connector the query runs against.
    fn table_name() -> String {
        match Self::table_override() {
            Some(table) => table.to_string(),
            None => naming::table_name(Self::NAME),
        }
    }

    /// Primary key field name
    fn primary_key_name() -> &'static str {
        "id"
    }

    /// Every column the type maps
    fn columns() -> &'static [&'static str];

    /// Columns `fill` is allowed to write
    fn fillable() -> &'static [&'static str] {
        &[]
    }

    /// Current value of a column, `None` for columns the type does not map
    fn get_attribute(&self, column: &str) -> Option<Value>;

    /// Assign a column from a loosely typed value
    fn set_attribute(&mut self, column: &str, value: Value) -> OrmResult<()>;

    /// Per-field mutator applied by `fill`
    fn mutate(&self, _column: &str, value: Value) -> Value {
        value
    }

    fn record(&self) -> &RecordState;

    fn record_mut(&mut self) -> &mut RecordState;

    /// Primary key value, when set
    fn primary_key(&self) -> Option<Value> {
        self.get_attribute(Self::primary_key_name())
            .filter(|value| !value.is_null())
    }

    /// Build an instance from a row
    ///
    /// Only columns the type maps are assigned; extra columns (from joins or
    /// `SELECT *` on a wider table) are ignored.
    fn hydrate(row: &Row) -> OrmResult<Self> {
        let mut model = Self::default();
        for (column, value) in row.iter() {
            if Self::columns().contains(&column) {
                model.set_attribute(column, value.clone())?;
            }
        }
        Ok(model)
    }

    /// Fresh query over this model's table
    fn query() -> QueryBuilder<Self> {
        QueryBuilder::new()
            .from(&Self::table_name())
            .returning(Self::primary_key_name())
    }
}

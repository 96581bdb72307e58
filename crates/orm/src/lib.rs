//! # tessera-orm: query building and active-record persistence
//!
//! A fluent query builder rendered per SQL dialect (MySQL, PostgreSQL),
//! active-record models declared with [`model!`], collections, pagination,
//! one-shot relations and junction-table sync. Connections come from an
//! explicit [`Database`] provider; configuration mistakes are raised or
//! logged according to its [`ErrorPolicy`].

pub mod backends;
pub mod collection;
pub mod database;
pub mod error;
pub mod model;
pub mod paginated;
pub mod policy;
pub mod query;
pub mod relationships;
pub mod row;
pub mod security;
pub mod testing;
pub mod transaction;
pub mod value;

pub use backends::{Connection, ConnectionFactory, Connector, DriverFactory, ExecOutcome, SqlDialect, Statement};
pub use collection::Collection;
pub use database::{Database, SharedConnection, Target};
pub use error::{OrmError, OrmResult};
pub use model::{CrudOperations, FullModel, Model, ModelExtensions, QueryMethods, RecordState};
pub use paginated::{Page, PageInfo};
pub use policy::ErrorPolicy;
pub use query::{AggregateFunction, JoinType, LogicalOperator, OrderDirection, QueryBuilder, QueryOperator};
pub use relationships::{plan_sync, BelongsToMany, HasMany, HasOne, LinkKey, Related, SyncPlan};
pub use row::Row;
pub use value::{FromValue, Value};

pub use sqlx::types::Decimal;

pub use tessera_core::{AppConfig, ConnectorConfig, DatabaseConfig, DriverKind, Environment, OnConfigurationError};

#[doc(hidden)]
pub use paste;

//! Query Builder Module - fluent, immutable query values rendered per dialect

pub mod builder;
pub mod dml;
pub mod execution;
pub mod joins;
pub mod ordering;
pub mod pagination;
pub mod sql_generation;
pub mod types;
pub mod where_clause;

pub use builder::QueryBuilder;
pub use types::{
    AggregateFunction, JoinClause, JoinType, LogicalOperator, OrderClause, OrderDirection, QueryOperator,
    QueryType, SetClause, WhereCondition,
};

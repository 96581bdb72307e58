//! Model System - active-record entities
//!
//! - `core_trait`: the `Model` trait (table metadata, attribute access, hydration)
//! - `naming`: table names derived from type names
//! - `record_state`: pending writes and fetch bookkeeping per instance
//! - `crud_operations`: find / create / save / update / delete / refresh
//! - `query_methods`: aggregates and single-column lookups
//! - `extensions`: mass assignment, row counts and relations
//! - `macros`: the `model!` declaration macro

pub mod core_trait;
pub mod crud_operations;
pub mod extensions;
pub mod macros;
pub mod naming;
pub mod query_methods;
pub mod record_state;

pub use core_trait::Model;
pub use crud_operations::CrudOperations;
pub use extensions::ModelExtensions;
pub use query_methods::QueryMethods;
pub use record_state::RecordState;

/// Every model capability in one bound
pub trait FullModel: Model + CrudOperations + QueryMethods + ModelExtensions {}

impl<T> FullModel for T where T: Model + CrudOperations + QueryMethods + ModelExtensions {}

//! Database backends
//!
//! Two products are supported: MySQL (and MariaDB) and PostgreSQL. Both sit
//! behind the `Connector` and `Connection` traits so the query layer never
//! touches a driver type.

pub mod connector;
pub mod core;
pub mod mysql;
pub mod postgres;

pub use self::connector::{
    connector_for, Address, ConnectionDescriptor, ConnectionFactory, ConnectionOptions, Connector, DriverFactory,
};
pub use self::core::{Connection, ExecOutcome, SqlDialect, Statement};
pub use mysql::{MySqlConnector, MySqlDriverConnection};
pub use postgres::{PostgresConnection, PostgresConnector};

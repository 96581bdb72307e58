//! Shared fixtures: a provider over a recording connection and a few models
#![allow(dead_code)]

use tessera_orm::testing::RecordingConnection;
use tessera_orm::{AppConfig, ConnectorConfig, Database, DatabaseConfig, Decimal, DriverKind, Environment, Value};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Provider whose default connection is `connection`
pub fn database(connection: &RecordingConnection, environment: Environment, prefix: &str) -> Database {
    init_tracing();
    let driver = match connection_dialect(connection) {
        tessera_orm::SqlDialect::MySql => DriverKind::MySql,
        tessera_orm::SqlDialect::PostgreSql => DriverKind::Postgres,
    };
    let connector = ConnectorConfig::new(driver, "localhost", "shop").with_prefix(prefix);
    let config = AppConfig::new(environment, DatabaseConfig::single("main", connector));
    Database::with_connection(config, Box::new(connection.clone()))
}

fn connection_dialect(connection: &RecordingConnection) -> tessera_orm::SqlDialect {
    use tessera_orm::Connection;
    connection.dialect()
}

pub fn dev(connection: &RecordingConnection) -> Database {
    database(connection, Environment::Development, "")
}

pub fn prod(connection: &RecordingConnection) -> Database {
    database(connection, Environment::Production, "")
}

tessera_orm::model! {
    pub struct User {
        id: Option<i64>,
        email: String,
        name: String,
        profile_id: Option<i64>,
    }
    fillable [email, name, profile_id]
    mutators { email => |v: Value| Value::from(v.to_string().trim().to_lowercase()) }
}

tessera_orm::model! {
    pub struct Profile {
        id: Option<i64>,
        bio: Option<String>,
    }
}

tessera_orm::model! {
    pub struct Post {
        id: Option<i64>,
        user_id: i64,
        title: String,
    }
    fillable [title]
}

tessera_orm::model! {
    pub struct Tag {
        id: Option<i64>,
        name: String,
    }
}

tessera_orm::model! {
    pub struct Category {
        id: Option<i64>,
        label: String,
    }
}

tessera_orm::model! {
    pub struct Product {
        id: Option<i64>,
        name: String,
        price: Decimal,
        opens_at: Option<chrono::NaiveTime>,
    }
}

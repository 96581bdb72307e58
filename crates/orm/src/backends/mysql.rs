//! MySQL / MariaDB backend implementation
//!
//! Uses a single `sqlx::MySqlConnection`. Multi-statement execution is
//! disabled for this product, so any statement with an inner `;` is refused
//! before it reaches the server.

use async_trait::async_trait;
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::query::Query;
use sqlx::types::Decimal;
use sqlx::{Column, ConnectOptions, Executor, Row as SqlxRow, TypeInfo, ValueRef};

use tessera_core::ConnectorConfig;

use super::connector::{Address, ConnectionDescriptor, ConnectionOptions, Connector};
use super::core::{has_statement_separator, Connection, ExecOutcome, SqlDialect, Statement};
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::{BindKind, Value};

/// Connector for MySQL-compatible servers
#[derive(Debug, Clone)]
pub struct MySqlConnector {
    name: String,
    config: ConnectorConfig,
}

impl MySqlConnector {
    pub fn new(name: impl Into<String>, config: ConnectorConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::MySql
    }

    fn dialect_options(&self, options: ConnectionOptions) -> ConnectionOptions {
        ConnectionOptions {
            charset: Some(self.config.charset.clone()),
            multi_statements: false,
            ..options
        }
    }

    async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<Box<dyn Connection>, sqlx::Error> {
        let mut options = MySqlConnectOptions::new()
            .database(&descriptor.database)
            .statement_cache_capacity(descriptor.options.statement_cache_capacity);

        options = match &descriptor.address {
            Address::Socket(path) => options.socket(path),
            Address::Tcp { host, port } => options.host(host).port(*port),
        };
        if let Some(charset) = &descriptor.options.charset {
            options = options.charset(charset);
        }
        if let Some(username) = &descriptor.username {
            options = options.username(username);
        }
        if let Some(password) = &descriptor.password {
            options = options.password(password);
        }

        let conn = options.connect().await?;
        Ok(Box::new(MySqlDriverConnection {
            conn,
            multi_statements: descriptor.options.multi_statements,
        }))
    }
}

/// Open MySQL connection
pub struct MySqlDriverConnection {
    conn: MySqlConnection,
    multi_statements: bool,
}

impl MySqlDriverConnection {
    fn guard(&self, sql: &str) -> OrmResult<()> {
        if !self.multi_statements && has_statement_separator(sql) {
            return Err(OrmError::Database(
                "multiple statements are disabled on this connection".to_string(),
            ));
        }
        Ok(())
    }

    async fn control(&mut self, sql: &str) -> OrmResult<()> {
        (&mut self.conn)
            .execute(sql)
            .await
            .map_err(|e| OrmError::Transaction(format!("{} failed: {}", sql, e)))?;
        Ok(())
    }
}

#[async_trait]
impl Connection for MySqlDriverConnection {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::MySql
    }

    async fn fetch_all(&mut self, statement: &Statement) -> OrmResult<Vec<Row>> {
        self.guard(&statement.sql)?;
        let mut query = sqlx::query(&statement.sql);
        for value in &statement.binds {
            query = bind_value(query, value);
        }

        let rows = query.fetch_all(&mut self.conn).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&mut self, statement: &Statement) -> OrmResult<ExecOutcome> {
        self.guard(&statement.sql)?;
        let mut query = sqlx::query(&statement.sql);
        for value in &statement.binds {
            query = bind_value(query, value);
        }

        let result = query.execute(&mut self.conn).await?;
        Ok(ExecOutcome {
            rows_affected: result.rows_affected(),
            last_insert_id: i64::try_from(result.last_insert_id()).ok().filter(|id| *id > 0),
        })
    }

    async fn begin(&mut self) -> OrmResult<()> {
        self.control("BEGIN").await
    }

    async fn commit(&mut self) -> OrmResult<()> {
        self.control("COMMIT").await
    }

    async fn rollback(&mut self) -> OrmResult<()> {
        self.control("ROLLBACK").await
    }
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value.kind() {
        BindKind::Null => query.bind(Option::<String>::None),
        BindKind::Boolean => query.bind(value.as_bool()),
        BindKind::Integer => query.bind(value.as_i64()),
        BindKind::Text => query.bind(value.as_str().map(str::to_string)),
        BindKind::Unspecified => match value {
            Value::Float(f) => query.bind(*f),
            Value::Decimal(d) => query.bind(*d),
            Value::Bytes(b) => query.bind(b.clone()),
            Value::Json(j) => query.bind(sqlx::types::Json(j.clone())),
            Value::Timestamp(t) => query.bind(*t),
            Value::Date(d) => query.bind(*d),
            Value::Time(t) => query.bind(*t),
            // UUIDs are stored as CHAR(36)
            other => query.bind(other.to_string()),
        },
    }
}

fn decode_error(column: &str, err: sqlx::Error) -> OrmError {
    OrmError::hydration(format!("column '{}': {}", column, err))
}

fn decode_row(row: &MySqlRow) -> OrmResult<Row> {
    let mut decoded = Row::new();
    for column in row.columns() {
        decoded.push(column.name(), decode_value(row, column.ordinal())?);
    }
    Ok(decoded)
}

fn decode_value(row: &MySqlRow, index: usize) -> OrmResult<Value> {
    let column = &row.columns()[index];
    let name = column.name();

    let raw = row.try_get_raw(index).map_err(|e| decode_error(name, e))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    macro_rules! get {
        ($ty:ty) => {
            row.try_get::<$ty, _>(index).map_err(|e| decode_error(name, e))?
        };
    }
    macro_rules! get_unchecked {
        ($ty:ty) => {
            row.try_get_unchecked::<$ty, _>(index)
                .map_err(|e| decode_error(name, e))?
        };
    }

    let value = match column.type_info().name() {
        "BOOLEAN" => Value::Bool(get!(bool)),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => Value::Int(get_unchecked!(i64)),
        unsigned if unsigned.ends_with("UNSIGNED") => {
            let wide = get_unchecked!(u64);
            Value::Int(i64::try_from(wide).map_err(|_| {
                OrmError::hydration(format!("column '{}': {} exceeds i64", name, wide))
            })?)
        }
        "FLOAT" => Value::Float(f64::from(get!(f32))),
        "DOUBLE" => Value::Float(get!(f64)),
        "DECIMAL" => Value::Decimal(get!(Decimal)),
        "DATETIME" | "TIMESTAMP" => Value::Timestamp(get!(chrono::NaiveDateTime)),
        "DATE" => Value::Date(get!(chrono::NaiveDate)),
        "TIME" => Value::Time(get!(chrono::NaiveTime)),
        "JSON" => Value::Json(get!(serde_json::Value)),
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" | "BIT" => {
            Value::Bytes(get_unchecked!(Vec<u8>))
        }
        _ => Value::Text(get_unchecked!(String)),
    };
    Ok(value)
}

//! PostgreSQL backend implementation
//!
//! Uses a single `sqlx::PgConnection`. INSERT statements carrying a
//! `returning` column are fetched so the generated key can be reported.
//!
//! Text and NULL parameters are declared with type OID 0 so the server
//! infers their type from the statement, letting a string compare against
//! an enum column or a NULL land in any column.

use async_trait::async_trait;
use sqlx::encode::IsNull;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{
    PgArgumentBuffer, PgArguments, PgConnectOptions, PgConnection, PgRow, PgTypeInfo, PgTypeKind, Postgres,
};
use sqlx::query::Query;
use sqlx::types::Decimal;
use sqlx::{Column, ConnectOptions, Encode, Executor, Row as SqlxRow, Type, TypeInfo, ValueRef};

use tessera_core::ConnectorConfig;

use super::connector::{Address, ConnectionDescriptor, Connector};
use super::core::{Connection, ExecOutcome, SqlDialect, Statement};
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::{BindKind, Value};

/// PostgreSQL connector
#[derive(Debug, Clone)]
pub struct PostgresConnector {
    name: String,
    config: ConnectorConfig,
}

impl PostgresConnector {
    pub fn new(name: impl Into<String>, config: ConnectorConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::PostgreSql
    }

    async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<Box<dyn Connection>, sqlx::Error> {
        let mut options = PgConnectOptions::new()
            .database(&descriptor.database)
            .statement_cache_capacity(descriptor.options.statement_cache_capacity);

        options = match &descriptor.address {
            Address::Socket(path) => options.socket(path),
            Address::Tcp { host, port } => options.host(host).port(*port),
        };
        if let Some(username) = &descriptor.username {
            options = options.username(username);
        }
        if let Some(password) = &descriptor.password {
            options = options.password(password);
        }

        let conn = options.connect().await?;
        Ok(Box::new(PostgresConnection { conn }))
    }
}

/// Open PostgreSQL connection
pub struct PostgresConnection {
    conn: PgConnection,
}

impl PostgresConnection {
    async fn control(&mut self, sql: &str) -> OrmResult<()> {
        (&mut self.conn)
            .execute(sql)
            .await
            .map_err(|e| OrmError::Transaction(format!("{} failed: {}", sql, e)))?;
        Ok(())
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::PostgreSql
    }

    async fn fetch_all(&mut self, statement: &Statement) -> OrmResult<Vec<Row>> {
        let mut query = sqlx::query(&statement.sql);
        for value in &statement.binds {
            query = bind_value(query, value);
        }

        let rows = query.fetch_all(&mut self.conn).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&mut self, statement: &Statement) -> OrmResult<ExecOutcome> {
        let mut query = sqlx::query(&statement.sql);
        for value in &statement.binds {
            query = bind_value(query, value);
        }

        if statement.returning.is_some() {
            let row = query.fetch_optional(&mut self.conn).await?;
            let last_insert_id = match row {
                Some(ref row) if !row.columns().is_empty() => decode_value(row, 0)?.as_i64(),
                _ => None,
            };
            return Ok(ExecOutcome {
                rows_affected: u64::from(row.is_some()),
                last_insert_id,
            });
        }

        let result = query.execute(&mut self.conn).await?;
        Ok(ExecOutcome {
            rows_affected: result.rows_affected(),
            last_insert_id: None,
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

/// String parameter whose type is left for the server to infer
#[derive(Debug, Clone)]
struct UntypedText(String);

impl Type<Postgres> for UntypedText {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as Type<Postgres>>::compatible(ty)
    }
}

impl Encode<'_, Postgres> for UntypedText {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> IsNull {
        buf.extend(self.0.as_bytes());
        IsNull::No
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> Query<'q, Postgres, PgArguments> {
    match value.kind() {
        BindKind::Null => query.bind(Option::<UntypedText>::None),
        BindKind::Boolean => query.bind(value.as_bool()),
        BindKind::Integer => query.bind(value.as_i64()),
        BindKind::Text => query.bind(value.as_str().map(|s| UntypedText(s.to_string()))),
        BindKind::Unspecified => match value {
            Value::Float(f) => query.bind(*f),
            Value::Decimal(d) => query.bind(*d),
            Value::Bytes(b) => query.bind(b.clone()),
            Value::Json(j) => query.bind(sqlx::types::Json(j.clone())),
            Value::Uuid(u) => query.bind(*u),
            Value::Timestamp(t) => query.bind(*t),
            Value::Date(d) => query.bind(*d),
            Value::Time(t) => query.bind(*t),
            other => query.bind(UntypedText(other.to_string())),
        },
    }
}

fn decode_error(column: &str, err: sqlx::Error) -> OrmError {
    OrmError::hydration(format!("column '{}': {}", column, err))
}

fn decode_row(row: &PgRow) -> OrmResult<Row> {
    let mut decoded = Row::new();
    for column in row.columns() {
        decoded.push(column.name(), decode_value(row, column.ordinal())?);
    }
    Ok(decoded)
}

fn decode_value(row: &PgRow, index: usize) -> OrmResult<Value> {
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

    let value = match column.type_info().name() {
        "BOOL" => Value::Bool(get!(bool)),
        "INT2" => Value::Int(i64::from(get!(i16))),
        "INT4" => Value::Int(i64::from(get!(i32))),
        "INT8" => Value::Int(get!(i64)),
        "FLOAT4" => Value::Float(f64::from(get!(f32))),
        "FLOAT8" => Value::Float(get!(f64)),
        "NUMERIC" => Value::Decimal(get!(Decimal)),
        "TIMESTAMP" => Value::Timestamp(get!(chrono::NaiveDateTime)),
        "TIMESTAMPTZ" => Value::Timestamp(get!(chrono::DateTime<chrono::Utc>).naive_utc()),
        "DATE" => Value::Date(get!(chrono::NaiveDate)),
        "TIME" => Value::Time(get!(chrono::NaiveTime)),
        "UUID" => Value::Uuid(get!(uuid::Uuid)),
        "JSON" | "JSONB" => Value::Json(get!(serde_json::Value)),
        "BYTEA" => Value::Bytes(get!(Vec<u8>)),
        // unresolved declarations report "?" and have no kind
        type_name if type_name != "?" && is_textual(type_name, column.type_info().kind()) => Value::Text(
            row.try_get_unchecked::<String, _>(index)
                .map_err(|e| decode_error(name, e))?,
        ),
        other => {
            return Err(OrmError::hydration(format!(
                "column '{}': type {} has no value mapping, select it as {}::text",
                name, other, name
            )))
        }
    };
    Ok(value)
}

/// Types whose binary wire form is their UTF-8 text
fn is_textual(type_name: &str, kind: &PgTypeKind) -> bool {
    matches!(type_name, "TEXT" | "VARCHAR" | "CHAR" | "NAME" | "UNKNOWN" | "CITEXT" | "citext")
        || matches!(kind, PgTypeKind::Enum(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untyped_text_leaves_inference_to_the_server() {
        assert_eq!(UntypedText::type_info().oid(), Some(Oid(0)));
        assert_eq!(<Option<UntypedText> as Type<Postgres>>::type_info().oid(), Some(Oid(0)));
    }

    #[test]
    fn test_textual_types() {
        let labels = vec!["draft".to_string(), "published".to_string()];

        assert!(is_textual("TEXT", &PgTypeKind::Simple));
        assert!(is_textual("VARCHAR", &PgTypeKind::Simple));
        assert!(is_textual("post_status", &PgTypeKind::Enum(labels.into())));
        assert!(!is_textual("INTERVAL", &PgTypeKind::Simple));
        assert!(!is_textual("INET", &PgTypeKind::Simple));
    }
}

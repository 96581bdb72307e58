//! Query Builder execution
//!
//! Terminal calls consume the builder. Each one validates, renders for the
//! dialect of the connection it runs on, checks bind parity and only then
//! talks to the driver. Configuration problems go through the provider's
//! `ErrorPolicy`; when it only logs them the call degrades to an empty
//! result (`None`, an empty collection, zero).

use super::builder::QueryBuilder;
use super::types::AggregateFunction;
use crate::backends::{ExecOutcome, Statement};
use crate::collection::Collection;
use crate::database::{Database, SharedConnection};
use crate::error::{OrmError, OrmResult};
use crate::model::Model;
use crate::row::Row;
use crate::value::Value;

/// Hand a configuration error to the policy; `Ok(None)` means "degrade"
fn degrade<T>(db: &Database, err: OrmError) -> OrmResult<Option<T>> {
    db.policy().raise_or_log(err)?;
    Ok(None)
}

fn driver_failure(statement: &Statement) -> impl FnOnce(OrmError) -> OrmError + '_ {
    move |err| {
        tracing::error!(sql = %statement.sql, error = %err, "statement failed");
        err
    }
}

impl<M> QueryBuilder<M> {
    /// Validate, resolve the connection and render
    ///
    /// `Ok(None)` when a configuration error was logged instead of raised.
    pub(crate) async fn prepare(&self, db: &Database) -> OrmResult<Option<(Statement, SharedConnection)>> {
        if let Err(err) = self.validate() {
            return degrade(db, err);
        }
        let prefix = match db.prefix(&self.target) {
            Ok(prefix) => prefix,
            Err(err) => return degrade(db, err),
        };
        let connection = match db.connection(&self.target).await {
            Ok(connection) => connection,
            Err(err) => return degrade(db, err),
        };

        let dialect = connection.lock().await.dialect();
        let statement = self.to_statement(dialect, &prefix);
        statement.verify(dialect)?;

        tracing::debug!(
            sql = %statement.sql,
            binds = statement.binds.len(),
            target = %self.target,
            "executing query"
        );
        Ok(Some((statement, connection)))
    }

    /// Run the query and return every raw row
    pub async fn fetch_all(self, db: &Database) -> OrmResult<Vec<Row>> {
        let Some((statement, connection)) = self.prepare(db).await? else {
            return Ok(Vec::new());
        };
        let mut connection = connection.lock().await;
        connection
            .fetch_all(&statement)
            .await
            .map_err(driver_failure(&statement))
    }

    /// Run the query with LIMIT 1 and return the raw row, if any
    pub async fn fetch_one(self, db: &Database) -> OrmResult<Option<Row>> {
        Ok(self.limit(1).fetch_all(db).await?.into_iter().next())
    }

    /// Run a statement that returns no rows
    ///
    /// `Ok(None)` when the statement was never sent because a configuration
    /// error was logged.
    pub async fn execute(self, db: &Database) -> OrmResult<Option<ExecOutcome>> {
        let Some((statement, connection)) = self.prepare(db).await? else {
            return Ok(None);
        };
        let mut connection = connection.lock().await;
        let outcome = connection
            .execute(&statement)
            .await
            .map_err(driver_failure(&statement))?;
        tracing::debug!(rows_affected = outcome.rows_affected, "statement executed");
        Ok(Some(outcome))
    }

    /// INSERT `data`; returns the generated id when the driver reports one
    pub async fn create<I, K, V>(self, db: &Database, data: I) -> OrmResult<Option<i64>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let outcome = self.set_values(data).as_insert().execute(db).await?;
        Ok(outcome.and_then(|outcome| outcome.last_insert_id))
    }

    /// UPDATE the matching rows with `data`; returns the affected-row count
    pub async fn update<I, K, V>(self, db: &Database, data: I) -> OrmResult<Option<u64>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let outcome = self.set_values(data).as_update().execute(db).await?;
        Ok(outcome.map(|outcome| outcome.rows_affected))
    }

    /// DELETE the matching rows; returns the affected-row count
    pub async fn delete(self, db: &Database) -> OrmResult<Option<u64>> {
        let outcome = self.as_delete().execute(db).await?;
        Ok(outcome.map(|outcome| outcome.rows_affected))
    }

    async fn aggregate(self, db: &Database, function: AggregateFunction, column: &str) -> OrmResult<Value> {
        let row = self
            .as_aggregate(function, column)
            .fetch_all(db)
            .await?
            .into_iter()
            .next();
        Ok(row
            .and_then(|row| row.get("aggregate").or_else(|| row.first_value()).cloned())
            .unwrap_or(Value::Null))
    }

    /// COUNT(column); `*` counts rows
    pub async fn count(self, db: &Database, column: &str) -> OrmResult<i64> {
        let value = self.aggregate(db, AggregateFunction::Count, column).await?;
        if value.is_null() {
            return Ok(0);
        }
        value
            .as_i64()
            .ok_or_else(|| non_numeric(AggregateFunction::Count, &value))
    }

    pub async fn sum(self, db: &Database, column: &str) -> OrmResult<f64> {
        let value = self.aggregate(db, AggregateFunction::Sum, column).await?;
        numeric(AggregateFunction::Sum, value)
    }

    pub async fn max(self, db: &Database, column: &str) -> OrmResult<f64> {
        let value = self.aggregate(db, AggregateFunction::Max, column).await?;
        numeric(AggregateFunction::Max, value)
    }

    pub async fn min(self, db: &Database, column: &str) -> OrmResult<f64> {
        let value = self.aggregate(db, AggregateFunction::Min, column).await?;
        numeric(AggregateFunction::Min, value)
    }

    pub async fn avg(self, db: &Database, column: &str) -> OrmResult<f64> {
        let value = self.aggregate(db, AggregateFunction::Avg, column).await?;
        numeric(AggregateFunction::Avg, value)
    }

    /// Whether at least one row matches
    pub async fn exists(self, db: &Database) -> OrmResult<bool> {
        Ok(self.count(db, "*").await? > 0)
    }
}

/// Aggregates over no rows come back as NULL, which reads as zero
fn numeric(function: AggregateFunction, value: Value) -> OrmResult<f64> {
    if value.is_null() {
        return Ok(0.0);
    }
    value.as_f64().ok_or_else(|| non_numeric(function, &value))
}

fn non_numeric(function: AggregateFunction, value: &Value) -> OrmError {
    OrmError::hydration(format!(
        "{} returned a non-numeric {} value '{}'",
        function,
        value.type_name(),
        value
    ))
}

impl<M: Model> QueryBuilder<M> {
    /// Zero or one hydrated record
    ///
    /// The record remembers that it was fetched, so `save` updates it.
    pub async fn find(self, db: &Database) -> OrmResult<Option<M>> {
        match self.fetch_one(db).await? {
            Some(row) => {
                let mut record = M::hydrate(&row)?;
                record.record_mut().mark_loaded();
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Like `find`, but a missing row is a `NotFound` error
    pub async fn find_or_fail(self, db: &Database) -> OrmResult<M> {
        let table = self.table.clone();
        let key = self.key_hint();
        match self.find(db).await? {
            Some(record) => Ok(record),
            None => Err(db.policy().raise_or_not_found(&table, key)),
        }
    }

    /// Alias of `find`
    pub async fn first(self, db: &Database) -> OrmResult<Option<M>> {
        self.find(db).await
    }

    /// Every matching row, hydrated
    pub async fn find_all(self, db: &Database) -> OrmResult<Collection<M>> {
        let rows = self.fetch_all(db).await?;
        Collection::from_rows(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::SqlDialect;
    use crate::testing::RecordingConnection;
    use tessera_core::{AppConfig, ConnectorConfig, DatabaseConfig, DriverKind};

    fn database(connection: &RecordingConnection, production: bool) -> Database {
        let connector = ConnectorConfig::new(DriverKind::MySql, "localhost", "shop");
        let database = DatabaseConfig::single("main", connector);
        let config = if production {
            AppConfig::production(database)
        } else {
            AppConfig::development(database)
        };
        Database::with_connection(config, Box::new(connection.clone()))
    }

    #[tokio::test]
    async fn test_fetch_all_records_statement() {
        let connection = RecordingConnection::mysql();
        connection.push_rows(vec![Row::new().with("id", 1), Row::new().with("id", 2)]);
        let db = database(&connection, false);

        let rows = QueryBuilder::table("users").where_eq("active", true).fetch_all(&db).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(connection.sql_log(), vec!["SELECT * FROM users WHERE active = ?"]);
    }

    #[tokio::test]
    async fn test_configuration_error_raised_in_development() {
        let connection = RecordingConnection::mysql();
        let db = database(&connection, false);

        let result = QueryBuilder::table("users").where_in("id", Vec::<i64>::new()).fetch_all(&db).await;

        assert!(matches!(result, Err(OrmError::Configuration(_))));
        assert!(connection.statements().is_empty());
    }

    #[tokio::test]
    async fn test_configuration_error_degrades_in_production() {
        let connection = RecordingConnection::mysql();
        let db = database(&connection, true);

        let rows = QueryBuilder::table("users").where_in("id", Vec::<i64>::new()).fetch_all(&db).await.unwrap();
        let deleted = QueryBuilder::table("users").where_op("id", "===", 1).delete(&db).await.unwrap();

        assert!(rows.is_empty());
        assert_eq!(deleted, None);
        assert!(connection.statements().is_empty());
    }

    #[tokio::test]
    async fn test_driver_errors_propagate_in_every_environment() {
        let connection = RecordingConnection::mysql();
        connection.push_failure(OrmError::Database("deadlock".into()));
        let db = database(&connection, true);

        let result = QueryBuilder::table("users").set("name", "x").as_update().execute(&db).await;

        assert_eq!(result, Err(OrmError::Database("deadlock".into())));
    }

    #[tokio::test]
    async fn test_aggregates_are_numeric() {
        let connection = RecordingConnection::mysql();
        connection
            .push_rows(vec![Row::new().with("aggregate", "42")])
            .push_rows(vec![Row::new().with("aggregate", "12.50")])
            .push_rows(vec![Row::new().with("aggregate", Value::Null)])
            .push_rows(vec![Row::new().with("aggregate", "n/a")]);
        let db = database(&connection, false);

        assert_eq!(QueryBuilder::table("orders").count(&db, "*").await.unwrap(), 42);
        assert_eq!(QueryBuilder::table("orders").sum(&db, "total").await.unwrap(), 12.5);
        assert_eq!(QueryBuilder::table("orders").max(&db, "total").await.unwrap(), 0.0);
        assert!(matches!(
            QueryBuilder::table("orders").avg(&db, "total").await,
            Err(OrmError::Hydration(_))
        ));
        assert_eq!(
            connection.sql_log()[1],
            "SELECT SUM(total) AS aggregate FROM orders"
        );
    }

    #[tokio::test]
    async fn test_decimal_aggregates() {
        let connection = RecordingConnection::new(SqlDialect::PostgreSql);
        let total: sqlx::types::Decimal = "1049.75".parse().unwrap();
        connection
            .push_rows(vec![Row::new().with("aggregate", total)])
            .push_rows(vec![Row::new().with("aggregate", sqlx::types::Decimal::from(7))]);
        let db = database(&connection, false);

        assert_eq!(QueryBuilder::table("orders").sum(&db, "total").await.unwrap(), 1049.75);
        assert_eq!(QueryBuilder::table("orders").count(&db, "id").await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_unknown_connector_target() {
        let connection = RecordingConnection::mysql();
        let db = database(&connection, false);

        let result = QueryBuilder::table("users")
            .on(crate::database::Target::connector("archive"))
            .fetch_all(&db)
            .await;

        assert!(matches!(result, Err(OrmError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_postgres_create_returns_generated_id() {
        let connection = RecordingConnection::new(SqlDialect::PostgreSql);
        connection.set_next_insert_id(31);
        let db = database(&connection, false);

        let id = QueryBuilder::table("users")
            .returning("id")
            .create(&db, [("email", "a@b.c")])
            .await
            .unwrap();

        assert_eq!(id, Some(31));
        let statement = connection.last_statement().unwrap();
        assert_eq!(statement.sql, "INSERT INTO users (email) VALUES ($1) RETURNING id");
        assert_eq!(statement.returning.as_deref(), Some("id"));
    }
}

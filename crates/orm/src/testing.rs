//! In-memory connection for tests
//!
//! `RecordingConnection` never talks to a server. It records every statement
//! it receives and answers from scripted row sets and execution outcomes,
//! so query rendering and model behaviour can be tested without a database.
//! Clones share the same recording. `RecordingFactory` hands a new one out
//! for every connection a provider opens.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use tessera_core::ConnectorConfig;

use crate::backends::{Connection, ConnectionFactory, ExecOutcome, SqlDialect, Statement};
use crate::error::{OrmError, OrmResult};
use crate::policy::ErrorPolicy;
use crate::row::Row;

#[derive(Debug, Default)]
struct Recording {
    statements: Vec<Statement>,
    rows: VecDeque<Vec<Row>>,
    outcomes: VecDeque<OrmResult<ExecOutcome>>,
    transaction_log: Vec<&'static str>,
    next_insert_id: i64,
}

/// Scripted connection that records what it is asked to run
#[derive(Debug, Clone)]
pub struct RecordingConnection {
    dialect: SqlDialect,
    recording: Arc<Mutex<Recording>>,
}

impl RecordingConnection {
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            recording: Arc::new(Mutex::new(Recording {
                next_insert_id: 1,
                ..Recording::default()
            })),
        }
    }

    pub fn mysql() -> Self {
        Self::new(SqlDialect::MySql)
    }

    pub fn postgres() -> Self {
        Self::new(SqlDialect::PostgreSql)
    }

    fn recording(&self) -> MutexGuard<'_, Recording> {
        self.recording.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue the rows returned by the next fetch
    pub fn push_rows(&self, rows: Vec<Row>) -> &Self {
        self.recording().rows.push_back(rows);
        self
    }

    /// Queue the outcome of the next execute
    pub fn push_outcome(&self, outcome: ExecOutcome) -> &Self {
        self.recording().outcomes.push_back(Ok(outcome));
        self
    }

    /// Make the next execute fail
    pub fn push_failure(&self, error: OrmError) -> &Self {
        self.recording().outcomes.push_back(Err(error));
        self
    }

    /// Set the id reported by the next INSERT without a scripted outcome
    pub fn set_next_insert_id(&self, id: i64) -> &Self {
        self.recording().next_insert_id = id;
        self
    }

    /// Every statement received, in order
    pub fn statements(&self) -> Vec<Statement> {
        self.recording().statements.clone()
    }

    /// SQL text of every statement received
    pub fn sql_log(&self) -> Vec<String> {
        self.recording().statements.iter().map(|s| s.sql.clone()).collect()
    }

    pub fn last_statement(&self) -> Option<Statement> {
        self.recording().statements.last().cloned()
    }

    /// BEGIN / COMMIT / ROLLBACK calls, in order
    pub fn transaction_log(&self) -> Vec<&'static str> {
        self.recording().transaction_log.clone()
    }

    pub fn clear(&self) {
        self.recording().statements.clear();
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    async fn fetch_all(&mut self, statement: &Statement) -> OrmResult<Vec<Row>> {
        let mut recording = self.recording();
        recording.statements.push(statement.clone());
        Ok(recording.rows.pop_front().unwrap_or_default())
    }

    async fn execute(&mut self, statement: &Statement) -> OrmResult<ExecOutcome> {
        let mut recording = self.recording();
        recording.statements.push(statement.clone());
        if let Some(outcome) = recording.outcomes.pop_front() {
            return outcome;
        }

        if statement.sql.starts_with("INSERT") {
            let id = recording.next_insert_id;
            recording.next_insert_id += 1;
            return Ok(ExecOutcome {
                rows_affected: 1,
                last_insert_id: Some(id),
            });
        }
        Ok(ExecOutcome {
            rows_affected: 1,
            last_insert_id: None,
        })
    }

    async fn begin(&mut self) -> OrmResult<()> {
        self.recording().transaction_log.push("BEGIN");
        Ok(())
    }

    async fn commit(&mut self) -> OrmResult<()> {
        self.recording().transaction_log.push("COMMIT");
        Ok(())
    }

    async fn rollback(&mut self) -> OrmResult<()> {
        self.recording().transaction_log.push("ROLLBACK");
        Ok(())
    }
}

/// Factory that opens a fresh `RecordingConnection` per request
///
/// The connection's dialect follows the connector's driver. Clones share
/// the list of opened connections.
#[derive(Debug, Clone, Default)]
pub struct RecordingFactory {
    opened: Arc<Mutex<Vec<(String, RecordingConnection)>>>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn opened_list(&self) -> MutexGuard<'_, Vec<(String, RecordingConnection)>> {
        self.opened.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Connector names, one per opened connection, in order
    pub fn opened(&self) -> Vec<String> {
        self.opened_list().iter().map(|(name, _)| name.clone()).collect()
    }

    /// The `index`-th connection opened
    pub fn connection(&self, index: usize) -> Option<RecordingConnection> {
        self.opened_list().get(index).map(|(_, connection)| connection.clone())
    }
}

#[async_trait]
impl ConnectionFactory for RecordingFactory {
    async fn open(&self, name: &str, config: ConnectorConfig, _policy: &ErrorPolicy) -> OrmResult<Box<dyn Connection>> {
        let connection = RecordingConnection::new(SqlDialect::from(config.driver));
        self.opened_list().push((name.to_string(), connection.clone()));
        Ok(Box::new(connection))
    }
}

//! Core connection abstractions
//!
//! A `Connection` runs fully rendered `Statement`s and hands back name-keyed
//! rows. `SqlDialect` carries every syntax difference the renderer has to
//! know about.

use async_trait::async_trait;

use tessera_core::DriverKind;

use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;

/// SQL dialect enumeration for generating database-specific SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    MySql,
    PostgreSql,
}

impl SqlDialect {
    /// Placeholder for the parameter at zero-based `index`
    pub fn parameter_placeholder(&self, index: usize) -> String {
        match self {
            SqlDialect::PostgreSql => format!("${}", index + 1),
            SqlDialect::MySql => "?".to_string(),
        }
    }

    /// Whether UPDATE and DELETE accept a LIMIT clause
    pub fn limit_on_mutation(&self) -> bool {
        matches!(self, SqlDialect::MySql)
    }

    /// Whether UPDATE and DELETE accept an OFFSET clause
    pub fn offset_on_mutation(&self) -> bool {
        false
    }

    /// Whether UPDATE and DELETE accept ORDER BY
    pub fn order_on_mutation(&self) -> bool {
        matches!(self, SqlDialect::MySql)
    }

    /// Whether INSERT can return the generated key
    pub fn supports_returning(&self) -> bool {
        matches!(self, SqlDialect::PostgreSql)
    }

    /// Count the placeholders of this dialect in rendered SQL
    pub fn count_placeholders(&self, sql: &str) -> usize {
        match self {
            SqlDialect::MySql => count_question_marks(sql),
            SqlDialect::PostgreSql => max_numbered_placeholder(sql),
        }
    }
}

impl From<DriverKind> for SqlDialect {
    fn from(driver: DriverKind) -> Self {
        match driver {
            DriverKind::MySql => SqlDialect::MySql,
            DriverKind::Postgres => SqlDialect::PostgreSql,
        }
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlDialect::MySql => write!(f, "mysql"),
            SqlDialect::PostgreSql => write!(f, "pgsql"),
        }
    }
}

// Quoted literals never contain placeholders the driver would bind.
fn unquoted_chars(sql: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    let mut quote: Option<char> = None;
    sql.char_indices().filter(move |(_, c)| match quote {
        Some(q) if *c == q => {
            quote = None;
            false
        }
        Some(_) => false,
        None if *c == '\'' || *c == '"' || *c == '`' => {
            quote = Some(*c);
            false
        }
        None => true,
    })
}

/// True when `sql` holds a `;` other than a trailing one
pub(crate) fn has_statement_separator(sql: &str) -> bool {
    let trimmed = sql.trim_end().trim_end_matches(';');
    unquoted_chars(trimmed).any(|(_, c)| c == ';')
}

fn count_question_marks(sql: &str) -> usize {
    unquoted_chars(sql).filter(|(_, c)| *c == '?').count()
}

fn max_numbered_placeholder(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    unquoted_chars(sql)
        .filter(|(_, c)| *c == '$')
        .filter_map(|(i, _)| {
            let digits: String = bytes[i + 1..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .map(|b| *b as char)
                .collect();
            digits.parse::<usize>().ok()
        })
        .max()
        .unwrap_or(0)
}

/// Rendered SQL plus its bind list in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<Value>,
    /// Column whose generated value an INSERT returns
    pub returning: Option<String>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, binds: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            binds,
            returning: None,
        }
    }

    /// Fail unless the bind list covers every placeholder exactly
    pub fn verify(&self, dialect: SqlDialect) -> OrmResult<()> {
        let placeholders = dialect.count_placeholders(&self.sql);
        if placeholders != self.binds.len() {
            tracing::error!(
                sql = %self.sql,
                placeholders,
                binds = self.binds.len(),
                "refusing to execute statement with mismatched binds"
            );
            return Err(OrmError::BindMismatch {
                placeholders,
                binds: self.binds.len(),
            });
        }
        Ok(())
    }
}

/// Result of a statement that returns no rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

/// An open driver connection
#[async_trait]
pub trait Connection: Send {
    /// Dialect spoken by this connection
    fn dialect(&self) -> SqlDialect;

    /// Run a statement and return every row
    async fn fetch_all(&mut self, statement: &Statement) -> OrmResult<Vec<Row>>;

    /// Run a statement that returns no rows
    async fn execute(&mut self, statement: &Statement) -> OrmResult<ExecOutcome>;

    async fn begin(&mut self) -> OrmResult<()>;

    async fn commit(&mut self) -> OrmResult<()>;

    async fn rollback(&mut self) -> OrmResult<()>;
}

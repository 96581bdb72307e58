//! Junction-table writes: attach, detach and sync
//!
//! `sync` works out the full difference between what the junction holds
//! and what it should hold before writing anything: one DELETE for the
//! links to drop, then one INSERT per link to add. Links present on both
//! sides are left alone.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::database::Database;
use crate::error::{OrmError, OrmResult};
use crate::model::Model;
use crate::query::QueryBuilder;
use crate::value::Value;

/// Comparable form of a junction column value
///
/// Text is compared verbatim, so `"007"` and `"7"` are different links.
/// UUIDs compare by their hyphenated text and so match UUIDs stored as
/// CHAR(36).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LinkKey {
    Int(i64),
    Text(String),
}

impl TryFrom<&Value> for LinkKey {
    type Error = String;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Int(i) => Ok(LinkKey::Int(*i)),
            Value::Text(text) => Ok(LinkKey::Text(text.clone())),
            Value::Uuid(uuid) => Ok(LinkKey::Text(uuid.hyphenated().to_string())),
            other => Err(format!("{} value '{}' cannot be used as a link key", other.type_name(), other)),
        }
    }
}

impl TryFrom<Value> for LinkKey {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        LinkKey::try_from(&value)
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKey::Int(i) => write!(f, "{}", i),
            LinkKey::Text(text) => write!(f, "{}", text),
        }
    }
}

/// Link values keyed by their comparable form; the first value seen wins
type LinkValues = BTreeMap<LinkKey, Value>;

fn link_values<I: IntoIterator<Item = Value>>(values: I) -> Result<LinkValues, String> {
    let mut links = LinkValues::new();
    for value in values {
        let key = LinkKey::try_from(&value)?;
        links.entry(key).or_insert(value);
    }
    Ok(links)
}

fn bound<'a>(links: &'a LinkValues, keys: &'a [LinkKey]) -> impl Iterator<Item = Value> + 'a {
    keys.iter().filter_map(|key| links.get(key).cloned())
}

/// Writes needed to bring a junction in line with a desired set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub detach: Vec<LinkKey>,
    pub attach: Vec<LinkKey>,
}

impl SyncPlan {
    pub fn is_noop(&self) -> bool {
        self.detach.is_empty() && self.attach.is_empty()
    }
}

/// `existing - desired` to detach, `desired - existing` to attach
pub fn plan_sync(existing: &BTreeSet<LinkKey>, desired: &BTreeSet<LinkKey>) -> SyncPlan {
    SyncPlan {
        detach: existing.difference(desired).cloned().collect(),
        attach: desired.difference(existing).cloned().collect(),
    }
}

/// Junction rows owned by one parent record
#[derive(Debug, Clone)]
pub struct Related {
    junction: String,
    first_key: String,
    second_key: String,
    parent: Value,
    issue: Option<String>,
}

impl Related {
    /// `first_key` holds the parent's primary key, `second_key` the linked id
    pub fn new<P: Model>(parent: &P, junction: &str, first_key: &str, second_key: &str) -> Self {
        let (parent_key, issue) = match parent.primary_key() {
            Some(value) => (value, None),
            None => (
                Value::Null,
                Some(format!(
                    "{} has no '{}' value to link from",
                    P::NAME,
                    P::primary_key_name()
                )),
            ),
        };
        Self {
            junction: junction.to_string(),
            first_key: first_key.to_string(),
            second_key: second_key.to_string(),
            parent: parent_key,
            issue,
        }
    }

    /// Junction query scoped to this parent
    fn scoped(&self) -> QueryBuilder {
        let query = QueryBuilder::table(&self.junction);
        match &self.issue {
            Some(issue) => query.issue(issue.clone()),
            None => query.where_eq(&self.first_key, self.parent.clone()),
        }
    }

    /// Insert one link per id, reusing a single INSERT statement
    pub async fn attach<I, T>(&self, db: &Database, ids: I) -> OrmResult<u64>
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let ids: Vec<Value> = ids.into_iter().map(Into::into).collect();
        self.attach_values(db, ids).await
    }

    async fn attach_values(&self, db: &Database, ids: Vec<Value>) -> OrmResult<u64> {
        if ids.is_empty() {
            tracing::debug!(junction = %self.junction, "attach skipped, no ids");
            return Ok(0);
        }

        let mut template = QueryBuilder::table(&self.junction)
            .set(&self.first_key, self.parent.clone())
            .set(&self.second_key, Value::Null)
            .as_insert();
        if let Some(issue) = &self.issue {
            template = template.issue(issue.clone());
        }
        let Some((statement, connection)) = template.prepare(db).await? else {
            return Ok(0);
        };

        let mut connection = connection.lock().await;
        let mut attached = 0;
        for id in ids {
            let mut statement = statement.clone();
            if let Some(slot) = statement.binds.last_mut() {
                *slot = id;
            }
            let outcome = connection.execute(&statement).await.map_err(|err| {
                tracing::error!(junction = %self.junction, error = %err, "attach failed");
                err
            })?;
            attached += outcome.rows_affected;
        }
        tracing::debug!(junction = %self.junction, attached, "links attached");
        Ok(attached)
    }

    /// Delete the links to `ids` with one statement
    pub async fn detach<I, T>(&self, db: &Database, ids: I) -> OrmResult<u64>
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let ids: Vec<Value> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Ok(0);
        }
        let affected = self.scoped().where_in(&self.second_key, ids).delete(db).await?;
        Ok(affected.unwrap_or(0))
    }

    /// Ids currently linked to the parent
    pub async fn existing(&self, db: &Database) -> OrmResult<BTreeSet<LinkKey>> {
        Ok(self.existing_values(db).await?.into_keys().collect())
    }

    async fn existing_values(&self, db: &Database) -> OrmResult<LinkValues> {
        let rows = self
            .scoped()
            .select(&[self.second_key.as_str()])
            .fetch_all(db)
            .await?;

        link_values(rows.iter().filter_map(|row| row.get(&self.second_key).cloned()))
            .map_err(OrmError::hydration)
    }

    /// Make the parent's links equal `ids` exactly
    ///
    /// Returns the plan that was applied. Detached links are bound with the
    /// values read from the junction, attached links with the values given.
    pub async fn sync<I, T>(&self, db: &Database, ids: I) -> OrmResult<SyncPlan>
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        if let Some(issue) = &self.issue {
            db.policy().raise_or_log(OrmError::configuration(issue.clone()))?;
            return Ok(SyncPlan::default());
        }
        let desired = match link_values(ids.into_iter().map(Into::into)) {
            Ok(desired) => desired,
            Err(message) => {
                db.policy().raise_or_log(OrmError::configuration(message))?;
                return Ok(SyncPlan::default());
            }
        };

        let existing = self.existing_values(db).await?;
        let plan = plan_sync(
            &existing.keys().cloned().collect(),
            &desired.keys().cloned().collect(),
        );
        if plan.is_noop() {
            tracing::debug!(junction = %self.junction, "sync found nothing to change");
            return Ok(plan);
        }

        self.detach(db, bound(&existing, &plan.detach)).await?;
        self.attach_values(db, bound(&desired, &plan.attach).collect())
            .await?;
        tracing::info!(
            junction = %self.junction,
            detached = plan.detach.len(),
            attached = plan.attach.len(),
            "junction synced"
        );
        Ok(plan)
    }
}

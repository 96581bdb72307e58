//! Query Builder SQL generation
//!
//! One renderer walks the clause nodes in fixed order (start, join, where,
//! order, limit, offset) and asks the `Binder` for a placeholder every time
//! it emits a value, so placeholders and binds cannot drift apart. Dialect
//! differences are decided here and nowhere else.

use super::builder::QueryBuilder;
use super::types::*;
use crate::backends::{SqlDialect, Statement};
use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// MySQL needs a LIMIT before OFFSET; this is its documented "no limit"
const MYSQL_NO_LIMIT: &str = "18446744073709551615";

/// Positional marker counter paired with the values it hands out
#[derive(Debug)]
pub(crate) struct Binder {
    dialect: SqlDialect,
    binds: Vec<Value>,
}

impl Binder {
    pub(crate) fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            binds: Vec::new(),
        }
    }

    /// Keep `value` and return the placeholder that refers to it
    pub(crate) fn bind(&mut self, value: Value) -> String {
        let placeholder = self.dialect.parameter_placeholder(self.binds.len());
        self.binds.push(value);
        placeholder
    }

    fn bind_count(&mut self, count: u64) -> String {
        self.bind(Value::Int(i64::try_from(count).unwrap_or(i64::MAX)))
    }
}

impl<M> QueryBuilder<M> {
    /// Check everything that does not depend on the dialect
    pub fn validate(&self) -> OrmResult<()> {
        if !self.issues.is_empty() {
            return Err(OrmError::Configuration(self.issues.join("; ")));
        }
        if self.table.is_empty() {
            return Err(OrmError::configuration("query has no table"));
        }
        match self.query_type {
            QueryType::Insert | QueryType::Update if self.set_clauses.is_empty() => {
                return Err(OrmError::configuration(format!(
                    "nothing to write into '{}'",
                    self.table
                )));
            }
            _ => {}
        }
        if self.query_type.is_mutation() && !self.joins.is_empty() {
            return Err(OrmError::configuration(
                "joins are only supported on SELECT and aggregate queries",
            ));
        }
        Ok(())
    }

    /// Render for a dialect; `prefix` is prepended to the base table
    pub fn to_statement(&self, dialect: SqlDialect, prefix: &str) -> Statement {
        let mut binder = Binder::new(dialect);
        let sql = self.render(&mut binder, prefix);
        let returning = match self.query_type {
            QueryType::Insert if dialect.supports_returning() => self.returning.clone(),
            _ => None,
        };
        Statement {
            sql,
            binds: binder.binds,
            returning,
        }
    }

    /// Render without a table prefix
    pub fn to_sql(&self, dialect: SqlDialect) -> String {
        self.to_statement(dialect, "").sql
    }

    fn render(&self, binder: &mut Binder, prefix: &str) -> String {
        let table = format!("{}{}", prefix, self.table);

        match &self.query_type {
            QueryType::Select => {
                let columns = if self.select_fields.is_empty() {
                    "*".to_string()
                } else {
                    self.select_fields.join(", ")
                };
                let mut sql = format!("SELECT {} FROM {}", columns, table);
                self.render_joins(&mut sql);
                self.render_where(&mut sql, binder, prefix);
                self.render_order(&mut sql);
                self.render_limit_offset(&mut sql, binder);
                sql
            }
            QueryType::Aggregate { function, column } => {
                let mut sql = format!("SELECT {}({}) AS aggregate FROM {}", function, column, table);
                self.render_joins(&mut sql);
                self.render_where(&mut sql, binder, prefix);
                sql
            }
            QueryType::Insert => {
                let columns: Vec<&str> = self.set_clauses.iter().map(|c| c.column.as_str()).collect();
                let placeholders: Vec<String> = self
                    .set_clauses
                    .iter()
                    .map(|c| binder.bind(c.value.clone()))
                    .collect();
                let mut sql = format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    table,
                    columns.join(", "),
                    placeholders.join(", ")
                );
                if let Some(column) = &self.returning {
                    if binder.dialect.supports_returning() {
                        sql.push_str(" RETURNING ");
                        sql.push_str(column);
                    }
                }
                sql
            }
            QueryType::Update => {
                let assignments: Vec<String> = self
                    .set_clauses
                    .iter()
                    .map(|c| format!("{} = {}", c.column, binder.bind(c.value.clone())))
                    .collect();
                let mut sql = format!("UPDATE {} SET {}", table, assignments.join(", "));
                self.render_where(&mut sql, binder, prefix);
                self.render_mutation_tail(&mut sql, binder);
                sql
            }
            QueryType::Delete => {
                let mut sql = format!("DELETE FROM {}", table);
                self.render_where(&mut sql, binder, prefix);
                self.render_mutation_tail(&mut sql, binder);
                sql
            }
        }
    }

    fn render_joins(&self, sql: &mut String) {
        for join in &self.joins {
            sql.push_str(&format!(
                " {} {} ON {} {} {}",
                join.join_type, join.table, join.left, join.operator, join.right
            ));
        }
    }

    fn render_where(&self, sql: &mut String, binder: &mut Binder, prefix: &str) {
        for (index, condition) in self.where_conditions.iter().enumerate() {
            let connector = match (index, condition.connector()) {
                (0, _) => LogicalOperator::Where,
                (_, LogicalOperator::Where) => LogicalOperator::And,
                (_, connector) => connector,
            };
            sql.push_str(&format!(" {} ", connector));

            match condition {
                WhereCondition::Compare {
                    column,
                    operator,
                    value,
                    ..
                } => {
                    let placeholder = binder.bind(value.clone());
                    sql.push_str(&format!("{} {} {}", column, operator, placeholder));
                }
                WhereCondition::In {
                    column,
                    negated,
                    values,
                    ..
                } => {
                    let placeholders: Vec<String> = values.iter().map(|v| binder.bind(v.clone())).collect();
                    let operator = if *negated { QueryOperator::NotIn } else { QueryOperator::In };
                    sql.push_str(&format!("{} {} ({})", column, operator, placeholders.join(", ")));
                }
                WhereCondition::Between {
                    column, low, high, ..
                } => {
                    let low = binder.bind(low.clone());
                    let high = binder.bind(high.clone());
                    sql.push_str(&format!("{} BETWEEN {} AND {}", column, low, high));
                }
                WhereCondition::Null { column, negated, .. } => {
                    let operator = if *negated {
                        QueryOperator::IsNotNull
                    } else {
                        QueryOperator::IsNull
                    };
                    sql.push_str(&format!("{} {}", column, operator));
                }
                WhereCondition::Exists {
                    negated, subquery, ..
                } => {
                    let inner = subquery.render(binder, prefix);
                    let keyword = if *negated { "NOT EXISTS" } else { "EXISTS" };
                    sql.push_str(&format!("{} ({})", keyword, inner));
                }
            }
        }
    }

    fn render_order(&self, sql: &mut String) {
        if self.order_by.is_empty() {
            return;
        }
        let clauses: Vec<String> = self
            .order_by
            .iter()
            .map(|o| format!("{} {}", o.column, o.direction))
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&clauses.join(", "));
    }

    fn render_limit_offset(&self, sql: &mut String, binder: &mut Binder) {
        match self.limit_count {
            Some(limit) => {
                sql.push_str(" LIMIT ");
                sql.push_str(&binder.bind_count(limit));
            }
            None if self.offset_value.is_some() && binder.dialect == SqlDialect::MySql => {
                sql.push_str(" LIMIT ");
                sql.push_str(MYSQL_NO_LIMIT);
            }
            None => {}
        }
        if let Some(offset) = self.offset_value {
            sql.push_str(" OFFSET ");
            sql.push_str(&binder.bind_count(offset));
        }
    }

    /// ORDER / LIMIT / OFFSET on UPDATE and DELETE, as far as the dialect allows
    fn render_mutation_tail(&self, sql: &mut String, binder: &mut Binder) {
        let dialect = binder.dialect;

        if !self.order_by.is_empty() {
            if dialect.order_on_mutation() {
                self.render_order(sql);
            } else {
                tracing::warn!(%dialect, table = %self.table, "ORDER BY dropped from UPDATE/DELETE");
            }
        }
        if let Some(limit) = self.limit_count {
            if dialect.limit_on_mutation() {
                sql.push_str(" LIMIT ");
                sql.push_str(&binder.bind_count(limit));
            } else {
                tracing::warn!(%dialect, table = %self.table, "LIMIT dropped from UPDATE/DELETE");
            }
        }
        if self.offset_value.is_some() && !dialect.offset_on_mutation() {
            tracing::warn!(%dialect, table = %self.table, "OFFSET dropped from UPDATE/DELETE");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> QueryBuilder {
        QueryBuilder::table("users")
    }

    #[test]
    fn test_select_fragments_in_order() {
        let statement = users()
            .select(&["users.id", "users.email", "roles.name AS role"])
            .left_join("roles", &["roles.id", "=", "users.role_id"])
            .where_eq("users.active", true)
            .or_where_op("users.score", ">", 10)
            .order_by("users.email", OrderDirection::Asc)
            .order_by_desc("users.id")
            .limit(20)
            .offset(40)
            .to_statement(SqlDialect::MySql, "");

        assert_eq!(
            statement.sql,
            "SELECT users.id, users.email, roles.name AS role FROM users \
             LEFT JOIN roles ON roles.id = users.role_id \
             WHERE users.active = ? OR users.score > ? \
             ORDER BY users.email ASC, users.id DESC LIMIT ? OFFSET ?"
        );
        assert_eq!(
            statement.binds,
            vec![Value::Bool(true), Value::Int(10), Value::Int(20), Value::Int(40)]
        );
    }

    #[test]
    fn test_postgres_numbers_placeholders_across_clauses() {
        let statement = users()
            .where_in("id", [1, 2, 3])
            .where_between("age", 18, 65)
            .where_null("deleted_at")
            .limit(5)
            .to_statement(SqlDialect::PostgreSql, "app_");

        assert_eq!(
            statement.sql,
            "SELECT * FROM app_users WHERE id IN ($1, $2, $3) AND age BETWEEN $4 AND $5 \
             AND deleted_at IS NULL LIMIT $6"
        );
        assert_eq!(statement.binds.len(), 6);
        assert!(statement.verify(SqlDialect::PostgreSql).is_ok());
    }

    #[test]
    fn test_update_binds_set_values_before_where() {
        let statement = users()
            .set("email", "new@example.com")
            .set("active", false)
            .where_eq("id", 9)
            .as_update()
            .to_statement(SqlDialect::MySql, "");

        assert_eq!(statement.sql, "UPDATE users SET email = ?, active = ? WHERE id = ?");
        assert_eq!(
            statement.binds,
            vec![Value::from("new@example.com"), Value::Bool(false), Value::Int(9)]
        );
    }

    #[test]
    fn test_postgres_drops_limit_and_offset_on_mutations() {
        let select = users().where_eq("active", false).limit(10).offset(5);
        let update = select.clone().set("active", true).as_update();
        let delete = select.clone().as_delete();

        let select_sql = select.to_sql(SqlDialect::PostgreSql);
        assert!(select_sql.contains("LIMIT $2") && select_sql.contains("OFFSET $3"));

        for query in [update, delete] {
            let statement = query.to_statement(SqlDialect::PostgreSql, "");
            assert!(!statement.sql.contains("LIMIT"));
            assert!(!statement.sql.contains("OFFSET"));
            assert!(statement.verify(SqlDialect::PostgreSql).is_ok());
        }
    }

    #[test]
    fn test_mysql_keeps_limit_but_drops_offset_on_delete() {
        let statement = users()
            .where_eq("active", false)
            .order_by("id", OrderDirection::Asc)
            .limit(10)
            .offset(5)
            .as_delete()
            .to_statement(SqlDialect::MySql, "");

        assert_eq!(statement.sql, "DELETE FROM users WHERE active = ? ORDER BY id ASC LIMIT ?");
        assert_eq!(statement.binds, vec![Value::Bool(false), Value::Int(10)]);
    }

    #[test]
    fn test_mysql_offset_without_limit() {
        let sql = users().offset(30).to_sql(SqlDialect::MySql);
        assert_eq!(sql, "SELECT * FROM users LIMIT 18446744073709551615 OFFSET ?");
    }

    #[test]
    fn test_null_limit_suppresses_clause() {
        let sql = users().limit(10).limit(None).offset(None).to_sql(SqlDialect::MySql);
        assert_eq!(sql, "SELECT * FROM users");
    }

    #[test]
    fn test_insert_with_returning() {
        let query = users()
            .set_values([("email", "a@b.c"), ("name", "Ada")])
            .returning("id")
            .as_insert();

        let pg = query.to_statement(SqlDialect::PostgreSql, "");
        assert_eq!(pg.sql, "INSERT INTO users (email, name) VALUES ($1, $2) RETURNING id");
        assert_eq!(pg.returning.as_deref(), Some("id"));

        let mysql = query.to_statement(SqlDialect::MySql, "");
        assert_eq!(mysql.sql, "INSERT INTO users (email, name) VALUES (?, ?)");
        assert_eq!(mysql.returning, None);
    }

    #[test]
    fn test_aggregate_ignores_order_and_limit() {
        let sql = users()
            .where_eq("active", true)
            .order_by_desc("id")
            .limit(3)
            .as_aggregate(AggregateFunction::Sum, "score")
            .to_sql(SqlDialect::MySql);
        assert_eq!(sql, "SELECT SUM(score) AS aggregate FROM users WHERE active = ?");
    }

    #[test]
    fn test_exists_subquery_binds_in_place() {
        let posts = QueryBuilder::table("posts")
            .select(&["id"])
            .where_op("posts.user_id", "=", 5)
            .where_eq("posts.published", true);
        let statement = users()
            .where_eq("active", true)
            .where_exists(posts)
            .where_op("age", ">=", 21)
            .to_statement(SqlDialect::PostgreSql, "");

        assert_eq!(
            statement.sql,
            "SELECT * FROM users WHERE active = $1 AND EXISTS \
             (SELECT id FROM posts WHERE posts.user_id = $2 AND posts.published = $3) AND age >= $4"
        );
        assert_eq!(
            statement.binds,
            vec![Value::Bool(true), Value::Int(5), Value::Bool(true), Value::Int(21)]
        );
    }

    #[test]
    fn test_validation_rules() {
        assert!(users().validate().is_ok());
        assert!(users().as_insert().validate().is_err());
        assert!(users().as_update().validate().is_err());
        assert!(users()
            .join("roles", &["roles.id", "=", "users.role_id"])
            .as_delete()
            .validate()
            .is_err());
        assert!(users().where_in("id", Vec::<i64>::new()).validate().is_err());
    }

    #[test]
    fn test_bind_parity_over_many_shapes() {
        let shapes: Vec<QueryBuilder> = vec![
            users(),
            users().where_eq("a", 1).or_where("b", 2).where_not_in("c", [1, 2]),
            users().where_between("d", 1, 9).where_not_null("e").limit(1).offset(2),
            users().set("a", 1).where_in("id", [4, 5]).limit(3).offset(9).as_update(),
            users().where_like("name", "A%").limit(2).as_delete(),
            users().set_values([("a", 1), ("b", 2), ("c", 3)]).as_insert(),
            users().where_eq("x", 1).as_aggregate(AggregateFunction::Count, "*"),
            users().where_exists(QueryBuilder::table("t").where_eq("k", 1)).offset(4),
        ];

        for shape in shapes {
            for dialect in [SqlDialect::MySql, SqlDialect::PostgreSql] {
                let statement = shape.to_statement(dialect, "");
                assert_eq!(
                    dialect.count_placeholders(&statement.sql),
                    statement.binds.len(),
                    "{}",
                    statement.sql
                );
            }
        }
    }
}

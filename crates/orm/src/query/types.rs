//! Query Builder Types - clause nodes and the operator allow-lists

use std::fmt;
use std::str::FromStr;

use super::builder::QueryBuilder;
use crate::value::Value;

/// Comparison operators accepted in predicates and join conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Equal,
    NotEqual,
    /// `<>`
    NotEqualAnsi,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    /// `!<`
    NotLessThan,
    /// `!>`
    NotGreaterThan,
    Like,
    NotLike,
    In,
    NotIn,
    Between,
    IsNull,
    IsNotNull,
    Exists,
}

impl QueryOperator {
    /// Operators that compare a column with exactly one value
    pub fn is_binary(&self) -> bool {
        !matches!(
            self,
            QueryOperator::In
                | QueryOperator::NotIn
                | QueryOperator::Between
                | QueryOperator::IsNull
                | QueryOperator::IsNotNull
                | QueryOperator::Exists
        )
    }
}

impl FromStr for QueryOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        let operator = match normalized.as_str() {
            "=" => QueryOperator::Equal,
            "!=" => QueryOperator::NotEqual,
            "<>" => QueryOperator::NotEqualAnsi,
            ">" => QueryOperator::GreaterThan,
            ">=" => QueryOperator::GreaterThanOrEqual,
            "<" => QueryOperator::LessThan,
            "<=" => QueryOperator::LessThanOrEqual,
            "!<" => QueryOperator::NotLessThan,
            "!>" => QueryOperator::NotGreaterThan,
            "LIKE" => QueryOperator::Like,
            "NOT LIKE" => QueryOperator::NotLike,
            "IN" => QueryOperator::In,
            "NOT IN" => QueryOperator::NotIn,
            "BETWEEN" => QueryOperator::Between,
            "IS NULL" => QueryOperator::IsNull,
            "IS NOT NULL" => QueryOperator::IsNotNull,
            "EXISTS" => QueryOperator::Exists,
            _ => return Err(format!("operator '{}' is not allowed", s)),
        };
        Ok(operator)
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            QueryOperator::Equal => "=",
            QueryOperator::NotEqual => "!=",
            QueryOperator::NotEqualAnsi => "<>",
            QueryOperator::GreaterThan => ">",
            QueryOperator::GreaterThanOrEqual => ">=",
            QueryOperator::LessThan => "<",
            QueryOperator::LessThanOrEqual => "<=",
            QueryOperator::NotLessThan => "!<",
            QueryOperator::NotGreaterThan => "!>",
            QueryOperator::Like => "LIKE",
            QueryOperator::NotLike => "NOT LIKE",
            QueryOperator::In => "IN",
            QueryOperator::NotIn => "NOT IN",
            QueryOperator::Between => "BETWEEN",
            QueryOperator::IsNull => "IS NULL",
            QueryOperator::IsNotNull => "IS NOT NULL",
            QueryOperator::Exists => "EXISTS",
        };
        write!(f, "{}", token)
    }
}

/// Logical connector placed before a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    Where,
    And,
    Or,
}

impl FromStr for LogicalOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "WHERE" => Ok(LogicalOperator::Where),
            "AND" => Ok(LogicalOperator::And),
            "OR" => Ok(LogicalOperator::Or),
            _ => Err(format!("logical operator '{}' is not allowed", s)),
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::Where => write!(f, "WHERE"),
            LogicalOperator::And => write!(f, "AND"),
            LogicalOperator::Or => write!(f, "OR"),
        }
    }
}

/// Where clause condition
#[derive(Debug, Clone)]
pub enum WhereCondition {
    Compare {
        connector: LogicalOperator,
        column: String,
        operator: QueryOperator,
        value: Value,
    },
    In {
        connector: LogicalOperator,
        column: String,
        negated: bool,
        values: Vec<Value>,
    },
    Between {
        connector: LogicalOperator,
        column: String,
        low: Value,
        high: Value,
    },
    Null {
        connector: LogicalOperator,
        column: String,
        negated: bool,
    },
    Exists {
        connector: LogicalOperator,
        negated: bool,
        subquery: Box<QueryBuilder>,
    },
}

impl WhereCondition {
    pub fn connector(&self) -> LogicalOperator {
        match self {
            WhereCondition::Compare { connector, .. }
            | WhereCondition::In { connector, .. }
            | WhereCondition::Between { connector, .. }
            | WhereCondition::Null { connector, .. }
            | WhereCondition::Exists { connector, .. } => *connector,
        }
    }
}

/// Join types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER JOIN"),
            JoinType::Left => write!(f, "LEFT JOIN"),
            JoinType::Right => write!(f, "RIGHT JOIN"),
        }
    }
}

/// Join clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: String,
    pub left: String,
    pub operator: QueryOperator,
    pub right: String,
}

/// Order by direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for OrderDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ASC" => Ok(OrderDirection::Asc),
            "DESC" => Ok(OrderDirection::Desc),
            _ => Err(format!("order direction '{}' is not allowed", s)),
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// Order clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    pub column: String,
    pub direction: OrderDirection,
}

/// Aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Max,
    Min,
    Avg,
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateFunction::Count => write!(f, "COUNT"),
            AggregateFunction::Sum => write!(f, "SUM"),
            AggregateFunction::Max => write!(f, "MAX"),
            AggregateFunction::Min => write!(f, "MIN"),
            AggregateFunction::Avg => write!(f, "AVG"),
        }
    }
}

/// Query types supported by the builder
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QueryType {
    #[default]
    Select,
    Insert,
    Update,
    Delete,
    Aggregate {
        function: AggregateFunction,
        column: String,
    },
}

impl QueryType {
    /// UPDATE and DELETE
    pub fn is_mutation(&self) -> bool {
        matches!(self, QueryType::Update | QueryType::Delete)
    }
}

/// Set clause for UPDATE and INSERT operations
#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    pub column: String,
    pub value: Value,
}

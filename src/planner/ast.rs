//! Query AST structures
//!
//! Defines the filter expression tree and sort clauses consumed by the
//! filter and order compilers. Leaves reference properties by name only.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::schema::Value;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    /// Equality: property eq literal
    Eq,
    /// Inequality: property ne literal
    Ne,
    /// Greater than: property gt literal
    Gt,
    /// Less than: property lt literal
    Lt,
    /// Greater than or equal: property ge literal
    Ge,
    /// Less than or equal: property le literal
    Le,
}

impl ComparisonOp {
    /// Returns the wire name of the operator
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "eq",
            ComparisonOp::Ne => "ne",
            ComparisonOp::Gt => "gt",
            ComparisonOp::Lt => "lt",
            ComparisonOp::Ge => "ge",
            ComparisonOp::Le => "le",
        }
    }

    /// Parses a wire operator name (case-insensitive)
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "eq" => Some(ComparisonOp::Eq),
            "ne" => Some(ComparisonOp::Ne),
            "gt" => Some(ComparisonOp::Gt),
            "lt" => Some(ComparisonOp::Lt),
            "ge" => Some(ComparisonOp::Ge),
            "le" => Some(ComparisonOp::Le),
            _ => None,
        }
    }

    /// Returns true for eq / ne
    pub fn is_equality(&self) -> bool {
        matches!(self, ComparisonOp::Eq | ComparisonOp::Ne)
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A literal on the right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
}

impl Literal {
    /// Converts the literal into a comparable value
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => Value::Int(*i),
            Literal::Float(f) => Value::Float(*f),
            Literal::Text(s) => Value::Text(s.clone()),
            Literal::DateTime(d) => Value::DateTime(*d),
            Literal::Uuid(u) => Value::Uuid(*u),
        }
    }

    /// Returns the literal's type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::Text(_) => "string",
            Literal::DateTime(_) => "datetime",
            Literal::Uuid(_) => "uuid",
        }
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Int(v)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Float(v)
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Literal::Bool(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for Literal {
    fn from(v: DateTime<Utc>) -> Self {
        Literal::DateTime(v)
    }
}

impl From<Uuid> for Literal {
    fn from(v: Uuid) -> Self {
        Literal::Uuid(v)
    }
}

/// Boolean expression tree over property comparisons
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Comparison {
        property: String,
        op: ComparisonOp,
        literal: Literal,
    },
    And(Box<FilterNode>, Box<FilterNode>),
    Or(Box<FilterNode>, Box<FilterNode>),
    /// Accepts every entity; the policy for an absent filter
    AlwaysTrue,
}

impl FilterNode {
    /// Create a comparison leaf
    pub fn compare(property: impl Into<String>, op: ComparisonOp, literal: impl Into<Literal>) -> Self {
        FilterNode::Comparison {
            property: property.into(),
            op,
            literal: literal.into(),
        }
    }

    pub fn eq(property: impl Into<String>, literal: impl Into<Literal>) -> Self {
        Self::compare(property, ComparisonOp::Eq, literal)
    }

    pub fn ne(property: impl Into<String>, literal: impl Into<Literal>) -> Self {
        Self::compare(property, ComparisonOp::Ne, literal)
    }

    pub fn gt(property: impl Into<String>, literal: impl Into<Literal>) -> Self {
        Self::compare(property, ComparisonOp::Gt, literal)
    }

    pub fn lt(property: impl Into<String>, literal: impl Into<Literal>) -> Self {
        Self::compare(property, ComparisonOp::Lt, literal)
    }

    pub fn ge(property: impl Into<String>, literal: impl Into<Literal>) -> Self {
        Self::compare(property, ComparisonOp::Ge, literal)
    }

    pub fn le(property: impl Into<String>, literal: impl Into<Literal>) -> Self {
        Self::compare(property, ComparisonOp::Le, literal)
    }

    /// Combine with another node using AND
    pub fn and(self, other: FilterNode) -> Self {
        FilterNode::And(Box::new(self), Box::new(other))
    }

    /// Combine with another node using OR
    pub fn or(self, other: FilterNode) -> Self {
        FilterNode::Or(Box::new(self), Box::new(other))
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

/// A single ordering key; earlier clauses take priority
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    /// Property to sort by
    pub property: String,
    /// Sort direction
    pub direction: SortDirection,
}

impl SortClause {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Descending,
        }
    }
}

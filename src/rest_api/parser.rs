//! # Query Parameter Parser
//!
//! Parses request parameters into a `QueryDescriptor`.
//!
//! Supported parameters (the `$` prefix is optional):
//! `$filter`, `$orderby`, `$select`, `$expand`, `$skip`, `$top`, `$count`.
//!
//! Filter grammar, lowest precedence first:
//!
//! ```text
//! or_expr    := and_expr ("or" and_expr)*
//! and_expr   := primary ("and" primary)*
//! primary    := "(" or_expr ")" | comparison
//! comparison := property op literal
//! op         := eq | ne | gt | lt | ge | le
//! literal    := null | true | false | number | 'text' | datetime | guid
//! ```
//!
//! Parenthesis nesting is capped at `MAX_FILTER_DEPTH` and the number of
//! comparisons at `MAX_FILTER_COMPARISONS`, which also bounds the depth of
//! the `and`/`or` chains built from them.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::planner::{ComparisonOp, FilterNode, Literal, QueryDescriptor, SortClause, SortDirection};

use super::errors::{RestError, RestResult};

/// Default maximum for `$top`
pub const DEFAULT_MAX_TOP: usize = 1000;

/// Maximum parenthesis nesting in a filter
pub const MAX_FILTER_DEPTH: usize = 32;

/// Maximum number of comparisons in a filter
pub const MAX_FILTER_COMPARISONS: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Param {
    Filter,
    OrderBy,
    Select,
    Expand,
    Skip,
    Top,
    Count,
}

impl Param {
    fn parse(key: &str) -> Option<Self> {
        let key = key.strip_prefix('$').unwrap_or(key);
        match key.to_ascii_lowercase().as_str() {
            "filter" => Some(Param::Filter),
            "orderby" => Some(Param::OrderBy),
            "select" => Some(Param::Select),
            "expand" => Some(Param::Expand),
            "skip" => Some(Param::Skip),
            "top" => Some(Param::Top),
            "count" => Some(Param::Count),
            _ => None,
        }
    }
}

/// Parses request parameters into a descriptor.
///
/// Unknown or repeated parameters are rejected, as is a `top` above
/// `max_top`.
pub fn parse_query(params: &[(String, String)], max_top: usize) -> RestResult<QueryDescriptor> {
    let mut seen: Vec<Param> = Vec::with_capacity(params.len());
    let mut descriptor = QueryDescriptor::new();

    for (key, value) in params {
        let param = Param::parse(key)
            .ok_or_else(|| RestError::InvalidQueryParam(format!("unknown parameter '{}'", key)))?;
        if seen.contains(&param) {
            return Err(RestError::InvalidQueryParam(format!(
                "parameter '{}' given more than once",
                key
            )));
        }
        seen.push(param);

        descriptor = match param {
            Param::Filter => match parse_filter_opt(value)? {
                Some(filter) => descriptor.with_filter(filter),
                None => descriptor,
            },
            Param::OrderBy => descriptor.with_order(parse_orderby(value)?),
            Param::Select => descriptor.with_select(parse_list(value)),
            Param::Expand => descriptor.with_expand(parse_list(value)),
            Param::Skip => descriptor.with_skip(parse_count_value("skip", value)?),
            Param::Top => {
                let top = parse_count_value("top", value)?;
                if top > max_top {
                    return Err(RestError::LimitExceeded(top, max_top));
                }
                descriptor.with_top(top)
            }
            Param::Count => descriptor.with_count(parse_flag(value)?),
        };
    }

    Ok(descriptor)
}

/// Parses a comma-separated name list, dropping blank entries
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses `property[ asc|desc]` clauses separated by commas
pub fn parse_orderby(value: &str) -> RestResult<Vec<SortClause>> {
    let mut clauses = Vec::new();

    for part in value.split(',') {
        let mut words = part.split_whitespace();
        let Some(property) = words.next() else {
            continue;
        };

        let direction = match words.next() {
            None => SortDirection::Ascending,
            Some(word) => match word.to_ascii_lowercase().as_str() {
                "asc" => SortDirection::Ascending,
                "desc" => SortDirection::Descending,
                _ => {
                    return Err(RestError::InvalidOrder(format!(
                        "invalid direction '{}' for '{}'",
                        word, property
                    )))
                }
            },
        };

        if let Some(extra) = words.next() {
            return Err(RestError::InvalidOrder(format!(
                "unexpected '{}' after '{}'",
                extra,
                part.trim()
            )));
        }

        clauses.push(SortClause {
            property: property.to_string(),
            direction,
        });
    }

    Ok(clauses)
}

fn parse_count_value(name: &str, value: &str) -> RestResult<usize> {
    value.trim().parse().map_err(|_| {
        RestError::InvalidQueryParam(format!("Invalid {}: {}", name, value))
    })
}

/// Presence means true; an explicit value must be true or false
fn parse_flag(value: &str) -> RestResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(RestError::InvalidQueryParam(format!("Invalid count: {}", value))),
    }
}

fn parse_filter_opt(value: &str) -> RestResult<Option<FilterNode>> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_filter(value).map(Some)
}

/// Parses a filter expression
pub fn parse_filter(input: &str) -> RestResult<FilterNode> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        comparisons: 0,
    };
    let node = parser.or_expr()?;
    match parser.peek() {
        None => Ok(node),
        Some(token) => Err(RestError::InvalidFilter(format!(
            "unexpected {}",
            token.describe()
        ))),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    /// Quoted text with escapes removed
    Text(String),
    /// Any unquoted run of characters
    Word(String),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Text(text) => format!("text '{}'", text),
            Token::Word(word) => format!("'{}'", word),
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(w) if w.eq_ignore_ascii_case(keyword))
    }
}

fn tokenize(input: &str) -> RestResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '\'' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('\'') => {
                            // '' is an escaped quote
                            if chars.peek() == Some(&'\'') {
                                chars.next();
                                text.push('\'');
                            } else {
                                break;
                            }
                        }
                        Some(ch) => text.push(ch),
                        None => {
                            return Err(RestError::InvalidFilter(
                                "unterminated text literal".to_string(),
                            ))
                        }
                    }
                }
                tokens.push(Token::Text(text));
            }
            _ => {
                let mut word = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_whitespace() || ch == '(' || ch == ')' || ch == '\'' {
                        break;
                    }
                    word.push(ch);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Open parentheses around the current position
    depth: usize,
    comparisons: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn or_expr(&mut self) -> RestResult<FilterNode> {
        let mut node = self.and_expr()?;
        while self.peek().is_some_and(|t| t.is_keyword("or")) {
            self.pos += 1;
            node = node.or(self.and_expr()?);
        }
        Ok(node)
    }

    fn and_expr(&mut self) -> RestResult<FilterNode> {
        let mut node = self.primary()?;
        while self.peek().is_some_and(|t| t.is_keyword("and")) {
            self.pos += 1;
            node = node.and(self.primary()?);
        }
        Ok(node)
    }

    fn primary(&mut self) -> RestResult<FilterNode> {
        match self.next() {
            Some(Token::LParen) => {
                if self.depth == MAX_FILTER_DEPTH {
                    return Err(RestError::InvalidFilter(format!(
                        "filter nested too deeply (max {})",
                        MAX_FILTER_DEPTH
                    )));
                }
                self.depth += 1;
                let node = self.or_expr()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::RParen) => Ok(node),
                    Some(other) => Err(RestError::InvalidFilter(format!(
                        "expected ')' but found {}",
                        other.describe()
                    ))),
                    None => Err(RestError::InvalidFilter("missing ')'".to_string())),
                }
            }
            Some(Token::Word(property)) => self.comparison(property),
            Some(other) => Err(RestError::InvalidFilter(format!(
                "expected a property but found {}",
                other.describe()
            ))),
            None => Err(RestError::InvalidFilter("unexpected end of filter".to_string())),
        }
    }

    fn comparison(&mut self, property: String) -> RestResult<FilterNode> {
        self.comparisons += 1;
        if self.comparisons > MAX_FILTER_COMPARISONS {
            return Err(RestError::InvalidFilter(format!(
                "filter has too many comparisons (max {})",
                MAX_FILTER_COMPARISONS
            )));
        }

        let op = match self.next() {
            Some(Token::Word(word)) => ComparisonOp::parse(&word).ok_or_else(|| {
                RestError::InvalidFilter(format!("unknown operator '{}'", word))
            })?,
            Some(other) => {
                return Err(RestError::InvalidFilter(format!(
                    "expected an operator after '{}' but found {}",
                    property,
                    other.describe()
                )))
            }
            None => {
                return Err(RestError::InvalidFilter(format!(
                    "missing operator after '{}'",
                    property
                )))
            }
        };

        let literal = match self.next() {
            Some(Token::Text(text)) => Literal::Text(text),
            Some(Token::Word(word)) => parse_literal(&word)?,
            Some(other) => {
                return Err(RestError::InvalidFilter(format!(
                    "expected a literal after '{} {}' but found {}",
                    property,
                    op,
                    other.describe()
                )))
            }
            None => {
                return Err(RestError::InvalidFilter(format!(
                    "missing literal after '{} {}'",
                    property, op
                )))
            }
        };

        Ok(FilterNode::compare(property, op, literal))
    }
}

/// Parses an unquoted literal
fn parse_literal(word: &str) -> RestResult<Literal> {
    match word.to_ascii_lowercase().as_str() {
        "null" => return Ok(Literal::Null),
        "true" => return Ok(Literal::Bool(true)),
        "false" => return Ok(Literal::Bool(false)),
        _ => {}
    }

    if let Ok(v) = word.parse::<i64>() {
        return Ok(Literal::Int(v));
    }

    let numeric = word
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'));
    if numeric {
        if let Ok(v) = word.parse::<f64>() {
            if v.is_finite() {
                return Ok(Literal::Float(v));
            }
        }
    }

    if let Ok(v) = DateTime::parse_from_rfc3339(word) {
        return Ok(Literal::DateTime(v.with_timezone(&Utc)));
    }
    if let Ok(date) = NaiveDate::parse_from_str(word, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Literal::DateTime(midnight.and_utc()));
        }
    }

    if let Ok(v) = Uuid::parse_str(word) {
        return Ok(Literal::Uuid(v));
    }

    Err(RestError::InvalidFilter(format!("invalid literal '{}'", word)))
}

//! Query descriptor
//!
//! Immutable description of one request's filter, order, select, expand,
//! pagination and count intent.

use super::ast::{FilterNode, SortClause};

/// A single request's query intent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDescriptor {
    filter: Option<FilterNode>,
    order: Vec<SortClause>,
    select: Option<Vec<String>>,
    expand: Option<Vec<String>>,
    skip: Option<usize>,
    top: Option<usize>,
    count: bool,
}

impl QueryDescriptor {
    /// An empty descriptor: no filter, natural order, full entities
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: FilterNode) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Append a sort clause (lower priority than those already present)
    pub fn then_by(mut self, clause: SortClause) -> Self {
        self.order.push(clause);
        self
    }

    pub fn with_order(mut self, order: Vec<SortClause>) -> Self {
        self.order = order;
        self
    }

    pub fn with_select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_expand<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expand = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn with_top(mut self, top: usize) -> Self {
        self.top = Some(top);
        self
    }

    pub fn with_count(mut self, count: bool) -> Self {
        self.count = count;
        self
    }

    pub fn filter(&self) -> Option<&FilterNode> {
        self.filter.as_ref()
    }

    pub fn order(&self) -> &[SortClause] {
        &self.order
    }

    pub fn select(&self) -> Option<&[String]> {
        self.select.as_deref()
    }

    pub fn expand(&self) -> Option<&[String]> {
        self.expand.as_deref()
    }

    pub fn skip(&self) -> Option<usize> {
        self.skip
    }

    pub fn top(&self) -> Option<usize> {
        self.top
    }

    pub fn count_requested(&self) -> bool {
        self.count
    }

    /// Returns true if the request asks for a projected shape
    pub fn wants_projection(&self) -> bool {
        self.select.is_some() || self.expand.is_some()
    }
}

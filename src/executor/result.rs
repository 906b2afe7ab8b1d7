//! Result envelope returned by the query engine

use serde::Serialize;

use crate::projection::Record;

/// Returned items: full entities, or projected records when select or
/// expand was requested
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Items<E> {
    Entities(Vec<E>),
    Records(Vec<Record>),
}

impl<E> Items<E> {
    /// Returns the number of items
    pub fn len(&self) -> usize {
        match self {
            Items::Entities(items) => items.len(),
            Items::Records(items) => items.len(),
        }
    }

    /// Returns true if there are no items
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the entities if no projection occurred
    pub fn entities(&self) -> Option<&[E]> {
        match self {
            Items::Entities(items) => Some(items),
            Items::Records(_) => None,
        }
    }

    /// Returns the records if projection occurred
    pub fn records(&self) -> Option<&[Record]> {
        match self {
            Items::Records(items) => Some(items),
            Items::Entities(_) => None,
        }
    }

    /// Returns true if the items are projected records
    pub fn is_projected(&self) -> bool {
        matches!(self, Items::Records(_))
    }
}

/// Response wrapper: `{"items": [...], "count"?: n}`
///
/// `items` is always present, even when empty. `count` is present only
/// when counting was requested and holds the pre-pagination total.
#[derive(Debug, Clone, Serialize)]
pub struct ResultEnvelope<E> {
    pub items: Items<E>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<E> ResultEnvelope<E> {
    pub fn new(items: Items<E>, count: Option<usize>) -> Self {
        Self { items, count }
    }
}

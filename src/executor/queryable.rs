//! Queryable collaborator contract
//!
//! The engine never reads storage directly. It composes a query against a
//! `Queryable` and triggers exactly one fetch per request via `materialize`
//! (or `count`). Both fetches may fail or be cancelled.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use crate::planner::{CompiledFilter, CompiledOrder};

/// Storage collaborator failures, surfaced to the caller unchanged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The request was abandoned before the fetch completed
    #[error("Storage request cancelled")]
    Cancelled,

    /// The backend could not be reached
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The backend failed while serving the fetch
    #[error("Storage backend failure: {0}")]
    Backend(String),
}

impl StorageError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::Cancelled => "STORAGE_CANCELLED",
            StorageError::Unavailable(_) => "STORAGE_UNAVAILABLE",
            StorageError::Backend(_) => "STORAGE_BACKEND_FAILURE",
        }
    }
}

/// Result type for storage fetches
pub type StorageResult<T> = Result<T, StorageError>;

/// A lazily composed query over a stored entity collection.
///
/// Composition methods are cheap and never touch storage.
pub trait Queryable<E>: Sized + Send {
    fn filter(self, predicate: CompiledFilter<E>) -> Self;

    fn order_by(self, order: CompiledOrder<E>) -> Self;

    fn skip(self, n: usize) -> Self;

    fn take(self, n: usize) -> Self;

    /// Counts the entities the composed query would return
    fn count(self) -> impl Future<Output = StorageResult<usize>> + Send;

    /// Fetches the composed query
    fn materialize(self) -> impl Future<Output = StorageResult<Vec<E>>> + Send;
}

enum Step<E> {
    Filter(CompiledFilter<E>),
    Order(CompiledOrder<E>),
    Skip(usize),
    Take(usize),
}

/// Reference collaborator over a shared in-memory snapshot.
///
/// Steps are applied in the order they were composed.
pub struct InMemoryCollection<E> {
    rows: Arc<Vec<E>>,
    steps: Vec<Step<E>>,
}

impl<E> InMemoryCollection<E> {
    /// Creates a query over a snapshot
    pub fn new(rows: Arc<Vec<E>>) -> Self {
        Self {
            rows,
            steps: Vec::new(),
        }
    }

    fn push(mut self, step: Step<E>) -> Self {
        self.steps.push(step);
        self
    }
}

impl<E: Clone> InMemoryCollection<E> {
    fn run(&self) -> Vec<E> {
        let mut rows: Vec<E> = self.rows.as_ref().clone();
        for step in &self.steps {
            match step {
                Step::Filter(predicate) => rows.retain(|row| predicate.matches(row)),
                Step::Order(order) => order.sort(&mut rows),
                Step::Skip(n) => {
                    let n = (*n).min(rows.len());
                    rows.drain(..n);
                }
                Step::Take(n) => rows.truncate(*n),
            }
        }
        rows
    }
}

impl<E> From<Vec<E>> for InMemoryCollection<E> {
    fn from(rows: Vec<E>) -> Self {
        Self::new(Arc::new(rows))
    }
}

impl<E> Queryable<E> for InMemoryCollection<E>
where
    E: Clone + Send + Sync + 'static,
{
    fn filter(self, predicate: CompiledFilter<E>) -> Self {
        self.push(Step::Filter(predicate))
    }

    fn order_by(self, order: CompiledOrder<E>) -> Self {
        self.push(Step::Order(order))
    }

    fn skip(self, n: usize) -> Self {
        self.push(Step::Skip(n))
    }

    fn take(self, n: usize) -> Self {
        self.push(Step::Take(n))
    }

    fn count(self) -> impl Future<Output = StorageResult<usize>> + Send {
        async move { Ok(self.run().len()) }
    }

    fn materialize(self) -> impl Future<Output = StorageResult<Vec<E>>> + Send {
        async move { Ok(self.run()) }
    }
}

//! Query orchestrator for aeroquery
//!
//! Composes the compiled pieces in fixed order: filter, order, projection,
//! count, pagination. Deterministic: same descriptor + same data = same
//! envelope.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::planner::{
    CompiledFilter, CompiledOrder, FilterCompiler, FilterNode, OrderCompiler, QueryDescriptor,
    QueryError, QueryResult, Severity,
};
use crate::projection::{derive_columns, ProjectionCompiler, Projector, ShapeRegistry};
use crate::schema::{Entity, PropertyResolver};

use super::queryable::{Queryable, StorageError, StorageResult};
use super::result::{Items, ResultEnvelope};

/// A fully compiled request, ready to run against a collaborator
pub struct CompiledQuery<E> {
    filter: Option<CompiledFilter<E>>,
    order: Option<CompiledOrder<E>>,
    projector: Option<Projector<E>>,
    skip: Option<usize>,
    top: Option<usize>,
    count: bool,
}

impl<E> CompiledQuery<E> {
    /// Returns true if items will be projected records
    pub fn is_projected(&self) -> bool {
        self.projector.is_some()
    }

    /// Returns the projector, if any
    pub fn projector(&self) -> Option<&Projector<E>> {
        self.projector.as_ref()
    }

    /// Composes filter and order, plus pagination when it can be pushed down
    fn compose<Q: Queryable<E>>(&self, source: Q) -> Q {
        let mut query = source;
        if let Some(filter) = &self.filter {
            query = query.filter(filter.clone());
        }
        if let Some(order) = &self.order {
            query = query.order_by(order.clone());
        }
        // Counting needs the whole filtered set, so pagination stays in memory
        if !self.count {
            if let Some(skip) = self.skip {
                query = query.skip(skip);
            }
            if let Some(top) = self.top {
                query = query.take(top);
            }
        }
        query
    }

    fn paginate<T>(&self, items: impl Iterator<Item = T>) -> Vec<T> {
        if !self.count {
            return items.collect();
        }
        let items = items.skip(self.skip.unwrap_or(0));
        match self.top {
            Some(top) => items.take(top).collect(),
            None => items.collect(),
        }
    }

    /// Runs the query: one fetch, then count, projection and pagination
    pub async fn run<Q: Queryable<E>>(
        &self,
        source: Q,
        cancel: &CancellationToken,
    ) -> QueryResult<ResultEnvelope<E>> {
        let entities = fetch(self.compose(source).materialize(), cancel).await?;

        let total = self.count.then_some(entities.len());

        let items = match &self.projector {
            Some(projector) => {
                Items::Records(self.paginate(entities.iter().map(|e| projector.project(e))))
            }
            None => Items::Entities(self.paginate(entities.into_iter())),
        };

        Ok(ResultEnvelope::new(items, total))
    }
}

/// Races a storage fetch against cancellation.
///
/// On cancellation the fetch future is dropped before it completes.
async fn fetch<T, F>(fut: F, cancel: &CancellationToken) -> StorageResult<T>
where
    F: Future<Output = StorageResult<T>>,
{
    if cancel.is_cancelled() {
        return Err(StorageError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StorageError::Cancelled),
        result = fut => result,
    }
}

/// Query engine for one entity type
pub struct QueryEngine<E> {
    resolver: Arc<PropertyResolver<E>>,
    shapes: Arc<ShapeRegistry>,
    metrics: Arc<MetricsRegistry>,
}

impl<E: Entity> QueryEngine<E> {
    /// Creates an engine over the process-wide shape registry
    pub fn new() -> Self {
        Self::with_registries(ShapeRegistry::global(), Arc::new(MetricsRegistry::new()))
    }

    /// Creates an engine with explicit shared registries
    pub fn with_registries(shapes: Arc<ShapeRegistry>, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            resolver: PropertyResolver::shared(),
            shapes,
            metrics,
        }
    }

    pub fn resolver(&self) -> &Arc<PropertyResolver<E>> {
        &self.resolver
    }

    pub fn shapes(&self) -> &Arc<ShapeRegistry> {
        &self.shapes
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Compiles every part of a descriptor.
    ///
    /// Fails on the first invalid part; nothing is partially applied.
    pub fn compile(&self, descriptor: &QueryDescriptor) -> QueryResult<CompiledQuery<E>> {
        let filter = descriptor
            .filter()
            .map(|ast| FilterCompiler::compile(&self.resolver, ast))
            .transpose()?;

        let order = if descriptor.order().is_empty() {
            None
        } else {
            Some(OrderCompiler::compile(&self.resolver, descriptor.order())?)
        };

        let projector = match derive_columns(&self.resolver, descriptor.select(), descriptor.expand())? {
            Some(columns) => {
                let entry = self.shapes.get_or_create(&self.resolver, &columns)?;
                Some(ProjectionCompiler::build(entry, &self.resolver)?)
            }
            None => None,
        };

        Ok(CompiledQuery {
            filter,
            order,
            projector,
            skip: descriptor.skip(),
            top: descriptor.top(),
            count: descriptor.count_requested(),
        })
    }

    /// Executes a descriptor against a collaborator.
    ///
    /// Compile errors are returned before `source` is touched. Storage
    /// failures and cancellation are returned as `QueryError::Storage`.
    pub async fn execute<Q: Queryable<E>>(
        &self,
        source: Q,
        descriptor: &QueryDescriptor,
        cancel: &CancellationToken,
    ) -> QueryResult<ResultEnvelope<E>> {
        let compiled = self.compile(descriptor).map_err(|e| self.rejected(e))?;

        match compiled.run(source, cancel).await {
            Ok(envelope) => {
                self.metrics.record_executed(envelope.items.len());
                let items = envelope.items.len().to_string();
                let count = envelope
                    .count
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string());
                log_event_with_fields(
                    Event::QueryExecuted,
                    &[
                        ("entity", E::TYPE_NAME),
                        ("items", &items),
                        ("count", &count),
                    ],
                );
                Ok(envelope)
            }
            Err(e) => Err(self.failed(e)),
        }
    }

    /// Counts the entities matching a filter without fetching them
    pub async fn count<Q: Queryable<E>>(
        &self,
        source: Q,
        filter: Option<&FilterNode>,
        cancel: &CancellationToken,
    ) -> QueryResult<usize> {
        let compiled = filter
            .map(|ast| FilterCompiler::compile(&self.resolver, ast))
            .transpose()
            .map_err(|e| self.rejected(e))?;

        let query = match compiled {
            Some(predicate) => source.filter(predicate),
            None => source,
        };

        match fetch(query.count(), cancel).await {
            Ok(total) => {
                self.metrics.record_executed(0);
                let total_str = total.to_string();
                log_event_with_fields(
                    Event::QueryExecuted,
                    &[("entity", E::TYPE_NAME), ("count", &total_str)],
                );
                Ok(total)
            }
            Err(e) => Err(self.failed(QueryError::Storage(e))),
        }
    }

    fn rejected(&self, error: QueryError) -> QueryError {
        let event = if error.severity() == Severity::Fatal {
            Event::ShapeConstructionFailed
        } else {
            Event::QueryRejected
        };
        self.metrics.increment_queries_rejected();
        let message = error.to_string();
        log_event_with_fields(
            event,
            &[
                ("entity", E::TYPE_NAME),
                ("code", error.code()),
                ("error", &message),
            ],
        );
        error
    }

    fn failed(&self, error: QueryError) -> QueryError {
        if error.is_cancelled() {
            self.metrics.increment_queries_cancelled();
            log_event_with_fields(Event::QueryCancelled, &[("entity", E::TYPE_NAME)]);
        } else {
            self.metrics.increment_storage_failures();
            let message = error.to_string();
            log_event_with_fields(
                Event::StorageFailed,
                &[("entity", E::TYPE_NAME), ("error", &message)],
            );
        }
        error
    }
}

impl<E: Entity> Default for QueryEngine<E> {
    fn default() -> Self {
        Self::new()
    }
}

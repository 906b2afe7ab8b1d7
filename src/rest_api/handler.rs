//! # REST Handlers
//!
//! Routes requests for a named collection to the query engine of the
//! matching entity type, plus direct catalog reads (by id, order details,
//! orders by customer email).

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio_util::sync::CancellationToken;

use crate::catalog::{CatalogEntity, CatalogStore, Collection, Customer, MenuItem, Order, OrderItem};
use crate::executor::QueryEngine;
use crate::observability::{MetricsRegistry, MetricsSnapshot};
use crate::planner::QueryDescriptor;
use crate::projection::ShapeRegistry;

use super::errors::{RestError, RestResult};
use super::parser::parse_query;

/// Shared state for all routes
pub struct ApiState {
    store: Arc<CatalogStore>,
    shapes: Arc<ShapeRegistry>,
    metrics: Arc<MetricsRegistry>,
    max_top: usize,
    /// Cancelled on shutdown; every request runs under a child token
    shutdown: CancellationToken,
}

impl ApiState {
    /// Creates state with the process-wide shape registry
    pub fn new(store: CatalogStore, max_top: usize) -> Self {
        Self::with_registries(
            store,
            max_top,
            ShapeRegistry::global(),
            Arc::new(MetricsRegistry::new()),
        )
    }

    pub fn with_registries(
        store: CatalogStore,
        max_top: usize,
        shapes: Arc<ShapeRegistry>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            store: Arc::new(store),
            shapes,
            metrics,
            max_top,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn shapes(&self) -> &Arc<ShapeRegistry> {
        &self.shapes
    }

    /// Token that aborts in-flight queries when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    fn engine<E: CatalogEntity>(&self) -> QueryEngine<E> {
        QueryEngine::with_registries(Arc::clone(&self.shapes), Arc::clone(&self.metrics))
    }

    async fn list<E: CatalogEntity>(&self, descriptor: &QueryDescriptor) -> RestResult<Response> {
        // Expanded navigation is loaded by storage
        let linked = descriptor.expand().is_some_and(|e| !e.is_empty());
        let source = self.store.query::<E>(linked);
        let cancel = self.shutdown.child_token();

        let envelope = self.engine::<E>().execute(source, descriptor, &cancel).await?;
        Ok(Json(envelope).into_response())
    }

    fn get_by_id<E: CatalogEntity>(&self, id: i64) -> RestResult<JsonValue> {
        let row = self
            .store
            .get::<E>(id)
            .ok_or_else(|| RestError::EntityNotFound {
                collection: E::COLLECTION.to_string(),
                id,
            })?;
        serde_json::to_value(row).map_err(|e| RestError::Internal(e.to_string()))
    }

    async fn count<E: CatalogEntity>(&self, descriptor: &QueryDescriptor) -> RestResult<usize> {
        let source = self.store.query::<E>(false);
        let cancel = self.shutdown.child_token();

        Ok(self
            .engine::<E>()
            .count(source, descriptor.filter(), &cancel)
            .await?)
    }
}

pub type SharedState = Arc<ApiState>;

/// Count response
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: usize,
}

/// List of plain rows
#[derive(Debug, Serialize)]
pub struct ItemsResponse<T> {
    pub items: Vec<T>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Metrics response
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub counters: MetricsSnapshot,
    pub shapes_created: usize,
}

/// Collection query routes, nested under /api
pub fn api_routes(state: SharedState) -> Router {
    Router::new()
        .route("/:collection", get(list_handler))
        .route("/:collection/count", get(count_handler))
        .route("/:collection/:id", get(get_by_id_handler))
        .route("/orders/:id/details", get(order_details_handler))
        .route("/customers/by-email/:mail/orders", get(orders_by_email_handler))
        .with_state(state)
}

/// Observability routes, nested under /observability
pub fn observability_routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Health check route (also available at root /health)
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_handler))
}

fn parse_collection(name: &str) -> RestResult<Collection> {
    name.parse()
        .map_err(|_| RestError::CollectionNotFound(name.to_string()))
}

/// GET /api/:collection
async fn list_handler(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> RestResult<Response> {
    let collection = parse_collection(&name)?;
    let descriptor = parse_query(&params, state.max_top)?;

    match collection {
        Collection::Customers => state.list::<Customer>(&descriptor).await,
        Collection::MenuItems => state.list::<MenuItem>(&descriptor).await,
        Collection::Orders => state.list::<Order>(&descriptor).await,
        Collection::OrderItems => state.list::<OrderItem>(&descriptor).await,
    }
}

/// GET /api/:collection/count
async fn count_handler(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> RestResult<Json<CountResponse>> {
    let collection = parse_collection(&name)?;
    let descriptor = parse_query(&params, state.max_top)?;

    let count = match collection {
        Collection::Customers => state.count::<Customer>(&descriptor).await?,
        Collection::MenuItems => state.count::<MenuItem>(&descriptor).await?,
        Collection::Orders => state.count::<Order>(&descriptor).await?,
        Collection::OrderItems => state.count::<OrderItem>(&descriptor).await?,
    };

    Ok(Json(CountResponse { count }))
}

fn parse_id(raw: &str) -> RestResult<i64> {
    raw.trim()
        .parse()
        .map_err(|_| RestError::InvalidPathParam(format!("Invalid id: {}", raw)))
}

/// GET /api/:collection/:id
async fn get_by_id_handler(
    State(state): State<SharedState>,
    Path((name, raw_id)): Path<(String, String)>,
) -> RestResult<Json<JsonValue>> {
    let collection = parse_collection(&name)?;
    let id = parse_id(&raw_id)?;

    let row = match collection {
        Collection::Customers => state.get_by_id::<Customer>(id)?,
        Collection::MenuItems => state.get_by_id::<MenuItem>(id)?,
        Collection::Orders => state.get_by_id::<Order>(id)?,
        Collection::OrderItems => state.get_by_id::<OrderItem>(id)?,
    };
    Ok(Json(row))
}

/// GET /api/orders/:id/details
async fn order_details_handler(
    State(state): State<SharedState>,
    Path(raw_id): Path<String>,
) -> RestResult<Json<ItemsResponse<MenuItem>>> {
    let id = parse_id(&raw_id)?;
    Ok(Json(ItemsResponse {
        items: state.store.order_details(id),
    }))
}

/// GET /api/customers/by-email/:mail/orders
async fn orders_by_email_handler(
    State(state): State<SharedState>,
    Path(mail): Path<String>,
) -> Json<ItemsResponse<Order>> {
    Json(ItemsResponse {
        items: state.store.orders_for_email(&mail),
    })
}

async fn health_handler() -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}

async fn metrics_handler(State(state): State<SharedState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        counters: state.metrics.snapshot(),
        shapes_created: state.shapes.len(),
    })
}

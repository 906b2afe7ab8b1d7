//! # REST API
//!
//! HTTP boundary for the query engine.
//!
//! ```text
//! GET /api/{collection}?$filter=price ge 5&$orderby=name desc&$select=id,price
//! GET /api/{collection}/count?$filter=status eq 'open'
//! GET /api/{collection}/{id}
//! GET /api/orders/{id}/details
//! GET /api/customers/by-email/{mail}/orders
//! GET /health
//! GET /observability/metrics
//! ```

mod errors;
mod handler;
mod parser;
mod server;

pub use errors::{ErrorResponse, RestError, RestResult};
pub use handler::{
    api_routes, ApiState, CountResponse, ItemsResponse, MetricsResponse, SharedState,
};
pub use parser::{
    parse_filter, parse_list, parse_orderby, parse_query, DEFAULT_MAX_TOP, MAX_FILTER_COMPARISONS,
    MAX_FILTER_DEPTH,
};
pub use server::RestServer;

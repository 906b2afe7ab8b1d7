//! # REST Server
//!
//! Binds the query routes, health and metrics behind a CORS layer.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::catalog::CatalogStore;
use crate::config::{Config, ConfigError};
use crate::observability::{log_event_with_fields, Event};

use super::handler::{api_routes, health_routes, observability_routes, ApiState, SharedState};

/// HTTP server for collection queries
pub struct RestServer {
    config: Config,
    state: SharedState,
    router: Router,
}

impl RestServer {
    /// Create a server over a catalog
    pub fn new(config: Config, store: CatalogStore) -> Result<Self, ConfigError> {
        let state = Arc::new(ApiState::new(store, config.max_top));
        Self::with_state(config, state)
    }

    /// Create a server with prepared state. Fails on an invalid config.
    pub fn with_state(config: Config, state: SharedState) -> Result<Self, ConfigError> {
        config.validate()?;
        let router = Self::build_router(&config, Arc::clone(&state))?;
        Ok(Self {
            config,
            state,
            router,
        })
    }

    /// Build the combined router
    pub fn build_router(config: &Config, state: SharedState) -> Result<Router, ConfigError> {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(config.cors_origin_values()?))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Ok(Router::new()
            .merge(health_routes())
            .nest("/observability", observability_routes(Arc::clone(&state)))
            .nest("/api", api_routes(state))
            .layer(cors))
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until Ctrl-C, then cancel in-flight queries
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        let addr_str = addr.to_string();
        log_event_with_fields(Event::ServerStart, &[("addr", &addr_str)]);

        let shutdown = self.state.shutdown_token();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = tokio::signal::ctrl_c().await;
                shutdown.cancel();
            })
            .await?;

        Ok(())
    }
}

//! Hub server implementation
//!
//! Assembles the REST API, WebSocket feeds, and optional static file serving
//! into one axum server over shared application state.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::aggregate::Aggregator;
use crate::publish::Publisher;
use crate::store::StatusLog;

use super::api::create_router;
use super::config::HubConfig;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Append-only status log
    pub log: Arc<StatusLog>,

    /// Publisher owning the push feeds
    pub publisher: Arc<Publisher>,

    /// Stateless scan reducer for REST handlers
    pub aggregator: Aggregator,

    /// Server start time
    pub start_time: Instant,

    /// Configuration
    pub config: HubConfig,
}

// ============================================================================
// Hub Server
// ============================================================================

/// Main hub server
pub struct HubServer {
    config: HubConfig,
    state: AppState,
}

impl HubServer {
    /// Create a new hub server
    pub fn new(
        config: HubConfig,
        log: Arc<StatusLog>,
        publisher: Arc<Publisher>,
    ) -> Result<Self, HubError> {
        config
            .validate()
            .map_err(|e| HubError::Config(e.to_string()))?;

        let state = AppState {
            log,
            publisher,
            aggregator: Aggregator::new(),
            start_time: Instant::now(),
            config: config.clone(),
        };

        Ok(Self { config, state })
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        // Dashboard assets, when configured
        if let Some(dir) = &self.config.static_dir {
            router = router.fallback_service(ServeDir::new(dir));
        }

        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if self.config.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Start the server
    pub async fn start(&self) -> Result<(), HubError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        tracing::info!("Starting hub server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| HubError::Bind(e.to_string()))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| HubError::Serve(e.to_string()))?;

        Ok(())
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), HubError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        tracing::info!("Starting hub server on {} (with graceful shutdown)", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| HubError::Bind(e.to_string()))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| HubError::Serve(e.to_string()))?;

        tracing::info!("Hub server shutdown complete");
        Ok(())
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Hub server errors
#[derive(Error, Debug, Clone)]
pub enum HubError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to bind to address
    #[error("Failed to bind: {0}")]
    Bind(String),

    /// Server error
    #[error("Server error: {0}")]
    Serve(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_server() -> HubServer {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(StatusLog::new(dir.path().join("status.log")));
        let publisher = Arc::new(Publisher::with_defaults(log.clone()).unwrap());
        HubServer::new(HubConfig::default(), log, publisher).unwrap()
    }

    #[test]
    fn test_server_creation() {
        let server = test_server();
        assert_eq!(server.state().config.bind_address.port(), 3000);
    }

    #[test]
    fn test_router_builds() {
        let server = test_server();
        let _router = server.build_router();
    }

    #[tokio::test]
    async fn test_state_components() {
        let server = test_server();
        let state = server.state();

        assert_eq!(state.publisher.data_subscribers(), 0);
        assert_eq!(state.log.len_bytes().await, 0);
    }
}

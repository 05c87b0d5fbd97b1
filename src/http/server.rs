//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap an application router with the satellite mirror
//! - Wire up middleware (tracing, request timeout)
//! - Serve on a listener until shutdown is signalled

use std::time::Duration;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::http::middleware::{mirror_middleware, SatelliteMirror};
use crate::satellite::SatelliteError;

/// HTTP server hosting a mirrored application.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Mirror `app` to the satellite named in `config`.
    pub fn new(config: AppConfig, app: Router) -> Result<Self, SatelliteError> {
        let mirror = SatelliteMirror::new(&config.mirror)?;
        Ok(Self::with_mirror(config, app, mirror))
    }

    /// Mirror `app` through an already built mirror.
    pub fn with_mirror(config: AppConfig, app: Router, mirror: SatelliteMirror) -> Self {
        let router = Self::build_router(&config, app, mirror);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, app: Router, mirror: SatelliteMirror) -> Router {
        app.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                .layer(middleware::from_fn_with_state(mirror, mirror_middleware)),
        )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            satellite = %self.config.mirror.satellite_host,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The fully layered router, for serving or in-process calls.
    pub fn into_router(self) -> Router {
        self.router
    }
}

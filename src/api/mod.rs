//! HTTP API server for the sketch board

pub mod board;
pub mod health;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::workflow::Workflow;
use crate::Result;

/// Workflow shared between handlers; one trigger runs at a time
pub type SharedWorkflow = Arc<Mutex<Workflow>>;

/// HTTP server exposing one board session
pub struct ApiServer {
    workflow: SharedWorkflow,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    #[must_use]
    pub fn new(workflow: Workflow, port: u16) -> Self {
        Self {
            workflow: Arc::new(Mutex::new(workflow)),
            port,
            static_dir: None,
        }
    }

    /// Set the static files directory for serving the web UI
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Handle to the session driven by this server
    #[must_use]
    pub fn workflow(&self) -> SharedWorkflow {
        self.workflow.clone()
    }

    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .nest("/api", board::router(self.workflow.clone()))
            .merge(health::router());

        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir =
                ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        }

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}

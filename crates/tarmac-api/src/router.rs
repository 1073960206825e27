//! Router construction and listener plumbing.

use std::net::SocketAddr;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use tarmac_core::LifecycleManager;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{ApiServerError, ApiServerResult};
use crate::handlers;

/// One HTTP surface, ready to serve.
///
/// The write and read APIs are built separately so deployments can bind
/// them to different addresses (or run only one of the two).
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Build the write surface: archive creation from a checkout or an
    /// uploaded stream.
    #[must_use]
    pub fn write(manager: LifecycleManager) -> Self {
        let router = Router::new()
            .route(
                "/archives",
                post(handlers::create_archive).put(handlers::upload_archive),
            )
            .route("/healthz", get(|| async { (StatusCode::OK, "ok\n") }))
            .layer(TraceLayer::new_for_http())
            .with_state(manager);
        Self { router }
    }

    /// Build the read surface: one-shot archive delivery.
    #[must_use]
    pub fn read(manager: LifecycleManager) -> Self {
        let router = Router::new()
            .route("/archives/{id}", get(handlers::read_archive))
            .route("/healthz", get(|| async { (StatusCode::OK, "ok\n") }))
            .layer(TraceLayer::new_for_http())
            .with_state(manager);
        Self { router }
    }

    /// Bind `addr` and serve until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError::Bind`] when the address cannot be bound
    /// and [`ApiServerError::Serve`] when the server exits with an error.
    pub async fn serve(self, addr: SocketAddr) -> ApiServerResult<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        info!(%addr, "api listener bound");

        axum::serve(listener, self.router.into_make_service())
            .await
            .map_err(|source| ApiServerError::Serve { source })
    }

    /// Consume the server and expose its router, for in-process testing.
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }
}

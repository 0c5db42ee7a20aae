//! Gateway server: binds the listener and serves the router.

use crate::api::{create_router, AppState};
use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::info;

/// The HTTP gateway server.
pub struct GatewayServer {
    port: u16,
    router: Router,
}

impl GatewayServer {
    /// Creates a server from shared state; the port comes from the state's
    /// settings.
    pub fn new(state: AppState) -> Self {
        let port = state.settings.port;
        Self {
            port,
            router: create_router(state),
        }
    }

    /// Binds and serves until `shutdown` resolves.
    pub async fn run(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let addr = format!("0.0.0.0:{}", self.port);
        info!("Binding to TCP: {}", addr);

        let listener = TcpListener::bind(&addr).await?;
        info!("Gateway listening on {}", addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Gateway stopped");
        Ok(())
    }
}

//! HTTP server lifecycle: bind, serve, shut down on a signal.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tracing::{error, info};

use crate::config::Config;
use crate::error::Result;
use crate::http;
use crate::store::ContactStore;

/// The phonebook HTTP server.
#[derive(Debug)]
pub struct Server {
    addr: SocketAddr,
    router: Router,
}

impl Server {
    /// Create a server for the given configuration and store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MissingPort`] if no port is configured, or a
    /// configuration error for an invalid host.
    pub fn new(config: &Config, store: Arc<dyn ContactStore>) -> Result<Self> {
        let addr = config.socket_addr()?;
        info!("Using {} contact store", store.backend());
        let router = http::router(store, &config.server);
        Ok(Self { addr, router })
    }

    /// The address the server will bind.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Bind and serve until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or serving fails.
    pub async fn run(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("Server running on port {}", self.addr.port());

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryContactStore;

    #[test]
    fn test_new_requires_port() {
        let config = Config::default();
        let err = Server::new(&config, Arc::new(MemoryContactStore::new())).unwrap_err();
        assert!(matches!(err, crate::Error::MissingPort));
    }

    #[test]
    fn test_new_uses_configured_addr() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = Some(3001);

        let server = Server::new(&config, Arc::new(MemoryContactStore::new())).unwrap();
        assert_eq!(server.addr(), "127.0.0.1:3001".parse().unwrap());
    }
}

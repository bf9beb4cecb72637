//! casegen server - HTTP API and CLI
//!
//! Exposes the service flows over warp: OAuth login, repository browsing,
//! e2e and contract generation, reconciliation and the GitHub webhook.
//!
//! # Example
//!
//! ```rust,ignore
//! use casegen_server::serve;
//! use casegen_service::ServiceConfig;
//!
//! let config = ServiceConfig::load(None)?;
//! serve(&config, shutdown_signal()).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cli;
pub mod error;
pub mod routes;

pub use error::{handle_rejection, ServerError};
pub use routes::routes;

use casegen_service::{ServiceConfig, TestCaseService};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Listen address from server settings
///
/// # Errors
/// - `ServerError::InvalidAddress` if host and port do not parse
pub fn listen_addr(config: &ServiceConfig) -> Result<SocketAddr, ServerError> {
    let raw = format!("{}:{}", config.server.host, config.server.port);
    raw.parse()
        .map_err(|e: std::net::AddrParseError| ServerError::InvalidAddress(format!("{raw}: {e}")))
}

/// Build the service and serve until `shutdown` resolves
///
/// # Errors
/// Returns error if the configuration is invalid or the listener cannot bind
pub async fn serve(
    config: &ServiceConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let addr = listen_addr(config)?;
    let service = Arc::new(TestCaseService::from_config(config)?);
    tracing::info!(?service, "service ready");

    let (bound, server) =
        warp::serve(routes(service)).try_bind_with_graceful_shutdown(addr, shutdown)?;
    tracing::info!(%bound, "listening");

    server.await;
    tracing::info!("server stopped");
    Ok(())
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn listen_addr_from_settings() {
        let config = ServiceConfig::new().with_port(9000);
        assert_eq!(listen_addr(&config).unwrap().to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn bad_host_rejected() {
        let mut config = ServiceConfig::new();
        config.server.host = "not a host".into();
        assert!(matches!(
            listen_addr(&config),
            Err(ServerError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn serve_rejects_invalid_config() {
        let err = serve(&ServiceConfig::new(), async {}).await.unwrap_err();
        assert!(matches!(err, ServerError::Service(_)));
    }
}

//! services/api/src/adapters/connectivity.rs
//!
//! Implementations of the `ConnectivityProbe` port.

use async_trait::async_trait;
use journal_core::ports::ConnectivityProbe;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// Reports the network as reachable when a TCP connection to `host` opens within `timeout`.
#[derive(Clone, Debug)]
pub struct TcpConnectivityProbe {
    host: String,
    timeout: Duration,
}

impl TcpConnectivityProbe {
    pub fn new(host: impl Into<String>, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ConnectivityProbe for TcpConnectivityProbe {
    async fn is_reachable(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.host)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                debug!(host = %self.host, "Connectivity probe failed: {}", e);
                false
            }
            Err(_) => {
                debug!(host = %self.host, "Connectivity probe timed out");
                false
            }
        }
    }
}

/// A probe with a fixed answer. Used when no backend is configured.
#[derive(Clone, Copy, Debug)]
pub struct FixedConnectivity(pub bool);

#[async_trait]
impl ConnectivityProbe for FixedConnectivity {
    async fn is_reachable(&self) -> bool {
        self.0
    }
}

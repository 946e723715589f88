//! Point-in-time network reachability.

use async_trait::async_trait;
use std::time::Duration;
use tokio::net::{lookup_host, TcpStream};
use tracing::debug;

/// Answers "is the network reachable right now".
///
/// Callers check once per decision; a change while a request is in flight is
/// only seen by the next decision.
#[async_trait]
pub trait Connectivity: Send + Sync {
  async fn is_connected(&self) -> bool;
}

/// Connectivity pinned to a value (`--offline`, tests).
#[derive(Debug, Clone, Copy)]
pub struct FixedConnectivity(pub bool);

#[async_trait]
impl Connectivity for FixedConnectivity {
  async fn is_connected(&self) -> bool {
    self.0
  }
}

/// TCP connect probe against the API host.
///
/// Resolution and every connect attempt share one timeout, so a probe never
/// takes longer than `timeout` and can be cancelled at any point.
#[derive(Debug, Clone)]
pub struct NetworkProbe {
  address: String,
  timeout: Duration,
}

impl NetworkProbe {
  /// `address` is `host:port`
  pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
    Self {
      address: address.into(),
      timeout,
    }
  }

  async fn probe(&self) -> bool {
    let addrs = match lookup_host(self.address.as_str()).await {
      Ok(addrs) => addrs,
      Err(e) => {
        debug!(address = %self.address, error = %e, "probe address did not resolve");
        return false;
      }
    };

    for addr in addrs {
      if TcpStream::connect(addr).await.is_ok() {
        return true;
      }
    }
    false
  }
}

#[async_trait]
impl Connectivity for NetworkProbe {
  async fn is_connected(&self) -> bool {
    let connected = tokio::time::timeout(self.timeout, self.probe())
      .await
      .unwrap_or(false);
    debug!(address = %self.address, connected, "connectivity probe");
    connected
  }
}

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::config::ConnectivityConfig;
use crate::error::{Error, Result};

#[async_trait]
pub trait Reachability: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// Considers the network up when a TCP connection to `address` succeeds within `timeout`.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    address: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }

    pub fn from_config(cfg: &ConnectivityConfig) -> Self {
        Self::new(cfg.probe_address.clone(), cfg.timeout)
    }
}

#[async_trait]
impl Reachability for TcpProbe {
    async fn is_reachable(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.address)).await {
            Ok(Ok(_)) => true,
            Ok(Err(err)) => {
                debug!(address = %self.address, error = %err, "probe connect failed");
                false
            }
            Err(_) => {
                debug!(address = %self.address, "probe timed out");
                false
            }
        }
    }
}

/// Poll `probe` up to `attempts` times, `interval` apart.
pub async fn wait_for_network(
    probe: &dyn Reachability,
    attempts: u32,
    interval: Duration,
) -> Result<()> {
    for attempt in 1..=attempts {
        if probe.is_reachable().await {
            debug!(attempt, "network reachable");
            return Ok(());
        }
        if attempt < attempts {
            info!(attempt, attempts, "network unreachable; waiting");
            tokio::time::sleep(interval).await;
        }
    }
    warn!(attempts, "network still unreachable; giving up");
    Err(Error::Offline { attempts })
}

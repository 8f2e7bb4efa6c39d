//! Single-address liveness probes.
//!
//! A host is alive when `GET http://{address}:{port}{path}` returns a body
//! containing the configured marker (`"status":200` by default). The body is
//! not parsed; substring containment is the whole contract.

use anyhow::Context;
use async_trait::async_trait;
use seekr_common::config::Config;
use seekr_common::error::ProbeError;
use seekr_common::network::address::Address;
use tracing::debug;

/// Result of one probe. Built once per probe and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub address: Address,
    pub alive: bool,
}

#[async_trait]
pub trait LivenessChecker: Send + Sync {
    /// Probes `address` once. A reachable host with the wrong body is
    /// `Ok(false)`; transport failures are errors.
    async fn probe(&self, address: &Address) -> Result<bool, ProbeError>;

    /// Same as [`probe`](Self::probe) with every failure collapsed to "not alive".
    async fn is_alive(&self, address: &Address) -> bool {
        match self.probe(address).await {
            Ok(alive) => alive,
            Err(e) => {
                debug!("{} probe failed: {e}", e.kind());
                false
            }
        }
    }

    async fn check(&self, address: &Address) -> ProbeOutcome {
        ProbeOutcome {
            address: address.clone(),
            alive: self.is_alive(address).await,
        }
    }
}

/// Probes over HTTP with one shared connection pool.
///
/// `reqwest::Client` is internally reference counted, so all scan workers
/// share it without extra locking.
#[derive(Debug, Clone)]
pub struct HttpLivenessChecker {
    client: reqwest::Client,
    port: u16,
    path: String,
    marker: String,
}

impl HttpLivenessChecker {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(cfg.connect_timeout())
            .timeout(cfg.request_timeout())
            .no_proxy()
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            client,
            port: cfg.port,
            path: cfg.probe_path.clone(),
            marker: cfg.alive_marker.clone(),
        })
    }

    pub fn url_for(&self, address: &Address) -> String {
        format!("http://{}:{}{}", address, self.port, self.path)
    }
}

#[async_trait]
impl LivenessChecker for HttpLivenessChecker {
    async fn probe(&self, address: &Address) -> Result<bool, ProbeError> {
        let response = self
            .client
            .get(self.url_for(address))
            .send()
            .await
            .map_err(|e| classify(address, e))?;

        let body = response.text().await.map_err(|e| classify(address, e))?;
        Ok(body.contains(&self.marker))
    }
}

fn classify(address: &Address, err: reqwest::Error) -> ProbeError {
    let address = address.to_string();
    if err.is_timeout() {
        ProbeError::Timeout { address }
    } else if err.is_connect() {
        ProbeError::Unreachable {
            address,
            reason: err.to_string(),
        }
    } else {
        ProbeError::Io {
            address,
            reason: err.to_string(),
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

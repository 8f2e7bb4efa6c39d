//! Stubs shared by the unit tests of this crate.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use seekr_common::error::ProbeError;
use seekr_common::network::address::Address;

use crate::liveness::LivenessChecker;

type ProbeHook = Box<dyn Fn(&str, usize) + Send + Sync>;

/// Answers from a fixed set of live addresses.
///
/// Live hosts answer immediately unless `with_live_latency` is set. Dead hosts
/// wait a random 1..=`max_latency` ms (when set) and then fail, alternating
/// between a wrong body and a timeout so both failure paths are exercised.
pub(crate) struct StubChecker {
    alive: HashSet<String>,
    max_latency_ms: u64,
    max_live_latency_ms: u64,
    probes: Mutex<Vec<String>>,
    hook: Option<ProbeHook>,
}

impl StubChecker {
    pub(crate) fn alive(addresses: &[&str]) -> Self {
        Self {
            alive: addresses.iter().map(|a| a.to_string()).collect(),
            max_latency_ms: 0,
            max_live_latency_ms: 0,
            probes: Mutex::new(Vec::new()),
            hook: None,
        }
    }

    pub(crate) fn with_latency(mut self, max_ms: u64) -> Self {
        self.max_latency_ms = max_ms;
        self
    }

    /// Live hosts also wait a random 1..=`max_ms` before answering.
    pub(crate) fn with_live_latency(mut self, max_ms: u64) -> Self {
        self.max_live_latency_ms = max_ms;
        self
    }

    /// Called with the address and the 1-based probe count as each probe starts.
    pub(crate) fn on_probe(mut self, hook: impl Fn(&str, usize) + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub(crate) fn probes(&self) -> Vec<String> {
        self.probes.lock().unwrap().clone()
    }
}

#[async_trait]
impl LivenessChecker for StubChecker {
    async fn probe(&self, address: &Address) -> Result<bool, ProbeError> {
        let nth = {
            let mut probes = self.probes.lock().unwrap();
            probes.push(address.to_string());
            probes.len()
        };
        if let Some(hook) = &self.hook {
            hook(address.as_str(), nth);
        }

        if self.alive.contains(address.as_str()) {
            random_delay(self.max_live_latency_ms).await;
            return Ok(true);
        }

        random_delay(self.max_latency_ms).await;

        if nth % 2 == 0 {
            Ok(false)
        } else {
            Err(ProbeError::Timeout {
                address: address.to_string(),
            })
        }
    }
}

async fn random_delay(max_ms: u64) {
    if max_ms > 0 {
        let ms = rand::random_range(1..=max_ms);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

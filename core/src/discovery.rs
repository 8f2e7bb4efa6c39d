//! # Host Discovery Service
//!
//! Implements the core "find my server" use case.
//!
//! A session first re-probes the last confirmed address. Only when that fails
//! (or nothing is cached) does it derive the candidate subnets from the local
//! IPv4 address and sweep them with the [`SubnetScanner`]. The listener hears
//! exactly one terminal callback per session unless the session is cancelled.

use std::net::Ipv4Addr;
use std::sync::Arc;

use anyhow::Context;
use seekr_common::error::NetworkError;
use seekr_common::network::address::Address;
use seekr_common::network::interface::LocalNetwork;
use seekr_common::network::space::AddressSpace;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::ResultCache;
use crate::events::{DiscoveryEvent, EventSink};
use crate::liveness::LivenessChecker;
use crate::scanner::{ProgressFn, SubnetScanner};
use crate::session::{DiscoverySession, DiscoveryState};

mod notify;

pub use notify::{DiscoveryListener, Notifier, spawn_dispatcher};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    Found(Address),
    NotFound,
}

/// Application service for host discovery.
///
/// Orchestrates the process by:
/// 1. re-checking the cached address through the [`LivenessChecker`].
/// 2. falling back to a [`SubnetScanner`] sweep of the local address space.
/// 3. persisting the winner and reporting through the listener and [`EventSink`].
pub struct DiscoveryService {
    checker: Arc<dyn LivenessChecker>,
    scanner: SubnetScanner,
    cache: ResultCache,
    network: Arc<dyn LocalNetwork>,
    events: Arc<dyn EventSink>,
    fallback_subnets: bool,
}

impl DiscoveryService {
    pub fn new(
        checker: Arc<dyn LivenessChecker>,
        cache: ResultCache,
        network: Arc<dyn LocalNetwork>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            scanner: SubnetScanner::new(Arc::clone(&checker)),
            checker,
            cache,
            network,
            events,
            fallback_subnets: true,
        }
    }

    /// Whether the neighbouring 192.168.0/1 network is scanned too.
    pub fn with_fallback_subnets(mut self, enabled: bool) -> Self {
        self.fallback_subnets = enabled;
        self
    }

    /// Starts a session on the runtime and returns immediately.
    ///
    /// Callbacks go to `listener` on a dedicated dispatcher task.
    pub fn start<L: DiscoveryListener>(self: &Arc<Self>, listener: L) -> DiscoveryHandle {
        let session = Arc::new(DiscoverySession::new());
        let (notifier, dispatcher) = spawn_dispatcher(listener);

        let service = Arc::clone(self);
        let task_session = Arc::clone(&session);
        let task = tokio::spawn(async move { service.run(&task_session, &notifier).await });

        DiscoveryHandle {
            session,
            task,
            dispatcher,
        }
    }

    /// Drives one session to its end.
    ///
    /// Returns `None` when the session was cancelled before reaching a result.
    pub async fn run(
        &self,
        session: &Arc<DiscoverySession>,
        notifier: &Notifier,
    ) -> Option<DiscoveryOutcome> {
        if session.is_cancelled() {
            return self.cancelled(session);
        }
        session.transition(DiscoveryState::CheckingCache);

        match self.cached_address().await {
            Some(cached) => {
                debug!("checking last discovered host {cached}");
                // A cancel arriving during this probe does not suppress a hit,
                // same as a scan winner claimed before the workers stop.
                if self.checker.is_alive(&cached).await {
                    session.claim(cached.clone());
                    return Some(self.found(session, notifier, cached).await);
                }
                debug!("scanning subnet because last discovered host failed");
            }
            None => debug!("no cached host, scanning subnet"),
        }

        if session.is_cancelled() {
            return self.cancelled(session);
        }
        session.transition(DiscoveryState::Scanning);

        let local_ip = match self.local_ipv4().await {
            Ok(ip) => ip,
            Err(e) => {
                warn!("cannot scan for hosts: {e}");
                return Some(self.not_found(session, notifier));
            }
        };

        let space = AddressSpace::for_local(local_ip, self.fallback_subnets);
        info!("scanning {} candidate hosts in {space}", space.len());

        let progress_notifier = notifier.clone();
        let on_progress: ProgressFn = Arc::new(move |percent| progress_notifier.progress(percent));

        match self.scanner.scan(&space, session, Some(on_progress)).await {
            Some(address) => Some(self.found(session, notifier, address).await),
            None if session.is_cancelled() => self.cancelled(session),
            None => Some(self.not_found(session, notifier)),
        }
    }

    // Store and interface lookups block; they run on the blocking pool.

    async fn cached_address(&self) -> Option<Address> {
        let cache = self.cache.clone();
        tokio::task::spawn_blocking(move || cache.get())
            .await
            .unwrap_or_else(|e| {
                warn!("cache read task failed: {e}");
                None
            })
    }

    async fn persist(&self, address: &Address) {
        let cache = self.cache.clone();
        let winner = address.clone();
        match tokio::task::spawn_blocking(move || cache.set(&winner)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("could not persist {address}: {e}"),
            Err(e) => warn!("cache write task failed: {e}"),
        }
    }

    async fn local_ipv4(&self) -> Result<Ipv4Addr, NetworkError> {
        let network = Arc::clone(&self.network);
        tokio::task::spawn_blocking(move || network.local_ipv4())
            .await
            .unwrap_or_else(|e| {
                warn!("local network lookup failed: {e}");
                Err(NetworkError::NoLocalNetwork)
            })
    }

    async fn found(
        &self,
        session: &DiscoverySession,
        notifier: &Notifier,
        address: Address,
    ) -> DiscoveryOutcome {
        self.persist(&address).await;
        session.transition(DiscoveryState::Found);
        info!("found host at {address}");
        notifier.host_found(&address);
        DiscoveryOutcome::Found(address)
    }

    fn not_found(&self, session: &DiscoverySession, notifier: &Notifier) -> DiscoveryOutcome {
        session.transition(DiscoveryState::NotFound);
        warn!("no host answered on the local network");
        notifier.no_host_found();
        self.events.publish(DiscoveryEvent::ConnectFailed);
        DiscoveryOutcome::NotFound
    }

    fn cancelled(&self, session: &DiscoverySession) -> Option<DiscoveryOutcome> {
        session.transition(DiscoveryState::Cancelled);
        None
    }
}

/// A running discovery session.
pub struct DiscoveryHandle {
    session: Arc<DiscoverySession>,
    task: JoinHandle<Option<DiscoveryOutcome>>,
    dispatcher: JoinHandle<()>,
}

impl DiscoveryHandle {
    /// Requests cancellation. A winner that was already claimed may still be
    /// reported; nothing else will be.
    pub fn cancel(&self) {
        self.session.cancel();
    }

    pub fn session(&self) -> Arc<DiscoverySession> {
        Arc::clone(&self.session)
    }

    /// Waits for the session and for every queued callback to be delivered.
    pub async fn wait(self) -> anyhow::Result<Option<DiscoveryOutcome>> {
        let outcome = self.task.await.context("discovery task failed")?;
        self.dispatcher.await.context("listener dispatcher failed")?;
        Ok(outcome)
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

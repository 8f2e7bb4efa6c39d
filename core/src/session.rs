//! Per-request discovery state shared between the coordinator and its scan
//! workers.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};

use seekr_common::network::address::Address;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    Idle,
    CheckingCache,
    Scanning,
    Found,
    NotFound,
    /// Ended silently after `cancel()`.
    Cancelled,
}

impl DiscoveryState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DiscoveryState::Found | DiscoveryState::NotFound | DiscoveryState::Cancelled
        )
    }
}

/// Cancellation flag plus the write-once winner slot.
///
/// Workers call [`should_stop`](Self::should_stop) before every probe; the
/// first live host goes through [`claim`](Self::claim), and exactly one claim
/// per session succeeds.
#[derive(Debug)]
pub struct DiscoverySession {
    cancelled: AtomicBool,
    winner: OnceLock<Address>,
    probes: AtomicUsize,
    state: Mutex<DiscoveryState>,
}

impl Default for DiscoverySession {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoverySession {
    pub fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            winner: OnceLock::new(),
            probes: AtomicUsize::new(0),
            state: Mutex::new(DiscoveryState::Idle),
        }
    }

    /// Stops workers from starting new probes. In-flight probes finish.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            debug!("discovery session cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Records `address` as the winner. Returns `false` if another worker got
    /// there first; the stored winner is never replaced.
    pub fn claim(&self, address: Address) -> bool {
        self.winner.set(address).is_ok()
    }

    pub fn winner(&self) -> Option<&Address> {
        self.winner.get()
    }

    pub fn should_stop(&self) -> bool {
        self.is_cancelled() || self.winner.get().is_some()
    }

    pub(crate) fn record_probe(&self) {
        self.probes.fetch_add(1, Ordering::Relaxed);
    }

    /// Scan probes started so far. The cache check is not counted.
    pub fn probes_started(&self) -> usize {
        self.probes.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> DiscoveryState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn transition(&self, next: DiscoveryState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        debug!("discovery state {:?} -> {:?}", *state, next);
        *state = next;
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

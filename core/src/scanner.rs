//! Concurrent sweep of an [`AddressSpace`].
//!
//! Every half-range gets its own worker task that walks its addresses in
//! order. Workers check the session before each probe and stop as soon as the
//! session is cancelled or any worker has claimed a winner. In-flight probes
//! are never interrupted.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use seekr_common::network::address::Address;
use seekr_common::network::range::SubnetRange;
use seekr_common::network::space::AddressSpace;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::liveness::LivenessChecker;
use crate::session::DiscoverySession;

/// Receives scan progress as a whole percentage of candidates probed.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

pub struct SubnetScanner {
    checker: Arc<dyn LivenessChecker>,
}

impl SubnetScanner {
    pub fn new(checker: Arc<dyn LivenessChecker>) -> Self {
        Self { checker }
    }

    /// Probes `space` until one host answers or every worker runs dry.
    ///
    /// Returns the session's winner, which may also have been claimed before
    /// the scan started.
    pub async fn scan(
        &self,
        space: &AddressSpace,
        session: &Arc<DiscoverySession>,
        on_progress: Option<ProgressFn>,
    ) -> Option<Address> {
        let progress = Arc::new(Progress::new(space.len(), on_progress));
        let mut workers = JoinSet::new();

        for part in space.partitions() {
            let checker = Arc::clone(&self.checker);
            let session = Arc::clone(session);
            let progress = Arc::clone(&progress);
            workers.spawn(walk_range(part, checker, session, progress));
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("scan worker failed: {e}");
            }
        }

        session.winner().cloned()
    }
}

async fn walk_range(
    range: SubnetRange,
    checker: Arc<dyn LivenessChecker>,
    session: Arc<DiscoverySession>,
    progress: Arc<Progress>,
) {
    debug!("worker scanning {range}");

    for ip in range.iter() {
        if session.should_stop() {
            debug!("worker for {range} stopping early");
            return;
        }

        session.record_probe();
        let outcome = checker.check(&Address::from(ip)).await;
        progress.tick();

        if outcome.alive {
            let address = outcome.address;
            if session.claim(address.clone()) {
                info!("{address} answered the liveness probe");
            } else {
                debug!("{address} answered after another worker won");
            }
            return;
        }
    }
}

struct Progress {
    total: usize,
    done: AtomicUsize,
    last_percent: AtomicU8,
    callback: Option<ProgressFn>,
}

impl Progress {
    fn new(total: usize, callback: Option<ProgressFn>) -> Self {
        Self {
            total,
            done: AtomicUsize::new(0),
            last_percent: AtomicU8::new(0),
            callback,
        }
    }

    /// Fires the callback only when the whole percentage goes up.
    fn tick(&self) {
        let Some(callback) = &self.callback else {
            return;
        };
        let done = self.done.fetch_add(1, Ordering::AcqRel) + 1;
        let percent = (done * 100 / self.total.max(1)).min(100) as u8;
        let previous = self.last_percent.fetch_max(percent, Ordering::AcqRel);
        if percent > previous {
            callback(percent);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::StubChecker;
    use std::collections::HashSet;
    use std::net::Ipv4Addr;
    use std::sync::Mutex;

    fn ten_net() -> AddressSpace {
        AddressSpace::for_local(Ipv4Addr::new(10, 0, 0, 9), true)
    }

    #[tokio::test]
    async fn finds_the_only_live_host() {
        for _ in 0..10 {
            let checker = Arc::new(
                StubChecker::alive(&["192.168.0.200"])
                    .with_latency(2)
                    .with_live_latency(4),
            );
            let scanner = SubnetScanner::new(checker.clone());
            let session = Arc::new(DiscoverySession::new());
            let space = AddressSpace::for_local(Ipv4Addr::new(192, 168, 1, 4), true);

            let found = scanner.scan(&space, &session, None).await;
            assert_eq!(found.unwrap().as_str(), "192.168.0.200");
        }
    }

    #[tokio::test]
    async fn exhaustion_probes_every_address_once() {
        let checker = Arc::new(StubChecker::alive(&[]));
        let scanner = SubnetScanner::new(checker.clone());
        let session = Arc::new(DiscoverySession::new());
        let space = AddressSpace::for_local(Ipv4Addr::new(192, 168, 1, 4), true);

        assert_eq!(scanner.scan(&space, &session, None).await, None);

        let probes = checker.probes();
        let unique: HashSet<&String> = probes.iter().collect();
        assert_eq!(probes.len(), 510);
        assert_eq!(unique.len(), 510);
        assert_eq!(session.probes_started(), 510);
    }

    #[tokio::test]
    async fn winner_is_written_once() {
        for _ in 0..20 {
            let checker = Arc::new(
                StubChecker::alive(&["10.0.0.10", "10.0.0.200"])
                    .with_latency(3)
                    .with_live_latency(6),
            );
            let scanner = SubnetScanner::new(checker);
            let session = Arc::new(DiscoverySession::new());

            let found = scanner.scan(&ten_net(), &session, None).await.unwrap();
            assert!(["10.0.0.10", "10.0.0.200"].contains(&found.as_str()));
            assert_eq!(session.winner(), Some(&found));
        }
    }

    #[tokio::test]
    async fn siblings_stop_after_a_win() {
        let checker = Arc::new(StubChecker::alive(&["10.0.0.1"]).with_latency(1));
        let scanner = SubnetScanner::new(checker.clone());
        let session = Arc::new(DiscoverySession::new());

        scanner.scan(&ten_net(), &session, None).await.unwrap();

        // The upper-half worker can be at most one probe ahead of the winner.
        assert!(checker.probes().len() <= 2, "{:?}", checker.probes());
    }

    #[tokio::test]
    async fn cancelled_session_starts_no_probes() {
        let checker = Arc::new(StubChecker::alive(&["10.0.0.50"]));
        let scanner = SubnetScanner::new(checker.clone());
        let session = Arc::new(DiscoverySession::new());
        session.cancel();

        assert_eq!(scanner.scan(&ten_net(), &session, None).await, None);
        assert!(checker.probes().is_empty());
    }

    #[tokio::test]
    async fn cancel_mid_scan_stops_new_probes() {
        const CANCEL_AT: usize = 40;
        let session = Arc::new(DiscoverySession::new());
        let hook_session = Arc::clone(&session);
        let checker = Arc::new(
            StubChecker::alive(&[])
                .with_latency(1)
                .on_probe(move |_, nth| {
                    if nth == CANCEL_AT {
                        hook_session.cancel();
                    }
                }),
        );
        let scanner = SubnetScanner::new(checker.clone());

        assert_eq!(scanner.scan(&ten_net(), &session, None).await, None);

        // Two workers: the other one may finish the probe it already started.
        let probed = checker.probes().len();
        assert!(probed >= CANCEL_AT && probed <= CANCEL_AT + 1, "probed {probed}");
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_completes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let on_progress: ProgressFn = Arc::new(move |p| sink.lock().unwrap().push(p));

        let scanner = SubnetScanner::new(Arc::new(StubChecker::alive(&[])));
        let session = Arc::new(DiscoverySession::new());
        scanner.scan(&ten_net(), &session, Some(on_progress)).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.iter().collect::<HashSet<_>>().len() == seen.len());
        assert!(seen.iter().all(|p| (1..=100).contains(p)));
    }
}

//! Serialized delivery of listener callbacks.
//!
//! The listener is owned by a single dispatcher task and only ever called
//! from there, so callbacks never overlap. [`Notifier`] is the sending half,
//! cloned into whatever needs to report progress.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use seekr_common::network::address::Address;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::warn;

/// Receives the outcome of a discovery session.
///
/// Per session, exactly one of `on_host_found` / `on_no_host_found` is called,
/// unless the session was cancelled first. Progress updates only arrive
/// before that terminal call.
pub trait DiscoveryListener: Send + 'static {
    fn on_host_found(&mut self, address: &Address);
    fn on_no_host_found(&mut self);
    fn on_progress_update(&mut self, _percent: u8) {}
}

#[derive(Debug)]
enum Notification {
    Progress(u8),
    HostFound(Address),
    NoHostFound,
}

#[derive(Debug, Clone)]
pub struct Notifier {
    tx: UnboundedSender<Notification>,
    terminated: Arc<AtomicBool>,
}

impl Notifier {
    pub fn progress(&self, percent: u8) {
        if !self.terminated.load(Ordering::Acquire) {
            let _ = self.tx.send(Notification::Progress(percent));
        }
    }

    /// Queues the terminal "found" callback. Returns `false` if a terminal
    /// callback was already queued.
    pub fn host_found(&self, address: &Address) -> bool {
        self.terminal(Notification::HostFound(address.clone()))
    }

    pub fn no_host_found(&self) -> bool {
        self.terminal(Notification::NoHostFound)
    }

    fn terminal(&self, notification: Notification) -> bool {
        if self
            .terminated
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("dropping second terminal notification {notification:?}");
            return false;
        }
        let _ = self.tx.send(notification);
        true
    }
}

/// Spawns the dispatcher for `listener`. It exits once every [`Notifier`]
/// clone has been dropped.
pub fn spawn_dispatcher<L: DiscoveryListener>(listener: L) -> (Notifier, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let notifier = Notifier {
        tx,
        terminated: Arc::new(AtomicBool::new(false)),
    };
    let handle = tokio::spawn(dispatch(listener, rx));
    (notifier, handle)
}

async fn dispatch<L: DiscoveryListener>(mut listener: L, mut rx: UnboundedReceiver<Notification>) {
    let mut finished = false;
    let mut last_percent = 0u8;

    while let Some(notification) = rx.recv().await {
        if finished {
            continue;
        }
        match notification {
            Notification::Progress(percent) if percent > last_percent => {
                last_percent = percent;
                listener.on_progress_update(percent);
            }
            Notification::Progress(_) => {}
            Notification::HostFound(address) => {
                finished = true;
                listener.on_host_found(&address);
            }
            Notification::NoHostFound => {
                finished = true;
                listener.on_no_host_found();
            }
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
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Heard {
        Found(String),
        NotFound,
        Progress(u8),
    }

    struct Recorder(Arc<Mutex<Vec<Heard>>>);

    impl DiscoveryListener for Recorder {
        fn on_host_found(&mut self, address: &Address) {
            self.0.lock().unwrap().push(Heard::Found(address.to_string()));
        }
        fn on_no_host_found(&mut self) {
            self.0.lock().unwrap().push(Heard::NotFound);
        }
        fn on_progress_update(&mut self, percent: u8) {
            self.0.lock().unwrap().push(Heard::Progress(percent));
        }
    }

    #[tokio::test]
    async fn only_the_first_terminal_is_delivered() {
        let heard = Arc::new(Mutex::new(Vec::new()));
        let (notifier, dispatcher) = spawn_dispatcher(Recorder(heard.clone()));

        notifier.progress(10);
        assert!(notifier.host_found(&"10.0.0.50".parse().unwrap()));
        assert!(!notifier.no_host_found());
        assert!(!notifier.host_found(&"10.0.0.60".parse().unwrap()));
        notifier.progress(20);
        drop(notifier);
        dispatcher.await.unwrap();

        assert_eq!(
            *heard.lock().unwrap(),
            vec![Heard::Progress(10), Heard::Found("10.0.0.50".into())]
        );
    }

    #[tokio::test]
    async fn stale_progress_is_dropped() {
        let heard = Arc::new(Mutex::new(Vec::new()));
        let (notifier, dispatcher) = spawn_dispatcher(Recorder(heard.clone()));

        for percent in [5, 3, 7, 7, 6, 9] {
            notifier.progress(percent);
        }
        notifier.no_host_found();
        drop(notifier);
        dispatcher.await.unwrap();

        assert_eq!(
            *heard.lock().unwrap(),
            vec![
                Heard::Progress(5),
                Heard::Progress(7),
                Heard::Progress(9),
                Heard::NotFound
            ]
        );
    }
}

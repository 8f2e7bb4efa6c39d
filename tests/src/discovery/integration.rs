#![cfg(test)]
use seekr_common::config::Config;
use seekr_common::network::address::Address;
use seekr_common::network::interface::StaticNetwork;
use seekr_core::cache::{KeyValueStore, LAST_DISCOVERED_HOST, ResultCache, TomlFileStore};
use seekr_core::discovery::{DiscoveryListener, DiscoveryOutcome, DiscoveryService};
use seekr_core::events::LogEventSink;
use seekr_core::liveness::HttpLivenessChecker;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Any 127.0.0.x works as "our" address: the scan then covers 127.0.0.1-255,
/// where only 127.0.0.1 has the responder bound.
const LOOPBACK_LOCAL: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 9);

/// Answers every request on 127.0.0.1 with `body`.
async fn responder(body: &'static str) -> u16 {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
            });
        }
    });

    port
}

fn cache_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir()
        .join(format!("seekr-it-{}", std::process::id()))
        .join(format!("{name}.toml"));
    let _ = std::fs::remove_file(&path);
    path
}

#[derive(Clone, Default)]
struct Terminals(Arc<Mutex<Vec<Option<String>>>>);

impl DiscoveryListener for Terminals {
    fn on_host_found(&mut self, address: &Address) {
        self.0.lock().unwrap().push(Some(address.to_string()));
    }

    fn on_no_host_found(&mut self) {
        self.0.lock().unwrap().push(None);
    }
}

fn service(port: u16, store: Arc<dyn KeyValueStore>) -> Arc<DiscoveryService> {
    let cfg = Config {
        port,
        request_timeout_ms: 500,
        ..Config::default()
    };
    let checker = Arc::new(HttpLivenessChecker::new(&cfg).unwrap());

    Arc::new(
        DiscoveryService::new(
            checker,
            ResultCache::new(store),
            Arc::new(StaticNetwork(LOOPBACK_LOCAL)),
            Arc::new(LogEventSink),
        )
        .with_fallback_subnets(false),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn finds_loopback_responder_and_caches_it() {
    let port = responder(r#"{"status":200,"name":"media"}"#).await;
    let path = cache_path("finds_loopback");
    let store: Arc<dyn KeyValueStore> = Arc::new(TomlFileStore::new(&path));
    let service = service(port, store.clone());

    let listener = Terminals::default();
    let handle = service.start(listener.clone());
    let first_session = handle.session();
    let outcome = handle.wait().await.unwrap();

    let localhost: Address = "127.0.0.1".parse().unwrap();
    assert_eq!(outcome, Some(DiscoveryOutcome::Found(localhost.clone())));
    assert_eq!(*listener.0.lock().unwrap(), vec![Some("127.0.0.1".to_string())]);
    assert!(first_session.probes_started() >= 1);
    assert_eq!(
        store.get(LAST_DISCOVERED_HOST).unwrap().as_deref(),
        Some("127.0.0.1")
    );

    // The second run is answered from the cache without scanning.
    let listener = Terminals::default();
    let handle = service.start(listener.clone());
    let second_session = handle.session();
    let outcome = handle.wait().await.unwrap();

    assert_eq!(outcome, Some(DiscoveryOutcome::Found(localhost)));
    assert_eq!(second_session.probes_started(), 0);
    assert_eq!(listener.0.lock().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn wrong_body_everywhere_is_not_found() {
    let port = responder(r#"{"status":"starting"}"#).await;
    let path = cache_path("wrong_body");
    let store: Arc<dyn KeyValueStore> = Arc::new(TomlFileStore::new(&path));
    let service = service(port, store.clone());

    let listener = Terminals::default();
    let handle = service.start(listener.clone());
    let session = handle.session();
    let outcome = handle.wait().await.unwrap();

    assert_eq!(outcome, Some(DiscoveryOutcome::NotFound));
    assert_eq!(*listener.0.lock().unwrap(), vec![None]);
    assert_eq!(session.probes_started(), 255);
    assert_eq!(store.get(LAST_DISCOVERED_HOST).unwrap(), None);
}

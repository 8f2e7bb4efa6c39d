use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use colored::*;
use indicatif::ProgressBar;
use seekr_common::config::Config;
use seekr_common::network::address::Address;
use seekr_common::network::interface::{InterfaceNetwork, LocalNetwork, StaticNetwork};
use seekr_core::cache::{KeyValueStore, MemoryStore, ResultCache, TomlFileStore};
use seekr_core::discovery::{DiscoveryListener, DiscoveryOutcome, DiscoveryService};
use seekr_core::events::LogEventSink;
use seekr_core::liveness::HttpLivenessChecker;
use tracing::{debug, warn};

use crate::commands::FindArgs;
use crate::terminal::{colors, print, spinner};

/// Exit status after Ctrl-C, as shells report SIGINT.
const EXIT_CANCELLED: u8 = 130;

/// Mirrors session progress on the spinner.
struct SpinnerListener {
    bar: ProgressBar,
}

impl DiscoveryListener for SpinnerListener {
    fn on_host_found(&mut self, address: &Address) {
        self.bar.set_message(format!("Found {address}"));
    }

    fn on_no_host_found(&mut self) {
        self.bar.set_message("No host answered");
    }

    fn on_progress_update(&mut self, percent: u8) {
        spinner::report_progress(&self.bar, percent);
    }
}

pub async fn find(cfg: &Config, args: &FindArgs, quiet: bool) -> anyhow::Result<ExitCode> {
    let service = Arc::new(build_service(cfg, args)?);

    let spinner = spinner::Spinner::start("Looking for the server", quiet);
    let start_time: Instant = Instant::now();

    let handle = service.start(SpinnerListener { bar: spinner.bar() });
    let session = handle.session();
    let wait = handle.wait();
    tokio::pin!(wait);

    let outcome = tokio::select! {
        outcome = &mut wait => outcome?,
        Ok(()) = tokio::signal::ctrl_c() => {
            warn!("stopping discovery");
            session.cancel();
            wait.await?
        }
    };
    drop(spinner);

    let elapsed = start_time.elapsed();
    match outcome {
        Some(DiscoveryOutcome::Found(address)) => {
            host_found(&address, elapsed, session.probes_started(), quiet);
            Ok(ExitCode::SUCCESS)
        }
        Some(DiscoveryOutcome::NotFound) => {
            no_host_found(elapsed, session.probes_started(), quiet);
            Ok(ExitCode::FAILURE)
        }
        None => {
            warn!("discovery cancelled after {} probes", session.probes_started());
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
    }
}

fn build_service(cfg: &Config, args: &FindArgs) -> anyhow::Result<DiscoveryService> {
    let checker = Arc::new(HttpLivenessChecker::new(cfg)?);

    let store: Arc<dyn KeyValueStore> = if args.no_cache {
        debug!("cache disabled for this run");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(TomlFileStore::new(&cfg.cache_file))
    };

    let network: Arc<dyn LocalNetwork> = match args.local_ip {
        Some(ip) => Arc::new(StaticNetwork(ip)),
        None => Arc::new(InterfaceNetwork),
    };

    Ok(DiscoveryService::new(
        checker,
        ResultCache::new(store),
        network,
        Arc::new(LogEventSink),
    )
    .with_fallback_subnets(cfg.fallback_subnets && !args.no_fallback))
}

fn host_found(address: &Address, elapsed: Duration, probes: usize, quiet: bool) {
    if quiet {
        print::print(address.as_str());
        return;
    }

    print::header("host found", quiet);
    print::aligned_line("Address", address.to_string().color(colors::ALIVE).bold());
    print::aligned_line("Scan probes", probes.to_string());
    print::aligned_line("Elapsed", format!("{:.2}s", elapsed.as_secs_f64()));
    print::fat_separator();
}

fn no_host_found(elapsed: Duration, probes: usize, quiet: bool) {
    print::header("no host found", quiet);
    if quiet {
        return;
    }

    print::no_results();
    let summary: ColoredString = format!(
        "{} probes in {}",
        probes.to_string().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold().yellow()
    )
    .color(colors::TEXT_DEFAULT);
    print::fat_separator();
    print::centerln(&summary.to_string());
}

pub mod cache;
pub mod find;
pub mod info;
pub mod probe;

use std::net::Ipv4Addr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use seekr_common::config::Config;
use seekr_common::network::address::Address;

#[derive(Parser)]
#[command(name = "seekr", version)]
#[command(about = "Finds the paired server on the local network.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Read settings from a TOML file; flags still win
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Port the server listens on
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Per-probe connect timeout in milliseconds
    #[arg(short, long, global = true, value_name = "MS")]
    pub timeout: Option<u64>,

    /// More log output (-vv for trace)
    #[arg(short, long, global = true, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only print results and warnings
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Look for the server, cached address first
    #[command(alias = "f")]
    Find(FindArgs),
    /// Send a single liveness probe to one address
    #[command(alias = "p")]
    Probe { address: Address },
    /// Show the local address and the ranges a scan would cover
    #[command(alias = "i")]
    Info,
    /// Show the last discovered address
    #[command(alias = "c")]
    Cache,
}

#[derive(Args, Debug, Default, Clone)]
pub struct FindArgs {
    /// Scan around this address instead of the detected one
    #[arg(long, value_name = "IP")]
    pub local_ip: Option<Ipv4Addr>,

    /// Do not scan the neighbouring 192.168.0/1 network
    #[arg(long)]
    pub no_fallback: bool,

    /// Neither read nor write the cached address
    #[arg(long)]
    pub no_cache: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Defaults, then the config file, then flags.
    pub fn config(&self) -> anyhow::Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(port) = self.port {
            cfg.port = port;
        }
        if let Some(ms) = self.timeout {
            cfg.connect_timeout_ms = ms;
            cfg.request_timeout_ms = cfg.request_timeout_ms.max(ms);
        }

        cfg.validate().context("invalid settings")?;
        Ok(cfg)
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

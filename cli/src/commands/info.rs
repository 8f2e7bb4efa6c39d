use colored::*;
use seekr_common::config::Config;
use seekr_common::network::interface::{self, InterfaceNetwork, LocalNetwork};
use seekr_common::network::range::SubnetPrefix;
use seekr_common::network::space::AddressSpace;
use tracing::warn;

use crate::terminal::{colors, format, print};

pub fn info(cfg: &Config, quiet: bool) -> anyhow::Result<()> {
    print::header("lan interfaces", quiet);
    let interfaces = interface::lan_interfaces();
    if interfaces.is_empty() {
        print::print_status("no physical LAN interface");
    }
    for (idx, iface) in interfaces.iter().enumerate() {
        format::print_interface(iface, idx);
    }

    print::header("scan plan", quiet);
    let local_ip = match InterfaceNetwork.local_ipv4() {
        Ok(ip) => ip,
        Err(e) => {
            warn!("{e}");
            return Ok(());
        }
    };

    let space = AddressSpace::for_local(local_ip, cfg.fallback_subnets);
    print::aligned_line("Local IPv4", local_ip.to_string().color(colors::IPV4_ADDR));
    print::aligned_line("Prefix", SubnetPrefix::of(local_ip).to_string());
    print::aligned_line("Candidates", space.len().to_string());
    print::aligned_line("Workers", space.partitions().len().to_string());
    print::aligned_line(
        "Probe",
        format!(
            "http://<host>:{}{}",
            cfg.port.to_string().color(colors::ACCENT),
            cfg.probe_path
        ),
    );
    print::as_tree_one_level(format::space_to_detail(&space));
    Ok(())
}

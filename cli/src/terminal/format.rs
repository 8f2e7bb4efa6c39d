use crate::terminal::{colors, print};
use colored::*;
use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::Ipv4Network;
use seekr_common::network::space::AddressSpace;
use seekr_common::utils::interface::NetworkInterfaceExtension;

pub type Detail = (String, ColoredString);

pub fn ipv4_nets_to_detail(nets: &[Ipv4Network]) -> Vec<Detail> {
    nets.iter()
        .map(|net| {
            let address: ColoredString = net.ip().to_string().color(colors::IPV4_ADDR);
            let prefix: ColoredString = net.prefix().to_string().color(colors::IPV4_PREFIX);
            let value: ColoredString = format!("{address}/{prefix}").color(colors::SEPARATOR);
            ("IPv4".to_string(), value)
        })
        .collect()
}

/// One detail line per candidate range, with its host count.
pub fn space_to_detail(space: &AddressSpace) -> Vec<Detail> {
    space
        .ranges()
        .iter()
        .enumerate()
        .map(|(idx, range)| {
            let value = format!(
                "{} {}",
                range.to_string().color(colors::IPV4_ADDR),
                format!("({} hosts)", range.len()).color(colors::SEPARATOR)
            );
            (format!("Range{}", idx + 1), value.normal())
        })
        .collect()
}

pub fn print_interface(interface: &NetworkInterface, idx: usize) {
    print::tree_head(idx, &interface.name);
    let mut details: Vec<Detail> = ipv4_nets_to_detail(&interface.get_ipv4_nets());
    if let Some(mac_addr) = interface.mac {
        details.push((
            "MAC".to_string(),
            mac_addr.to_string().color(colors::MAC_ADDR),
        ));
    }
    print::as_tree_one_level(details);
}

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use pnet::datalink::NetworkInterface;
use tracing::debug;

#[cfg(target_os = "linux")]
use linux_impl::{is_physical, is_wireless};
#[cfg(target_os = "macos")]
use macos_impl::{is_physical, is_wireless};
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
use generic_impl::{is_physical, is_wireless};

use crate::error::NetworkError;
use crate::utils::interface::NetworkInterfaceExtension;

/// Where discovery learns "my IPv4 address".
pub trait LocalNetwork: Send + Sync {
    fn local_ipv4(&self) -> Result<Ipv4Addr, NetworkError>;
}

/// Reads the address of the primary LAN interface from the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct InterfaceNetwork;

impl LocalNetwork for InterfaceNetwork {
    fn local_ipv4(&self) -> Result<Ipv4Addr, NetworkError> {
        if let Some(ip) = lan_interface_ipv4(pnet::datalink::interfaces()) {
            return Ok(ip);
        }

        // Containers and VMs often expose only virtual interfaces; ask the
        // routing table which source address it would use instead.
        debug!("no physical LAN interface, falling back to route lookup");
        match route_source_ipv4(Ipv4Addr::new(192, 168, 0, 1)) {
            Some(ip) if ip.is_private() => Ok(ip),
            _ => Err(NetworkError::NoLocalNetwork),
        }
    }
}

/// A fixed address, for `--local-ip` overrides and tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticNetwork(pub Ipv4Addr);

impl LocalNetwork for StaticNetwork {
    fn local_ipv4(&self) -> Result<Ipv4Addr, NetworkError> {
        Ok(self.0)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ViabilityError {
    /// The interface is operationally down.
    IsDown,
    /// The interface was filtered out as "not physical" by the provided logic.
    NotPhysical,
    /// The interface does not have a MAC address.
    NoMacAddress,
    /// The interface does not support broadcast.
    NotBroadcast,
    /// The interface is a point-to-point link (e.g., a VPN).
    IsPointToPoint,
    /// The interface has no private IPv4 address.
    NoValidLanIp,
}

/// Interfaces that could carry the paired service: up, physical, broadcast
/// capable and holding a private IPv4 address.
pub fn lan_interfaces() -> Vec<NetworkInterface> {
    viable_interfaces(pnet::datalink::interfaces())
}

fn viable_interfaces(interfaces: Vec<NetworkInterface>) -> Vec<NetworkInterface> {
    interfaces
        .into_iter()
        .filter(|interface| is_viable_lan_interface(interface, is_physical).is_ok())
        .collect()
}

/// Picks the best LAN interface and returns its private IPv4 address.
fn lan_interface_ipv4(interfaces: Vec<NetworkInterface>) -> Option<Ipv4Addr> {
    let interface = select_best_lan_interface(viable_interfaces(interfaces), is_wired)?;
    debug!("selected LAN interface {}", interface.name);
    interface.get_private_ipv4()
}

fn is_viable_lan_interface(
    interface: &NetworkInterface,
    is_physical: impl Fn(&NetworkInterface) -> bool,
) -> Result<(), ViabilityError> {
    if !interface.is_up() {
        return Err(ViabilityError::IsDown);
    }
    if !is_physical(interface) || interface.is_loopback() {
        return Err(ViabilityError::NotPhysical);
    }
    if interface.mac.is_none() {
        return Err(ViabilityError::NoMacAddress);
    }
    if !interface.is_broadcast() {
        return Err(ViabilityError::NotBroadcast);
    }
    if interface.is_point_to_point() {
        return Err(ViabilityError::IsPointToPoint);
    }
    if interface.get_private_ipv4().is_none() {
        return Err(ViabilityError::NoValidLanIp);
    }

    Ok(())
}

fn select_best_lan_interface(
    interfaces: Vec<NetworkInterface>,
    is_wired: impl Fn(&NetworkInterface) -> bool,
) -> Option<NetworkInterface> {
    let wired = interfaces.iter().position(is_wired).unwrap_or(0);
    interfaces.into_iter().nth(wired)
}

/// Source address the kernel would pick to reach `target`. No packet is sent.
fn route_source_ipv4(target: Ipv4Addr) -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect((target, 53)).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_unspecified() && !ip.is_loopback() => Some(ip),
        _ => None,
    }
}

fn is_wired(interface: &NetworkInterface) -> bool {
    is_physical(interface) && !is_wireless(interface)
}

#[cfg(target_os = "linux")]
mod linux_impl {
    use super::*;
    use std::path::Path;

    pub fn is_physical(interface: &NetworkInterface) -> bool {
        Path::new(&format!("/sys/class/net/{}/device", interface.name)).exists()
    }

    pub fn is_wireless(interface: &NetworkInterface) -> bool {
        Path::new(&format!("/sys/class/net/{}/wireless", interface.name)).exists()
    }
}

#[cfg(target_os = "macos")]
mod macos_impl {
    use super::*;
    use std::collections::HashSet;
    use std::process::Command;
    use std::sync::OnceLock;

    struct HardwareInfo {
        physical_devices: HashSet<String>,
        wireless_devices: HashSet<String>,
    }

    /// Runs `networksetup` once and caches the answer.
    fn get_hardware_info() -> &'static HardwareInfo {
        static HARDWARE_INFO: OnceLock<HardwareInfo> = OnceLock::new();

        HARDWARE_INFO.get_or_init(|| {
            let mut physical = HashSet::new();
            let mut wireless = HashSet::new();

            if let Ok(output) = Command::new("networksetup")
                .arg("-listallhardwareports")
                .output()
            {
                let stdout = String::from_utf8_lossy(&output.stdout);
                for line in stdout.lines() {
                    if let Some(device) = line.strip_prefix("Device: ") {
                        physical.insert(device.trim().to_string());
                    }
                }
            }

            for device in &physical {
                let is_wifi = Command::new("networksetup")
                    .arg("-getairportnetwork")
                    .arg(device)
                    .output()
                    .map(|out| out.status.success())
                    .unwrap_or(false);

                if is_wifi {
                    wireless.insert(device.clone());
                }
            }

            HardwareInfo {
                physical_devices: physical,
                wireless_devices: wireless,
            }
        })
    }

    pub fn is_physical(interface: &NetworkInterface) -> bool {
        get_hardware_info().physical_devices.contains(&interface.name)
    }

    pub fn is_wireless(interface: &NetworkInterface) -> bool {
        get_hardware_info().wireless_devices.contains(&interface.name)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod generic_impl {
    use super::*;

    pub fn is_physical(interface: &NetworkInterface) -> bool {
        interface.mac.is_some()
    }

    pub fn is_wireless(_interface: &NetworkInterface) -> bool {
        false
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

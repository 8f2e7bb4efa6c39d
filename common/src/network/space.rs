//! # Candidate Address Space
//!
//! Turns "my IPv4 address" into the set of /24 ranges a discovery scan walks.
//!
//! Home routers overwhelmingly hand out either `192.168.0.0/24` or
//! `192.168.1.0/24`. When the local prefix is one of them, the other is added as
//! a secondary range so a server sitting on the neighbouring default network is
//! still found.

use std::fmt;
use std::net::Ipv4Addr;

use crate::network::range::{SubnetPrefix, SubnetRange};

pub const COMMON_PREFIXES: [SubnetPrefix; 2] = [
    SubnetPrefix::new(192, 168, 0),
    SubnetPrefix::new(192, 168, 1),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSpace {
    ranges: Vec<SubnetRange>,
}

impl AddressSpace {
    pub fn new(ranges: Vec<SubnetRange>) -> Self {
        Self { ranges }
    }

    /// Builds the space for a device at `local_ip`.
    ///
    /// The local prefix always comes first. The device's own address is not
    /// excluded.
    pub fn for_local(local_ip: Ipv4Addr, with_fallback: bool) -> Self {
        let local = SubnetPrefix::of(local_ip);
        let mut ranges = vec![SubnetRange::full(local)];

        if with_fallback && let Some(other) = fallback_prefix(local) {
            ranges.push(SubnetRange::full(other));
        }

        Self { ranges }
    }

    pub fn ranges(&self) -> &[SubnetRange] {
        &self.ranges
    }

    /// Work units for the scanner: every range split into its halves.
    pub fn partitions(&self) -> Vec<SubnetRange> {
        self.ranges.iter().flat_map(SubnetRange::halves).collect()
    }

    /// Number of probes a full, uninterrupted scan performs.
    pub fn len(&self) -> usize {
        self.ranges.iter().map(SubnetRange::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        self.ranges.iter().any(|range| range.contains(ip))
    }

    pub fn iter(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.ranges.iter().flat_map(SubnetRange::iter)
    }
}

impl fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.ranges.iter().map(ToString::to_string).collect();
        f.write_str(&joined.join(", "))
    }
}

/// The other common home prefix, if `local` is one of them.
pub fn fallback_prefix(local: SubnetPrefix) -> Option<SubnetPrefix> {
    COMMON_PREFIXES
        .iter()
        .position(|p| *p == local)
        .map(|idx| COMMON_PREFIXES[1 - idx])
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
    use std::collections::HashSet;

    fn all_hosts(a: u8, b: u8, c: u8) -> HashSet<Ipv4Addr> {
        (1..=255).map(|d| Ipv4Addr::new(a, b, c, d)).collect()
    }

    #[test]
    fn home_1_includes_home_0() {
        let space = AddressSpace::for_local(Ipv4Addr::new(192, 168, 1, 33), true);
        let candidates: HashSet<Ipv4Addr> = space.iter().collect();

        assert!(candidates.is_superset(&all_hosts(192, 168, 1)));
        assert!(candidates.is_superset(&all_hosts(192, 168, 0)));
        assert_eq!(space.len(), 510);
        assert_eq!(space.ranges()[0].prefix, SubnetPrefix::new(192, 168, 1));
    }

    #[test]
    fn home_0_includes_home_1() {
        let space = AddressSpace::for_local(Ipv4Addr::new(192, 168, 0, 2), true);
        let candidates: HashSet<Ipv4Addr> = space.iter().collect();

        assert!(candidates.is_superset(&all_hosts(192, 168, 0)));
        assert!(candidates.is_superset(&all_hosts(192, 168, 1)));
        assert_eq!(space.ranges()[0].prefix, SubnetPrefix::new(192, 168, 0));
    }

    #[test]
    fn other_prefixes_have_no_fallback() {
        let space = AddressSpace::for_local(Ipv4Addr::new(10, 0, 0, 7), true);
        assert_eq!(space.ranges().len(), 1);
        assert_eq!(space.iter().collect::<HashSet<_>>(), all_hosts(10, 0, 0));
    }

    #[test]
    fn fallback_can_be_disabled() {
        let space = AddressSpace::for_local(Ipv4Addr::new(192, 168, 1, 33), false);
        assert_eq!(space.ranges().len(), 1);
        assert!(!space.contains(Ipv4Addr::new(192, 168, 0, 1)));
    }

    #[test]
    fn self_address_is_a_candidate() {
        let me = Ipv4Addr::new(10, 1, 2, 3);
        assert!(AddressSpace::for_local(me, true).contains(me));
    }

    #[test]
    fn partitions_are_two_halves_per_prefix() {
        let space = AddressSpace::for_local(Ipv4Addr::new(192, 168, 0, 2), true);
        let parts = space.partitions();

        assert_eq!(parts.len(), 4);
        let probed: usize = parts.iter().map(SubnetRange::len).sum();
        assert_eq!(probed, space.len());
    }

    #[test]
    fn display_lists_ranges() {
        let space = AddressSpace::for_local(Ipv4Addr::new(192, 168, 1, 33), true);
        assert_eq!(space.to_string(), "192.168.1.1-255, 192.168.0.1-255");
    }
}

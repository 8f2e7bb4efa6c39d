//! # Subnet Range Model
//!
//! A [`SubnetPrefix`] is the first three octets of a /24 ("192.168.1.") and a
//! [`SubnetRange`] is an inclusive last-octet window inside it. Scans split each
//! range into halves so two workers can walk it in parallel.

use std::fmt;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubnetPrefix([u8; 3]);

impl SubnetPrefix {
    pub const fn new(a: u8, b: u8, c: u8) -> Self {
        Self([a, b, c])
    }

    /// Drops the last octet of `ip`.
    pub fn of(ip: Ipv4Addr) -> Self {
        let [a, b, c, _] = ip.octets();
        Self([a, b, c])
    }

    pub fn host(&self, last_octet: u8) -> Ipv4Addr {
        let [a, b, c] = self.0;
        Ipv4Addr::new(a, b, c, last_octet)
    }
}

impl fmt::Display for SubnetPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{a}.{b}.{c}.")
    }
}

/// Inclusive range of hosts `prefix.low ..= prefix.high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubnetRange {
    pub prefix: SubnetPrefix,
    pub low: u8,
    pub high: u8,
}

impl SubnetRange {
    pub const FIRST_HOST: u8 = 1;
    pub const LAST_HOST: u8 = 255;

    pub fn new(prefix: SubnetPrefix, low: u8, high: u8) -> Self {
        Self { prefix, low, high }
    }

    /// Every candidate host of the prefix, 1 through 255.
    pub fn full(prefix: SubnetPrefix) -> Self {
        Self::new(prefix, Self::FIRST_HOST, Self::LAST_HOST)
    }

    pub fn len(&self) -> usize {
        if self.low > self.high {
            0
        } else {
            usize::from(self.high - self.low) + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let last = ip.octets()[3];
        SubnetPrefix::of(ip) == self.prefix && self.low <= last && last <= self.high
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Ipv4Addr> + Clone + use<> {
        let prefix = self.prefix;
        (self.low..=self.high).map(move |octet| prefix.host(octet))
    }

    /// Splits into two adjacent halves that together cover the range exactly.
    ///
    /// `1..=255` becomes `1..=127` and `128..=255`. Ranges of fewer than two
    /// hosts are returned as-is.
    pub fn halves(&self) -> Vec<SubnetRange> {
        if self.len() < 2 {
            return vec![*self];
        }
        let mid = ((u16::from(self.low) + u16::from(self.high)).div_ceil(2)) as u8;
        vec![
            Self::new(self.prefix, self.low, mid - 1),
            Self::new(self.prefix, mid, self.high),
        ]
    }
}

impl fmt::Display for SubnetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}-{}", self.prefix, self.low, self.high)
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

//! # Probe Address Model
//!
//! An [`Address`] is either an IPv4 dotted-quad or a hostname. It can only be
//! built through validation (or from an [`Ipv4Addr`]), so anything holding one
//! can hand it straight to a liveness checker.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::AddressError;

const MAX_ADDRESS_LEN: usize = 253;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the IPv4 form when the address is a dotted-quad.
    pub fn as_ipv4(&self) -> Option<Ipv4Addr> {
        self.0.parse().ok()
    }
}

impl From<Ipv4Addr> for Address {
    fn from(ip: Ipv4Addr) -> Self {
        Self(ip.to_string())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressError;

    /// Accepts "192.168.1.20" or "media-box.lan", trimmed of surrounding
    /// whitespace. Ports, schemes and paths are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        if s.len() > MAX_ADDRESS_LEN {
            return Err(AddressError::TooLong);
        }

        if looks_numeric(s) {
            return s
                .parse::<Ipv4Addr>()
                .map(Self::from)
                .map_err(|_| AddressError::InvalidIpv4(s.to_string()));
        }

        for label in s.split('.') {
            if !is_valid_label(label) {
                return Err(AddressError::InvalidLabel {
                    address: s.to_string(),
                    label: label.to_string(),
                });
            }
        }

        Ok(Self(s.to_ascii_lowercase()))
    }
}

fn looks_numeric(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit() || c == '.')
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

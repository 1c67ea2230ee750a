// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid IPv4 address: {0}")]
    InvalidAddress(String),

    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(u8),

    #[error("Invalid VLAN ID: {0} (must be 0-4094)")]
    InvalidVlanId(u64),
}

/// IPv4 subnet in CIDR notation value object
///
/// Represents the network a port-group is provisioned for. Invariants:
/// - Valid IPv4 address and prefix length 0-32
/// - Canonical form: host bits are masked off on construction
///
/// Classification helpers mirror the address-space rules applied during
/// specification validation: loopback, multicast, and reserved spaces are
/// unsafe to provision; public routable space is legal but discouraged.
///
/// # Examples
///
/// ```rust
/// use range_orchestrator::domain::SubnetCidr;
///
/// let subnet = SubnetCidr::new("192.168.10.5/24").unwrap();
/// assert_eq!(subnet.to_string(), "192.168.10.0/24");
/// assert!(subnet.is_private());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubnetCidr {
    network: Ipv4Addr,
    prefix_length: u8,
}

impl SubnetCidr {
    /// Parse CIDR notation, e.g. `"10.0.0.0/16"`
    ///
    /// A bare address is accepted as a /32 host network.
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref();

        let (addr_str, prefix_length) = match cidr.split_once('/') {
            Some((addr, prefix)) => {
                let prefix = prefix
                    .parse::<u8>()
                    .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;
                (addr, prefix)
            }
            None => (cidr, 32),
        };

        if prefix_length > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        let address = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidAddress(addr_str.to_string()))?;

        // Canonical form: mask off host bits
        let mask = Self::mask_bits(prefix_length);
        let network = Ipv4Addr::from(u32::from(address) & mask);

        Ok(Self {
            network,
            prefix_length,
        })
    }

    /// Network address (host bits zeroed)
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Prefix length in bits
    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Loopback space (127.0.0.0/8)
    pub fn is_loopback(&self) -> bool {
        self.network.is_loopback()
    }

    /// Multicast space (224.0.0.0/4)
    pub fn is_multicast(&self) -> bool {
        self.network.is_multicast()
    }

    /// IETF reserved space: "this network" (0.0.0.0/8), link-local
    /// (169.254.0.0/16), and class E (240.0.0.0/4)
    pub fn is_reserved(&self) -> bool {
        let octets = self.network.octets();
        octets[0] == 0 || octets[0] >= 240 || self.network.is_link_local()
    }

    /// RFC 1918 private space (10/8, 172.16/12, 192.168/16)
    pub fn is_private(&self) -> bool {
        self.network.is_private()
    }

    /// Unsafe to provision: loopback, multicast, or reserved
    pub fn is_unusable(&self) -> bool {
        self.is_loopback() || self.is_multicast() || self.is_reserved()
    }

    fn mask_bits(prefix_length: u8) -> u32 {
        if prefix_length == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix_length))
        }
    }
}

impl fmt::Display for SubnetCidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_length)
    }
}

impl FromStr for SubnetCidr {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// IEEE 802.1Q VLAN ID value object
///
/// Invariants:
/// - 0-4094 (0 means untagged; 4095 is reserved by the standard)
///
/// The virtualization platform additionally reserves IDs at and above
/// [`VlanId::PLATFORM_CEILING`] for its own use, so specifications must stay
/// below it. That rule is applied during validation, not construction, so the
/// ceiling violation can be reported with section context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VlanId(u16);

impl VlanId {
    /// IDs at or above this value are reserved for platform use
    pub const PLATFORM_CEILING: u16 = 2000;

    /// Untagged traffic
    pub const UNTAGGED: VlanId = VlanId(0);

    /// Create a VLAN ID with validation
    pub fn new(id: u64) -> Result<Self, NetworkError> {
        if id > 4094 {
            return Err(NetworkError::InvalidVlanId(id));
        }
        Ok(Self(id as u16))
    }

    /// Raw VLAN tag value
    pub fn value(&self) -> u16 {
        self.0
    }

    /// True when the ID collides with the platform-reserved range
    pub fn exceeds_platform_ceiling(&self) -> bool {
        self.0 >= Self::PLATFORM_CEILING
    }
}

impl Default for VlanId {
    fn default() -> Self {
        Self::UNTAGGED
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_subnets() {
        assert!(SubnetCidr::new("10.0.0.0/8").is_ok());
        assert!(SubnetCidr::new("172.16.0.0/12").is_ok());
        assert!(SubnetCidr::new("192.168.1.0/24").is_ok());
        assert!(SubnetCidr::new("192.168.1.1").is_ok()); // bare address
    }

    #[test]
    fn test_invalid_subnets() {
        assert!(SubnetCidr::new("").is_err());
        assert!(SubnetCidr::new("not-a-subnet").is_err());
        assert!(SubnetCidr::new("10.0.0.0/33").is_err());
        assert!(SubnetCidr::new("10.0.0/8").is_err());
        assert!(SubnetCidr::new("10.0.0.0/abc").is_err());
    }

    #[test]
    fn test_canonical_network_address() {
        let subnet = SubnetCidr::new("192.168.10.55/24").unwrap();
        assert_eq!(subnet.network(), Ipv4Addr::new(192, 168, 10, 0));
        assert_eq!(subnet.to_string(), "192.168.10.0/24");
    }

    #[test]
    fn test_address_space_classification() {
        assert!(SubnetCidr::new("127.0.0.0/8").unwrap().is_loopback());
        assert!(SubnetCidr::new("224.0.0.0/4").unwrap().is_multicast());
        assert!(SubnetCidr::new("240.0.0.0/4").unwrap().is_reserved());
        assert!(SubnetCidr::new("0.0.0.0/8").unwrap().is_reserved());
        assert!(SubnetCidr::new("169.254.0.0/16").unwrap().is_reserved());
        assert!(SubnetCidr::new("10.10.0.0/16").unwrap().is_private());
        assert!(!SubnetCidr::new("8.8.8.0/24").unwrap().is_private());
        assert!(!SubnetCidr::new("8.8.8.0/24").unwrap().is_unusable());
    }

    #[test]
    fn test_vlan_range() {
        assert!(VlanId::new(0).is_ok());
        assert!(VlanId::new(100).is_ok());
        assert!(VlanId::new(4094).is_ok());
        assert!(VlanId::new(4095).is_err());
        assert!(VlanId::new(10_000).is_err());
    }

    #[test]
    fn test_vlan_platform_ceiling() {
        assert!(!VlanId::new(1999).unwrap().exceeds_platform_ceiling());
        assert!(VlanId::new(2000).unwrap().exceeds_platform_ceiling());
        assert!(VlanId::new(2500).unwrap().exceeds_platform_ceiling());
    }
}

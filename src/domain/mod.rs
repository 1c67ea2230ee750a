// Copyright (c) 2025 - Cowboy AI, Inc.
//! Range Domain Models
//!
//! Core domain concepts for range orchestration as value objects with
//! validation invariants:
//!
//! - [`SubnetCidr`] - IPv4 subnet in CIDR notation with address-space classification
//! - [`VlanId`] - IEEE 802.1Q VLAN ID with the platform deployment ceiling
//! - [`Hostname`] - DNS-validated hostnames (RFC 1123)
//! - [`NamingConvention`] - master/instance naming rules for deployed entities

pub mod hostname;
pub mod naming;
pub mod network;

// Re-export value objects
pub use hostname::{Hostname, HostnameError};
pub use naming::NamingConvention;
pub use network::{NetworkError, SubnetCidr, VlanId};

// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32 for IPv4)")]
    InvalidPrefixLength(u8),

    #[error("CIDR {0} has host bits set")]
    HostBitsSet(String),

    #[error("Subnet mask /{0} leaves fewer than 2 usable host addresses")]
    InsufficientHosts(u8),

    #[error("Subnet mask /{mask} is wider than the network block {network}")]
    MaskWiderThanNetwork { mask: u8, network: String },

    #[error("Network {network} cannot hold {requested} subnets of /{mask}")]
    AddressSpaceExhausted {
        network: String,
        mask: u8,
        requested: usize,
    },

    #[error("Address {address} is outside subnet {subnet}")]
    AddressOutsideSubnet { address: Ipv4Addr, subnet: String },

    #[error("Invalid port range: {from}-{to}")]
    InvalidPortRange { from: u16, to: u16 },
}

/// IPv4 network block in CIDR notation
///
/// Invariants:
/// - Prefix length 0-32
/// - Canonical form (no host bits set)
///
/// # Examples
///
/// ```rust
/// use cim_cloud_topology::domain::Ipv4Cidr;
///
/// let block = Ipv4Cidr::new("10.0.0.0/16").unwrap();
/// assert_eq!(block.subdivide(24, 1).unwrap().to_string(), "10.0.1.0/24");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    /// The whole IPv4 space
    pub const ANY: Ipv4Cidr = Ipv4Cidr {
        network: Ipv4Addr::UNSPECIFIED,
        prefix: 0,
    };

    /// Smallest mask that still leaves two usable hosts (network and
    /// broadcast addresses excluded)
    pub const MAX_SUBNET_PREFIX: u8 = 30;

    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref();
        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let network = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;
        let prefix = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(network, prefix)
    }

    pub fn from_parts(network: Ipv4Addr, prefix: u8) -> Result<Self, NetworkError> {
        if prefix > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix));
        }

        // Invariant: canonical network address
        if u32::from(network) & !Self::mask_bits(prefix) != 0 {
            return Err(NetworkError::HostBitsSet(format!("{}/{}", network, prefix)));
        }

        Ok(Self { network, prefix })
    }

    fn mask_bits(prefix: u8) -> u32 {
        if prefix == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix))
        }
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Total addresses in the block
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix))
    }

    /// Addresses left once network and broadcast are excluded
    pub fn usable_hosts(&self) -> u64 {
        self.size().saturating_sub(2)
    }

    pub fn contains(&self, address: Ipv4Addr) -> bool {
        u32::from(address) & Self::mask_bits(self.prefix) == u32::from(self.network)
    }

    /// The `index`-th block of size `/new_prefix` inside this one
    pub fn subdivide(&self, new_prefix: u8, index: usize) -> Result<Self, NetworkError> {
        if new_prefix > 32 {
            return Err(NetworkError::InvalidPrefixLength(new_prefix));
        }
        if new_prefix < self.prefix {
            return Err(NetworkError::MaskWiderThanNetwork {
                mask: new_prefix,
                network: self.to_string(),
            });
        }

        let capacity = 1u64 << (new_prefix - self.prefix);
        if index as u64 >= capacity {
            return Err(NetworkError::AddressSpaceExhausted {
                network: self.to_string(),
                mask: new_prefix,
                requested: index + 1,
            });
        }

        let step = 1u64 << (32 - u32::from(new_prefix));
        let start = u64::from(u32::from(self.network)) + index as u64 * step;
        // start < 2^32 since index < capacity
        Self::from_parts(Ipv4Addr::from(start as u32), new_prefix)
    }

    /// How many `/new_prefix` blocks fit in this one
    pub fn capacity(&self, new_prefix: u8) -> u64 {
        if new_prefix < self.prefix || new_prefix > 32 {
            0
        } else {
            1u64 << (new_prefix - self.prefix)
        }
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Ipv4Cidr {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Ipv4Cidr> for String {
    fn from(cidr: Ipv4Cidr) -> Self {
        cidr.to_string()
    }
}

/// Subnet visibility tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetVisibility {
    /// Routed through an internet gateway
    Public,
    /// Egress only
    Private,
    /// No route out of the network
    Isolated,
}

impl SubnetVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::Private => "Private",
            Self::Isolated => "Isolated",
        }
    }
}

impl fmt::Display for SubnetVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// IP protocol of an ingress rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    All,
}

impl Protocol {
    /// Provider protocol token
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Icmp => "icmp",
            Self::All => "-1",
        }
    }
}

/// Inclusive port range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRange {
    from: u16,
    to: u16,
}

impl PortRange {
    pub fn new(from: u16, to: u16) -> Result<Self, NetworkError> {
        if from > to {
            return Err(NetworkError::InvalidPortRange { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn single(port: u16) -> Self {
        Self { from: port, to: port }
    }

    pub fn all() -> Self {
        Self { from: 0, to: u16::MAX }
    }

    pub fn from_port(&self) -> u16 {
        self.from
    }

    pub fn to_port(&self) -> u16 {
        self.to
    }
}

/// Security group ingress rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IngressRule {
    pub peer: Ipv4Cidr,
    pub protocol: Protocol,
    pub ports: PortRange,
    pub description: String,
}

impl IngressRule {
    /// TCP on a single port from `peer`
    pub fn tcp(peer: Ipv4Cidr, port: u16, description: impl Into<String>) -> Self {
        Self {
            peer,
            protocol: Protocol::Tcp,
            ports: PortRange::single(port),
            description: description.into(),
        }
    }
}

// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cloud Resource Kind Taxonomy
//!
//! The closed set of resource kinds a topology graph can contain, together
//! with the provider type names the backend intake expects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource kind taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    // Network
    /// Virtual private network
    Network,
    /// Subnet carved from a network
    Subnet,
    /// Internet gateway attached to a network
    InternetGateway,
    /// Route table associated with a subnet
    RouteTable,
    /// Stateful firewall boundary
    SecurityGroup,

    // Compute
    /// Placement group (cluster/spread/partition)
    PlacementGroup,
    /// Elastic network interface
    NetworkInterface,
    /// Compute instance
    Instance,

    // Identity
    /// Assumable identity role
    Role,
    /// Inline policy attached to roles
    Policy,
}

impl ResourceKind {
    /// All kinds, in declaration order
    pub const ALL: [ResourceKind; 10] = [
        Self::Network,
        Self::Subnet,
        Self::InternetGateway,
        Self::RouteTable,
        Self::SecurityGroup,
        Self::PlacementGroup,
        Self::NetworkInterface,
        Self::Instance,
        Self::Role,
        Self::Policy,
    ];

    /// Get the canonical string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Subnet => "subnet",
            Self::InternetGateway => "internet_gateway",
            Self::RouteTable => "route_table",
            Self::SecurityGroup => "security_group",
            Self::PlacementGroup => "placement_group",
            Self::NetworkInterface => "network_interface",
            Self::Instance => "instance",
            Self::Role => "role",
            Self::Policy => "policy",
        }
    }

    /// Provider resource type name used in the declared state
    pub fn provider_type(&self) -> &'static str {
        match self {
            Self::Network => "AWS::EC2::VPC",
            Self::Subnet => "AWS::EC2::Subnet",
            Self::InternetGateway => "AWS::EC2::InternetGateway",
            Self::RouteTable => "AWS::EC2::RouteTable",
            Self::SecurityGroup => "AWS::EC2::SecurityGroup",
            Self::PlacementGroup => "AWS::EC2::PlacementGroup",
            Self::NetworkInterface => "AWS::EC2::NetworkInterface",
            Self::Instance => "AWS::EC2::Instance",
            Self::Role => "AWS::IAM::Role",
            Self::Policy => "AWS::IAM::Policy",
        }
    }

    /// Parse a provider type name back into a kind
    pub fn from_provider_type(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.provider_type() == name)
    }

    /// Whether the kind belongs to the network layer
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Network
                | Self::Subnet
                | Self::InternetGateway
                | Self::RouteTable
                | Self::SecurityGroup
        )
    }

    /// Whether the kind belongs to the identity layer
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Role | Self::Policy)
    }

    /// Prefix the provider uses for physical ids of this kind
    pub fn physical_id_prefix(&self) -> &'static str {
        match self {
            Self::Network => "vpc-",
            Self::Subnet => "subnet-",
            Self::InternetGateway => "igw-",
            Self::RouteTable => "rtb-",
            Self::SecurityGroup => "sg-",
            Self::PlacementGroup => "pg-",
            Self::NetworkInterface => "eni-",
            Self::Instance => "i-",
            Self::Role => "role-",
            Self::Policy => "policy-",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_roundtrip() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_provider_type(kind.provider_type()), Some(kind));
        }
        assert_eq!(ResourceKind::from_provider_type("AWS::S3::Bucket"), None);
    }

    #[test]
    fn test_layers() {
        assert!(ResourceKind::Subnet.is_network());
        assert!(!ResourceKind::Instance.is_network());
        assert!(ResourceKind::Policy.is_identity());
        assert!(!ResourceKind::PlacementGroup.is_identity());
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&ResourceKind::NetworkInterface).unwrap();
        assert_eq!(json, "\"network_interface\"");
    }
}

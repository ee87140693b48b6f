// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Domain Models
//!
//! Typed resource payloads and validated value objects for the cloud
//! topology graph.
//!
//! # Value Objects with Invariants
//!
//! - [`Ipv4Cidr`] - canonical IPv4 block with subdivision
//! - [`PartitionCount`] - partition placement count (1-7)
//! - [`InstanceShape`] - `family.size` instance type
//! - [`PolicyStatement`] - non-empty action set, resources default to `*`
//! - [`TrustPrincipal`] - service or account principal
//! - [`ResourceId`] - provider logical id
//!
//! # Resource Payloads
//!
//! Each payload renders to an attribute mapping; references inside the
//! attributes are the graph's edges.
//!
//! ```text
//! Network ← Subnet ← NetworkInterface ← Instance → PlacementGroup
//!        ↖ SecurityGroup ↙               Role ← Policy
//! ```

pub mod compute;
pub mod identity;
pub mod interface;
pub mod invariants;
pub mod network;
pub mod placement;
pub mod resource;
pub mod resource_type;
pub mod vpc;

pub use compute::{ImageRef, InstanceShape, InstanceSpec, Placement};
pub use identity::{
    is_read_only_action, Effect, IdentityError, ManagedPolicyRef, PolicySpec, PolicyStatement,
    RoleSpec, TrustPrincipal,
};
pub use interface::{BindingTarget, NetworkInterfaceBinding, NetworkInterfaceSpec};
pub use network::{IngressRule, Ipv4Cidr, NetworkError, PortRange, Protocol, SubnetVisibility};
pub use placement::{PartitionCount, PlacementGroupSpec, PlacementStrategy, RemovalPolicy};
pub use resource::{AttributeValue, Attributes, Reference, Resource, ResourceId, ResourceProperties};
pub use resource_type::ResourceKind;
pub use vpc::{InternetGatewaySpec, NetworkSpec, Route, RouteTableSpec, SecurityGroupSpec, SubnetSpec};

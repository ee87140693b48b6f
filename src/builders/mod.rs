// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Builders
//!
//! Fluent builders that validate their own inputs and insert resources into
//! a [`BuildContext`](crate::BuildContext). Cross-resource rules that need
//! the finished graph are left to the assembler.

pub mod compute;
pub mod identity;
pub mod interface;
pub mod network;
pub mod placement;

pub use compute::{InstanceBuilder, InstanceRef, InterfaceAttachment};
pub use identity::{RoleBuilder, RoleRef};
pub use interface::NetworkInterfaceBuilder;
pub use network::{
    NetworkBuilder, NetworkTopology, SecurityGroupBuilder, SubnetGroup, SubnetRef, SubnetSelection,
};
pub use placement::{PlacementGroupBuilder, PlacementGroupRef};

// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Interface Builder
//!
//! Standalone interfaces carry their own security-group set and are later
//! attached to an instance at a device index above 0.

use indexmap::{IndexMap, IndexSet};
use std::net::Ipv4Addr;
use tracing::info;

use crate::context::BuildContext;
use crate::domain::{NetworkInterfaceSpec, Resource, ResourceId, ResourceKind, SubnetSpec};
use crate::errors::{TopologyError, TopologyResult};

/// Builder for a standalone network interface
#[derive(Debug, Clone)]
pub struct NetworkInterfaceBuilder {
    id: ResourceId,
    subnet: ResourceId,
    security_groups: IndexSet<ResourceId>,
    private_address: Option<Ipv4Addr>,
    description: Option<String>,
    tags: IndexMap<String, String>,
}

impl NetworkInterfaceBuilder {
    pub fn new(id: ResourceId, subnet: &ResourceId) -> Self {
        Self {
            id,
            subnet: subnet.clone(),
            security_groups: IndexSet::new(),
            private_address: None,
            description: None,
            tags: IndexMap::new(),
        }
    }

    pub fn security_group(mut self, group: &ResourceId) -> Self {
        self.security_groups.insert(group.clone());
        self
    }

    /// Fixed private address; must lie inside the subnet's block
    pub fn private_address(mut self, address: Ipv4Addr) -> Self {
        self.private_address = Some(address);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    fn subnet_spec<'c>(&self, ctx: &'c BuildContext) -> TopologyResult<&'c SubnetSpec> {
        ctx.require(&self.id, &self.subnet, ResourceKind::Subnet)?
            .as_subnet()
            .ok_or_else(|| TopologyError::Configuration(format!("{} is not a subnet", self.subnet)))
    }

    /// Insert the interface into `ctx`
    ///
    /// # Errors
    ///
    /// - `UnresolvedReference`/`WrongResourceKind` for unknown subnet or groups
    /// - `SubnetMismatch` if a security group belongs to another network
    /// - `Configuration` if the private address is outside the subnet
    pub fn build(self, ctx: &mut BuildContext) -> TopologyResult<ResourceId> {
        let subnet = self.subnet_spec(ctx)?;

        for group_id in &self.security_groups {
            let group = ctx
                .require(&self.id, group_id, ResourceKind::SecurityGroup)?
                .as_security_group()
                .ok_or_else(|| {
                    TopologyError::Configuration(format!("{} is not a security group", group_id))
                })?;
            if group.network != subnet.network {
                return Err(TopologyError::SubnetMismatch {
                    resource: self.id.clone(),
                    subnet: self.subnet.clone(),
                    reason: format!(
                        "is in network {} but security group {} is in network {}",
                        subnet.network, group_id, group.network
                    ),
                });
            }
        }

        if let Some(address) = self.private_address {
            if !subnet.cidr_block.contains(address) {
                return Err(TopologyError::Configuration(format!(
                    "Interface {} address {} is outside subnet {} ({})",
                    self.id, address, self.subnet, subnet.cidr_block
                )));
            }
        }

        let groups = self.security_groups.len();
        let id = ctx.insert(Resource::new(
            self.id,
            NetworkInterfaceSpec {
                subnet: self.subnet,
                security_groups: self.security_groups,
                private_address: self.private_address,
                description: self.description,
                tags: self.tags,
            },
        ))?;
        info!(interface = %id, security_groups = groups, "Network interface built");
        Ok(id)
    }
}

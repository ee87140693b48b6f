// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Topology Builder
//!
//! Produces a network, one subnet per availability zone for every subnet
//! group, the routing for those subnets, and security groups.
//!
//! Subnet blocks are carved from the network block in group order, then
//! zone order: with the defaults (10.0.0.0/16, two zones, one `/24` public
//! group) the subnets are 10.0.0.0/24 and 10.0.1.0/24.

use indexmap::IndexSet;
use tracing::{debug, info};

use crate::context::BuildContext;
use crate::domain::invariants::{validate_subnet_capacity, validate_subnet_mask};
use crate::domain::{
    IngressRule, InternetGatewaySpec, Ipv4Cidr, NetworkError, NetworkSpec, Resource, ResourceId,
    ResourceKind, Route, RouteTableSpec, SecurityGroupSpec, SubnetSpec, SubnetVisibility,
};
use crate::errors::{TopologyError, TopologyResult};

/// Default network block
pub const DEFAULT_NETWORK_CIDR: &str = "10.0.0.0/16";

/// A set of subnets sharing a name, visibility and mask, one per zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetGroup {
    pub name: String,
    pub visibility: SubnetVisibility,
    pub mask_bits: u8,
}

impl SubnetGroup {
    pub fn new(name: impl Into<String>, visibility: SubnetVisibility, mask_bits: u8) -> Self {
        Self {
            name: name.into(),
            visibility,
            mask_bits,
        }
    }

    pub fn public(mask_bits: u8) -> Self {
        Self::new("Public", SubnetVisibility::Public, mask_bits)
    }
}

/// Subnet produced by the builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetRef {
    pub id: ResourceId,
    pub group_name: String,
    pub visibility: SubnetVisibility,
    pub availability_zone: usize,
    pub cidr_block: Ipv4Cidr,
    pub route_table: ResourceId,
}

/// Read-only view selecting one subnet of a network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetSelection {
    pub visibility: SubnetVisibility,
    /// Narrows the match when several groups share a visibility
    pub group_name: Option<String>,
    pub availability_zone: usize,
}

impl SubnetSelection {
    /// Public subnet in zone `zone`
    pub fn public(zone: usize) -> Self {
        Self {
            visibility: SubnetVisibility::Public,
            group_name: None,
            availability_zone: zone,
        }
    }

    pub fn in_group(mut self, name: impl Into<String>) -> Self {
        self.group_name = Some(name.into());
        self
    }
}

/// Network and the subnets carved from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkTopology {
    pub network: ResourceId,
    pub cidr_block: Ipv4Cidr,
    pub internet_gateway: Option<ResourceId>,
    pub subnets: Vec<SubnetRef>,
}

impl NetworkTopology {
    pub fn subnets_of(&self, visibility: SubnetVisibility) -> impl Iterator<Item = &SubnetRef> {
        self.subnets.iter().filter(move |s| s.visibility == visibility)
    }

    pub fn public_subnets(&self) -> Vec<&SubnetRef> {
        self.subnets_of(SubnetVisibility::Public).collect()
    }

    /// Resolve a selection to exactly one subnet
    ///
    /// # Errors
    ///
    /// `Configuration` if zero or several subnets match
    pub fn select(&self, selection: &SubnetSelection) -> TopologyResult<&SubnetRef> {
        let matches: Vec<&SubnetRef> = self
            .subnets_of(selection.visibility)
            .filter(|s| s.availability_zone == selection.availability_zone)
            .filter(|s| {
                selection
                    .group_name
                    .as_deref()
                    .map_or(true, |name| s.group_name == name)
            })
            .collect();

        match matches.as_slice() {
            [subnet] => Ok(subnet),
            [] => Err(TopologyError::Configuration(format!(
                "No {} subnet in zone {} of {}",
                selection.visibility, selection.availability_zone, self.network
            ))),
            many => Err(TopologyError::Configuration(format!(
                "Selection matches {} {} subnets in zone {} of {}; name a subnet group",
                many.len(),
                selection.visibility,
                selection.availability_zone,
                self.network
            ))),
        }
    }
}

/// Builder for a network and its subnets
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    id: ResourceId,
    cidr_block: Option<Ipv4Cidr>,
    max_availability_zones: u8,
    groups: Vec<SubnetGroup>,
    enable_dns: bool,
}

impl NetworkBuilder {
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            cidr_block: None,
            max_availability_zones: 2,
            groups: Vec::new(),
            enable_dns: true,
        }
    }

    pub fn cidr_block(mut self, cidr: Ipv4Cidr) -> Self {
        self.cidr_block = Some(cidr);
        self
    }

    pub fn max_availability_zones(mut self, zones: u8) -> Self {
        self.max_availability_zones = zones;
        self
    }

    pub fn subnet_group(mut self, group: SubnetGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn enable_dns(mut self, enabled: bool) -> Self {
        self.enable_dns = enabled;
        self
    }

    fn validate(&self, cidr: &Ipv4Cidr) -> TopologyResult<()> {
        if self.max_availability_zones == 0 {
            return Err(TopologyError::Configuration(
                "max availability zones must be at least 1".to_string(),
            ));
        }
        if self.groups.is_empty() {
            return Err(TopologyError::Configuration(format!(
                "Network {} declares no subnet groups",
                self.id
            )));
        }

        let mut names = IndexSet::new();
        for group in &self.groups {
            if !names.insert(group.name.as_str()) {
                return Err(TopologyError::Configuration(format!(
                    "Duplicate subnet group name: {}",
                    group.name
                )));
            }
            validate_subnet_mask(group.mask_bits)?;
            validate_subnet_capacity(cidr, group.mask_bits, usize::from(self.max_availability_zones))?;
        }
        Ok(())
    }

    /// Insert the network, its subnets and routing into `ctx`
    pub fn build(self, ctx: &mut BuildContext) -> TopologyResult<NetworkTopology> {
        let cidr = match self.cidr_block {
            Some(cidr) => cidr,
            None => Ipv4Cidr::new(DEFAULT_NETWORK_CIDR)?,
        };
        self.validate(&cidr)?;

        ctx.insert(Resource::new(
            self.id.clone(),
            NetworkSpec {
                name: format!("{}/{}", ctx.stack_name(), self.id),
                cidr_block: cidr,
                enable_dns_hostnames: self.enable_dns,
                enable_dns_support: self.enable_dns,
            },
        ))?;

        let internet_gateway = if self
            .groups
            .iter()
            .any(|g| g.visibility == SubnetVisibility::Public)
        {
            let igw = self.id.child("IGW")?;
            ctx.insert(Resource::new(
                igw.clone(),
                InternetGatewaySpec {
                    network: self.id.clone(),
                },
            ))?;
            Some(igw)
        } else {
            None
        };

        let mut allocator = BlockAllocator::new(cidr);
        let mut subnets = Vec::new();
        for group in &self.groups {
            for zone in 0..usize::from(self.max_availability_zones) {
                let block = allocator.next(group.mask_bits)?;
                let subnet_id = self.id.child(&format!("{}Subnet{}", group.name, zone + 1))?;
                let public = group.visibility == SubnetVisibility::Public;

                ctx.insert(Resource::new(
                    subnet_id.clone(),
                    SubnetSpec {
                        network: self.id.clone(),
                        cidr_block: block,
                        availability_zone: zone,
                        visibility: group.visibility,
                        group_name: group.name.clone(),
                        map_public_ip_on_launch: public,
                    },
                ))?;

                let routes = match (&internet_gateway, public) {
                    (Some(gateway), true) => vec![Route {
                        destination: Ipv4Cidr::ANY,
                        gateway: gateway.clone(),
                    }],
                    _ => Vec::new(),
                };
                let route_table = subnet_id.child("RouteTable")?;
                ctx.insert(Resource::new(
                    route_table.clone(),
                    RouteTableSpec {
                        network: self.id.clone(),
                        subnet: subnet_id.clone(),
                        routes,
                    },
                ))?;

                debug!(subnet = %subnet_id, cidr = %block, zone, "Allocated subnet");
                subnets.push(SubnetRef {
                    id: subnet_id,
                    group_name: group.name.clone(),
                    visibility: group.visibility,
                    availability_zone: zone,
                    cidr_block: block,
                    route_table,
                });
            }
        }

        info!(
            network = %self.id,
            cidr = %cidr,
            zones = self.max_availability_zones,
            subnets = subnets.len(),
            "Network topology built"
        );

        Ok(NetworkTopology {
            network: self.id,
            cidr_block: cidr,
            internet_gateway,
            subnets,
        })
    }
}

/// Sequential, alignment-respecting block allocator
struct BlockAllocator {
    network: Ipv4Cidr,
    /// Offset of the first free address from the network address
    offset: u64,
}

impl BlockAllocator {
    fn new(network: Ipv4Cidr) -> Self {
        Self { network, offset: 0 }
    }

    fn next(&mut self, mask: u8) -> Result<Ipv4Cidr, NetworkError> {
        let size = 1u64 << (32 - u32::from(mask));
        let index = self.offset.div_ceil(size);
        let block = usize::try_from(index)
            .map_err(|_| NetworkError::AddressSpaceExhausted {
                network: self.network.to_string(),
                mask,
                requested: usize::MAX,
            })
            .and_then(|index| self.network.subdivide(mask, index))?;
        self.offset = (index + 1) * size;
        Ok(block)
    }
}

/// Builder for a security group
#[derive(Debug, Clone)]
pub struct SecurityGroupBuilder {
    id: ResourceId,
    network: ResourceId,
    description: String,
    allow_all_outbound: bool,
    ingress: Vec<IngressRule>,
}

impl SecurityGroupBuilder {
    pub fn new(id: ResourceId, network: &ResourceId) -> Self {
        Self {
            id,
            network: network.clone(),
            description: String::new(),
            allow_all_outbound: true,
            ingress: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn allow_all_outbound(mut self, allow: bool) -> Self {
        self.allow_all_outbound = allow;
        self
    }

    pub fn ingress(mut self, rule: IngressRule) -> Self {
        self.ingress.push(rule);
        self
    }

    pub fn build(self, ctx: &mut BuildContext) -> TopologyResult<ResourceId> {
        ctx.require(&self.id, &self.network, ResourceKind::Network)?;

        let description = if self.description.is_empty() {
            format!("{}/{}", ctx.stack_name(), self.id)
        } else {
            self.description
        };
        if description.len() > 255 {
            return Err(TopologyError::Configuration(format!(
                "Security group {} description exceeds 255 characters",
                self.id
            )));
        }

        let rules = self.ingress.len();
        let id = ctx.insert(Resource::new(
            self.id,
            SecurityGroupSpec {
                network: self.network,
                description,
                allow_all_outbound: self.allow_all_outbound,
                ingress: self.ingress,
            },
        ))?;
        info!(security_group = %id, ingress_rules = rules, "Security group built");
        Ok(id)
    }
}

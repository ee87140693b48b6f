// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Graph Assembler
//!
//! Consumes a [`BuildContext`] and either returns a frozen
//! [`ValidatedGraph`] with the collected advisories, or the first validation
//! error. Placement and device-index mistakes are caught here, before
//! anything is submitted to the provisioning backend.
//!
//! # Checks, in order
//!
//! 1. Every reference (resources and outputs) resolves
//! 2. The reference graph is acyclic
//! 3. Per-resource cross checks:
//!    - referenced ids have the expected kind
//!    - security groups share the network of the subnet they guard
//!    - instance interfaces all live in the instance's network and zone
//!    - partition numbers fall inside the group's partition count
//! 4. Role names are unique across the graph

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::{error, info};
use uuid::Uuid;

use super::{ResourceGraph, ValidatedGraph};
use crate::advisory::AdvisoryWarning;
use crate::context::{require_kind, BuildContext};
use crate::domain::invariants::{validate_interface_bindings, validate_partition_number};
use crate::domain::{
    BindingTarget, InstanceSpec, NetworkInterfaceSpec, Resource, ResourceId, ResourceKind,
    ResourceProperties, RouteTableSpec, SubnetSpec,
};
use crate::errors::{TopologyError, TopologyResult};

/// Outcome of a successful assembly run
#[derive(Debug, Clone)]
pub struct AssembledTopology {
    pub run_id: Uuid,
    pub assembled_at: DateTime<Utc>,
    pub graph: ValidatedGraph,
    pub advisories: Vec<AdvisoryWarning>,
}

/// Validates a build context into a read-only graph
#[derive(Debug, Default, Clone, Copy)]
pub struct Assembler;

impl Assembler {
    pub fn new() -> Self {
        Self
    }

    /// Validate and freeze the graph owned by `ctx`
    pub fn assemble(&self, ctx: BuildContext) -> TopologyResult<AssembledTopology> {
        let run_id = ctx.run_id();
        let (stack_name, graph, advisories) = ctx.into_parts();

        let result = Self::validate(&graph);
        let order = match result {
            Ok(order) => order,
            Err(err) => {
                error!(%run_id, stack = %stack_name, error = %err, "Topology assembly failed");
                return Err(err);
            }
        };

        info!(
            %run_id,
            stack = %stack_name,
            resources = graph.len(),
            network = graph.resources().filter(|r| r.kind().is_network()).count(),
            identity = graph.resources().filter(|r| r.kind().is_identity()).count(),
            advisories = advisories.len(),
            "Topology assembled"
        );

        Ok(AssembledTopology {
            run_id,
            assembled_at: Utc::now(),
            graph: ValidatedGraph::new(stack_name, graph, order),
            advisories,
        })
    }

    fn validate(graph: &ResourceGraph) -> TopologyResult<Vec<ResourceId>> {
        if let Some((from, target)) = graph.find_unresolved() {
            return Err(TopologyError::UnresolvedReference { from, target });
        }
        for output in graph.outputs() {
            let target = output.value.target();
            if !graph.contains(target) {
                return Err(TopologyError::UnresolvedReference {
                    from: ResourceId::new(output.name.as_str())?,
                    target: target.clone(),
                });
            }
        }

        let order = graph.topological_order()?;

        for resource in graph.resources() {
            Self::check_resource(graph, resource)?;
        }
        Self::check_role_names(graph)?;

        Ok(order)
    }

    fn check_role_names(graph: &ResourceGraph) -> TopologyResult<()> {
        let mut named: IndexMap<&str, &ResourceId> = IndexMap::new();
        for resource in graph.resources() {
            let Some(name) = resource.as_role().and_then(|r| r.role_name.as_deref()) else {
                continue;
            };
            if let Some(first) = named.insert(name, resource.id()) {
                return Err(TopologyError::Configuration(format!(
                    "Roles {} and {} share the role name {}",
                    first,
                    resource.id(),
                    name
                )));
            }
        }
        Ok(())
    }

    fn check_resource(graph: &ResourceGraph, resource: &Resource) -> TopologyResult<()> {
        let id = resource.id();
        match resource.properties() {
            ResourceProperties::Network(_) | ResourceProperties::PlacementGroup(_) => Ok(()),
            ResourceProperties::Role(_) => Ok(()),
            ResourceProperties::Subnet(spec) => {
                require_kind(graph, id, &spec.network, ResourceKind::Network).map(|_| ())
            }
            ResourceProperties::InternetGateway(spec) => {
                require_kind(graph, id, &spec.network, ResourceKind::Network).map(|_| ())
            }
            ResourceProperties::SecurityGroup(spec) => {
                require_kind(graph, id, &spec.network, ResourceKind::Network).map(|_| ())
            }
            ResourceProperties::RouteTable(spec) => Self::check_route_table(graph, id, spec),
            ResourceProperties::NetworkInterface(spec) => {
                Self::check_interface(graph, id, spec).map(|_| ())
            }
            ResourceProperties::Instance(spec) => Self::check_instance(graph, id, spec),
            ResourceProperties::Policy(spec) => {
                for role in &spec.roles {
                    require_kind(graph, id, role, ResourceKind::Role)?;
                }
                Ok(())
            }
        }
    }

    fn subnet<'g>(
        graph: &'g ResourceGraph,
        from: &ResourceId,
        subnet: &ResourceId,
    ) -> TopologyResult<&'g SubnetSpec> {
        require_kind(graph, from, subnet, ResourceKind::Subnet)?
            .as_subnet()
            .ok_or_else(|| TopologyError::Configuration(format!("{} is not a subnet", subnet)))
    }

    /// Every security group must belong to the subnet's network
    fn check_security_groups<'a>(
        graph: &ResourceGraph,
        from: &ResourceId,
        subnet_id: &ResourceId,
        subnet: &SubnetSpec,
        groups: impl IntoIterator<Item = &'a ResourceId>,
    ) -> TopologyResult<()> {
        for group_id in groups {
            let group = require_kind(graph, from, group_id, ResourceKind::SecurityGroup)?
                .as_security_group()
                .ok_or_else(|| {
                    TopologyError::Configuration(format!("{} is not a security group", group_id))
                })?;
            if group.network != subnet.network {
                return Err(TopologyError::SubnetMismatch {
                    resource: from.clone(),
                    subnet: subnet_id.clone(),
                    reason: format!(
                        "is in network {} but security group {} is in network {}",
                        subnet.network, group_id, group.network
                    ),
                });
            }
        }
        Ok(())
    }

    fn check_route_table(
        graph: &ResourceGraph,
        id: &ResourceId,
        spec: &RouteTableSpec,
    ) -> TopologyResult<()> {
        require_kind(graph, id, &spec.network, ResourceKind::Network)?;
        let subnet = Self::subnet(graph, id, &spec.subnet)?;
        if subnet.network != spec.network {
            return Err(TopologyError::SubnetMismatch {
                resource: id.clone(),
                subnet: spec.subnet.clone(),
                reason: format!(
                    "is in network {}, route table is in network {}",
                    subnet.network, spec.network
                ),
            });
        }
        for route in &spec.routes {
            require_kind(graph, id, &route.gateway, ResourceKind::InternetGateway)?;
        }
        Ok(())
    }

    fn check_interface<'g>(
        graph: &'g ResourceGraph,
        id: &ResourceId,
        spec: &NetworkInterfaceSpec,
    ) -> TopologyResult<&'g SubnetSpec> {
        let subnet = Self::subnet(graph, id, &spec.subnet)?;
        Self::check_security_groups(graph, id, &spec.subnet, subnet, &spec.security_groups)?;
        if let Some(address) = spec.private_address {
            if !subnet.cidr_block.contains(address) {
                return Err(TopologyError::Configuration(format!(
                    "Interface {} address {} is outside subnet {} ({})",
                    id, address, spec.subnet, subnet.cidr_block
                )));
            }
        }
        Ok(subnet)
    }

    fn check_instance(
        graph: &ResourceGraph,
        id: &ResourceId,
        spec: &InstanceSpec,
    ) -> TopologyResult<()> {
        validate_interface_bindings(id, &spec.network_interfaces)?;

        let group = require_kind(graph, id, &spec.placement.group, ResourceKind::PlacementGroup)?
            .as_placement_group()
            .ok_or_else(|| {
                TopologyError::Configuration(format!(
                    "{} is not a placement group",
                    spec.placement.group
                ))
            })?;
        validate_partition_number(id, spec, group)?;

        // The primary inline binding fixes the instance's network and zone
        let mut bindings: Vec<_> = spec.network_interfaces.iter().collect();
        bindings.sort_by_key(|b| b.device_index);

        let mut scope: Option<(&ResourceId, &SubnetSpec)> = None;
        for binding in bindings {
            let (subnet_id, subnet) = match &binding.target {
                BindingTarget::Inline {
                    subnet: subnet_id,
                    security_groups,
                    ..
                } => {
                    let subnet = Self::subnet(graph, id, subnet_id)?;
                    Self::check_security_groups(graph, id, subnet_id, subnet, security_groups)?;
                    (subnet_id, subnet)
                }
                BindingTarget::Existing { interface } => {
                    let eni = require_kind(graph, id, interface, ResourceKind::NetworkInterface)?
                        .as_network_interface()
                        .ok_or_else(|| {
                            TopologyError::Configuration(format!(
                                "{} is not a network interface",
                                interface
                            ))
                        })?;
                    let subnet = Self::check_interface(graph, interface, eni)?;
                    (&eni.subnet, subnet)
                }
            };

            match scope {
                None => scope = Some((subnet_id, subnet)),
                Some((primary_id, primary)) => {
                    if subnet.network != primary.network {
                        return Err(TopologyError::SubnetMismatch {
                            resource: id.clone(),
                            subnet: subnet_id.clone(),
                            reason: format!(
                                "is in network {}, instance is in network {}",
                                subnet.network, primary.network
                            ),
                        });
                    }
                    if subnet.availability_zone != primary.availability_zone {
                        return Err(TopologyError::SubnetMismatch {
                            resource: id.clone(),
                            subnet: subnet_id.clone(),
                            reason: format!(
                                "is in zone {}, instance is in zone {} via {}",
                                subnet.availability_zone, primary.availability_zone, primary_id
                            ),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Effect, InternetGatewaySpec, Ipv4Cidr, NetworkSpec, PolicySpec, PolicyStatement,
        RoleSpec, SubnetVisibility, TrustPrincipal,
    };

    fn id(s: &str) -> ResourceId {
        ResourceId::new(s).unwrap()
    }

    fn network(name: &str) -> Resource {
        Resource::new(
            id(name),
            NetworkSpec {
                name: name.to_string(),
                cidr_block: Ipv4Cidr::new("10.0.0.0/16").unwrap(),
                enable_dns_hostnames: true,
                enable_dns_support: true,
            },
        )
    }

    fn subnet(name: &str, network: &str) -> Resource {
        Resource::new(
            id(name),
            SubnetSpec {
                network: id(network),
                cidr_block: Ipv4Cidr::new("10.0.0.0/24").unwrap(),
                availability_zone: 0,
                visibility: SubnetVisibility::Public,
                group_name: "Public".to_string(),
                map_public_ip_on_launch: true,
            },
        )
    }

    fn role(name: &str, role_name: Option<&str>) -> Resource {
        Resource::new(
            id(name),
            RoleSpec {
                role_name: role_name.map(str::to_string),
                description: None,
                trust: TrustPrincipal::current_account(),
                managed_policies: Default::default(),
            },
        )
    }

    fn context(resources: impl IntoIterator<Item = Resource>) -> BuildContext {
        let mut ctx = BuildContext::new("Test");
        for resource in resources {
            ctx.insert(resource).unwrap();
        }
        ctx
    }

    #[test]
    fn test_route_table_in_other_network_rejected() {
        let table = Resource::new(
            id("SubnetRouteTable"),
            RouteTableSpec {
                network: id("Other"),
                subnet: id("Subnet"),
                routes: vec![],
            },
        );
        let ctx = context([network("Vpc"), network("Other"), subnet("Subnet", "Vpc"), table]);

        let result = Assembler::new().assemble(ctx);
        assert!(matches!(
            result,
            Err(TopologyError::SubnetMismatch { ref resource, ref subnet, .. })
                if *resource == id("SubnetRouteTable") && *subnet == id("Subnet")
        ));
    }

    #[test]
    fn test_policy_must_attach_to_a_role() {
        let policy = Resource::new(
            id("Policy"),
            PolicySpec {
                policy_name: "Policy".to_string(),
                roles: [id("Vpc")].into_iter().collect(),
                statements: vec![PolicyStatement::new(
                    Effect::Allow,
                    ["dynamodb:GetItem"],
                    ["*"],
                )
                .unwrap()],
            },
        );
        let ctx = context([network("Vpc"), policy]);

        assert_eq!(
            Assembler::new().assemble(ctx).map(|_| ()),
            Err(TopologyError::WrongResourceKind {
                from: id("Policy"),
                target: id("Vpc"),
                expected: ResourceKind::Role,
                actual: ResourceKind::Network,
            })
        );
    }

    #[test]
    fn test_cycle_rejected_at_assembly() {
        let ctx = context([
            network("Vpc").with_dependency(&id("Igw")),
            Resource::new(id("Igw"), InternetGatewaySpec { network: id("Vpc") }),
        ]);

        assert_eq!(
            Assembler::new().assemble(ctx).map(|_| ()),
            Err(TopologyError::CyclicDependency(vec![id("Vpc"), id("Igw"), id("Vpc")]))
        );
    }

    #[test]
    fn test_duplicate_role_names_rejected() {
        let ctx = context([role("First", Some("Shared")), role("Second", Some("Shared"))]);
        let result = Assembler::new().assemble(ctx);
        assert!(matches!(result, Err(TopologyError::Configuration(ref m)) if m.contains("Shared")));

        let unnamed = context([role("First", None), role("Second", None)]);
        assert!(Assembler::new().assemble(unnamed).is_ok());
    }
}

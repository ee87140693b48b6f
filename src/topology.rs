// Copyright (c) 2025 - Cowboy AI, Inc.
//! Partition/Interface Reference Topology
//!
//! One network with public subnets, a partition placement group, an SSH
//! security group, a standalone secondary interface, a dual-interface
//! instance pinned to a partition, and two roles: one trusted by the
//! compute service with a managed policy, one trusted by the account with
//! an inline read-only policy.
//!
//! ```text
//! VPC ── VPCPublicSubnet1 ── SecondaryENI ──┐
//!  └──── InstanceSG ────────────────────────┼── MyPartitionInstance
//! PartitionPlacementGroup ──────────────────┘
//! MyEC2Role        MyUserAssumableRole ← MyUserAssumableRoleDefaultPolicy
//! ```

use tracing::info;

use crate::builders::{
    InstanceBuilder, InstanceRef, InterfaceAttachment, NetworkBuilder, NetworkInterfaceBuilder,
    NetworkTopology, PlacementGroupBuilder, PlacementGroupRef, RoleBuilder, RoleRef,
    SecurityGroupBuilder, SubnetGroup, SubnetSelection,
};
use crate::config::TopologyConfig;
use crate::context::BuildContext;
use crate::domain::{
    IngressRule, InstanceShape, Ipv4Cidr, PlacementStrategy, PolicyStatement, Reference,
    RemovalPolicy, ResourceId, TrustPrincipal,
};
use crate::errors::TopologyResult;
use crate::graph::{AssembledTopology, Assembler, DeclaredState, StackOutput, ValidatedGraph};
use crate::image::ImageResolver;
use crate::resolution::{
    OUTPUT_EC2_ROLE_ARN, OUTPUT_INSTANCE_ID, OUTPUT_PLACEMENT_GROUP_NAME,
    OUTPUT_USER_ASSUMABLE_ROLE_ARN,
};

const COMPUTE_SERVICE: &str = "ec2.amazonaws.com";
const SSH_PORT: u16 = 22;

/// Handles to everything the reference topology declares
#[derive(Debug, Clone)]
pub struct PartitionEniTopology {
    pub assembled: AssembledTopology,
    pub network: NetworkTopology,
    pub placement_group: PlacementGroupRef,
    pub security_group: ResourceId,
    pub secondary_interface: ResourceId,
    pub instance: InstanceRef,
    pub instance_role: RoleRef,
    pub user_role: RoleRef,
}

impl PartitionEniTopology {
    /// The assembled graph, ready for submission
    pub fn graph(&self) -> &ValidatedGraph {
        &self.assembled.graph
    }

    pub fn declared_state(&self) -> DeclaredState {
        self.assembled.graph.declared_state()
    }
}

fn id(name: &str) -> TopologyResult<ResourceId> {
    ResourceId::new(name)
}

/// Build and assemble the reference topology
///
/// # Errors
///
/// Any builder or assembly error; nothing is returned partially built
pub fn build_partition_eni_topology(
    config: &TopologyConfig,
    resolver: &dyn ImageResolver,
) -> TopologyResult<PartitionEniTopology> {
    let mut ctx = BuildContext::new(config.stack_name.clone());
    info!(stack = %config.stack_name, run_id = %ctx.run_id(), "Building partition/interface topology");

    let network = NetworkBuilder::new(id("VPC")?)
        .cidr_block(Ipv4Cidr::new(&config.vpc_cidr)?)
        .max_availability_zones(config.max_availability_zones)
        .subnet_group(SubnetGroup::public(config.subnet_mask_bits))
        .build(&mut ctx)?;
    let subnet = network.select(&SubnetSelection::public(0))?.id.clone();

    let placement_group =
        PlacementGroupBuilder::new(id("PartitionPlacementGroup")?, PlacementStrategy::Partition)
            .partitions(config.partition_count)
            .removal_policy(RemovalPolicy::Destroy)
            .build(&mut ctx)?;

    let security_group = SecurityGroupBuilder::new(id("InstanceSG")?, &network.network)
        .description("Allow SSH")
        .allow_all_outbound(true)
        .ingress(IngressRule::tcp(
            Ipv4Cidr::new(&config.ssh_ingress_cidr)?,
            SSH_PORT,
            "Allow SSH access",
        ))
        .build(&mut ctx)?;

    let mut eni = NetworkInterfaceBuilder::new(id("SecondaryENI")?, &subnet)
        .security_group(&security_group)
        .description("Secondary ENI for EC2 Instance")
        .tag("Name", "Secondary-ENI");
    if let Some(address) = config.secondary_private_address {
        eni = eni.private_address(address);
    }
    let secondary_interface = eni.build(&mut ctx)?;

    let image = resolver.resolve_image(&config.image)?;
    let instance = InstanceBuilder::new(
        id("MyPartitionInstance")?,
        image,
        InstanceShape::new(&config.instance_shape)?,
    )
    .key_name(config.key_pair_name.clone())
    .placement(&placement_group.id, config.partition_number)
    .attach(InterfaceAttachment::primary(
        &subnet,
        [&security_group],
        config.primary_associates_public_address,
    ))
    .attach(InterfaceAttachment::secondary(&secondary_interface))
    .build(&mut ctx)?;

    let instance_role = RoleBuilder::new(id("MyEC2Role")?)
        .assumed_by(TrustPrincipal::service(COMPUTE_SERVICE)?)
        .role_name(config.instance_role_name.clone())
        .description("This role is assumed by an EC2 instance for application needs.")
        .managed_policy("AmazonS3ReadOnlyAccess")
        .build(&mut ctx)?;

    let user_role = RoleBuilder::new(id("MyUserAssumableRole")?)
        .assumed_by(TrustPrincipal::account(config.account_id.clone())?)
        .role_name(config.user_role_name.clone())
        .description("This role can be assumed by developers for read-only access.")
        .add_to_policy(PolicyStatement::allow([
            "dynamodb:GetItem",
            "dynamodb:Scan",
            "dynamodb:Query",
            "dynamodb:ListTables",
        ])?)
        .build(&mut ctx)?;

    let outputs = [
        (OUTPUT_INSTANCE_ID, None, instance.instance_id()),
        (
            OUTPUT_PLACEMENT_GROUP_NAME,
            None,
            Reference::id(&placement_group.id),
        ),
        (
            OUTPUT_EC2_ROLE_ARN,
            Some("ARN of the IAM role for the EC2 instance"),
            instance_role.arn(),
        ),
        (
            OUTPUT_USER_ASSUMABLE_ROLE_ARN,
            Some("ARN of the IAM role for users to assume"),
            user_role.arn(),
        ),
    ];
    for (name, description, value) in outputs {
        ctx.add_output(StackOutput {
            name: name.to_string(),
            description: description.map(str::to_string),
            value,
        })?;
    }

    let assembled = Assembler::new().assemble(ctx)?;

    Ok(PartitionEniTopology {
        assembled,
        network,
        placement_group,
        security_group,
        secondary_interface,
        instance,
        instance_role,
        user_role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceKind;
    use crate::errors::TopologyError;
    use crate::image::SsmImageResolver;

    #[test]
    fn test_default_topology_assembles() {
        let topology =
            build_partition_eni_topology(&TopologyConfig::default(), &SsmImageResolver).unwrap();

        let graph = &topology.assembled.graph;
        // VPC, IGW, 2 × (subnet + route table), placement group, SG, ENI,
        // instance, 2 roles, 1 policy
        assert_eq!(graph.len(), 13);
        assert!(topology.assembled.advisories.is_empty());
        assert_eq!(graph.outputs().count(), 4);

        let order = graph.dependency_order();
        let position = |name: &str| order.iter().position(|i| i.as_str() == name).unwrap();
        assert!(position("SecondaryENI") < position("MyPartitionInstance"));
        assert!(position("PartitionPlacementGroup") < position("MyPartitionInstance"));
        assert!(position("MyUserAssumableRole") < position("MyUserAssumableRoleDefaultPolicy"));
    }

    #[test]
    fn test_out_of_range_partition_fails_assembly() {
        let config = TopologyConfig {
            partition_number: Some(3),
            ..TopologyConfig::default()
        };
        let result = build_partition_eni_topology(&config, &SsmImageResolver);
        assert!(matches!(
            result,
            Err(TopologyError::PartitionNumberOutOfRange { partition: 3, partition_count: 3, .. })
        ));
    }

    #[test]
    fn test_secondary_address_must_fit_subnet() {
        let config = TopologyConfig {
            secondary_private_address: Some("10.0.0.100".parse().unwrap()),
            ..TopologyConfig::default()
        };
        let topology = build_partition_eni_topology(&config, &SsmImageResolver).unwrap();
        let eni = topology.assembled.graph.get(&topology.secondary_interface).unwrap();
        assert_eq!(eni.kind(), ResourceKind::NetworkInterface);

        let outside = TopologyConfig {
            secondary_private_address: Some("10.0.1.100".parse().unwrap()),
            ..TopologyConfig::default()
        };
        assert!(build_partition_eni_topology(&outside, &SsmImageResolver).is_err());
    }
}

// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Assembly Tests
//!
//! End-to-end builder → assembler runs: placement and interface errors are
//! caught before anything reaches a backend, advisories travel with the
//! graph, and declared state is deterministic.

mod fixtures;

use anyhow::Result;
use pretty_assertions::assert_eq;
use test_case::test_case;

use cim_cloud_topology::builders::{
    InterfaceAttachment, InstanceBuilder, NetworkBuilder, NetworkInterfaceBuilder,
    PlacementGroupBuilder, RoleBuilder, SecurityGroupBuilder, SubnetGroup,
};
use cim_cloud_topology::domain::{PlacementStrategy, PolicyStatement, Reference, TrustPrincipal};
use cim_cloud_topology::{
    build_partition_eni_topology, Assembler, BuildContext, DeclaredState, SsmImageResolver,
    StackOutput, TopologyError,
};
use fixtures::*;

#[test_case(0 ; "zero partitions")]
#[test_case(8 ; "above provider ceiling")]
fn test_partition_count_out_of_bounds(count: u32) {
    let mut ctx = BuildContext::new(STACK_NAME);
    let result = PlacementGroupBuilder::new(id("Pg"), PlacementStrategy::Partition)
        .partitions(count)
        .build(&mut ctx);
    assert_eq!(result, Err(TopologyError::InvalidPartitionCount(count)));
}

#[test_case(0, true ; "first partition")]
#[test_case(2, true ; "last partition")]
#[test_case(3, false ; "one past the end")]
#[test_case(6, false ; "far past the end")]
fn test_partition_number_checked_at_assembly(partition: u32, assembles: bool) -> Result<()> {
    let mut ctx = single_network_context(3);
    instance(Some(partition)).build(&mut ctx)?;

    let result = Assembler::new().assemble(ctx);
    if assembles {
        assert!(result.is_ok());
    } else {
        assert!(matches!(
            result,
            Err(TopologyError::PartitionNumberOutOfRange { partition_count: 3, .. })
        ));
    }
    Ok(())
}

#[test]
fn test_omitted_partition_number_assembles() -> Result<()> {
    let mut ctx = single_network_context(3);
    instance(None).build(&mut ctx)?;
    Assembler::new().assemble(ctx)?;
    Ok(())
}

#[test]
fn test_interface_from_other_network_is_subnet_mismatch() -> Result<()> {
    init_tracing();
    let mut ctx = BuildContext::new(STACK_NAME);
    add_network(&mut ctx, "NetOne", "10.0.0.0/16");
    add_network(&mut ctx, "NetTwo", "10.1.0.0/16");
    add_partition_group(&mut ctx, 3);

    // interface lives in NetOne, the instance's primary subnet in NetTwo
    NetworkInterfaceBuilder::new(id("Eni"), &id("NetOnePublicSubnet1"))
        .security_group(&id("NetOneSg"))
        .build(&mut ctx)?;
    InstanceBuilder::new(id("Instance"), image(), shape())
        .placement(&id("Pg"), Some(0))
        .attach(InterfaceAttachment::primary(
            &id("NetTwoPublicSubnet1"),
            [&id("NetTwoSg")],
            true,
        ))
        .attach(InterfaceAttachment::secondary(&id("Eni")))
        .build(&mut ctx)?;

    let result = Assembler::new().assemble(ctx);
    assert!(matches!(
        result,
        Err(TopologyError::SubnetMismatch { ref subnet, .. }) if subnet == &id("NetOnePublicSubnet1")
    ));
    Ok(())
}

#[test]
fn test_primary_security_group_from_other_network_is_subnet_mismatch() -> Result<()> {
    let mut ctx = BuildContext::new(STACK_NAME);
    add_network(&mut ctx, "NetOne", "10.0.0.0/16");
    add_network(&mut ctx, "NetTwo", "10.1.0.0/16");
    add_partition_group(&mut ctx, 3);

    InstanceBuilder::new(id("Instance"), image(), shape())
        .placement(&id("Pg"), None)
        .attach(InterfaceAttachment::primary(
            &id("NetOnePublicSubnet1"),
            [&id("NetTwoSg")],
            false,
        ))
        .build(&mut ctx)?;

    assert!(matches!(
        Assembler::new().assemble(ctx),
        Err(TopologyError::SubnetMismatch { .. })
    ));
    Ok(())
}

#[test]
fn test_interface_in_other_zone_is_subnet_mismatch() -> Result<()> {
    let mut ctx = BuildContext::new(STACK_NAME);
    NetworkBuilder::new(id("Vpc"))
        .max_availability_zones(2)
        .subnet_group(SubnetGroup::public(24))
        .build(&mut ctx)?;
    SecurityGroupBuilder::new(id("VpcSg"), &id("Vpc")).build(&mut ctx)?;
    add_partition_group(&mut ctx, 3);

    // same network, zone 1 against the primary's zone 0
    NetworkInterfaceBuilder::new(id("Eni"), &id("VpcPublicSubnet2"))
        .security_group(&id("VpcSg"))
        .build(&mut ctx)?;
    instance(Some(0)).build(&mut ctx)?;

    let result = Assembler::new().assemble(ctx);
    assert!(matches!(
        result,
        Err(TopologyError::SubnetMismatch { ref resource, ref subnet, .. })
            if resource == &id("Instance") && subnet == &id("VpcPublicSubnet2")
    ));
    Ok(())
}

#[test]
fn test_dangling_output_is_unresolved_reference() -> Result<()> {
    let mut ctx = single_network_context(3);
    ctx.add_output(StackOutput {
        name: "InstanceId".into(),
        description: None,
        value: Reference::id(&id("NotBuilt")),
    })?;
    assert!(matches!(
        Assembler::new().assemble(ctx),
        Err(TopologyError::UnresolvedReference { .. })
    ));
    Ok(())
}

#[test]
fn test_output_names_checked_when_declared() -> Result<()> {
    let mut ctx = single_network_context(3);
    let declared = ctx.add_output(StackOutput {
        name: "Instance-Id".into(),
        description: None,
        value: Reference::id(&id("NotBuilt")),
    });
    assert!(matches!(declared, Err(TopologyError::Configuration(_))));
    assert!(Assembler::new().assemble(ctx).is_ok());
    Ok(())
}

#[test]
fn test_device_indices_are_contiguous() -> Result<()> {
    let mut ctx = single_network_context(3);
    NetworkInterfaceBuilder::new(id("EniTwo"), &id("VpcPublicSubnet1"))
        .security_group(&id("VpcSg"))
        .build(&mut ctx)?;
    let built = instance(Some(1))
        .attach(InterfaceAttachment::secondary(&id("EniTwo")))
        .build(&mut ctx)?;

    let assembled = Assembler::new().assemble(ctx)?;
    let spec = assembled
        .graph
        .get(&built.id)
        .and_then(|r| r.as_instance())
        .expect("instance in graph");
    let indices: Vec<u32> = spec.network_interfaces.iter().map(|b| b.device_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    Ok(())
}

fn role_advisories(statement: Option<PolicyStatement>) -> Result<usize> {
    let mut ctx = BuildContext::new(STACK_NAME);
    let mut role = RoleBuilder::new(id("Role"))
        .assumed_by(TrustPrincipal::service("ec2.amazonaws.com")?)
        .managed_policy("AmazonS3ReadOnlyAccess");
    if let Some(statement) = statement {
        role = role.add_to_policy(statement);
    }
    role.build(&mut ctx)?;
    Ok(Assembler::new().assemble(ctx)?.advisories.len())
}

#[test]
fn test_managed_policy_role_has_no_advisories() -> Result<()> {
    assert_eq!(role_advisories(None)?, 0);
    Ok(())
}

#[test]
fn test_wildcard_put_item_raises_one_advisory() -> Result<()> {
    let statement = PolicyStatement::allow(["dynamodb:PutItem"])?;
    assert_eq!(role_advisories(Some(statement))?, 1);
    Ok(())
}

#[test]
fn test_declared_state_is_deterministic() -> Result<()> {
    let resolver = static_resolver();
    let first = build_partition_eni_topology(&config(), &resolver)?;
    let second = build_partition_eni_topology(&config(), &resolver)?;
    assert_ne!(first.assembled.run_id, second.assembled.run_id);

    let first_state = first.declared_state();
    let second_state = second.declared_state();
    assert_eq!(first_state.to_json()?, second_state.to_json()?);

    let reparsed = DeclaredState::from_json(&first_state.to_json()?)?;
    assert_eq!(reparsed, first_state);
    assert_eq!(reparsed.output_bindings(), first_state.output_bindings());
    assert_eq!(
        reparsed.output_bindings().get("InstanceId"),
        Some(&Reference::id(&id("MyPartitionInstance")))
    );
    assert_eq!(
        reparsed.output_bindings().get("PlacementGroupName"),
        Some(&Reference::id(&id("PartitionPlacementGroup")))
    );
    Ok(())
}

#[test]
fn test_declared_state_shape() -> Result<()> {
    let topology = build_partition_eni_topology(&config(), &SsmImageResolver)?;
    let json: serde_json::Value = serde_json::from_str(&topology.declared_state().to_json()?)?;

    let instance = &json["Resources"]["MyPartitionInstance"];
    assert_eq!(instance["Type"], "AWS::EC2::Instance");
    assert_eq!(
        instance["Properties"]["ImageId"],
        "{{resolve:ssm:/aws/service/ami-amazon-linux-latest/amzn2-ami-hvm-x86_64-gp2}}"
    );
    assert_eq!(
        instance["Properties"]["Placement"],
        serde_json::json!({"GroupName": {"Ref": "PartitionPlacementGroup"}, "PartitionNumber": 0})
    );
    assert_eq!(
        instance["Properties"]["NetworkInterfaces"][1],
        serde_json::json!({"DeviceIndex": "1", "NetworkInterfaceId": {"Ref": "SecondaryENI"}})
    );
    assert_eq!(
        json["Resources"]["PartitionPlacementGroup"]["DeletionPolicy"],
        "Delete"
    );
    assert_eq!(
        json["Outputs"]["EC2RoleArn"]["Value"],
        serde_json::json!({"Fn::GetAtt": ["MyEC2Role", "Arn"]})
    );
    Ok(())
}

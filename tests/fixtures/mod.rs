// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-cloud-topology
//!
//! Deterministic contexts and configurations shared by the integration
//! suites. Every fixture builds through the public builders; tests never
//! insert raw resources.

#![allow(dead_code)]

use cim_cloud_topology::builders::{
    InstanceBuilder, InterfaceAttachment, NetworkBuilder, NetworkInterfaceBuilder,
    PlacementGroupBuilder, SecurityGroupBuilder, SubnetGroup,
};
use cim_cloud_topology::domain::{
    ImageRef, InstanceShape, Ipv4Cidr, PlacementStrategy, ResourceId,
};
use cim_cloud_topology::{BuildContext, StaticImageResolver, ImageCriteria, TopologyConfig};

pub const STACK_NAME: &str = "FixtureStack";
pub const IMAGE_ID: &str = "ami-0abcdef1234567890";

/// Install a test-writer subscriber once; `RUST_LOG` controls verbosity
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn id(name: &str) -> ResourceId {
    ResourceId::new(name).expect("fixture ids are valid")
}

pub fn image() -> ImageRef {
    ImageRef::id(IMAGE_ID).expect("fixture image id is valid")
}

pub fn shape() -> InstanceShape {
    InstanceShape::new("c5.large").expect("fixture shape is valid")
}

pub fn static_resolver() -> StaticImageResolver {
    StaticImageResolver::new()
        .with_image(ImageCriteria::amazon_linux_2(), IMAGE_ID)
        .expect("fixture image id is valid")
}

pub fn config() -> TopologyConfig {
    TopologyConfig {
        stack_name: STACK_NAME.to_string(),
        ..TopologyConfig::default()
    }
}

/// Network `name` with one public subnet, plus security group `{name}Sg`
pub fn add_network(ctx: &mut BuildContext, name: &str, cidr: &str) {
    NetworkBuilder::new(id(name))
        .cidr_block(Ipv4Cidr::new(cidr).expect("fixture cidr is valid"))
        .max_availability_zones(1)
        .subnet_group(SubnetGroup::public(24))
        .build(ctx)
        .expect("fixture network builds");
    SecurityGroupBuilder::new(id(&format!("{}Sg", name)), &id(name))
        .build(ctx)
        .expect("fixture security group builds");
}

pub fn add_partition_group(ctx: &mut BuildContext, partitions: u32) -> ResourceId {
    PlacementGroupBuilder::new(id("Pg"), PlacementStrategy::Partition)
        .partitions(partitions)
        .build(ctx)
        .expect("fixture placement group builds")
        .id
}

/// Single-network context with a partition group and one secondary ENI
pub fn single_network_context(partitions: u32) -> BuildContext {
    init_tracing();
    let mut ctx = BuildContext::new(STACK_NAME);
    add_network(&mut ctx, "Vpc", "10.0.0.0/16");
    add_partition_group(&mut ctx, partitions);
    NetworkInterfaceBuilder::new(id("Eni"), &id("VpcPublicSubnet1"))
        .security_group(&id("VpcSg"))
        .build(&mut ctx)
        .expect("fixture interface builds");
    ctx
}

/// Instance in `Vpc` carrying the fixture secondary interface
pub fn instance(partition: Option<u32>) -> InstanceBuilder {
    InstanceBuilder::new(id("Instance"), image(), shape())
        .placement(&id("Pg"), partition)
        .attach(InterfaceAttachment::primary(
            &id("VpcPublicSubnet1"),
            [&id("VpcSg")],
            true,
        ))
        .attach(InterfaceAttachment::secondary(&id("Eni")))
}

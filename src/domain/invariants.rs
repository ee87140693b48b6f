// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Topology Invariants
//!
//! Rules that can be checked on a single value or a single resource without
//! looking at the rest of the graph. Cross-resource rules live in the
//! assembler, which composes these.
//!
//! All functions are pure: no I/O, no mutation, deterministic.

use indexmap::IndexSet;

use super::compute::InstanceSpec;
use super::interface::{BindingTarget, NetworkInterfaceBinding};
use super::network::{Ipv4Cidr, NetworkError};
use super::placement::PlacementGroupSpec;
use super::resource::ResourceId;
use crate::errors::{TopologyError, TopologyResult};

/// Validate a subnet mask leaves at least two usable hosts
///
/// # Rules
/// - Mask ≤ 30 (2^(32−mask) − 2 ≥ 2)
pub fn validate_subnet_mask(mask: u8) -> Result<(), NetworkError> {
    if mask > 32 {
        return Err(NetworkError::InvalidPrefixLength(mask));
    }
    if mask > Ipv4Cidr::MAX_SUBNET_PREFIX {
        return Err(NetworkError::InsufficientHosts(mask));
    }
    Ok(())
}

/// Validate that `count` subnets of `/mask` fit into `network`
pub fn validate_subnet_capacity(
    network: &Ipv4Cidr,
    mask: u8,
    count: usize,
) -> Result<(), NetworkError> {
    if mask < network.prefix() {
        return Err(NetworkError::MaskWiderThanNetwork {
            mask,
            network: network.to_string(),
        });
    }
    if network.capacity(mask) < count as u64 {
        return Err(NetworkError::AddressSpaceExhausted {
            network: network.to_string(),
            mask,
            requested: count,
        });
    }
    Ok(())
}

/// Validate the device indices of an instance's interface bindings
///
/// # Rules
/// - At least one binding
/// - Exactly one binding at index 0, and it is the inline primary
/// - Indices unique and contiguous from 0
/// - A pre-created interface is bound at most once
pub fn validate_interface_bindings(
    instance: &ResourceId,
    bindings: &[NetworkInterfaceBinding],
) -> TopologyResult<()> {
    let invalid = |reason: String| TopologyError::InvalidInterfaceBindings {
        instance: instance.clone(),
        reason,
    };

    if bindings.is_empty() {
        return Err(invalid("instance has no network interfaces".to_string()));
    }

    let primaries = bindings.iter().filter(|b| b.is_primary()).count();
    if primaries != 1 {
        return Err(invalid(format!(
            "expected exactly one binding at device index 0, found {}",
            primaries
        )));
    }

    let mut indices: Vec<u32> = bindings.iter().map(|b| b.device_index).collect();
    indices.sort_unstable();
    for (expected, actual) in indices.iter().enumerate() {
        if *actual != expected as u32 {
            return Err(invalid(format!(
                "device indices must be contiguous from 0, got {:?}",
                indices
            )));
        }
    }

    let mut attached = IndexSet::new();
    for binding in bindings {
        match &binding.target {
            BindingTarget::Existing { interface } if binding.is_primary() => {
                return Err(invalid(format!(
                    "primary binding must be inline, found interface {}",
                    interface
                )));
            }
            BindingTarget::Existing { interface } => {
                if !attached.insert(interface) {
                    return Err(invalid(format!("interface {} is bound twice", interface)));
                }
            }
            BindingTarget::Inline { .. } if !binding.is_primary() => {
                return Err(invalid(format!(
                    "secondary binding at index {} must reference a network interface",
                    binding.device_index
                )));
            }
            BindingTarget::Inline { .. } => {}
        }
    }

    Ok(())
}

/// Validate an instance's partition number against its placement group
///
/// # Rules
/// - Only partition groups accept a partition number
/// - The number must be below the group's partition count
pub fn validate_partition_number(
    instance: &ResourceId,
    spec: &InstanceSpec,
    group: &PlacementGroupSpec,
) -> TopologyResult<()> {
    let Some(partition) = spec.placement.partition_number else {
        return Ok(());
    };

    match group.partitions() {
        Some(count) if count.admits(partition) => Ok(()),
        Some(count) => Err(TopologyError::PartitionNumberOutOfRange {
            instance: instance.clone(),
            group: spec.placement.group.clone(),
            partition,
            partition_count: count.value(),
        }),
        None => Err(TopologyError::Configuration(format!(
            "Instance {} sets partition {} on {} placement group {}",
            instance, partition, group.strategy, spec.placement.group
        ))),
    }
}

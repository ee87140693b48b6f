// Copyright (c) 2025 - Cowboy AI, Inc.
//! Device index properties

use cim_cloud_topology::builders::{InstanceBuilder, InterfaceAttachment, NetworkInterfaceBuilder};
use cim_cloud_topology::domain::invariants::validate_interface_bindings;
use cim_cloud_topology::domain::{BindingTarget, NetworkInterfaceBinding};
use cim_cloud_topology::Assembler;
use proptest::prelude::*;

use crate::fixtures::{id, image, shape, single_network_context};

fn binding(device_index: u32, position: usize) -> NetworkInterfaceBinding {
    let target = if device_index == 0 {
        BindingTarget::Inline {
            subnet: id("Subnet"),
            security_groups: Default::default(),
            associate_public_address: false,
        }
    } else {
        BindingTarget::Existing {
            interface: id(&format!("Eni{}", position)),
        }
    };
    NetworkInterfaceBinding {
        device_index,
        target,
    }
}

proptest! {
    /// Builder output: one primary at 0, indices exactly {0..N-1}
    #[test]
    fn prop_builder_assigns_contiguous_indices(
        secondaries in 0usize..6,
        primary_slot in 0usize..6,
    ) {
        let mut ctx = single_network_context(3);
        let mut attachments = Vec::new();
        for n in 0..secondaries {
            let eni = NetworkInterfaceBuilder::new(id(&format!("Extra{}", n)), &id("VpcPublicSubnet1"))
                .security_group(&id("VpcSg"))
                .build(&mut ctx)
                .unwrap();
            attachments.push(InterfaceAttachment::secondary(&eni));
        }
        let primary = InterfaceAttachment::primary(&id("VpcPublicSubnet1"), [&id("VpcSg")], true);
        attachments.insert(primary_slot.min(secondaries), primary);

        let mut builder = InstanceBuilder::new(id("Instance"), image(), shape()).placement(&id("Pg"), None);
        for attachment in attachments {
            builder = builder.attach(attachment);
        }
        let built = builder.build(&mut ctx).unwrap();

        let assembled = Assembler::new().assemble(ctx).unwrap();
        let spec = assembled.graph.get(&built.id).and_then(|r| r.as_instance()).unwrap();

        let mut indices: Vec<u32> = spec.network_interfaces.iter().map(|b| b.device_index).collect();
        prop_assert_eq!(indices.iter().filter(|i| **i == 0).count(), 1);
        indices.sort_unstable();
        let expected: Vec<u32> = (0..=secondaries as u32).collect();
        prop_assert_eq!(indices, expected);
        prop_assert!(spec.primary_binding().and_then(|b| b.inline_subnet()).is_some());
    }

    /// Validation accepts exactly the permutations of {0..N-1}
    #[test]
    fn prop_validation_requires_contiguous_indices(indices in prop::collection::vec(0u32..8, 1..8)) {
        let bindings: Vec<_> = indices
            .iter()
            .enumerate()
            .map(|(position, index)| binding(*index, position))
            .collect();

        let mut sorted = indices.clone();
        sorted.sort_unstable();
        let contiguous = sorted.iter().enumerate().all(|(i, index)| *index == i as u32);

        let result = validate_interface_bindings(&id("Instance"), &bindings);
        prop_assert_eq!(result.is_ok(), contiguous);
    }
}

// Copyright (c) 2025 - Cowboy AI, Inc.
//! Partition count and partition number properties

use cim_cloud_topology::builders::PlacementGroupBuilder;
use cim_cloud_topology::domain::PlacementStrategy;
use cim_cloud_topology::{Assembler, BuildContext, TopologyError};
use proptest::prelude::*;

use crate::fixtures::{id, instance, single_network_context, STACK_NAME};

proptest! {
    /// A partition group builds iff 1 ≤ count ≤ 7
    #[test]
    fn prop_partition_count_bounds(count in 0u32..64) {
        let mut ctx = BuildContext::new(STACK_NAME);
        let result = PlacementGroupBuilder::new(id("Pg"), PlacementStrategy::Partition)
            .partitions(count)
            .build(&mut ctx);

        if (1..=7).contains(&count) {
            prop_assert!(result.is_ok());
            prop_assert!(Assembler::new().assemble(ctx).is_ok());
        } else {
            prop_assert_eq!(result, Err(TopologyError::InvalidPartitionCount(count)));
        }
    }

    /// An instance assembles iff its partition number is below the count
    #[test]
    fn prop_partition_number_below_count(count in 1u32..=7, partition in 0u32..10) {
        let mut ctx = single_network_context(count);
        prop_assert!(instance(Some(partition)).build(&mut ctx).is_ok());

        let result = Assembler::new().assemble(ctx);
        if partition < count {
            prop_assert!(result.is_ok());
        } else {
            let is_out_of_range = matches!(
                result,
                Err(TopologyError::PartitionNumberOutOfRange { .. })
            );
            prop_assert!(is_out_of_range);
        }
    }
}

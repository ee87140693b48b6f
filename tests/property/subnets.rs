// Copyright (c) 2025 - Cowboy AI, Inc.
//! Subnet allocation properties

use cim_cloud_topology::builders::{NetworkBuilder, SubnetGroup};
use cim_cloud_topology::domain::Ipv4Cidr;
use cim_cloud_topology::BuildContext;
use proptest::prelude::*;
use test_case::test_case;

use crate::fixtures::{id, STACK_NAME};

fn build(mask: u8, zones: u8) -> Option<Vec<Ipv4Cidr>> {
    let mut ctx = BuildContext::new(STACK_NAME);
    NetworkBuilder::new(id("Vpc"))
        .cidr_block(Ipv4Cidr::new("10.0.0.0/16").unwrap())
        .max_availability_zones(zones)
        .subnet_group(SubnetGroup::public(mask))
        .build(&mut ctx)
        .ok()
        .map(|topology| topology.subnets.iter().map(|s| s.cidr_block).collect())
}

#[test_case(24, true ; "default mask")]
#[test_case(30, true ; "two usable hosts")]
#[test_case(31, false ; "no usable hosts")]
#[test_case(15, false ; "wider than network")]
fn test_mask_sizes(mask: u8, builds: bool) {
    assert_eq!(build(mask, 2).is_some(), builds);
}

proptest! {
    /// Accepted masks yield disjoint subnets inside the network
    #[test]
    fn prop_subnets_fit_and_do_not_overlap(mask in 16u8..=32, zones in 1u8..=4) {
        let network = Ipv4Cidr::new("10.0.0.0/16").unwrap();
        let fits = mask <= 30 && (1u64 << (mask - 16)) >= u64::from(zones);
        match build(mask, zones) {
            Some(subnets) => {
                prop_assert!(fits);
                prop_assert_eq!(subnets.len(), usize::from(zones));
                for (i, a) in subnets.iter().enumerate() {
                    prop_assert!(network.contains(a.network()));
                    prop_assert!(a.usable_hosts() >= 2);
                    for b in &subnets[i + 1..] {
                        prop_assert!(!a.contains(b.network()) && !b.contains(a.network()));
                    }
                }
            }
            None => prop_assert!(!fits),
        }
    }
}

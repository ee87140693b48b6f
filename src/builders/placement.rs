// Copyright (c) 2025 - Cowboy AI, Inc.
//! Placement Group Builder

use tracing::info;

use crate::context::BuildContext;
use crate::domain::{
    PartitionCount, PlacementGroupSpec, PlacementStrategy, RemovalPolicy, Resource, ResourceId,
};
use crate::errors::{TopologyError, TopologyResult};

/// Placement group produced by the builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementGroupRef {
    pub id: ResourceId,
    pub strategy: PlacementStrategy,
    pub partition_count: Option<PartitionCount>,
}

/// Builder for a placement group
///
/// # Example
///
/// ```rust
/// use cim_cloud_topology::builders::PlacementGroupBuilder;
/// use cim_cloud_topology::domain::{PlacementStrategy, ResourceId};
/// use cim_cloud_topology::BuildContext;
///
/// let mut ctx = BuildContext::new("Demo");
/// let group = PlacementGroupBuilder::new(ResourceId::new("Pg")?, PlacementStrategy::Partition)
///     .partitions(3)
///     .build(&mut ctx)?;
/// assert_eq!(group.partition_count.map(|c| c.value()), Some(3));
/// # Ok::<(), cim_cloud_topology::TopologyError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PlacementGroupBuilder {
    id: ResourceId,
    strategy: PlacementStrategy,
    partitions: Option<u32>,
    removal_policy: RemovalPolicy,
}

impl PlacementGroupBuilder {
    pub fn new(id: ResourceId, strategy: PlacementStrategy) -> Self {
        Self {
            id,
            strategy,
            partitions: None,
            removal_policy: RemovalPolicy::default(),
        }
    }

    pub fn partitions(mut self, count: u32) -> Self {
        self.partitions = Some(count);
        self
    }

    pub fn removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal_policy = policy;
        self
    }

    /// Insert the placement group into `ctx`
    ///
    /// # Errors
    ///
    /// - `InvalidPartitionCount` if the count is outside 1..=7
    /// - `Configuration` if a partition group has no count, or another
    ///   strategy has one
    pub fn build(self, ctx: &mut BuildContext) -> TopologyResult<PlacementGroupRef> {
        let partition_count = match (self.strategy, self.partitions) {
            (PlacementStrategy::Partition, Some(count)) => Some(PartitionCount::new(count)?),
            (PlacementStrategy::Partition, None) => {
                return Err(TopologyError::Configuration(format!(
                    "Partition placement group {} needs a partition count",
                    self.id
                )))
            }
            (strategy, Some(_)) => {
                return Err(TopologyError::Configuration(format!(
                    "Placement group {} uses {} strategy, which takes no partition count",
                    self.id, strategy
                )))
            }
            (_, None) => None,
        };

        let id = ctx.insert(Resource::new(
            self.id,
            PlacementGroupSpec {
                strategy: self.strategy,
                partition_count,
                removal_policy: self.removal_policy,
            },
        ))?;

        info!(
            placement_group = %id,
            strategy = %self.strategy,
            partitions = partition_count.map(|c| c.value()),
            removal_policy = self.removal_policy.as_str(),
            "Placement group built"
        );

        Ok(PlacementGroupRef {
            id,
            strategy: self.strategy,
            partition_count,
        })
    }
}

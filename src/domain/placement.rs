// Copyright (c) 2025 - Cowboy AI, Inc.
//! Placement Group Value Objects
//!
//! Placement strategy and the bounded partition count of a partition
//! placement group. The partition count is advisory capacity: instances pick
//! a partition number independently and nothing here tracks occupancy.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::resource::Attributes;
use crate::errors::{TopologyError, TopologyResult};

/// Placement strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// Pack instances close together in one zone
    Cluster,
    /// Place each instance on distinct hardware
    Spread,
    /// Spread instances across failure-isolated partitions
    Partition,
}

impl PlacementStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cluster => "cluster",
            Self::Spread => "spread",
            Self::Partition => "partition",
        }
    }
}

impl fmt::Display for PlacementStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Number of partitions in a partition placement group
///
/// # Invariants
/// - 1 ≤ count ≤ 7 (provider ceiling per availability zone)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PartitionCount(u32);

impl PartitionCount {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 7;

    pub fn new(count: u32) -> TopologyResult<Self> {
        if !(Self::MIN..=Self::MAX).contains(&count) {
            return Err(TopologyError::InvalidPartitionCount(count));
        }
        Ok(Self(count))
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Whether `partition` is a valid zero-based partition number
    pub fn admits(&self, partition: u32) -> bool {
        partition < self.0
    }
}

impl TryFrom<u32> for PartitionCount {
    type Error = TopologyError;

    fn try_from(value: u32) -> TopologyResult<Self> {
        Self::new(value)
    }
}

impl From<PartitionCount> for u32 {
    fn from(count: PartitionCount) -> Self {
        count.0
    }
}

impl fmt::Display for PartitionCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the backend does with the resource when the graph is discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    #[default]
    Destroy,
    Retain,
    Snapshot,
}

impl RemovalPolicy {
    /// Provider deletion-policy token
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Destroy => "Delete",
            Self::Retain => "Retain",
            Self::Snapshot => "Snapshot",
        }
    }
}

/// Placement group payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementGroupSpec {
    pub strategy: PlacementStrategy,
    /// Present iff `strategy` is `Partition`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub partition_count: Option<PartitionCount>,
    #[serde(default)]
    pub removal_policy: RemovalPolicy,
}

impl PlacementGroupSpec {
    pub fn attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("Strategy".into(), self.strategy.as_str().into());
        if let Some(count) = self.partition_count {
            attrs.insert("PartitionCount".into(), count.value().into());
        }
        attrs
    }

    /// Partition count when the group uses the partition strategy
    pub fn partitions(&self) -> Option<PartitionCount> {
        match self.strategy {
            PlacementStrategy::Partition => self.partition_count,
            PlacementStrategy::Cluster | PlacementStrategy::Spread => None,
        }
    }
}

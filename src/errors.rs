// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for topology construction and assembly

use thiserror::Error;

use crate::domain::{IdentityError, NetworkError, ResourceId, ResourceKind};

/// Errors raised while building or assembling a resource graph
///
/// Every variant aborts assembly. Nothing reaches the provisioning backend
/// once one of these has been returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// Malformed builder input (bad mask size, missing principal, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Partition count outside the provider ceiling
    #[error("Invalid partition count: {0} (must be 1-7)")]
    InvalidPartitionCount(u32),

    /// Instance asks for a partition the group does not have
    #[error("Instance {instance} requests partition {partition} but group {group} has {partition_count} partitions")]
    PartitionNumberOutOfRange {
        instance: ResourceId,
        group: ResourceId,
        partition: u32,
        partition_count: u32,
    },

    /// Cross-network (or cross-zone) subnet reference
    #[error("Subnet mismatch on {resource}: subnet {subnet} {reason}")]
    SubnetMismatch {
        resource: ResourceId,
        subnet: ResourceId,
        reason: String,
    },

    /// Interface bindings on an instance violate device-index rules
    #[error("Invalid interface bindings on {instance}: {reason}")]
    InvalidInterfaceBindings { instance: ResourceId, reason: String },

    /// The reference graph is not acyclic
    #[error("Cyclic dependency through: {}", format_cycle(.0))]
    CyclicDependency(Vec<ResourceId>),

    /// A reference points at an id that is not in the graph
    #[error("Unresolved reference from {from} to {target}")]
    UnresolvedReference { from: ResourceId, target: ResourceId },

    /// A reference points at a resource of the wrong kind
    #[error("{from} expects {expected} for {target}, found {actual}")]
    WrongResourceKind {
        from: ResourceId,
        target: ResourceId,
        expected: ResourceKind,
        actual: ResourceKind,
    },

    /// Two resources share a logical id
    #[error("Duplicate resource id: {0}")]
    DuplicateResource(ResourceId),

    /// Phase-two resolution failed (missing or non-injective mapping)
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Declared-state serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for topology operations
pub type TopologyResult<T> = Result<T, TopologyError>;

fn format_cycle(ids: &[ResourceId]) -> String {
    ids.iter()
        .map(ResourceId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl From<NetworkError> for TopologyError {
    fn from(err: NetworkError) -> Self {
        TopologyError::Configuration(err.to_string())
    }
}

impl From<IdentityError> for TopologyError {
    fn from(err: IdentityError) -> Self {
        TopologyError::Configuration(err.to_string())
    }
}

impl From<serde_json::Error> for TopologyError {
    fn from(err: serde_json::Error) -> Self {
        TopologyError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_path() {
        let ids = vec![
            ResourceId::new("A").unwrap(),
            ResourceId::new("B").unwrap(),
            ResourceId::new("A").unwrap(),
        ];
        let err = TopologyError::CyclicDependency(ids);
        assert_eq!(err.to_string(), "Cyclic dependency through: A -> B -> A");
    }

    #[test]
    fn test_network_error_maps_to_configuration() {
        let err: TopologyError = NetworkError::InvalidPrefixLength(40).into();
        assert!(matches!(err, TopologyError::Configuration(_)));
    }
}

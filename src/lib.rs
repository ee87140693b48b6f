// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cloud topology graphs for the Composable Information Machine
//!
//! Declares infrastructure as a typed resource graph (networks, placement
//! groups, interfaces, instances, roles) and validates it before anything
//! reaches a provisioning backend.
//!
//! # Flow
//!
//! ```text
//! TopologyConfig ─┐
//!                 ▼
//! BuildContext ◄── builders (network, placement, interface, compute, identity)
//!      │
//!      ▼
//! Assembler ──> ValidatedGraph + advisories
//!                  │ submit
//!                  ▼
//! ProvisioningBackend ──> ResolutionTable ──> outputs
//! ```
//!
//! # Example
//!
//! ```rust
//! use cim_cloud_topology::{build_partition_eni_topology, SsmImageResolver, TopologyConfig};
//!
//! let topology = build_partition_eni_topology(&TopologyConfig::default(), &SsmImageResolver)?;
//! assert!(topology.assembled.advisories.is_empty());
//! # Ok::<(), cim_cloud_topology::TopologyError>(())
//! ```

pub mod advisory;
pub mod backend;
pub mod builders;
pub mod config;
pub mod context;
pub mod domain;
pub mod errors;
pub mod graph;
pub mod image;
pub mod resolution;
pub mod topology;

// Re-export commonly used types
pub use advisory::{AdvisoryCode, AdvisoryWarning, Severity};
pub use backend::{
    BackendError, BackendResult, InMemoryBackend, ProvisioningBackend, ProvisioningHandle,
    ProvisioningStatus,
};
pub use config::TopologyConfig;
pub use context::BuildContext;
pub use errors::{TopologyError, TopologyResult};
pub use graph::{
    AssembledTopology, Assembler, DeclaredState, ResourceGraph, StackOutput, ValidatedGraph,
};
pub use image::{ImageCriteria, ImageResolver, SsmImageResolver, StaticImageResolver};
pub use resolution::{ResolutionTable, ResolvedOutputs, StackOutputs};
pub use topology::{build_partition_eni_topology, PartitionEniTopology};

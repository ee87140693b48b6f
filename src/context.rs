// Copyright (c) 2025 - Cowboy AI, Inc.
//! Build Context
//!
//! One `BuildContext` exists per assembly run. It owns the in-progress graph
//! and the advisories raised by builders, is passed explicitly to every
//! builder, and is consumed by the [`Assembler`](crate::graph::Assembler).
//! Nothing outlives the run.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::advisory::AdvisoryWarning;
use crate::domain::{Resource, ResourceId, ResourceKind};
use crate::errors::{TopologyError, TopologyResult};
use crate::graph::{ResourceGraph, StackOutput};

/// Per-run owner of the in-progress resource graph
#[derive(Debug)]
pub struct BuildContext {
    stack_name: String,
    run_id: Uuid,
    started_at: DateTime<Utc>,
    graph: ResourceGraph,
    advisories: Vec<AdvisoryWarning>,
}

impl BuildContext {
    pub fn new(stack_name: impl Into<String>) -> Self {
        let stack_name = stack_name.into();
        let run_id = Uuid::now_v7();
        debug!(%run_id, stack = %stack_name, "Starting topology build");
        Self {
            stack_name,
            run_id,
            started_at: Utc::now(),
            graph: ResourceGraph::new(),
            advisories: Vec::new(),
        }
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Insert a resource into the graph
    pub fn insert(&mut self, resource: Resource) -> TopologyResult<ResourceId> {
        debug!(id = %resource.id(), kind = %resource.kind(), "Inserting resource");
        self.graph.insert(resource)
    }

    /// Declare a named output
    pub fn add_output(&mut self, output: StackOutput) -> TopologyResult<()> {
        self.graph.add_output(output)
    }

    pub fn resource(&self, id: &ResourceId) -> Option<&Resource> {
        self.graph.get(id)
    }

    /// Look up `target` on behalf of `from`, requiring a given kind
    ///
    /// # Errors
    ///
    /// `UnresolvedReference` if absent, `WrongResourceKind` on a kind mismatch
    pub fn require(
        &self,
        from: &ResourceId,
        target: &ResourceId,
        expected: ResourceKind,
    ) -> TopologyResult<&Resource> {
        require_kind(&self.graph, from, target, expected)
    }

    /// Record a non-fatal advisory
    pub fn advise(&mut self, advisory: AdvisoryWarning) {
        warn!(
            resource = %advisory.resource,
            code = ?advisory.code,
            "{}",
            advisory.message
        );
        self.advisories.push(advisory);
    }

    pub fn advisories(&self) -> &[AdvisoryWarning] {
        &self.advisories
    }

    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    pub(crate) fn into_parts(self) -> (String, ResourceGraph, Vec<AdvisoryWarning>) {
        (self.stack_name, self.graph, self.advisories)
    }
}

/// Kind-checked lookup shared by builders and the assembler
pub(crate) fn require_kind<'g>(
    graph: &'g ResourceGraph,
    from: &ResourceId,
    target: &ResourceId,
    expected: ResourceKind,
) -> TopologyResult<&'g Resource> {
    let resource = graph
        .get(target)
        .ok_or_else(|| TopologyError::UnresolvedReference {
            from: from.clone(),
            target: target.clone(),
        })?;
    if resource.kind() != expected {
        return Err(TopologyError::WrongResourceKind {
            from: from.clone(),
            target: target.clone(),
            expected,
            actual: resource.kind(),
        });
    }
    Ok(resource)
}

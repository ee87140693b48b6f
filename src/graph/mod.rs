// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Graph
//!
//! The graph is a map of logical id → [`Resource`] in insertion order plus
//! the named outputs surfaced after provisioning. Edges are derived from
//! each resource's attribute references.
//!
//! # Lifecycle
//!
//! ```text
//! BuildContext (mutable ResourceGraph)
//!      │  builders insert resources
//!      ▼
//! Assembler::assemble ──validate──> ValidatedGraph (read-only)
//!                                        │
//!                                        ├──submit──> ProvisioningBackend
//!                                        ▼
//!                                  DeclaredState (rendering)
//! ```

pub mod assembler;
pub mod declared;

pub use assembler::{AssembledTopology, Assembler};
pub use declared::{DeclaredOutput, DeclaredResource, DeclaredState};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::domain::{Reference, Resource, ResourceId};
use crate::errors::{TopologyError, TopologyResult};

/// Named read-only projection of a resource attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackOutput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    pub value: Reference,
}

/// In-progress resource graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceGraph {
    resources: IndexMap<ResourceId, Resource>,
    outputs: IndexMap<String, StackOutput>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource
    ///
    /// # Errors
    ///
    /// Returns `DuplicateResource` if the id is taken
    pub fn insert(&mut self, resource: Resource) -> TopologyResult<ResourceId> {
        let id = resource.id().clone();
        if self.resources.contains_key(&id) {
            return Err(TopologyError::DuplicateResource(id));
        }
        self.resources.insert(id.clone(), resource);
        Ok(id)
    }

    /// Declare a named output
    ///
    /// # Errors
    ///
    /// `Configuration` if the name is taken or is not a valid logical id
    pub fn add_output(&mut self, output: StackOutput) -> TopologyResult<()> {
        ResourceId::new(output.name.as_str())?;
        if self.outputs.contains_key(&output.name) {
            return Err(TopologyError::Configuration(format!(
                "Duplicate output name: {}",
                output.name
            )));
        }
        self.outputs.insert(output.name.clone(), output);
        Ok(())
    }

    pub fn get(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.resources.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Resources in insertion order
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn outputs(&self) -> impl Iterator<Item = &StackOutput> {
        self.outputs.values()
    }

    pub fn output(&self, name: &str) -> Option<&StackOutput> {
        self.outputs.get(name)
    }

    /// Resources that reference `id`, in insertion order
    pub fn dependents_of(&self, id: &ResourceId) -> Vec<&ResourceId> {
        self.resources
            .values()
            .filter(|r| r.references().contains(id))
            .map(Resource::id)
            .collect()
    }

    /// First reference that does not resolve, if any
    pub fn find_unresolved(&self) -> Option<(ResourceId, ResourceId)> {
        self.resources.values().find_map(|resource| {
            resource
                .references()
                .into_iter()
                .find(|target| !self.contains(target))
                .map(|target| (resource.id().clone(), target))
        })
    }

    /// A cycle as a closed id path (`A -> B -> A`), if one exists
    pub fn find_cycle(&self) -> Option<Vec<ResourceId>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit(
            graph: &ResourceGraph,
            id: &ResourceId,
            marks: &mut IndexMap<ResourceId, Mark>,
            path: &mut Vec<ResourceId>,
        ) -> Option<Vec<ResourceId>> {
            match marks.get(id) {
                Some(Mark::Done) => return None,
                Some(Mark::Visiting) => {
                    let start = path.iter().position(|p| p == id).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(id.clone());
                    return Some(cycle);
                }
                None => {}
            }

            marks.insert(id.clone(), Mark::Visiting);
            path.push(id.clone());
            if let Some(resource) = graph.get(id) {
                for target in resource.references() {
                    if graph.contains(&target) {
                        if let Some(cycle) = visit(graph, &target, marks, path) {
                            return Some(cycle);
                        }
                    }
                }
            }
            path.pop();
            marks.insert(id.clone(), Mark::Done);
            None
        }

        let mut marks = IndexMap::new();
        let mut path = Vec::new();
        self.resources
            .keys()
            .find_map(|id| visit(self, id, &mut marks, &mut path))
    }

    /// Dependency order: every resource after everything it references
    ///
    /// Ties keep insertion order, so the result is deterministic.
    ///
    /// # Errors
    ///
    /// Returns `CyclicDependency` if the graph is not a DAG
    pub fn topological_order(&self) -> TopologyResult<Vec<ResourceId>> {
        let mut pending: IndexMap<&ResourceId, usize> = IndexMap::new();
        let mut dependents: IndexMap<&ResourceId, Vec<&ResourceId>> = IndexMap::new();

        for (id, resource) in &self.resources {
            let deps: IndexSet<ResourceId> = resource
                .references()
                .into_iter()
                .filter(|target| self.contains(target))
                .collect();
            pending.insert(id, deps.len());
            for dep in deps {
                if let Some((key, _)) = self.resources.get_key_value(&dep) {
                    dependents.entry(key).or_default().push(id);
                }
            }
        }

        let mut ready: VecDeque<&ResourceId> = pending
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut order = Vec::with_capacity(self.resources.len());

        while let Some(id) = ready.pop_front() {
            order.push(id.clone());
            for dependent in dependents.get(id).into_iter().flatten() {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push_back(*dependent);
                    }
                }
            }
        }

        if order.len() != self.resources.len() {
            let cycle = self.find_cycle().unwrap_or_default();
            return Err(TopologyError::CyclicDependency(cycle));
        }
        Ok(order)
    }
}

/// Validated, read-only resource graph
///
/// Only the [`Assembler`] can construct one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedGraph {
    stack_name: String,
    graph: ResourceGraph,
    order: Vec<ResourceId>,
}

impl ValidatedGraph {
    pub(crate) fn new(stack_name: String, graph: ResourceGraph, order: Vec<ResourceId>) -> Self {
        Self {
            stack_name,
            graph,
            order,
        }
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn get(&self, id: &ResourceId) -> Option<&Resource> {
        self.graph.get(id)
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Resources in dependency order
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.order.iter().filter_map(|id| self.graph.get(id))
    }

    pub fn dependency_order(&self) -> &[ResourceId] {
        &self.order
    }

    pub fn outputs(&self) -> impl Iterator<Item = &StackOutput> {
        self.graph.outputs()
    }

    pub fn output(&self, name: &str) -> Option<&StackOutput> {
        self.graph.output(name)
    }

    pub fn dependents_of(&self, id: &ResourceId) -> Vec<&ResourceId> {
        self.graph.dependents_of(id)
    }

    /// Intake shape for the provisioning backend
    pub fn declared_state(&self) -> DeclaredState {
        DeclaredState::from_graph(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InternetGatewaySpec, Ipv4Cidr, NetworkSpec};

    fn id(s: &str) -> ResourceId {
        ResourceId::new(s).unwrap()
    }

    fn network(name: &str) -> Resource {
        Resource::new(
            id(name),
            NetworkSpec {
                name: name.to_string(),
                cidr_block: Ipv4Cidr::new("10.0.0.0/16").unwrap(),
                enable_dns_hostnames: true,
                enable_dns_support: true,
            },
        )
    }

    fn gateway(name: &str, network: &str) -> Resource {
        Resource::new(id(name), InternetGatewaySpec { network: id(network) })
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let mut graph = ResourceGraph::new();
        graph.insert(network("Vpc")).unwrap();
        assert_eq!(
            graph.insert(network("Vpc")),
            Err(TopologyError::DuplicateResource(id("Vpc")))
        );
    }

    #[test]
    fn test_topological_order_puts_dependencies_first() {
        let mut graph = ResourceGraph::new();
        graph.insert(gateway("Igw", "Vpc")).unwrap();
        graph.insert(network("Vpc")).unwrap();

        let order = graph.topological_order().unwrap();
        assert_eq!(order, vec![id("Vpc"), id("Igw")]);
        assert_eq!(graph.dependents_of(&id("Vpc")), vec![&id("Igw")]);
    }

    #[test]
    fn test_unresolved_reference_detected() {
        let mut graph = ResourceGraph::new();
        graph.insert(gateway("Igw", "Missing")).unwrap();
        assert_eq!(graph.find_unresolved(), Some((id("Igw"), id("Missing"))));
    }

    #[test]
    fn test_cycle_detected() {
        let mut graph = ResourceGraph::new();
        graph
            .insert(network("Vpc").with_dependency(&id("Igw")))
            .unwrap();
        graph.insert(gateway("Igw", "Vpc")).unwrap();

        assert_eq!(graph.find_cycle(), Some(vec![id("Vpc"), id("Igw"), id("Vpc")]));
        assert!(matches!(
            graph.topological_order(),
            Err(TopologyError::CyclicDependency(_))
        ));
    }

    #[test]
    fn test_duplicate_output_rejected() {
        let mut graph = ResourceGraph::new();
        let output = StackOutput {
            name: "VpcId".into(),
            description: None,
            value: Reference::id(&id("Vpc")),
        };
        graph.add_output(output.clone()).unwrap();
        assert!(graph.add_output(output).is_err());
    }

    #[test]
    fn test_output_name_must_be_a_logical_id() {
        let mut graph = ResourceGraph::new();
        let output = StackOutput {
            name: "Instance-Id".into(),
            description: None,
            value: Reference::id(&id("Instance")),
        };
        assert!(matches!(
            graph.add_output(output),
            Err(TopologyError::Configuration(_))
        ));
        assert_eq!(graph.outputs().count(), 0);
    }
}

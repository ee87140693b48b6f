// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declared State - backend intake shape
//!
//! Serializable rendering of a [`ValidatedGraph`]: resources in dependency
//! order with their provider type, attributes and explicit ordering edges,
//! plus the symbolic output bindings. Identical inputs render identically.
//!
//! A `DeclaredState` is a rendering, not a submission: backends only accept
//! a [`ValidatedGraph`], and [`DeclaredState::from_json`] exists for
//! inspecting documents.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::ValidatedGraph;
use crate::domain::{Attributes, Reference, ResourceId, ResourceKind};
use crate::errors::TopologyResult;

/// One declared resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeclaredResource {
    #[serde(rename = "Type")]
    pub resource_type: String,
    pub properties: Attributes,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub depends_on: Vec<ResourceId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deletion_policy: Option<String>,
}

impl DeclaredResource {
    pub fn kind(&self) -> Option<ResourceKind> {
        ResourceKind::from_provider_type(&self.resource_type)
    }
}

/// One declared output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeclaredOutput {
    pub value: Reference,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

/// Declared end state as the provisioning backend records it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeclaredState {
    pub stack_name: String,
    pub resources: IndexMap<ResourceId, DeclaredResource>,
    #[serde(default)]
    pub outputs: IndexMap<String, DeclaredOutput>,
}

impl DeclaredState {
    pub fn from_graph(graph: &ValidatedGraph) -> Self {
        let resources = graph
            .resources()
            .map(|resource| {
                let declared = DeclaredResource {
                    resource_type: resource.kind().provider_type().to_string(),
                    properties: resource.attributes(),
                    depends_on: resource.depends_on().iter().cloned().collect(),
                    deletion_policy: resource.removal_policy().map(|p| p.as_str().to_string()),
                };
                (resource.id().clone(), declared)
            })
            .collect();

        let outputs = graph
            .outputs()
            .map(|output| {
                (
                    output.name.clone(),
                    DeclaredOutput {
                        value: output.value.clone(),
                        description: output.description.clone(),
                    },
                )
            })
            .collect();

        Self {
            stack_name: graph.stack_name().to_string(),
            resources,
            outputs,
        }
    }

    /// Symbolic output bindings (`InstanceId` → `Ref(Instance)`, ...)
    pub fn output_bindings(&self) -> IndexMap<String, Reference> {
        self.outputs
            .iter()
            .map(|(name, output)| (name.clone(), output.value.clone()))
            .collect()
    }

    pub fn to_json(&self) -> TopologyResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> TopologyResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

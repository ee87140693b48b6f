// Copyright (c) 2025 - Cowboy AI, Inc.
//! Two-Phase Resolution
//!
//! Phase one is the graph itself: every cross-resource value is a symbolic
//! [`Reference`] to a logical id. Phase two runs after the backend reports
//! completion and maps those tokens to concrete values through a
//! [`ResolutionTable`].
//!
//! # Invariants
//! - The token → physical id mapping is injective: two logical ids never
//!   resolve to the same physical id
//! - Outputs resolve only from a `Complete` provisioning status

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::ProvisioningStatus;
use crate::domain::{Reference, ResourceId};
use crate::errors::{TopologyError, TopologyResult};
use crate::graph::DeclaredState;

pub const OUTPUT_INSTANCE_ID: &str = "InstanceId";
pub const OUTPUT_PLACEMENT_GROUP_NAME: &str = "PlacementGroupName";
pub const OUTPUT_EC2_ROLE_ARN: &str = "EC2RoleArn";
pub const OUTPUT_USER_ASSUMABLE_ROLE_ARN: &str = "UserAssumableRoleArn";

/// Concrete values for one provisioned resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedResource {
    pub physical_id: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,
}

/// Injective logical id → physical id table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "IndexMap<ResourceId, ResolvedResource>", into = "IndexMap<ResourceId, ResolvedResource>")]
pub struct ResolutionTable {
    entries: IndexMap<ResourceId, ResolvedResource>,
    owners: IndexMap<String, ResourceId>,
}

impl ResolutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `id` to `physical_id`
    ///
    /// # Errors
    ///
    /// `Resolution` if `id` is already mapped or `physical_id` is already
    /// owned by another id
    pub fn insert(&mut self, id: ResourceId, physical_id: impl Into<String>) -> TopologyResult<()> {
        let physical_id = physical_id.into();
        if self.entries.contains_key(&id) {
            return Err(TopologyError::Resolution(format!("{} is already resolved", id)));
        }
        if let Some(owner) = self.owners.get(&physical_id) {
            return Err(TopologyError::Resolution(format!(
                "{} and {} both resolve to {}",
                owner, id, physical_id
            )));
        }
        self.owners.insert(physical_id.clone(), id.clone());
        self.entries.insert(
            id,
            ResolvedResource {
                physical_id,
                attributes: IndexMap::new(),
            },
        );
        Ok(())
    }

    /// Record a runtime attribute (e.g. `Arn`) of a resolved id
    pub fn set_attribute(
        &mut self,
        id: &ResourceId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> TopologyResult<()> {
        let entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| TopologyError::Resolution(format!("{} is not resolved", id)))?;
        entry.attributes.insert(name.into(), value.into());
        Ok(())
    }

    pub fn get(&self, id: &ResourceId) -> Option<&ResolvedResource> {
        self.entries.get(id)
    }

    pub fn physical_id(&self, id: &ResourceId) -> Option<&str> {
        self.entries.get(id).map(|e| e.physical_id.as_str())
    }

    /// Logical id owning a physical id
    pub fn owner_of(&self, physical_id: &str) -> Option<&ResourceId> {
        self.owners.get(physical_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceId, &ResolvedResource)> {
        self.entries.iter()
    }

    /// Concrete value of a symbolic reference
    pub fn resolve(&self, reference: &Reference) -> TopologyResult<String> {
        let entry = self.entries.get(reference.target()).ok_or_else(|| {
            TopologyError::Resolution(format!("{} has no physical id", reference.target()))
        })?;
        match reference {
            Reference::Id(_) => Ok(entry.physical_id.clone()),
            Reference::Attribute(id, name) => entry.attributes.get(name).cloned().ok_or_else(|| {
                TopologyError::Resolution(format!("{} has no attribute {}", id, name))
            }),
        }
    }
}

impl TryFrom<IndexMap<ResourceId, ResolvedResource>> for ResolutionTable {
    type Error = TopologyError;

    fn try_from(entries: IndexMap<ResourceId, ResolvedResource>) -> TopologyResult<Self> {
        let mut table = Self::new();
        for (id, resolved) in entries {
            table.insert(id.clone(), resolved.physical_id)?;
            for (name, value) in resolved.attributes {
                table.set_attribute(&id, name, value)?;
            }
        }
        Ok(table)
    }
}

impl From<ResolutionTable> for IndexMap<ResourceId, ResolvedResource> {
    fn from(table: ResolutionTable) -> Self {
        table.entries
    }
}

/// Symbolic output bindings of a declared graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackOutputs {
    bindings: IndexMap<String, Reference>,
}

impl StackOutputs {
    pub fn from_declared(state: &DeclaredState) -> Self {
        Self {
            bindings: state.output_bindings(),
        }
    }

    pub fn bindings(&self) -> &IndexMap<String, Reference> {
        &self.bindings
    }

    /// Resolve every output against a finished provisioning run
    ///
    /// # Errors
    ///
    /// `Resolution` unless `status` is `Complete` and every binding resolves
    pub fn resolve(&self, status: &ProvisioningStatus) -> TopologyResult<ResolvedOutputs> {
        let table = match status {
            ProvisioningStatus::Complete(table) => table,
            ProvisioningStatus::Pending => {
                return Err(TopologyError::Resolution(
                    "outputs are not available until provisioning completes".to_string(),
                ))
            }
            ProvisioningStatus::Failed(reason) => {
                return Err(TopologyError::Resolution(format!(
                    "provisioning failed: {}",
                    reason
                )))
            }
        };

        let values = self
            .bindings
            .iter()
            .map(|(name, reference)| {
                let value = table.resolve(reference)?;
                debug!(output = %name, reference = %reference, value = %value, "Resolved output");
                Ok((name.clone(), value))
            })
            .collect::<TopologyResult<IndexMap<_, _>>>()?;
        Ok(ResolvedOutputs { values })
    }
}

/// Concrete output values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedOutputs {
    values: IndexMap<String, String>,
}

impl ResolvedOutputs {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn instance_id(&self) -> Option<&str> {
        self.get(OUTPUT_INSTANCE_ID)
    }

    pub fn placement_group_name(&self) -> Option<&str> {
        self.get(OUTPUT_PLACEMENT_GROUP_NAME)
    }

    pub fn ec2_role_arn(&self) -> Option<&str> {
        self.get(OUTPUT_EC2_ROLE_ARN)
    }

    pub fn user_assumable_role_arn(&self) -> Option<&str> {
        self.get(OUTPUT_USER_ASSUMABLE_ROLE_ARN)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ResourceId {
        ResourceId::new(s).unwrap()
    }

    #[test]
    fn test_table_is_injective() {
        let mut table = ResolutionTable::new();
        table.insert(id("A"), "i-1").unwrap();
        assert!(matches!(
            table.insert(id("B"), "i-1"),
            Err(TopologyError::Resolution(_))
        ));
        assert!(table.insert(id("A"), "i-2").is_err());
        assert_eq!(table.owner_of("i-1"), Some(&id("A")));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_resolve_reference_and_attribute() {
        let mut table = ResolutionTable::new();
        table.insert(id("Role"), "WebAppInstanceRole").unwrap();
        table
            .set_attribute(&id("Role"), "Arn", "arn:aws:iam::123456789012:role/WebAppInstanceRole")
            .unwrap();

        assert_eq!(table.resolve(&Reference::id(&id("Role"))).unwrap(), "WebAppInstanceRole");
        assert_eq!(
            table.resolve(&Reference::attribute(&id("Role"), "Arn")).unwrap(),
            "arn:aws:iam::123456789012:role/WebAppInstanceRole"
        );
        assert!(table.resolve(&Reference::attribute(&id("Role"), "RoleId")).is_err());
        assert!(table.resolve(&Reference::id(&id("Missing"))).is_err());
    }

    #[test]
    fn test_table_deserialization_rejects_collisions() {
        let json = r#"{"A": {"physical_id": "x"}, "B": {"physical_id": "x"}}"#;
        assert!(serde_json::from_str::<ResolutionTable>(json).is_err());
    }

    #[test]
    fn test_outputs_wait_for_completion() {
        let mut bindings = IndexMap::new();
        bindings.insert(OUTPUT_INSTANCE_ID.to_string(), Reference::id(&id("Instance")));
        let outputs = StackOutputs { bindings };

        assert!(outputs.resolve(&ProvisioningStatus::Pending).is_err());
        assert!(outputs
            .resolve(&ProvisioningStatus::Failed("quota".into()))
            .is_err());

        let mut table = ResolutionTable::new();
        table.insert(id("Instance"), "i-0123456789abcdef0").unwrap();
        let resolved = outputs.resolve(&ProvisioningStatus::Complete(table)).unwrap();
        assert_eq!(resolved.instance_id(), Some("i-0123456789abcdef0"));
        assert_eq!(resolved.ec2_role_arn(), None);
    }
}

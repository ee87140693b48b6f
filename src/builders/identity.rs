// Copyright (c) 2025 - Cowboy AI, Inc.
//! Identity Builder
//!
//! Builds a role trusted by exactly one principal. Managed policies are
//! referenced on the role itself; inline statements go into a separate
//! policy resource that references the role.
//!
//! Allow statements that pair a `*` resource with mutating actions raise an
//! advisory. The role is still built.

use tracing::{debug, info};

use crate::advisory::AdvisoryWarning;
use crate::context::BuildContext;
use crate::domain::identity::validate_role_name;
use crate::domain::{
    Effect, ManagedPolicyRef, PolicySpec, PolicyStatement, Reference, Resource, ResourceId,
    RoleSpec, TrustPrincipal,
};
use crate::errors::{TopologyError, TopologyResult};

/// Role produced by the builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRef {
    pub id: ResourceId,
    /// Inline policy resource, when statements were added
    pub policy: Option<ResourceId>,
}

impl RoleRef {
    /// Symbolic handle to the provisioned role ARN
    pub fn arn(&self) -> Reference {
        Reference::attribute(&self.id, "Arn")
    }
}

/// Builder for a role and its inline policy
#[derive(Debug, Clone)]
pub struct RoleBuilder {
    id: ResourceId,
    role_name: Option<String>,
    description: Option<String>,
    principals: Vec<TrustPrincipal>,
    managed_policies: Vec<String>,
    statements: Vec<PolicyStatement>,
}

impl RoleBuilder {
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            role_name: None,
            description: None,
            principals: Vec::new(),
            managed_policies: Vec::new(),
            statements: Vec::new(),
        }
    }

    pub fn role_name(mut self, name: impl Into<String>) -> Self {
        self.role_name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn assumed_by(mut self, principal: TrustPrincipal) -> Self {
        self.principals.push(principal);
        self
    }

    /// Attach a provider-managed policy by name (`AmazonS3ReadOnlyAccess`)
    pub fn managed_policy(mut self, name: impl Into<String>) -> Self {
        self.managed_policies.push(name.into());
        self
    }

    pub fn add_to_policy(mut self, statement: PolicyStatement) -> Self {
        self.statements.push(statement);
        self
    }

    /// Insert the role, and its inline policy if any, into `ctx`
    ///
    /// # Errors
    ///
    /// `Configuration` unless exactly one trust principal is given, or for
    /// invalid role and managed policy names
    pub fn build(self, ctx: &mut BuildContext) -> TopologyResult<RoleRef> {
        let trust = match self.principals.as_slice() {
            [principal] => principal.clone(),
            others => {
                return Err(TopologyError::Configuration(format!(
                    "Role {} needs exactly one trust principal, found {}",
                    self.id,
                    others.len()
                )))
            }
        };
        if let Some(name) = &self.role_name {
            validate_role_name(name)?;
        }
        let managed_policies = self
            .managed_policies
            .iter()
            .map(ManagedPolicyRef::new)
            .collect::<Result<_, _>>()?;

        let policy_id = if self.statements.is_empty() {
            None
        } else {
            let policy_id = self.id.child("DefaultPolicy")?;
            if ctx.resource(&policy_id).is_some() {
                return Err(TopologyError::DuplicateResource(policy_id));
            }
            Some(policy_id)
        };

        let id = ctx.insert(Resource::new(
            self.id.clone(),
            RoleSpec {
                role_name: self.role_name,
                description: self.description,
                trust,
                managed_policies,
            },
        ))?;

        for statement in &self.statements {
            if statement.effect() != Effect::Allow || !statement.has_wildcard_resource() {
                continue;
            }
            let mutating = statement.mutating_actions();
            if !mutating.is_empty() {
                ctx.advise(AdvisoryWarning::wildcard_resource(&id, &mutating));
            }
        }

        let policy = if let Some(policy_id) = policy_id {
            debug!(policy = %policy_id, statements = self.statements.len(), "Adding inline policy");
            ctx.insert(Resource::new(
                policy_id.clone(),
                PolicySpec {
                    policy_name: policy_id.to_string(),
                    roles: [id.clone()].into_iter().collect(),
                    statements: self.statements,
                },
            ))?;
            Some(policy_id)
        } else {
            None
        };

        info!(role = %id, inline_policy = policy.is_some(), "Role built");
        Ok(RoleRef { id, policy })
    }
}

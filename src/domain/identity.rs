// Copyright (c) 2025 - Cowboy AI, Inc.
//! Identity Models: Roles, Trust Principals and Policy Statements

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::resource::{AttributeValue, Attributes, ResourceId};

/// Policy language version stamped on every document
pub const POLICY_VERSION: &str = "2012-10-17";

/// Operation-name prefixes treated as read-only
const READ_VERBS: [&str; 6] = ["Get", "List", "Describe", "Scan", "Query", "BatchGet"];

/// Identity validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Policy statement must name at least one action")]
    EmptyActions,

    #[error("Invalid action: {0} (expected service:Operation or *)")]
    InvalidAction(String),

    #[error("Invalid resource pattern: {0} (expected ARN pattern or *)")]
    InvalidResource(String),

    #[error("Invalid role name: {0}")]
    InvalidRoleName(String),

    #[error("Invalid service principal: {0}")]
    InvalidServicePrincipal(String),

    #[error("Invalid account id: {0}")]
    InvalidAccountId(String),

    #[error("Invalid managed policy name: {0}")]
    InvalidManagedPolicyName(String),
}

/// Identity permitted to assume a role
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrustPrincipal {
    /// A provider service, e.g. `ec2.amazonaws.com`
    Service { service: String },
    /// Any principal of an account
    Account { account_id: String },
}

impl TrustPrincipal {
    /// Token the backend substitutes with the deploying account
    pub const CURRENT_ACCOUNT: &'static str = "${AWS::AccountId}";

    pub fn service(service: impl Into<String>) -> Result<Self, IdentityError> {
        let service = service.into();
        let valid = service.contains('.')
            && !service.starts_with('.')
            && !service.ends_with('.')
            && service
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-');
        if !valid {
            return Err(IdentityError::InvalidServicePrincipal(service));
        }
        Ok(Self::Service { service })
    }

    pub fn account(account_id: impl Into<String>) -> Result<Self, IdentityError> {
        let account_id = account_id.into();
        let literal = account_id.len() == 12 && account_id.chars().all(|c| c.is_ascii_digit());
        if !literal && account_id != Self::CURRENT_ACCOUNT {
            return Err(IdentityError::InvalidAccountId(account_id));
        }
        Ok(Self::Account { account_id })
    }

    /// The account the graph is deployed into
    pub fn current_account() -> Self {
        Self::Account {
            account_id: Self::CURRENT_ACCOUNT.to_string(),
        }
    }

    fn principal(&self) -> AttributeValue {
        let mut principal = IndexMap::new();
        match self {
            Self::Service { service } => {
                principal.insert("Service".to_string(), service.clone().into());
            }
            Self::Account { account_id } => {
                principal.insert(
                    "AWS".to_string(),
                    format!("arn:aws:iam::{}:root", account_id).into(),
                );
            }
        }
        AttributeValue::Map(principal)
    }

    /// Trust policy document allowing this principal to assume the role
    pub fn assume_role_document(&self) -> AttributeValue {
        let mut statement = IndexMap::new();
        statement.insert("Action".to_string(), "sts:AssumeRole".into());
        statement.insert("Effect".to_string(), Effect::Allow.as_str().into());
        statement.insert("Principal".to_string(), self.principal());

        let mut document = IndexMap::new();
        document.insert("Statement".to_string(), vec![AttributeValue::Map(statement)].into());
        document.insert("Version".to_string(), POLICY_VERSION.into());
        AttributeValue::Map(document)
    }
}

impl fmt::Display for TrustPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service { service } => write!(f, "service:{}", service),
            Self::Account { account_id } => write!(f, "account:{}", account_id),
        }
    }
}

/// Statement effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
        }
    }
}

/// Whether an action only reads (`dynamodb:GetItem`, `s3:List*`)
///
/// Bare wildcards (`*`, `dynamodb:*`) are never read-only.
pub fn is_read_only_action(action: &str) -> bool {
    match action.split_once(':') {
        Some((_, operation)) => READ_VERBS.iter().any(|verb| operation.starts_with(verb)),
        None => false,
    }
}

fn validate_action(action: &str) -> Result<(), IdentityError> {
    if action == "*" {
        return Ok(());
    }
    let (service, operation) = action
        .split_once(':')
        .ok_or_else(|| IdentityError::InvalidAction(action.to_string()))?;
    let service_ok = !service.is_empty()
        && service
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let operation_ok =
        !operation.is_empty() && operation.chars().all(|c| c.is_ascii_alphanumeric() || c == '*');
    if !service_ok || !operation_ok {
        return Err(IdentityError::InvalidAction(action.to_string()));
    }
    Ok(())
}

/// Permission statement
///
/// # Invariants
/// - At least one action
/// - Resources default to `*` when none are given
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStatement {
    effect: Effect,
    actions: IndexSet<String>,
    resources: IndexSet<String>,
}

impl PolicyStatement {
    pub const WILDCARD: &'static str = "*";

    pub fn new<A, R>(effect: Effect, actions: A, resources: R) -> Result<Self, IdentityError>
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        let actions: IndexSet<String> = actions.into_iter().map(Into::into).collect();
        if actions.is_empty() {
            return Err(IdentityError::EmptyActions);
        }
        for action in &actions {
            validate_action(action)?;
        }

        let mut resources: IndexSet<String> = resources.into_iter().map(Into::into).collect();
        if resources.is_empty() {
            resources.insert(Self::WILDCARD.to_string());
        }
        if let Some(bad) = resources
            .iter()
            .find(|r| r.as_str() != Self::WILDCARD && !r.starts_with("arn:"))
        {
            return Err(IdentityError::InvalidResource(bad.clone()));
        }

        Ok(Self {
            effect,
            actions,
            resources,
        })
    }

    /// Allow statement over all resources
    pub fn allow<A>(actions: A) -> Result<Self, IdentityError>
    where
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self::new(Effect::Allow, actions, Vec::<String>::new())
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn actions(&self) -> &IndexSet<String> {
        &self.actions
    }

    pub fn resources(&self) -> &IndexSet<String> {
        &self.resources
    }

    pub fn has_wildcard_resource(&self) -> bool {
        self.resources.contains(Self::WILDCARD)
    }

    /// Actions that are not read-only, in declaration order
    pub fn mutating_actions(&self) -> Vec<&str> {
        self.actions
            .iter()
            .map(String::as_str)
            .filter(|action| !is_read_only_action(action))
            .collect()
    }

    pub fn attribute(&self) -> AttributeValue {
        let mut statement = IndexMap::new();
        statement.insert(
            "Action".to_string(),
            AttributeValue::List(self.actions.iter().map(|a| a.clone().into()).collect()),
        );
        statement.insert("Effect".to_string(), self.effect.as_str().into());
        let resource = if self.resources.len() == 1 && self.has_wildcard_resource() {
            AttributeValue::from(Self::WILDCARD)
        } else {
            AttributeValue::List(self.resources.iter().map(|r| r.clone().into()).collect())
        };
        statement.insert("Resource".to_string(), resource);
        AttributeValue::Map(statement)
    }
}

/// Provider-maintained policy referenced by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManagedPolicyRef(String);

impl ManagedPolicyRef {
    pub fn new(name: impl Into<String>) -> Result<Self, IdentityError> {
        let name = name.into();
        let valid = !name.is_empty()
            && name.len() <= 128
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "+=,.@_-/".contains(c));
        if !valid {
            return Err(IdentityError::InvalidManagedPolicyName(name));
        }
        Ok(Self(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn arn(&self) -> String {
        format!("arn:aws:iam::aws:policy/{}", self.0)
    }
}

/// Validate a role or policy name (1-64 of `[A-Za-z0-9+=,.@_-]`)
pub fn validate_role_name(name: &str) -> Result<(), IdentityError> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "+=,.@_-".contains(c));
    if !valid {
        return Err(IdentityError::InvalidRoleName(name.to_string()));
    }
    Ok(())
}

/// Role payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSpec {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    pub trust: TrustPrincipal,
    #[serde(skip_serializing_if = "IndexSet::is_empty", default)]
    pub managed_policies: IndexSet<ManagedPolicyRef>,
}

impl RoleSpec {
    pub fn attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("AssumeRolePolicyDocument".into(), self.trust.assume_role_document());
        if let Some(name) = &self.role_name {
            attrs.insert("RoleName".into(), name.clone().into());
        }
        if let Some(description) = &self.description {
            attrs.insert("Description".into(), description.clone().into());
        }
        if !self.managed_policies.is_empty() {
            attrs.insert(
                "ManagedPolicyArns".into(),
                AttributeValue::List(self.managed_policies.iter().map(|p| p.arn().into()).collect()),
            );
        }
        attrs
    }
}

/// Inline policy attached to one or more roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySpec {
    pub policy_name: String,
    pub roles: IndexSet<ResourceId>,
    pub statements: Vec<PolicyStatement>,
}

impl PolicySpec {
    pub fn attributes(&self) -> Attributes {
        let mut document = IndexMap::new();
        document.insert(
            "Statement".to_string(),
            AttributeValue::List(self.statements.iter().map(PolicyStatement::attribute).collect()),
        );
        document.insert("Version".to_string(), POLICY_VERSION.into());

        let mut attrs = Attributes::new();
        attrs.insert("PolicyDocument".into(), AttributeValue::Map(document));
        attrs.insert("PolicyName".into(), self.policy_name.clone().into());
        attrs.insert("Roles".into(), AttributeValue::refs(&self.roles));
        attrs
    }
}

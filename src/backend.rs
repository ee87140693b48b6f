// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning Backend Intake
//!
//! The backend receives a [`ValidatedGraph`] and reports progress through a
//! [`ProvisioningHandle`]. Only the [`Assembler`](crate::graph::Assembler)
//! produces a `ValidatedGraph`, so nothing that failed validation reaches
//! intake. Creating real cloud resources is the backend's business;
//! [`InMemoryBackend`] stands in for it with deterministic physical ids.
//!
//! ```text
//! submit(ValidatedGraph) ──> ProvisioningHandle
//! status(handle)         ──> Pending | Complete(ResolutionTable) | Failed
//! ```

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{ResourceKind, TrustPrincipal};
use crate::graph::{DeclaredState, ValidatedGraph};
use crate::resolution::ResolutionTable;

/// Errors reported by a provisioning backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Handle was not issued by this backend
    #[error("Unknown provisioning handle: {0}")]
    UnknownHandle(Uuid),

    /// Declared state refused at intake
    #[error("Declared state rejected: {0}")]
    Rejected(String),

    /// Backend internals unusable
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Receipt for one submitted declared state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningHandle {
    pub id: Uuid,
    pub stack_name: String,
    pub submitted_at: DateTime<Utc>,
}

/// Progress of a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum ProvisioningStatus {
    Pending,
    Complete(ResolutionTable),
    Failed(String),
}

impl ProvisioningStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

/// Intake of a provisioning engine
///
/// A parsed [`DeclaredState`] is for inspection only and cannot be submitted:
///
/// ```compile_fail
/// use cim_cloud_topology::{DeclaredState, InMemoryBackend, ProvisioningBackend};
///
/// let state = DeclaredState::from_json(r#"{"StackName": "S", "Resources": {}}"#).unwrap();
/// InMemoryBackend::default().submit(&state);
/// ```
pub trait ProvisioningBackend: Send + Sync {
    /// Accept an assembled graph for provisioning
    fn submit(&self, graph: &ValidatedGraph) -> BackendResult<ProvisioningHandle>;

    /// Current status of a submission
    fn status(&self, handle: &ProvisioningHandle) -> BackendResult<ProvisioningStatus>;
}

/// Submission held by the in-memory backend
#[derive(Debug)]
struct Submission {
    state: DeclaredState,
    status: ProvisioningStatus,
}

/// Backend that "provisions" by minting deterministic physical ids
///
/// Physical ids are derived from the resource's kind and position in the
/// declared order, so identical declared states resolve identically.
#[derive(Debug)]
pub struct InMemoryBackend {
    account_id: String,
    settle_on_submit: bool,
    submissions: Mutex<IndexMap<Uuid, Submission>>,
}

impl InMemoryBackend {
    pub const DEFAULT_ACCOUNT: &'static str = "123456789012";

    /// Backend completing every submission immediately
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            settle_on_submit: true,
            submissions: Mutex::new(IndexMap::new()),
        }
    }

    /// Backend leaving submissions `Pending` until [`settle`](Self::settle)
    pub fn deferred(account_id: impl Into<String>) -> Self {
        Self {
            settle_on_submit: false,
            ..Self::new(account_id)
        }
    }

    /// Declared state recorded for a submission
    pub fn declared(&self, handle: &ProvisioningHandle) -> BackendResult<DeclaredState> {
        self.lock()?
            .get(&handle.id)
            .map(|s| s.state.clone())
            .ok_or(BackendError::UnknownHandle(handle.id))
    }

    /// Finish a pending submission
    pub fn settle(&self, handle: &ProvisioningHandle) -> BackendResult<ProvisioningStatus> {
        let mut submissions = self.lock()?;
        let submission = submissions
            .get_mut(&handle.id)
            .ok_or(BackendError::UnknownHandle(handle.id))?;
        if matches!(submission.status, ProvisioningStatus::Pending) {
            submission.status = self.provision(&submission.state);
        }
        Ok(submission.status.clone())
    }

    fn lock(&self) -> BackendResult<std::sync::MutexGuard<'_, IndexMap<Uuid, Submission>>> {
        self.submissions
            .lock()
            .map_err(|e| BackendError::Unavailable(e.to_string()))
    }

    fn account(&self) -> &str {
        if self.account_id == TrustPrincipal::CURRENT_ACCOUNT {
            Self::DEFAULT_ACCOUNT
        } else {
            &self.account_id
        }
    }

    fn provision(&self, state: &DeclaredState) -> ProvisioningStatus {
        let mut table = ResolutionTable::new();
        for (position, (id, resource)) in state.resources.iter().enumerate() {
            let Some(kind) = resource.kind() else {
                return ProvisioningStatus::Failed(format!(
                    "{} has unsupported type {}",
                    id, resource.resource_type
                ));
            };
            let named = |key: &str| {
                resource
                    .properties
                    .get(key)
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{}-{}", state.stack_name, id))
            };

            let physical_id = match kind {
                ResourceKind::Role => named("RoleName"),
                ResourceKind::Policy => named("PolicyName"),
                ResourceKind::PlacementGroup => format!("{}-{}", state.stack_name, id),
                other => format!("{}{:017x}", other.physical_id_prefix(), position + 1),
            };

            let result = table.insert(id.clone(), physical_id.clone()).and_then(|()| {
                if kind == ResourceKind::Role {
                    table.set_attribute(
                        id,
                        "Arn",
                        format!("arn:aws:iam::{}:role/{}", self.account(), physical_id),
                    )
                } else {
                    Ok(())
                }
            });
            if let Err(err) = result {
                warn!(stack = %state.stack_name, error = %err, "Provisioning failed");
                return ProvisioningStatus::Failed(err.to_string());
            }
        }
        info!(stack = %state.stack_name, resources = table.len(), "Provisioning complete");
        ProvisioningStatus::Complete(table)
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ACCOUNT)
    }
}

impl ProvisioningBackend for InMemoryBackend {
    fn submit(&self, graph: &ValidatedGraph) -> BackendResult<ProvisioningHandle> {
        let state = graph.declared_state();
        if state.resources.is_empty() {
            return Err(BackendError::Rejected(format!(
                "stack {} declares no resources",
                state.stack_name
            )));
        }

        let handle = ProvisioningHandle {
            id: Uuid::now_v7(),
            stack_name: state.stack_name.clone(),
            submitted_at: Utc::now(),
        };
        let status = if self.settle_on_submit {
            self.provision(&state)
        } else {
            ProvisioningStatus::Pending
        };

        info!(
            handle = %handle.id,
            stack = %handle.stack_name,
            resources = state.resources.len(),
            "Declared state submitted"
        );
        self.lock()?.insert(
            handle.id,
            Submission { state, status },
        );
        Ok(handle)
    }

    fn status(&self, handle: &ProvisioningHandle) -> BackendResult<ProvisioningStatus> {
        self.lock()?
            .get(&handle.id)
            .map(|s| s.status.clone())
            .ok_or(BackendError::UnknownHandle(handle.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{PlacementGroupBuilder, RoleBuilder};
    use crate::context::BuildContext;
    use crate::domain::{Effect, PlacementStrategy, PolicyStatement, ResourceId, TrustPrincipal};
    use crate::graph::Assembler;

    fn id(s: &str) -> ResourceId {
        ResourceId::new(s).unwrap()
    }

    fn role(ctx: &mut BuildContext, logical: &str, name: &str) {
        RoleBuilder::new(id(logical))
            .role_name(name)
            .assumed_by(TrustPrincipal::service("ec2.amazonaws.com").unwrap())
            .build(ctx)
            .unwrap();
    }

    fn graph(build: impl FnOnce(&mut BuildContext)) -> ValidatedGraph {
        let mut ctx = BuildContext::new("Test");
        build(&mut ctx);
        Assembler::new().assemble(ctx).unwrap().graph
    }

    fn placement_and_role() -> ValidatedGraph {
        graph(|ctx| {
            PlacementGroupBuilder::new(id("Pg"), PlacementStrategy::Partition)
                .partitions(3)
                .build(ctx)
                .unwrap();
            role(ctx, "Role", "WebAppInstanceRole");
        })
    }

    #[test]
    fn test_ids_are_deterministic() {
        let graph = placement_and_role();
        let backend = InMemoryBackend::default();
        let a = backend.status(&backend.submit(&graph).unwrap()).unwrap();
        let b = backend.status(&backend.submit(&graph).unwrap()).unwrap();
        assert_eq!(a, b);

        let ProvisioningStatus::Complete(table) = a else {
            panic!("expected completion");
        };
        assert_eq!(table.physical_id(&id("Pg")), Some("Test-Pg"));
        assert_eq!(table.physical_id(&id("Role")), Some("WebAppInstanceRole"));
    }

    #[test]
    fn test_role_arn_uses_account() {
        let graph = placement_and_role();
        let backend = InMemoryBackend::new(TrustPrincipal::CURRENT_ACCOUNT);
        let ProvisioningStatus::Complete(table) =
            backend.status(&backend.submit(&graph).unwrap()).unwrap()
        else {
            panic!("expected completion");
        };
        assert_eq!(
            table.get(&id("Role")).unwrap().attributes["Arn"],
            "arn:aws:iam::123456789012:role/WebAppInstanceRole"
        );
    }

    #[test]
    fn test_role_name_colliding_with_policy_name_fails() {
        // `Reader` gets the inline policy `ReaderDefaultPolicy`
        let graph = graph(|ctx| {
            role(ctx, "Other", "ReaderDefaultPolicy");
            RoleBuilder::new(id("Reader"))
                .assumed_by(TrustPrincipal::current_account())
                .add_to_policy(
                    PolicyStatement::new(Effect::Allow, ["dynamodb:GetItem"], ["*"]).unwrap(),
                )
                .build(ctx)
                .unwrap();
        });
        let backend = InMemoryBackend::default();
        let status = backend.status(&backend.submit(&graph).unwrap()).unwrap();
        assert!(matches!(status, ProvisioningStatus::Failed(_)));
    }

    #[test]
    fn test_submission_records_declared_state() {
        let graph = placement_and_role();
        let backend = InMemoryBackend::default();
        let handle = backend.submit(&graph).unwrap();
        assert_eq!(backend.declared(&handle).unwrap(), graph.declared_state());
    }

    #[test]
    fn test_deferred_backend_stays_pending() {
        let graph = placement_and_role();
        let backend = InMemoryBackend::deferred(InMemoryBackend::DEFAULT_ACCOUNT);
        let handle = backend.submit(&graph).unwrap();
        assert_eq!(backend.status(&handle).unwrap(), ProvisioningStatus::Pending);
        assert!(backend.settle(&handle).unwrap().is_complete());
        assert!(backend.status(&handle).unwrap().is_complete());
    }

    #[test]
    fn test_unknown_handle_and_empty_graph() {
        let backend = InMemoryBackend::default();
        let handle = ProvisioningHandle {
            id: Uuid::now_v7(),
            stack_name: "Other".into(),
            submitted_at: Utc::now(),
        };
        assert_eq!(backend.status(&handle), Err(BackendError::UnknownHandle(handle.id)));
        assert!(matches!(
            backend.submit(&graph(|_| {})),
            Err(BackendError::Rejected(_))
        ));
    }
}

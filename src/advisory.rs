// Copyright (c) 2025 - Cowboy AI, Inc.
//! Non-fatal advisories collected during graph assembly
//!
//! Advisories never block assembly; they travel alongside the validated
//! graph so callers can surface them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::ResourceId;

/// Advisory severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
}

/// Advisory category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryCode {
    /// A `*` resource paired with actions that can write
    WildcardResourceWithMutatingActions,
}

/// Advisory warning raised by a builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryWarning {
    pub resource: ResourceId,
    pub code: AdvisoryCode,
    pub severity: Severity,
    pub message: String,
}

impl AdvisoryWarning {
    pub fn wildcard_resource(resource: &ResourceId, mutating: &[&str]) -> Self {
        Self {
            resource: resource.clone(),
            code: AdvisoryCode::WildcardResourceWithMutatingActions,
            severity: Severity::Low,
            message: format!(
                "statement grants {} on resource \"*\"; scope resources down to specific ARNs",
                mutating.join(", ")
            ),
        }
    }
}

impl fmt::Display for AdvisoryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.severity, self.resource, self.message)
    }
}

// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Interface Models
//!
//! Two binding shapes exist on an instance and are kept distinct:
//! - the primary interface is synthesized inline from a subnet and a
//!   security-group set at device index 0;
//! - every other interface is a standalone [`NetworkInterfaceSpec`] resource
//!   that carries its own security-group set and is attached by reference.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use super::resource::{AttributeValue, Attributes, Reference, ResourceId};

/// Standalone network interface
///
/// Has no device index of its own; the index is assigned when an instance
/// binds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterfaceSpec {
    pub subnet: ResourceId,
    pub security_groups: IndexSet<ResourceId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub private_address: Option<Ipv4Addr>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub tags: IndexMap<String, String>,
}

impl NetworkInterfaceSpec {
    pub fn attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("SubnetId".into(), Reference::id(&self.subnet).into());
        attrs.insert("GroupSet".into(), AttributeValue::refs(&self.security_groups));
        if let Some(address) = self.private_address {
            attrs.insert("PrivateIpAddress".into(), address.to_string().into());
        }
        if let Some(description) = &self.description {
            attrs.insert("Description".into(), description.clone().into());
        }
        if !self.tags.is_empty() {
            attrs.insert("Tags".into(), AttributeValue::tags(&self.tags));
        }
        attrs
    }
}

/// What a binding attaches at its device index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum BindingTarget {
    /// Interface created with the instance from a subnet and groups
    Inline {
        subnet: ResourceId,
        security_groups: IndexSet<ResourceId>,
        associate_public_address: bool,
    },
    /// Pre-created network interface resource
    Existing { interface: ResourceId },
}

/// Interface binding at a device index of an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterfaceBinding {
    pub device_index: u32,
    pub target: BindingTarget,
}

impl NetworkInterfaceBinding {
    pub fn is_primary(&self) -> bool {
        self.device_index == 0
    }

    /// Subnet of an inline binding
    pub fn inline_subnet(&self) -> Option<&ResourceId> {
        match &self.target {
            BindingTarget::Inline { subnet, .. } => Some(subnet),
            BindingTarget::Existing { .. } => None,
        }
    }

    pub fn attribute(&self) -> AttributeValue {
        let mut entry = IndexMap::new();
        // provider expects the index as a string
        entry.insert(
            "DeviceIndex".to_string(),
            AttributeValue::from(self.device_index.to_string()),
        );
        match &self.target {
            BindingTarget::Inline {
                subnet,
                security_groups,
                associate_public_address,
            } => {
                entry.insert("SubnetId".to_string(), Reference::id(subnet).into());
                entry.insert("GroupSet".to_string(), AttributeValue::refs(security_groups));
                entry.insert(
                    "AssociatePublicIpAddress".to_string(),
                    (*associate_public_address).into(),
                );
            }
            BindingTarget::Existing { interface } => {
                entry.insert("NetworkInterfaceId".to_string(), Reference::id(interface).into());
            }
        }
        AttributeValue::Map(entry)
    }
}

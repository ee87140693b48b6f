// Copyright (c) 2025 - Cowboy AI, Inc.
//! Compute Instance Builder
//!
//! Binds an image, a shape, a placement group and an ordered interface list
//! into an instance resource.
//!
//! Device indices are assigned here: the single primary attachment gets
//! index 0 and the secondaries get 1, 2, ... in the order they were added.
//! The partition number is only range-checked at assembly, where the
//! placement group's count is known to be final.

use tracing::info;

use crate::context::BuildContext;
use crate::domain::invariants::validate_interface_bindings;
use crate::domain::{
    BindingTarget, ImageRef, InstanceShape, InstanceSpec, NetworkInterfaceBinding, Placement,
    Reference, Resource, ResourceId, ResourceKind,
};
use crate::errors::{TopologyError, TopologyResult};
use indexmap::IndexSet;

/// One interface the instance should carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceAttachment {
    /// Created with the instance in `subnet`, guarded by `security_groups`
    Primary {
        subnet: ResourceId,
        security_groups: IndexSet<ResourceId>,
        associate_public_address: bool,
    },
    /// A network interface resource built beforehand
    Secondary { interface: ResourceId },
}

impl InterfaceAttachment {
    pub fn primary<'a>(
        subnet: &ResourceId,
        security_groups: impl IntoIterator<Item = &'a ResourceId>,
        associate_public_address: bool,
    ) -> Self {
        Self::Primary {
            subnet: subnet.clone(),
            security_groups: security_groups.into_iter().cloned().collect(),
            associate_public_address,
        }
    }

    pub fn secondary(interface: &ResourceId) -> Self {
        Self::Secondary {
            interface: interface.clone(),
        }
    }
}

/// Instance produced by the builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRef {
    pub id: ResourceId,
}

impl InstanceRef {
    /// Symbolic handle to the provisioned instance id
    pub fn instance_id(&self) -> Reference {
        Reference::id(&self.id)
    }
}

/// Builder for a compute instance
#[derive(Debug, Clone)]
pub struct InstanceBuilder {
    id: ResourceId,
    image: ImageRef,
    shape: InstanceShape,
    key_name: Option<String>,
    placement: Option<Placement>,
    attachments: Vec<InterfaceAttachment>,
}

impl InstanceBuilder {
    pub fn new(id: ResourceId, image: ImageRef, shape: InstanceShape) -> Self {
        Self {
            id,
            image,
            shape,
            key_name: None,
            placement: None,
            attachments: Vec::new(),
        }
    }

    pub fn key_name(mut self, key_name: impl Into<String>) -> Self {
        self.key_name = Some(key_name.into());
        self
    }

    /// Place in `group`, optionally pinned to a zero-based partition
    pub fn placement(mut self, group: &ResourceId, partition_number: Option<u32>) -> Self {
        self.placement = Some(Placement {
            group: group.clone(),
            partition_number,
        });
        self
    }

    pub fn attach(mut self, attachment: InterfaceAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    fn bindings(&self, ctx: &BuildContext) -> TopologyResult<Vec<NetworkInterfaceBinding>> {
        let invalid = |reason: String| TopologyError::InvalidInterfaceBindings {
            instance: self.id.clone(),
            reason,
        };

        let primaries = self
            .attachments
            .iter()
            .filter(|a| matches!(a, InterfaceAttachment::Primary { .. }))
            .count();
        if primaries != 1 {
            return Err(invalid(format!(
                "expected exactly one primary interface, found {}",
                primaries
            )));
        }

        let mut bindings = Vec::with_capacity(self.attachments.len());
        let mut next_index = 1u32;
        for attachment in &self.attachments {
            match attachment {
                InterfaceAttachment::Primary {
                    subnet,
                    security_groups,
                    associate_public_address,
                } => {
                    ctx.require(&self.id, subnet, ResourceKind::Subnet)?;
                    for group in security_groups {
                        ctx.require(&self.id, group, ResourceKind::SecurityGroup)?;
                    }
                    bindings.insert(
                        0,
                        NetworkInterfaceBinding {
                            device_index: 0,
                            target: BindingTarget::Inline {
                                subnet: subnet.clone(),
                                security_groups: security_groups.clone(),
                                associate_public_address: *associate_public_address,
                            },
                        },
                    );
                }
                InterfaceAttachment::Secondary { interface } => {
                    ctx.require(&self.id, interface, ResourceKind::NetworkInterface)?;
                    bindings.push(NetworkInterfaceBinding {
                        device_index: next_index,
                        target: BindingTarget::Existing {
                            interface: interface.clone(),
                        },
                    });
                    next_index += 1;
                }
            }
        }
        Ok(bindings)
    }

    /// Insert the instance into `ctx`
    ///
    /// # Errors
    ///
    /// - `InvalidInterfaceBindings` unless exactly one primary is attached,
    ///   or a secondary interface is attached twice
    /// - `UnresolvedReference`/`WrongResourceKind` for unknown subnets,
    ///   groups or interfaces
    /// - `Configuration` without a placement or with an empty key name
    pub fn build(self, ctx: &mut BuildContext) -> TopologyResult<InstanceRef> {
        let bindings = self.bindings(ctx)?;
        validate_interface_bindings(&self.id, &bindings)?;

        let placement = self.placement.ok_or_else(|| {
            TopologyError::Configuration(format!("Instance {} has no placement group", self.id))
        })?;
        if let Some(key_name) = &self.key_name {
            if key_name.is_empty() || key_name.len() > 255 {
                return Err(TopologyError::Configuration(format!(
                    "Instance {} key pair name must be 1-255 characters",
                    self.id
                )));
            }
        }

        let interfaces = bindings.len();
        let id = ctx.insert(Resource::new(
            self.id,
            InstanceSpec {
                image: self.image,
                shape: self.shape,
                key_name: self.key_name,
                placement,
                network_interfaces: bindings,
            },
        ))?;

        info!(instance = %id, interfaces, "Compute instance built");
        Ok(InstanceRef { id })
    }
}

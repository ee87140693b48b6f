// Copyright (c) 2025 - Cowboy AI, Inc.
//! Compute Instance Models
//!
//! An instance is bound to an image, an instance shape, a placement group
//! (optionally a specific partition) and an ordered list of interface
//! bindings.
//!
//! # Invariants
//! - Exactly one binding has device index 0
//! - Device indices are unique and contiguous from 0
//! - A partition number, when present, is below the group's partition count
//!   (checked against the graph at assembly time)

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::interface::NetworkInterfaceBinding;
use super::resource::{AttributeValue, Attributes, Reference, ResourceId};
use crate::errors::{TopologyError, TopologyResult};

/// Machine image reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "snake_case")]
pub enum ImageRef {
    /// Concrete image id (`ami-0abc...`)
    Id(String),
    /// Parameter path the backend dereferences at provisioning time
    Parameter(String),
}

impl ImageRef {
    /// Validated concrete image id
    pub fn id(id: impl Into<String>) -> TopologyResult<Self> {
        let id = id.into();
        let valid = id
            .strip_prefix("ami-")
            .map(|hex| {
                (hex.len() == 8 || hex.len() == 17) && hex.chars().all(|c| c.is_ascii_hexdigit())
            })
            .unwrap_or(false);
        if !valid {
            return Err(TopologyError::Configuration(format!("Invalid image id: {}", id)));
        }
        Ok(Self::Id(id))
    }

    /// Validated parameter path
    pub fn parameter(path: impl Into<String>) -> TopologyResult<Self> {
        let path = path.into();
        if !path.starts_with('/') || path.len() < 2 {
            return Err(TopologyError::Configuration(format!(
                "Image parameter must be an absolute path: {}",
                path
            )));
        }
        Ok(Self::Parameter(path))
    }

    pub fn attribute(&self) -> AttributeValue {
        match self {
            Self::Id(id) => id.clone().into(),
            Self::Parameter(path) => format!("{{{{resolve:ssm:{}}}}}", path).into(),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Parameter(path) => write!(f, "ssm:{}", path),
        }
    }
}

/// Instance shape (`family.size`, e.g. `c5.large`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceShape {
    family: String,
    size: String,
}

impl InstanceShape {
    pub fn new(shape: impl AsRef<str>) -> TopologyResult<Self> {
        let shape = shape.as_ref();
        let invalid = || TopologyError::Configuration(format!("Invalid instance shape: {:?}", shape));

        let (family, size) = shape.split_once('.').ok_or_else(invalid)?;
        let family_ok = family
            .chars()
            .next()
            .map(|c| c.is_ascii_lowercase())
            .unwrap_or(false)
            && family.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        let size_ok =
            !size.is_empty() && size.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if !family_ok || !size_ok {
            return Err(invalid());
        }

        Ok(Self {
            family: family.to_string(),
            size: size.to_string(),
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn size(&self) -> &str {
        &self.size
    }
}

impl fmt::Display for InstanceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.family, self.size)
    }
}

impl FromStr for InstanceShape {
    type Err = TopologyError;

    fn from_str(s: &str) -> TopologyResult<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for InstanceShape {
    type Error = TopologyError;

    fn try_from(value: String) -> TopologyResult<Self> {
        Self::new(value)
    }
}

impl From<InstanceShape> for String {
    fn from(shape: InstanceShape) -> Self {
        shape.to_string()
    }
}

/// Placement of an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub group: ResourceId,
    /// Omitted means the backend distributes automatically
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub partition_number: Option<u32>,
}

/// Compute instance payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSpec {
    pub image: ImageRef,
    pub shape: InstanceShape,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub key_name: Option<String>,
    pub placement: Placement,
    pub network_interfaces: Vec<NetworkInterfaceBinding>,
}

impl InstanceSpec {
    pub fn attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("ImageId".into(), self.image.attribute());
        attrs.insert("InstanceType".into(), self.shape.to_string().into());
        if let Some(key_name) = &self.key_name {
            attrs.insert("KeyName".into(), key_name.clone().into());
        }

        let mut placement = IndexMap::new();
        placement.insert(
            "GroupName".to_string(),
            AttributeValue::from(Reference::id(&self.placement.group)),
        );
        if let Some(partition) = self.placement.partition_number {
            placement.insert("PartitionNumber".to_string(), partition.into());
        }
        attrs.insert("Placement".into(), AttributeValue::Map(placement));

        attrs.insert(
            "NetworkInterfaces".into(),
            AttributeValue::List(
                self.network_interfaces
                    .iter()
                    .map(NetworkInterfaceBinding::attribute)
                    .collect(),
            ),
        );
        attrs
    }

    pub fn primary_binding(&self) -> Option<&NetworkInterfaceBinding> {
        self.network_interfaces.iter().find(|b| b.is_primary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_id_validation() {
        assert!(ImageRef::id("ami-0abcdef1234567890").is_ok());
        assert!(ImageRef::id("ami-12345678").is_ok());
        assert!(ImageRef::id("ami-xyz").is_err());
        assert!(ImageRef::id("img-12345678").is_err());
    }

    #[test]
    fn test_image_parameter_attribute() {
        let image = ImageRef::parameter("/aws/service/ami-amazon-linux-latest/amzn2-ami-hvm-x86_64-gp2")
            .unwrap();
        assert_eq!(
            image.attribute().as_str(),
            Some("{{resolve:ssm:/aws/service/ami-amazon-linux-latest/amzn2-ami-hvm-x86_64-gp2}}")
        );
        assert!(ImageRef::parameter("relative/path").is_err());
    }

    #[test]
    fn test_instance_shape() {
        let shape = InstanceShape::new("c5.large").unwrap();
        assert_eq!(shape.family(), "c5");
        assert_eq!(shape.size(), "large");
        assert_eq!(shape.to_string(), "c5.large");

        assert!(InstanceShape::new("c5").is_err());
        assert!(InstanceShape::new("C5.large").is_err());
        assert!(InstanceShape::new("c5.").is_err());
        assert!(InstanceShape::new(".large").is_err());
    }
}

// Copyright (c) 2025 - Cowboy AI, Inc.
//! Machine Image Resolution
//!
//! Image lookup happens before the compute builder runs. Resolvers turn
//! [`ImageCriteria`] into an [`ImageRef`]; the parameter resolver defers the
//! actual lookup to the provisioning backend.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ImageRef;
use crate::errors::{TopologyError, TopologyResult};

/// Public parameter namespace for the latest Amazon Linux images
pub const AMAZON_LINUX_PARAMETER_PREFIX: &str = "/aws/service/ami-amazon-linux-latest";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmazonLinuxEdition {
    #[default]
    Standard,
    Minimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpuArchitecture {
    #[default]
    X86_64,
    Arm64,
}

impl CpuArchitecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Arm64 => "arm64",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootStorage {
    #[default]
    GeneralPurpose,
    Ebs,
}

impl RootStorage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GeneralPurpose => "gp2",
            Self::Ebs => "ebs",
        }
    }
}

/// Amazon Linux 2 image selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ImageCriteria {
    pub edition: AmazonLinuxEdition,
    pub architecture: CpuArchitecture,
    pub storage: RootStorage,
}

impl ImageCriteria {
    /// Latest standard x86_64 image on general-purpose storage
    pub fn amazon_linux_2() -> Self {
        Self::default()
    }

    /// Public parameter name publishing the matching image id
    pub fn parameter_name(&self) -> String {
        let edition = match self.edition {
            AmazonLinuxEdition::Standard => "",
            AmazonLinuxEdition::Minimal => "minimal-",
        };
        format!(
            "{}/amzn2-ami-{}hvm-{}-{}",
            AMAZON_LINUX_PARAMETER_PREFIX,
            edition,
            self.architecture.as_str(),
            self.storage.as_str()
        )
    }
}

/// Turns image criteria into an image reference
pub trait ImageResolver {
    fn resolve_image(&self, criteria: &ImageCriteria) -> TopologyResult<ImageRef>;
}

/// Resolves to a parameter reference the backend dereferences
#[derive(Debug, Clone, Copy, Default)]
pub struct SsmImageResolver;

impl ImageResolver for SsmImageResolver {
    fn resolve_image(&self, criteria: &ImageCriteria) -> TopologyResult<ImageRef> {
        let image = ImageRef::parameter(criteria.parameter_name())?;
        debug!(image = %image, "Resolved image parameter");
        Ok(image)
    }
}

/// Resolves from a fixed criteria → image id table
#[derive(Debug, Clone, Default)]
pub struct StaticImageResolver {
    images: IndexMap<ImageCriteria, ImageRef>,
}

impl StaticImageResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, criteria: ImageCriteria, image_id: &str) -> TopologyResult<Self> {
        self.images.insert(criteria, ImageRef::id(image_id)?);
        Ok(self)
    }
}

impl ImageResolver for StaticImageResolver {
    fn resolve_image(&self, criteria: &ImageCriteria) -> TopologyResult<ImageRef> {
        self.images.get(criteria).cloned().ok_or_else(|| {
            TopologyError::Configuration(format!("No image registered for {:?}", criteria))
        })
    }
}

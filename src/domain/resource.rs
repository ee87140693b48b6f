// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Node and Attribute-Binding Model
//!
//! A [`Resource`] is a typed node in the topology graph. Its attributes are a
//! name → [`AttributeValue`] mapping, and any [`Reference`] found inside the
//! attributes is an edge to another resource. Edges are therefore never
//! declared twice: a subnet that carries `VpcId: {"Ref": "Vpc"}` depends on
//! `Vpc` by construction.
//!
//! References are symbolic until the backend has provisioned the graph; see
//! [`crate::resolution`] for the second phase that maps them to concrete ids.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::compute::InstanceSpec;
use super::identity::{PolicySpec, RoleSpec};
use super::interface::NetworkInterfaceSpec;
use super::placement::{PlacementGroupSpec, RemovalPolicy};
use super::resource_type::ResourceKind;
use super::vpc::{InternetGatewaySpec, NetworkSpec, RouteTableSpec, SecurityGroupSpec, SubnetSpec};
use crate::errors::{TopologyError, TopologyResult};

/// Ordered attribute mapping of a resource
pub type Attributes = IndexMap<String, AttributeValue>;

/// Logical identifier of a resource inside one graph
///
/// # Invariants
/// - 1-255 characters
/// - ASCII alphanumeric only (provider logical-id rules)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId(String);

impl ResourceId {
    /// Maximum logical id length
    pub const MAX_LEN: usize = 255;

    pub fn new(id: impl Into<String>) -> TopologyResult<Self> {
        let id = id.into();
        if id.is_empty() || id.len() > Self::MAX_LEN {
            return Err(TopologyError::Configuration(format!(
                "Resource id must be 1-{} characters: {:?}",
                Self::MAX_LEN,
                id
            )));
        }
        if let Some(c) = id.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(TopologyError::Configuration(format!(
                "Invalid character {:?} in resource id {}",
                c, id
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive a child id by appending a suffix (`Vpc` + `PublicSubnet1`)
    pub fn child(&self, suffix: &str) -> TopologyResult<Self> {
        Self::new(format!("{}{}", self.0, suffix))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResourceId {
    type Err = TopologyError;

    fn from_str(s: &str) -> TopologyResult<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ResourceId {
    type Error = TopologyError;

    fn try_from(value: String) -> TopologyResult<Self> {
        Self::new(value)
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

/// Symbolic reference to another resource
///
/// Serializes in the provider's intrinsic form: `{"Ref": "Id"}` or
/// `{"Fn::GetAtt": ["Id", "Attribute"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reference {
    /// The resource's primary physical identifier
    #[serde(rename = "Ref")]
    Id(ResourceId),

    /// A named runtime attribute of the resource
    #[serde(rename = "Fn::GetAtt")]
    Attribute(ResourceId, String),
}

impl Reference {
    pub fn id(target: &ResourceId) -> Self {
        Self::Id(target.clone())
    }

    pub fn attribute(target: &ResourceId, name: impl Into<String>) -> Self {
        Self::Attribute(target.clone(), name.into())
    }

    /// Resource the reference points at
    pub fn target(&self) -> &ResourceId {
        match self {
            Self::Id(id) | Self::Attribute(id, _) => id,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "Ref({})", id),
            Self::Attribute(id, name) => write!(f, "{}.{}", id, name),
        }
    }
}

/// Attribute value of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Reference(Reference),
    Bool(bool),
    Integer(i64),
    String(String),
    List(Vec<AttributeValue>),
    Map(IndexMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Collect every resource this value references, in encounter order
    pub fn collect_references(&self, out: &mut IndexSet<ResourceId>) {
        match self {
            Self::Reference(reference) => {
                out.insert(reference.target().clone());
            }
            Self::List(items) => items.iter().for_each(|item| item.collect_references(out)),
            Self::Map(entries) => entries.values().for_each(|value| value.collect_references(out)),
            Self::Bool(_) | Self::Integer(_) | Self::String(_) => {}
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Self::Reference(r) => Some(r),
            _ => None,
        }
    }

    /// Build a `[{Key, Value}]` tag list
    pub fn tags<'a>(tags: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        Self::List(
            tags.into_iter()
                .map(|(key, value)| {
                    let mut entry = IndexMap::new();
                    entry.insert("Key".to_string(), Self::from(key.as_str()));
                    entry.insert("Value".to_string(), Self::from(value.as_str()));
                    Self::Map(entry)
                })
                .collect(),
        )
    }

    /// Build a list of `Ref`s
    pub fn refs<'a>(ids: impl IntoIterator<Item = &'a ResourceId>) -> Self {
        Self::List(ids.into_iter().map(|id| Reference::id(id).into()).collect())
    }
}

impl From<Reference> for AttributeValue {
    fn from(reference: Reference) -> Self {
        Self::Reference(reference)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<AttributeValue>> for AttributeValue {
    fn from(values: Vec<AttributeValue>) -> Self {
        Self::List(values)
    }
}

/// Typed payload of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceProperties {
    Network(NetworkSpec),
    Subnet(SubnetSpec),
    InternetGateway(InternetGatewaySpec),
    RouteTable(RouteTableSpec),
    SecurityGroup(SecurityGroupSpec),
    PlacementGroup(PlacementGroupSpec),
    NetworkInterface(NetworkInterfaceSpec),
    Instance(InstanceSpec),
    Role(RoleSpec),
    Policy(PolicySpec),
}

impl ResourceProperties {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Network(_) => ResourceKind::Network,
            Self::Subnet(_) => ResourceKind::Subnet,
            Self::InternetGateway(_) => ResourceKind::InternetGateway,
            Self::RouteTable(_) => ResourceKind::RouteTable,
            Self::SecurityGroup(_) => ResourceKind::SecurityGroup,
            Self::PlacementGroup(_) => ResourceKind::PlacementGroup,
            Self::NetworkInterface(_) => ResourceKind::NetworkInterface,
            Self::Instance(_) => ResourceKind::Instance,
            Self::Role(_) => ResourceKind::Role,
            Self::Policy(_) => ResourceKind::Policy,
        }
    }

    /// Render the typed payload into the attribute mapping
    pub fn attributes(&self) -> Attributes {
        match self {
            Self::Network(spec) => spec.attributes(),
            Self::Subnet(spec) => spec.attributes(),
            Self::InternetGateway(spec) => spec.attributes(),
            Self::RouteTable(spec) => spec.attributes(),
            Self::SecurityGroup(spec) => spec.attributes(),
            Self::PlacementGroup(spec) => spec.attributes(),
            Self::NetworkInterface(spec) => spec.attributes(),
            Self::Instance(spec) => spec.attributes(),
            Self::Role(spec) => spec.attributes(),
            Self::Policy(spec) => spec.attributes(),
        }
    }
}

macro_rules! impl_from_spec {
    ($($variant:ident => $spec:ty),* $(,)?) => {
        $(
            impl From<$spec> for ResourceProperties {
                fn from(spec: $spec) -> Self {
                    Self::$variant(spec)
                }
            }
        )*
    };
}

impl_from_spec! {
    Network => NetworkSpec,
    Subnet => SubnetSpec,
    InternetGateway => InternetGatewaySpec,
    RouteTable => RouteTableSpec,
    SecurityGroup => SecurityGroupSpec,
    PlacementGroup => PlacementGroupSpec,
    NetworkInterface => NetworkInterfaceSpec,
    Instance => InstanceSpec,
    Role => RoleSpec,
    Policy => PolicySpec,
}

/// Typed resource node
///
/// Constructed once during graph assembly and never mutated after the graph
/// is validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    id: ResourceId,
    properties: ResourceProperties,
    /// Ordering-only edges that carry no attribute binding
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    depends_on: IndexSet<ResourceId>,
}

impl Resource {
    pub fn new(id: ResourceId, properties: impl Into<ResourceProperties>) -> Self {
        Self {
            id,
            properties: properties.into(),
            depends_on: IndexSet::new(),
        }
    }

    /// Add an explicit ordering edge
    pub fn with_dependency(mut self, id: &ResourceId) -> Self {
        self.depends_on.insert(id.clone());
        self
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.properties.kind()
    }

    pub fn properties(&self) -> &ResourceProperties {
        &self.properties
    }

    pub fn attributes(&self) -> Attributes {
        self.properties.attributes()
    }

    pub fn depends_on(&self) -> &IndexSet<ResourceId> {
        &self.depends_on
    }

    /// Every resource this one references: attribute bindings first, then
    /// explicit ordering edges
    pub fn references(&self) -> IndexSet<ResourceId> {
        let mut refs = IndexSet::new();
        for value in self.attributes().values() {
            value.collect_references(&mut refs);
        }
        refs.extend(self.depends_on.iter().cloned());
        refs
    }

    /// Removal policy, for kinds that carry one
    pub fn removal_policy(&self) -> Option<RemovalPolicy> {
        match &self.properties {
            ResourceProperties::PlacementGroup(spec) => Some(spec.removal_policy),
            _ => None,
        }
    }

    pub fn as_subnet(&self) -> Option<&SubnetSpec> {
        match &self.properties {
            ResourceProperties::Subnet(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_security_group(&self) -> Option<&SecurityGroupSpec> {
        match &self.properties {
            ResourceProperties::SecurityGroup(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_placement_group(&self) -> Option<&PlacementGroupSpec> {
        match &self.properties {
            ResourceProperties::PlacementGroup(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_network_interface(&self) -> Option<&NetworkInterfaceSpec> {
        match &self.properties {
            ResourceProperties::NetworkInterface(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&InstanceSpec> {
        match &self.properties {
            ResourceProperties::Instance(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_role(&self) -> Option<&RoleSpec> {
        match &self.properties {
            ResourceProperties::Role(spec) => Some(spec),
            _ => None,
        }
    }
}

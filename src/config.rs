// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Configuration
//!
//! Options for the partition/interface topology. Defaults reproduce the
//! reference stack; overrides come from a JSON document or `TOPOLOGY_*`
//! environment variables.
//!
//! | Variable                              | Default                   |
//! |---------------------------------------|---------------------------|
//! | `TOPOLOGY_STACK_NAME`                 | `PartitionEniStudyStack`  |
//! | `TOPOLOGY_VPC_CIDR`                   | `10.0.0.0/16`             |
//! | `TOPOLOGY_MAX_AZS`                    | `2`                       |
//! | `TOPOLOGY_SUBNET_MASK_BITS`           | `24`                      |
//! | `TOPOLOGY_PARTITION_COUNT`            | `3`                       |
//! | `TOPOLOGY_PARTITION_NUMBER`           | `0` (`none` to omit)      |
//! | `TOPOLOGY_INSTANCE_SHAPE`             | `c5.large`                |
//! | `TOPOLOGY_KEY_PAIR_NAME`              | `your-key-pair-name`      |
//! | `TOPOLOGY_PRIMARY_PUBLIC_ADDRESS`     | `true`                    |
//! | `TOPOLOGY_SSH_INGRESS_CIDR`           | `0.0.0.0/0`               |
//! | `TOPOLOGY_SECONDARY_PRIVATE_ADDRESS`  | unset                     |
//! | `TOPOLOGY_ACCOUNT_ID`                 | deploying account         |
//! | `TOPOLOGY_INSTANCE_ROLE_NAME`         | `WebAppInstanceRole`      |
//! | `TOPOLOGY_USER_ROLE_NAME`             | `DeveloperReadOnlyRole`   |
//!
//! Values are only parsed here; each builder checks its own ranges.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::str::FromStr;
use tracing::debug;

use crate::domain::TrustPrincipal;
use crate::errors::{TopologyError, TopologyResult};
use crate::image::ImageCriteria;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct TopologyConfig {
    pub stack_name: String,
    pub vpc_cidr: String,
    pub max_availability_zones: u8,
    pub subnet_mask_bits: u8,
    pub partition_count: u32,
    pub partition_number: Option<u32>,
    pub instance_shape: String,
    pub key_pair_name: String,
    pub primary_associates_public_address: bool,
    pub ssh_ingress_cidr: String,
    pub secondary_private_address: Option<Ipv4Addr>,
    pub account_id: String,
    pub instance_role_name: String,
    pub user_role_name: String,
    pub image: ImageCriteria,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            stack_name: "PartitionEniStudyStack".to_string(),
            vpc_cidr: "10.0.0.0/16".to_string(),
            max_availability_zones: 2,
            subnet_mask_bits: 24,
            partition_count: 3,
            partition_number: Some(0),
            instance_shape: "c5.large".to_string(),
            key_pair_name: "your-key-pair-name".to_string(),
            primary_associates_public_address: true,
            ssh_ingress_cidr: "0.0.0.0/0".to_string(),
            secondary_private_address: None,
            account_id: TrustPrincipal::CURRENT_ACCOUNT.to_string(),
            instance_role_name: "WebAppInstanceRole".to_string(),
            user_role_name: "DeveloperReadOnlyRole".to_string(),
            image: ImageCriteria::amazon_linux_2(),
        }
    }
}

impl TopologyConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> TopologyResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> TopologyResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, default: String| lookup(key).unwrap_or(default);

        let config = Self {
            stack_name: text("TOPOLOGY_STACK_NAME", defaults.stack_name),
            vpc_cidr: text("TOPOLOGY_VPC_CIDR", defaults.vpc_cidr),
            max_availability_zones: parsed(&lookup, "TOPOLOGY_MAX_AZS")?
                .unwrap_or(defaults.max_availability_zones),
            subnet_mask_bits: parsed(&lookup, "TOPOLOGY_SUBNET_MASK_BITS")?
                .unwrap_or(defaults.subnet_mask_bits),
            partition_count: parsed(&lookup, "TOPOLOGY_PARTITION_COUNT")?
                .unwrap_or(defaults.partition_count),
            partition_number: match lookup("TOPOLOGY_PARTITION_NUMBER") {
                Some(value) if value.eq_ignore_ascii_case("none") => None,
                Some(value) => Some(parse_value("TOPOLOGY_PARTITION_NUMBER", &value)?),
                None => defaults.partition_number,
            },
            instance_shape: text("TOPOLOGY_INSTANCE_SHAPE", defaults.instance_shape),
            key_pair_name: text("TOPOLOGY_KEY_PAIR_NAME", defaults.key_pair_name),
            primary_associates_public_address: parsed(&lookup, "TOPOLOGY_PRIMARY_PUBLIC_ADDRESS")?
                .unwrap_or(defaults.primary_associates_public_address),
            ssh_ingress_cidr: text("TOPOLOGY_SSH_INGRESS_CIDR", defaults.ssh_ingress_cidr),
            secondary_private_address: match parsed(&lookup, "TOPOLOGY_SECONDARY_PRIVATE_ADDRESS")? {
                Some(address) => Some(address),
                None => defaults.secondary_private_address,
            },
            account_id: text("TOPOLOGY_ACCOUNT_ID", defaults.account_id),
            instance_role_name: text("TOPOLOGY_INSTANCE_ROLE_NAME", defaults.instance_role_name),
            user_role_name: text("TOPOLOGY_USER_ROLE_NAME", defaults.user_role_name),
            image: defaults.image,
        };

        debug!(stack = %config.stack_name, "Topology configuration loaded");
        Ok(config)
    }

    /// Parse a JSON document; absent keys keep their defaults
    pub fn from_json(json: &str) -> TopologyResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| TopologyError::Configuration(format!("Invalid topology config: {}", e)))
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> TopologyResult<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|value| parse_value(key, &value)).transpose()
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> TopologyResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| TopologyError::Configuration(format!("{} has an invalid value: {}", key, value)))
}

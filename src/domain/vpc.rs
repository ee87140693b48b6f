// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network-Layer Resource Models
//!
//! Payloads for the network, its subnets, routing and security groups.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::network::{IngressRule, Ipv4Cidr, Protocol, SubnetVisibility};
use super::resource::{AttributeValue, Attributes, Reference, ResourceId};

fn map(entries: impl IntoIterator<Item = (&'static str, AttributeValue)>) -> AttributeValue {
    AttributeValue::Map(
        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect::<IndexMap<_, _>>(),
    )
}

/// Virtual network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub name: String,
    pub cidr_block: Ipv4Cidr,
    pub enable_dns_hostnames: bool,
    pub enable_dns_support: bool,
}

impl NetworkSpec {
    pub fn attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("CidrBlock".into(), self.cidr_block.to_string().into());
        attrs.insert("EnableDnsHostnames".into(), self.enable_dns_hostnames.into());
        attrs.insert("EnableDnsSupport".into(), self.enable_dns_support.into());
        attrs.insert(
            "Tags".into(),
            AttributeValue::tags([(&"Name".to_string(), &self.name)]),
        );
        attrs
    }
}

/// Subnet inside one availability zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetSpec {
    pub network: ResourceId,
    pub cidr_block: Ipv4Cidr,
    /// Zone index within the region's zone list
    pub availability_zone: usize,
    pub visibility: SubnetVisibility,
    /// Subnet group name (`Public`, ...)
    pub group_name: String,
    pub map_public_ip_on_launch: bool,
}

impl SubnetSpec {
    pub fn attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("VpcId".into(), Reference::id(&self.network).into());
        attrs.insert("CidrBlock".into(), self.cidr_block.to_string().into());
        attrs.insert(
            "AvailabilityZone".into(),
            map([(
                "Fn::Select",
                AttributeValue::List(vec![
                    (self.availability_zone as i64).into(),
                    map([("Fn::GetAZs", "".into())]),
                ]),
            )]),
        );
        attrs.insert("MapPublicIpOnLaunch".into(), self.map_public_ip_on_launch.into());
        attrs.insert(
            "Tags".into(),
            AttributeValue::tags([
                (&"Name".to_string(), &self.group_name),
                (&"SubnetType".to_string(), &self.visibility.to_string()),
            ]),
        );
        attrs
    }
}

/// Internet gateway attached to a network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternetGatewaySpec {
    pub network: ResourceId,
}

impl InternetGatewaySpec {
    pub fn attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("VpcId".into(), Reference::id(&self.network).into());
        attrs
    }
}

/// Route through a gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub destination: Ipv4Cidr,
    pub gateway: ResourceId,
}

/// Route table associated with exactly one subnet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTableSpec {
    pub network: ResourceId,
    pub subnet: ResourceId,
    pub routes: Vec<Route>,
}

impl RouteTableSpec {
    pub fn attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("VpcId".into(), Reference::id(&self.network).into());
        attrs.insert("SubnetId".into(), Reference::id(&self.subnet).into());
        attrs.insert(
            "Routes".into(),
            AttributeValue::List(
                self.routes
                    .iter()
                    .map(|route| {
                        map([
                            ("DestinationCidrBlock", route.destination.to_string().into()),
                            ("GatewayId", Reference::id(&route.gateway).into()),
                        ])
                    })
                    .collect(),
            ),
        );
        attrs
    }
}

/// Security group scoped to one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupSpec {
    pub network: ResourceId,
    pub description: String,
    pub allow_all_outbound: bool,
    pub ingress: Vec<IngressRule>,
}

impl SecurityGroupSpec {
    pub fn attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("VpcId".into(), Reference::id(&self.network).into());
        attrs.insert("GroupDescription".into(), self.description.clone().into());
        attrs.insert(
            "SecurityGroupIngress".into(),
            AttributeValue::List(
                self.ingress
                    .iter()
                    .map(|rule| {
                        map([
                            ("CidrIp", rule.peer.to_string().into()),
                            ("IpProtocol", rule.protocol.as_str().into()),
                            ("FromPort", i64::from(rule.ports.from_port()).into()),
                            ("ToPort", i64::from(rule.ports.to_port()).into()),
                            ("Description", rule.description.clone().into()),
                        ])
                    })
                    .collect(),
            ),
        );
        let egress = if self.allow_all_outbound {
            vec![map([
                ("CidrIp", Ipv4Cidr::ANY.to_string().into()),
                ("IpProtocol", Protocol::All.as_str().into()),
                ("Description", "Allow all outbound traffic by default".into()),
            ])]
        } else {
            Vec::new()
        };
        attrs.insert("SecurityGroupEgress".into(), AttributeValue::List(egress));
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_group_rules_render() {
        let sg = SecurityGroupSpec {
            network: ResourceId::new("Vpc").unwrap(),
            description: "Allow SSH".into(),
            allow_all_outbound: true,
            ingress: vec![IngressRule::tcp(Ipv4Cidr::ANY, 22, "Allow SSH access")],
        };
        let attrs = sg.attributes();
        let json = serde_json::to_value(&attrs).unwrap();

        assert_eq!(json["VpcId"], serde_json::json!({"Ref": "Vpc"}));
        assert_eq!(json["SecurityGroupIngress"][0]["FromPort"], 22);
        assert_eq!(json["SecurityGroupIngress"][0]["IpProtocol"], "tcp");
        assert_eq!(json["SecurityGroupEgress"][0]["IpProtocol"], "-1");
    }

    #[test]
    fn test_closed_outbound_renders_no_egress() {
        let sg = SecurityGroupSpec {
            network: ResourceId::new("Vpc").unwrap(),
            description: "locked".into(),
            allow_all_outbound: false,
            ingress: vec![],
        };
        assert_eq!(
            sg.attributes().get("SecurityGroupEgress"),
            Some(&AttributeValue::List(vec![]))
        );
    }

    #[test]
    fn test_subnet_zone_selection_renders() {
        let subnet = SubnetSpec {
            network: ResourceId::new("Vpc").unwrap(),
            cidr_block: Ipv4Cidr::new("10.0.1.0/24").unwrap(),
            availability_zone: 1,
            visibility: SubnetVisibility::Public,
            group_name: "Public".into(),
            map_public_ip_on_launch: true,
        };
        let json = serde_json::to_value(subnet.attributes()).unwrap();
        assert_eq!(json["AvailabilityZone"]["Fn::Select"][0], 1);
        assert_eq!(json["Tags"][1]["Value"], "Public");
    }
}

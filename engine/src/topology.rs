//! Topology builder
//!
//! Derives the node/edge graph of a deployment from its configuration.
//! Node IDs depend only on entity type and name, so building twice from
//! the same configuration yields the same graph.

use std::collections::HashSet;

use serde_json::{json, Map, Value};

use crate::generator::zones::resolve_zone;
use crate::models::config::{ComponentKind, DeploymentConfig};
use crate::models::topology::{Topology, TopologyEdge, TopologyNode};

pub const SUBNET_EDGE_LABEL: &str = "belongs-to";
pub const COMPONENT_EDGE_LABEL: &str = "attached-to";

/// Build the topology graph for `config`
pub fn build_topology(config: &DeploymentConfig) -> Topology {
    let mut ids = IdAllocator::default();
    let mut topology = Topology::default();
    let provider = config.provider();

    let network_ids: Vec<String> = config
        .networks()
        .into_iter()
        .map(|vpc| {
            let id = ids.allocate(&format!("vpc-{}", vpc.name));
            topology.nodes.push(TopologyNode {
                id: id.clone(),
                node_type: "vpc".to_string(),
                name: vpc.name.clone(),
                data: data(json!({
                    "cidr": vpc.cidr,
                    "enableDnsSupport": vpc.enable_dns_support,
                    "enableDnsHostnames": vpc.enable_dns_hostnames,
                })),
            });
            id
        })
        .collect();

    for subnet in config.subnets() {
        let id = ids.allocate(&format!("subnet-{}", subnet.name));
        let requested = if subnet.az.trim().is_empty() {
            &config.az
        } else {
            &subnet.az
        };
        let zone = resolve_zone(&provider, &config.region, requested).zone;

        topology.nodes.push(TopologyNode {
            id: id.clone(),
            node_type: "subnet".to_string(),
            name: subnet.name.clone(),
            data: data(json!({
                "cidr": subnet.cidr,
                "az": zone,
                "mapPublicIpOnLaunch": subnet.map_public_ip_on_launch,
            })),
        });

        if let Some(parent) = network_ids.get(config.parent_index(subnet)) {
            topology.edges.push(edge(&id, parent, SUBNET_EDGE_LABEL));
        }
    }

    for selection in &config.components {
        let id = ids.allocate(&format!("{}-{}", selection.value, selection.name));
        let properties = config
            .properties(selection)
            .cloned()
            .map(Value::Object)
            .unwrap_or_else(|| Value::Object(Map::new()));

        topology.nodes.push(TopologyNode {
            id: id.clone(),
            node_type: selection.value.clone(),
            name: selection.name.clone(),
            data: data(json!({ "properties": properties })),
        });

        let targets: &[String] = if selection.kind() == Some(ComponentKind::TransitGateway) {
            &network_ids
        } else {
            network_ids.get(..1).unwrap_or_default()
        };
        for target in targets {
            topology.edges.push(edge(&id, target, COMPONENT_EDGE_LABEL));
        }
    }

    topology
}

fn data(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn edge(source: &str, target: &str, label: &str) -> TopologyEdge {
    TopologyEdge {
        source: source.to_string(),
        target: target.to_string(),
        label: Some(label.to_string()),
    }
}

/// Hands out node IDs, suffixing repeats in encounter order
#[derive(Default)]
struct IdAllocator {
    used: HashSet<String>,
}

impl IdAllocator {
    fn allocate(&mut self, base: &str) -> String {
        let mut id = base.to_string();
        let mut n = 2;
        while !self.used.insert(id.clone()) {
            id = format!("{}-{}", base, n);
            n += 1;
        }
        id
    }
}

//! Infrastructure document generation
//!
//! Turns a [`DeploymentConfig`] into a Terraform document: one provider
//! block, the networks, the subnets, then one fragment per selected
//! component looked up in a [`ComponentRegistry`].

pub mod components;
pub mod hcl;
pub mod network;
pub mod options;
pub mod zones;

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::models::config::{
    CloudProvider, ComponentSelection, DeploymentConfig, PropertyMap, Subnet, Vpc,
};

pub use components::{ComponentRegistry, FragmentRenderer};
pub use hcl::resource_label;

/// Generated document text and the non-fatal issues found while producing it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub text: String,
    pub warnings: Vec<String>,
}

/// A configured network and its resource label
#[derive(Debug, Clone)]
pub struct NetworkRef<'a> {
    pub vpc: &'a Vpc,
    pub label: String,
}

/// A configured subnet with its parent network and resolved zone
#[derive(Debug, Clone)]
pub struct SubnetRef<'a> {
    pub subnet: &'a Subnet,
    pub label: String,
    /// Index into [`RenderContext::networks`]
    pub network: usize,
    pub zone: String,
}

/// A selected component as seen by a fragment renderer
#[derive(Debug, Clone)]
pub struct ComponentContext<'a> {
    pub selection: &'a ComponentSelection,
    pub label: String,
    pub properties: Option<&'a PropertyMap>,
}

/// Everything a fragment renderer may read
#[derive(Debug)]
pub struct RenderContext<'a> {
    pub config: &'a DeploymentConfig,
    pub provider: CloudProvider,
    pub networks: Vec<NetworkRef<'a>>,
    pub subnets: Vec<SubnetRef<'a>>,
    pub components: Vec<ComponentContext<'a>>,
}

impl<'a> RenderContext<'a> {
    /// Resolve labels, parents and zones. Zone fallbacks are pushed to
    /// `warnings`.
    pub fn new(config: &'a DeploymentConfig, warnings: &mut Vec<String>) -> Self {
        let provider = config.provider();

        let mut used = HashSet::new();
        let networks = config
            .networks()
            .into_iter()
            .map(|vpc| NetworkRef {
                vpc,
                label: unique_label(&mut used, &vpc.name),
            })
            .collect();

        let mut used = HashSet::new();
        let subnets = config
            .subnets()
            .into_iter()
            .map(|subnet| {
                let requested = if subnet.az.trim().is_empty() {
                    &config.az
                } else {
                    &subnet.az
                };
                let resolved = zones::resolve_zone(&provider, &config.region, requested);
                if let Some(warning) = resolved.warning {
                    warn!("{}", warning);
                    warnings.push(warning);
                }
                SubnetRef {
                    subnet,
                    label: unique_label(&mut used, &subnet.name),
                    network: config.parent_index(subnet),
                    zone: resolved.zone,
                }
            })
            .collect();

        let mut used = HashSet::new();
        let components = config
            .components
            .iter()
            .map(|selection| ComponentContext {
                selection,
                label: unique_label(&mut used, &selection.name),
                properties: config.properties(selection),
            })
            .collect();

        Self {
            config,
            provider,
            networks,
            subnets,
            components,
        }
    }

    /// First configured network; components without an explicit network
    /// attach here
    pub fn primary_network(&self) -> Option<&NetworkRef<'a>> {
        self.networks.first()
    }

    pub fn subnets_of(&self, network: usize) -> impl Iterator<Item = &SubnetRef<'a>> {
        self.subnets.iter().filter(move |s| s.network == network)
    }

    /// Subnets of the primary network, or every subnet when none belong to it
    pub fn primary_subnets(&self) -> Vec<&SubnetRef<'a>> {
        let primary: Vec<_> = self.subnets_of(0).collect();
        if primary.is_empty() {
            self.subnets.iter().collect()
        } else {
            primary
        }
    }

    pub fn primary_subnet(&self) -> Option<&SubnetRef<'a>> {
        self.primary_subnets().into_iter().next()
    }

    /// Reference to an attribute of a network resource
    pub fn network_attr(&self, network: &NetworkRef<'_>, attr: &str) -> String {
        format!(
            "{}.{}.{}",
            network::network_type(&self.provider),
            network.label,
            attr
        )
    }

    /// Reference to an attribute of a subnet resource
    pub fn subnet_attr(&self, subnet: &SubnetRef<'_>, attr: &str) -> String {
        format!(
            "{}.{}.{}",
            network::subnet_type(&self.provider),
            subnet.label,
            attr
        )
    }
}

fn unique_label(used: &mut HashSet<String>, name: &str) -> String {
    let base = resource_label(name);
    let mut label = base.clone();
    let mut n = 2;
    while !used.insert(label.clone()) {
        label = format!("{}_{}", base, n);
        n += 1;
    }
    label
}

/// Document generator backed by a component registry
#[derive(Default)]
pub struct Generator {
    registry: ComponentRegistry,
}

impl Generator {
    pub fn new(registry: ComponentRegistry) -> Self {
        Self { registry }
    }

    pub fn generate(&self, config: &DeploymentConfig) -> GeneratedDocument {
        let mut warnings = Vec::new();
        let ctx = RenderContext::new(config, &mut warnings);
        info!(
            "Generating Terraform document for {} in {}",
            ctx.provider.id(),
            config.region
        );

        let mut text = network::provider_block(&ctx.provider, &config.region).render();
        if ctx.networks.is_empty() {
            let warning = "No VPC configured, only the provider block was generated".to_string();
            warn!("{}", warning);
            warnings.push(warning);
            return GeneratedDocument { text, warnings };
        }

        for block in network::network_blocks(&ctx)
            .into_iter()
            .chain(network::subnet_blocks(&ctx))
        {
            text.push_str(&block.render());
        }

        for component in &ctx.components {
            match self.registry.get(&ctx.provider, component.selection) {
                Some(renderer) => {
                    debug!(
                        "Rendering {} ({}) for {}",
                        component.selection.name,
                        component.selection.value,
                        ctx.provider.id()
                    );
                    for block in renderer.render(&ctx, component) {
                        text.push_str(&block.render());
                    }
                }
                None => debug!(
                    "No {} renderer for {}, skipping",
                    component.selection.value,
                    ctx.provider.id()
                ),
            }
        }

        GeneratedDocument { text, warnings }
    }
}

/// Generate a document with the built-in renderers
pub fn generate(config: &DeploymentConfig) -> GeneratedDocument {
    Generator::default().generate(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: serde_json::Value) -> DeploymentConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_aws_document_layout() {
        let doc = generate(&config(json!({
            "cloudProvider": "aws",
            "region": "us-east-1",
            "az": "可用区A",
            "vpc": {"name": "main", "cidr": "10.0.0.0/16"},
            "subnet": {"name": "web", "cidr": "10.0.1.0/24", "mapPublicIpOnLaunch": true}
        })));

        let provider = doc.text.find("provider \"aws\"").unwrap();
        let vpc = doc.text.find("resource \"aws_vpc\" \"main\"").unwrap();
        let subnet = doc.text.find("resource \"aws_subnet\" \"web\"").unwrap();
        assert!(provider < vpc && vpc < subnet);
        assert!(doc.text.contains("region = \"us-east-1\""));
        assert!(doc.text.contains("vpc_id                  = aws_vpc.main.id"));
        assert!(doc.text.contains("availability_zone       = \"us-east-1a\""));
        assert!(doc.text.contains("map_public_ip_on_launch = true"));
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn test_unmapped_zone_warns() {
        let doc = generate(&config(json!({
            "cloudProvider": "aws",
            "region": "us-east-1",
            "az": "somewhere",
            "vpc": {"name": "main", "cidr": "10.0.0.0/16"},
            "subnet": {"name": "web", "cidr": "10.0.1.0/24"}
        })));

        assert!(doc.text.contains("\"us-east-1a\""));
        assert_eq!(doc.warnings.len(), 1);
    }

    #[test]
    fn test_unknown_component_contributes_nothing() {
        let base = json!({
            "cloudProvider": "aws",
            "region": "us-east-1",
            "vpc": {"name": "main", "cidr": "10.0.0.0/16"},
            "subnet": {"name": "web", "cidr": "10.0.1.0/24", "az": "us-east-1b"}
        });
        let mut with_unknown = base.clone();
        with_unknown["components"] = json!(["quantum-router"]);

        assert_eq!(generate(&config(base)).text, generate(&config(with_unknown)).text);
    }

    #[test]
    fn test_unsupported_provider_component_pair_is_skipped() {
        let base = json!({
            "cloudProvider": "baidu",
            "region": "bj",
            "vpc": {"name": "main", "cidr": "10.0.0.0/16"}
        });
        let mut with_lb = base.clone();
        with_lb["components"] = json!(["load-balancer"]);

        assert_eq!(generate(&config(base)).text, generate(&config(with_lb)).text);
    }

    #[test]
    fn test_multi_network_precedence() {
        let doc = generate(&config(json!({
            "cloudProvider": "aws",
            "region": "us-east-1",
            "vpc": {"name": "legacy", "cidr": "10.9.0.0/16"},
            "subnet": {"name": "legacy-subnet", "cidr": "10.9.1.0/24"},
            "allVpcs": [
                {"name": "hub", "cidr": "10.0.0.0/16"},
                {"name": "spoke", "cidr": "10.1.0.0/16"}
            ],
            "allSubnets": [
                {"name": "hub-a", "cidr": "10.0.1.0/24", "az": "us-east-1a", "vpcIndex": 0},
                {"name": "spoke-a", "cidr": "10.1.1.0/24", "az": "us-east-1b", "vpcIndex": 1},
                {"name": "orphan", "cidr": "10.0.2.0/24", "az": "us-east-1c", "vpcIndex": 9}
            ]
        })));

        assert!(!doc.text.contains("legacy"));
        assert!(doc.text.contains("resource \"aws_vpc\" \"hub\""));
        assert!(doc.text.contains("resource \"aws_vpc\" \"spoke\""));

        let spoke_subnet = &doc.text[doc.text.find("\"spoke-a\" {").unwrap()..];
        assert!(spoke_subnet.contains("aws_vpc.spoke.id"));
        let orphan = &doc.text[doc.text.find("\"orphan\" {").unwrap()..];
        assert!(orphan.contains("aws_vpc.hub.id"));
    }

    #[test]
    fn test_no_network_emits_provider_only() {
        let doc = generate(&config(json!({
            "cloudProvider": "alicloud",
            "region": "cn-hangzhou",
            "components": ["object-storage"]
        })));

        assert_eq!(doc.text, "provider \"alicloud\" {\n  region = \"cn-hangzhou\"\n}\n\n");
        assert_eq!(doc.warnings.len(), 1);
    }

    #[test]
    fn test_duplicate_names_get_unique_labels() {
        let doc = generate(&config(json!({
            "cloudProvider": "aws",
            "region": "us-east-1",
            "allVpcs": [
                {"name": "net", "cidr": "10.0.0.0/16"},
                {"name": "net", "cidr": "10.1.0.0/16"}
            ]
        })));

        assert!(doc.text.contains("resource \"aws_vpc\" \"net\""));
        assert!(doc.text.contains("resource \"aws_vpc\" \"net_2\""));
    }
}

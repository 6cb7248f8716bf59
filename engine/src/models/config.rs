//! Deployment request models

use std::collections::BTreeMap;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::EngineError;

/// Free-form properties for one component, keyed by property name
pub type PropertyMap = serde_json::Map<String, Value>;

/// A landing zone deployment request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    /// Cloud provider identifier (e.g., "aws", "azure", "alicloud")
    pub cloud_provider: String,

    /// Provider region
    pub region: String,

    /// Default availability zone for subnets that do not name one
    #[serde(default)]
    pub az: String,

    /// Legacy single-network shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc: Option<Vpc>,

    /// Legacy single-subnet shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<Subnet>,

    /// Multi-network shape, takes precedence over `vpc` when non-empty
    #[serde(default)]
    pub all_vpcs: Vec<Vpc>,

    /// Multi-subnet shape, takes precedence over `subnet` when non-empty
    #[serde(default)]
    pub all_subnets: Vec<Subnet>,

    /// Selected add-on components
    #[serde(default)]
    pub components: Vec<ComponentSelection>,

    /// Per-component free-form properties, keyed by component identifier
    #[serde(default)]
    pub component_properties: BTreeMap<String, PropertyMap>,

    /// Typed sub-options for components that need them
    #[serde(default)]
    pub component_config: ComponentConfig,
}

/// A virtual network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vpc {
    pub name: String,

    pub cidr: String,

    #[serde(default = "default_true")]
    pub enable_dns_support: bool,

    #[serde(default = "default_true")]
    pub enable_dns_hostnames: bool,
}

/// A subnet inside one of the configured networks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub name: String,

    pub cidr: String,

    /// Availability zone, falls back to the deployment-level zone when empty
    #[serde(default)]
    pub az: String,

    /// Index into the configured networks, negative values never resolve
    #[serde(default)]
    pub vpc_index: i64,

    #[serde(default)]
    pub map_public_ip_on_launch: bool,
}

fn default_true() -> bool {
    true
}

/// A selected component.
///
/// Accepts either a bare identifier (`"object-storage"`) or an object
/// (`{"value": "object-storage", "name": "assets"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSelection")]
pub struct ComponentSelection {
    /// Component identifier
    pub value: String,

    /// Display name
    pub name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSelection {
    Id(String),
    Full {
        value: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl From<RawSelection> for ComponentSelection {
    fn from(raw: RawSelection) -> Self {
        match raw {
            RawSelection::Id(value) => ComponentSelection::new(value),
            RawSelection::Full { value, name } => {
                let name = name.filter(|n| !n.is_empty()).unwrap_or_else(|| value.clone());
                ComponentSelection { value, name }
            }
        }
    }
}

impl ComponentSelection {
    /// Selection whose display name is its identifier
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            name: value.clone(),
            value,
        }
    }

    pub fn named(value: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            name: name.into(),
        }
    }

    /// Known component kind, if the identifier is recognized
    pub fn kind(&self) -> Option<ComponentKind> {
        ComponentKind::from_id(&self.value)
    }
}

/// Component kinds the generator knows how to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    LoadBalancer,
    ObjectStorage,
    Database,
    TransitGateway,
    Compute,
}

impl ComponentKind {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "load-balancer" => Some(ComponentKind::LoadBalancer),
            "object-storage" => Some(ComponentKind::ObjectStorage),
            "database" | "rds" => Some(ComponentKind::Database),
            "transit-gateway" => Some(ComponentKind::TransitGateway),
            "compute" => Some(ComponentKind::Compute),
            _ => None,
        }
    }

    /// Canonical identifier
    pub fn id(&self) -> &'static str {
        match self {
            ComponentKind::LoadBalancer => "load-balancer",
            ComponentKind::ObjectStorage => "object-storage",
            ComponentKind::Database => "database",
            ComponentKind::TransitGateway => "transit-gateway",
            ComponentKind::Compute => "compute",
        }
    }
}

/// Cloud providers with dedicated rendering
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CloudProvider {
    Aws,
    Azure,
    Alicloud,
    Baidu,
    Huawei,
    Tencent,
    Volcengine,
    /// Any other identifier, rendered with the generic fallback
    Other(String),
}

impl CloudProvider {
    pub fn from_id(id: &str) -> Self {
        match id {
            "aws" => CloudProvider::Aws,
            "azure" => CloudProvider::Azure,
            "alicloud" => CloudProvider::Alicloud,
            "baidu" => CloudProvider::Baidu,
            "huawei" => CloudProvider::Huawei,
            "tencent" => CloudProvider::Tencent,
            "volcengine" => CloudProvider::Volcengine,
            other => CloudProvider::Other(other.to_string()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            CloudProvider::Aws => "aws",
            CloudProvider::Azure => "azure",
            CloudProvider::Alicloud => "alicloud",
            CloudProvider::Baidu => "baidu",
            CloudProvider::Huawei => "huawei",
            CloudProvider::Tencent => "tencent",
            CloudProvider::Volcengine => "volcengine",
            CloudProvider::Other(id) => id,
        }
    }

    /// Name of the Terraform provider plugin
    pub fn terraform_name(&self) -> &str {
        match self {
            CloudProvider::Aws => "aws",
            CloudProvider::Azure => "azurerm",
            CloudProvider::Alicloud => "alicloud",
            CloudProvider::Baidu => "baiducloud",
            CloudProvider::Huawei => "huaweicloud",
            CloudProvider::Tencent => "tencentcloud",
            CloudProvider::Volcengine => "volcengine",
            CloudProvider::Other(id) => id,
        }
    }
}

/// Typed component sub-options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentConfig {
    pub bucket_name: String,

    /// One of "private", "public-read", "public-read-write" or "custom"
    pub bucket_policy_type: String,

    /// Policy document used when `bucket_policy_type` is "custom"
    pub custom_bucket_policy: String,

    pub enable_lifecycle_rules: bool,

    pub lifecycle_rule: BucketLifecycleRule,

    pub enable_route_tables: bool,

    pub enable_vpc_attachment: bool,

    pub transit_gateway_config: TransitGatewayConfig,

    pub transit_gateway_name: String,
}

/// Object storage lifecycle rule; zero day counts mean "not set"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BucketLifecycleRule {
    pub name: String,
    pub status: String,
    pub expiration_days: u32,
    pub transition_days: u32,
}

/// Transit gateway sub-options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransitGatewayConfig {
    pub description: String,
    pub route_table_name: String,
    pub default_route_table: bool,
    pub dns_support: Option<bool>,
    pub ecmp_support: Option<bool>,
    pub ipv6_support: bool,
    pub attachment_name: String,
}

impl DeploymentConfig {
    /// Configured networks; the multi-network list wins when non-empty
    pub fn networks(&self) -> Vec<&Vpc> {
        if !self.all_vpcs.is_empty() {
            self.all_vpcs.iter().collect()
        } else {
            self.vpc.iter().collect()
        }
    }

    /// Configured subnets; the multi-subnet list wins when non-empty
    pub fn subnets(&self) -> Vec<&Subnet> {
        if !self.all_subnets.is_empty() {
            self.all_subnets.iter().collect()
        } else {
            self.subnet.iter().collect()
        }
    }

    /// Index of the network a subnet belongs to, falling back to the first
    /// network when the subnet's index does not resolve
    pub fn parent_index(&self, subnet: &Subnet) -> usize {
        usize::try_from(subnet.vpc_index)
            .ok()
            .filter(|index| *index < self.networks().len())
            .unwrap_or(0)
    }

    pub fn provider(&self) -> CloudProvider {
        CloudProvider::from_id(&self.cloud_provider)
    }

    /// Free-form properties for a component, trying its canonical identifier
    /// when the selection used an alias
    pub fn properties(&self, selection: &ComponentSelection) -> Option<&PropertyMap> {
        self.component_properties.get(&selection.value).or_else(|| {
            selection
                .kind()
                .and_then(|kind| self.component_properties.get(kind.id()))
        })
    }

    /// Structural checks applied before a deployment is accepted
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.cloud_provider.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "cloudProvider is required".to_string(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(EngineError::InvalidConfig("region is required".to_string()));
        }

        let networks = self.networks();
        if networks.is_empty() {
            return Err(EngineError::InvalidConfig(
                "at least one VPC is required".to_string(),
            ));
        }
        for vpc in networks {
            check_named_cidr("VPC", &vpc.name, &vpc.cidr)?;
        }
        for subnet in self.subnets() {
            check_named_cidr("subnet", &subnet.name, &subnet.cidr)?;
        }
        Ok(())
    }
}

fn check_named_cidr(kind: &str, name: &str, cidr: &str) -> Result<(), EngineError> {
    if name.trim().is_empty() {
        return Err(EngineError::InvalidConfig(format!("{} name is required", kind)));
    }
    cidr.trim().parse::<Ipv4Net>().map_err(|e| {
        EngineError::InvalidConfig(format!(
            "{} {} has invalid CIDR '{}': {}",
            kind, name, cidr, e
        ))
    })?;
    Ok(())
}

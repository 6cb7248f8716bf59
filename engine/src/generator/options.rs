//! Typed component options
//!
//! Each option is resolved once, before rendering, in this order: the
//! structured `componentConfig`, then the component's free-form property
//! map, then the default.

use serde_json::Value;

use super::{ComponentContext, RenderContext};
use crate::models::config::PropertyMap;

/// Read-only view over a component's free-form properties
#[derive(Debug, Clone, Copy, Default)]
pub struct Props<'a>(Option<&'a PropertyMap>);

impl<'a> Props<'a> {
    pub fn new(properties: Option<&'a PropertyMap>) -> Self {
        Self(properties)
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.0.and_then(|map| map.get(key))
    }

    /// Non-empty string; numbers and booleans are accepted in their text form
    pub fn string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Non-negative integer; numeric strings are accepted
    pub fn number(&self, key: &str) -> Option<u32> {
        match self.get(key)? {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn primary_network_name(ctx: &RenderContext<'_>) -> String {
    ctx.primary_network()
        .map(|n| n.vpc.name.clone())
        .unwrap_or_else(|| "landing-zone".to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerOptions {
    pub name: String,
    pub listener_port: u32,
    pub target_port: u32,
    pub protocol: String,
    pub ingress_cidr: String,
}

impl LoadBalancerOptions {
    pub const DEFAULT_PORT: u32 = 80;
    pub const DEFAULT_PROTOCOL: &'static str = "HTTP";
    pub const DEFAULT_INGRESS_CIDR: &'static str = "0.0.0.0/0";

    pub fn resolve(ctx: &RenderContext<'_>, component: &ComponentContext<'_>) -> Self {
        let props = Props::new(component.properties);
        let listener_port = props.number("listener_port").unwrap_or(Self::DEFAULT_PORT);

        Self {
            name: format!("{}-{}", component.selection.name, primary_network_name(ctx)),
            listener_port,
            target_port: props.number("target_port").unwrap_or(listener_port),
            protocol: props
                .string("protocol")
                .map(|p| p.to_ascii_uppercase())
                .unwrap_or_else(|| Self::DEFAULT_PROTOCOL.to_string()),
            ingress_cidr: props
                .string("ingress_cidr")
                .unwrap_or_else(|| Self::DEFAULT_INGRESS_CIDR.to_string()),
        }
    }
}

/// Bucket access policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketAcl {
    Private,
    PublicRead,
    PublicReadWrite,
    /// Caller-supplied policy document
    Custom(String),
}

impl BucketAcl {
    /// Canned ACL name; custom policies keep the bucket private
    pub fn canned(&self) -> &'static str {
        match self {
            BucketAcl::Private | BucketAcl::Custom(_) => "private",
            BucketAcl::PublicRead => "public-read",
            BucketAcl::PublicReadWrite => "public-read-write",
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, BucketAcl::PublicRead | BucketAcl::PublicReadWrite)
    }

    fn parse(kind: &str, policy: Option<String>) -> Self {
        match kind {
            "public-read" => BucketAcl::PublicRead,
            "public-read-write" => BucketAcl::PublicReadWrite,
            "custom" => match policy {
                Some(policy) => BucketAcl::Custom(policy),
                None => BucketAcl::Private,
            },
            _ => BucketAcl::Private,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleRule {
    pub name: String,
    pub enabled: bool,
    pub expiration_days: u32,
    /// Omitted when it would not happen before expiration
    pub transition_days: Option<u32>,
    pub storage_class: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStorageOptions {
    pub bucket_name: String,
    pub acl: BucketAcl,
    pub lifecycle: Option<LifecycleRule>,
}

impl ObjectStorageOptions {
    pub const DEFAULT_EXPIRATION_DAYS: u32 = 365;
    pub const DEFAULT_TRANSITION_DAYS: u32 = 30;

    pub fn resolve(ctx: &RenderContext<'_>, component: &ComponentContext<'_>) -> Self {
        let structured = &ctx.config.component_config;
        let props = Props::new(component.properties);

        let bucket_name = non_empty(&structured.bucket_name)
            .or_else(|| props.string("bucket_name"))
            .unwrap_or_else(|| format!("{}-bucket", primary_network_name(ctx)));

        let policy_type = non_empty(&structured.bucket_policy_type)
            .or_else(|| props.string("bucket_policy_type"))
            .or_else(|| props.string("acl"))
            .unwrap_or_default();
        let policy = non_empty(&structured.custom_bucket_policy)
            .or_else(|| props.string("custom_bucket_policy"));
        let acl = BucketAcl::parse(&policy_type, policy);

        let lifecycle_enabled = structured.enable_lifecycle_rules
            || props.flag("enable_lifecycle_rules").unwrap_or(false);
        let lifecycle = lifecycle_enabled.then(|| {
            let rule = &structured.lifecycle_rule;
            let expiration_days = Some(rule.expiration_days)
                .filter(|d| *d > 0)
                .or_else(|| props.number("expiration_days"))
                .unwrap_or(Self::DEFAULT_EXPIRATION_DAYS);
            let transition_days = Some(rule.transition_days)
                .filter(|d| *d > 0)
                .or_else(|| props.number("transition_days"))
                .unwrap_or(Self::DEFAULT_TRANSITION_DAYS);

            LifecycleRule {
                name: non_empty(&rule.name).unwrap_or_else(|| format!("{}-lifecycle", bucket_name)),
                enabled: !rule.status.eq_ignore_ascii_case("disabled"),
                expiration_days,
                transition_days: (transition_days < expiration_days).then_some(transition_days),
                storage_class: props
                    .string("storage_class")
                    .unwrap_or_else(|| "STANDARD_IA".to_string()),
            }
        });

        Self {
            bucket_name,
            acl,
            lifecycle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseOptions {
    pub identifier: String,
    pub engine: String,
    pub engine_version: String,
    /// Provider-specific instance class, used verbatim when set
    pub instance_class: Option<String>,
    /// Size suffix such as "micro", combined with the provider's family
    pub instance_type: Option<String>,
    /// Storage in GB
    pub allocated_storage: u32,
    pub db_name: String,
    /// Provider default when unset
    pub username: Option<String>,
    pub password: String,
}

impl DatabaseOptions {
    pub const DEFAULT_ENGINE: &'static str = "mysql";
    pub const DEFAULT_ENGINE_VERSION: &'static str = "5.7";
    pub const DEFAULT_STORAGE_GB: u32 = 20;
    pub const DEFAULT_DB_NAME: &'static str = "mydb";
    pub const DEFAULT_PASSWORD: &'static str = "Password1234!";

    pub fn resolve(ctx: &RenderContext<'_>, component: &ComponentContext<'_>) -> Self {
        let props = Props::new(component.properties);
        let or_default = |key: &str, default: &str| {
            props.string(key).unwrap_or_else(|| default.to_string())
        };

        Self {
            identifier: format!("{}-db", primary_network_name(ctx)),
            engine: or_default("engine", Self::DEFAULT_ENGINE),
            engine_version: or_default("engine_version", Self::DEFAULT_ENGINE_VERSION),
            instance_class: props.string("instance_class"),
            instance_type: props.string("instance_type"),
            allocated_storage: props
                .number("allocated_storage")
                .or_else(|| props.number("storage_size"))
                .filter(|gb| *gb > 0)
                .unwrap_or(Self::DEFAULT_STORAGE_GB),
            db_name: or_default("db_name", Self::DEFAULT_DB_NAME),
            username: props.string("username"),
            password: or_default("password", Self::DEFAULT_PASSWORD),
        }
    }

    /// Parameter group family, e.g. `mysql5.7`
    pub fn parameter_family(&self) -> String {
        format!("{}{}", self.engine.to_ascii_lowercase(), self.engine_version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitGatewayOptions {
    pub name: String,
    pub description: String,
    pub dns_support: bool,
    pub ecmp_support: bool,
    pub ipv6_support: bool,
    /// Attach every configured network
    pub attach_networks: bool,
    pub attachment_name: String,
    /// Dedicated route table, when enabled
    pub route_table: Option<String>,
    pub default_route_table_association: bool,
}

impl TransitGatewayOptions {
    pub const DEFAULT_DESCRIPTION: &'static str = "Landing zone transit gateway";

    pub fn resolve(ctx: &RenderContext<'_>, component: &ComponentContext<'_>) -> Self {
        let structured = &ctx.config.component_config;
        let tgw = &structured.transit_gateway_config;
        let props = Props::new(component.properties);

        let name = non_empty(&structured.transit_gateway_name)
            .or_else(|| props.string("transit_gateway_name"))
            .unwrap_or_else(|| format!("{}-tgw", primary_network_name(ctx)));

        let route_tables = structured.enable_route_tables
            || props.flag("enable_route_tables").unwrap_or(false);
        let route_table = route_tables.then(|| {
            non_empty(&tgw.route_table_name)
                .or_else(|| props.string("route_table_name"))
                .unwrap_or_else(|| format!("{}-rt", name))
        });

        Self {
            description: non_empty(&tgw.description)
                .or_else(|| props.string("description"))
                .unwrap_or_else(|| Self::DEFAULT_DESCRIPTION.to_string()),
            dns_support: tgw
                .dns_support
                .or_else(|| props.flag("dns_support"))
                .unwrap_or(true),
            ecmp_support: tgw
                .ecmp_support
                .or_else(|| props.flag("ecmp_support"))
                .unwrap_or(true),
            ipv6_support: tgw.ipv6_support || props.flag("ipv6_support").unwrap_or(false),
            attach_networks: ctx.networks.len() > 1
                || structured.enable_vpc_attachment
                || props.flag("enable_vpc_attachment").unwrap_or(false),
            attachment_name: non_empty(&tgw.attachment_name)
                .or_else(|| props.string("attachment_name"))
                .unwrap_or_else(|| format!("{}-attachment", name)),
            default_route_table_association: tgw.default_route_table || route_table.is_none(),
            route_table,
            name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeOptions {
    pub count: u32,
    pub instance_type: String,
    pub image: String,
}

impl Default for ComputeOptions {
    fn default() -> Self {
        Self {
            count: 2,
            instance_type: "medium".to_string(),
            image: "ami-0c55b159cbfafe1f0".to_string(),
        }
    }
}

impl ComputeOptions {
    pub fn resolve(_ctx: &RenderContext<'_>, component: &ComponentContext<'_>) -> Self {
        let props = Props::new(component.properties);
        let defaults = Self::default();

        Self {
            count: props
                .number("instance_count")
                .filter(|c| *c > 0)
                .unwrap_or(defaults.count),
            instance_type: props.string("instance_type").unwrap_or(defaults.instance_type),
            image: props.string("ami").unwrap_or(defaults.image),
        }
    }

    /// Full instance type in `family`, unless one was given
    pub fn instance_type_in(&self, family: &str) -> String {
        if self.instance_type.contains('.') || self.instance_type.contains('_') {
            self.instance_type.clone()
        } else {
            format!("{}.{}", family, self.instance_type)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::DeploymentConfig;
    use serde_json::json;

    fn with_context<F>(value: serde_json::Value, check: F)
    where
        F: FnOnce(&RenderContext<'_>, &ComponentContext<'_>),
    {
        let config: DeploymentConfig = serde_json::from_value(value).unwrap();
        let mut warnings = Vec::new();
        let ctx = RenderContext::new(&config, &mut warnings);
        check(&ctx, &ctx.components[0]);
    }

    #[test]
    fn test_props_accept_strings_and_numbers() {
        let map: PropertyMap = serde_json::from_value(json!({
            "port": "8080", "count": 3, "flag": "true", "empty": "  ", "neg": -1
        }))
        .unwrap();
        let props = Props::new(Some(&map));

        assert_eq!(props.number("port"), Some(8080));
        assert_eq!(props.number("count"), Some(3));
        assert_eq!(props.string("count"), Some("3".to_string()));
        assert_eq!(props.flag("flag"), Some(true));
        assert_eq!(props.string("empty"), None);
        assert_eq!(props.number("neg"), None);
        assert_eq!(Props::default().string("port"), None);
    }

    #[test]
    fn test_load_balancer_defaults() {
        with_context(
            json!({
                "cloudProvider": "aws", "region": "us-east-1",
                "vpc": {"name": "main", "cidr": "10.0.0.0/16"},
                "components": [{"value": "load-balancer", "name": "web"}],
                "componentProperties": {"load-balancer": {"listener_port": "8080"}}
            }),
            |ctx, component| {
                let options = LoadBalancerOptions::resolve(ctx, component);
                assert_eq!(options.name, "web-main");
                assert_eq!(options.listener_port, 8080);
                assert_eq!(options.target_port, 8080);
                assert_eq!(options.protocol, "HTTP");
            },
        );
    }

    #[test]
    fn test_structured_options_win_over_properties() {
        with_context(
            json!({
                "cloudProvider": "aws", "region": "us-east-1",
                "vpc": {"name": "main", "cidr": "10.0.0.0/16"},
                "components": ["object-storage"],
                "componentProperties": {"object-storage": {"bucket_name": "from-props", "acl": "public-read"}},
                "componentConfig": {
                    "bucketName": "from-structured",
                    "enableLifecycleRules": true,
                    "lifecycleRule": {"expirationDays": 20, "transitionDays": 30}
                }
            }),
            |ctx, component| {
                let options = ObjectStorageOptions::resolve(ctx, component);
                assert_eq!(options.bucket_name, "from-structured");
                assert_eq!(options.acl, BucketAcl::PublicRead);

                let rule = options.lifecycle.unwrap();
                assert_eq!(rule.expiration_days, 20);
                assert_eq!(rule.transition_days, None);
                assert!(rule.enabled);
            },
        );
    }

    #[test]
    fn test_object_storage_defaults() {
        with_context(
            json!({
                "cloudProvider": "aws", "region": "us-east-1",
                "vpc": {"name": "main", "cidr": "10.0.0.0/16"},
                "components": ["object-storage"],
                "componentConfig": {"bucketPolicyType": "custom"}
            }),
            |ctx, component| {
                let options = ObjectStorageOptions::resolve(ctx, component);
                assert_eq!(options.bucket_name, "main-bucket");
                // A custom policy without a document degrades to private
                assert_eq!(options.acl, BucketAcl::Private);
                assert!(options.lifecycle.is_none());
            },
        );
    }

    #[test]
    fn test_database_defaults() {
        with_context(
            json!({
                "cloudProvider": "aws", "region": "us-east-1",
                "vpc": {"name": "main", "cidr": "10.0.0.0/16"},
                "components": ["rds"],
                "componentProperties": {"rds": {"storage_size": "50"}}
            }),
            |ctx, component| {
                let options = DatabaseOptions::resolve(ctx, component);
                assert_eq!(options.engine, "mysql");
                assert_eq!(options.allocated_storage, 50);
                assert_eq!(options.identifier, "main-db");
                assert_eq!(options.parameter_family(), "mysql5.7");
            },
        );
    }

    #[test]
    fn test_transit_gateway_options() {
        with_context(
            json!({
                "cloudProvider": "aws", "region": "us-east-1",
                "allVpcs": [
                    {"name": "hub", "cidr": "10.0.0.0/16"},
                    {"name": "spoke", "cidr": "10.1.0.0/16"}
                ],
                "components": ["transit-gateway"],
                "componentConfig": {
                    "enableRouteTables": true,
                    "transitGatewayConfig": {"dnsSupport": false}
                }
            }),
            |ctx, component| {
                let options = TransitGatewayOptions::resolve(ctx, component);
                assert_eq!(options.name, "hub-tgw");
                assert!(options.attach_networks);
                assert!(!options.dns_support);
                assert!(options.ecmp_support);
                assert_eq!(options.route_table.as_deref(), Some("hub-tgw-rt"));
                assert!(!options.default_route_table_association);
            },
        );
    }

    #[test]
    fn test_compute_instance_type() {
        let options = ComputeOptions::default();
        assert_eq!(options.instance_type_in("t3"), "t3.medium");

        let custom = ComputeOptions {
            instance_type: "m5.large".to_string(),
            ..ComputeOptions::default()
        };
        assert_eq!(custom.instance_type_in("t3"), "m5.large");
    }
}

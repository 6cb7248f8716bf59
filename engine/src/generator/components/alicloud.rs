//! Alibaba Cloud component renderers

use super::FragmentRenderer;
use crate::generator::hcl::Block;
use crate::generator::options::{
    BucketAcl, DatabaseOptions, LoadBalancerOptions, ObjectStorageOptions, TransitGatewayOptions,
};
use crate::generator::{ComponentContext, RenderContext};

fn primary_vswitch(ctx: &RenderContext<'_>) -> Option<String> {
    ctx.primary_subnet().map(|s| ctx.subnet_attr(s, "id"))
}

/// Server load balancer with one listener
pub struct LoadBalancer;

impl FragmentRenderer for LoadBalancer {
    fn render(&self, ctx: &RenderContext<'_>, component: &ComponentContext<'_>) -> Vec<Block> {
        let options = LoadBalancerOptions::resolve(ctx, component);
        let label = &component.label;

        let mut slb = Block::resource("alicloud_slb_load_balancer", label)
            .str("load_balancer_name", &options.name)
            .str("address_type", "internet")
            .str("load_balancer_spec", "slb.s2.small");
        if let Some(vswitch) = primary_vswitch(ctx) {
            slb = slb.raw("vswitch_id", vswitch);
        }

        vec![
            slb,
            Block::resource("alicloud_slb_listener", label)
                .raw("load_balancer_id", format!("alicloud_slb_load_balancer.{}.id", label))
                .num("backend_port", i64::from(options.target_port))
                .num("frontend_port", i64::from(options.listener_port))
                .str("protocol", options.protocol.to_ascii_lowercase())
                .num("bandwidth", 10),
        ]
    }
}

/// OSS bucket
pub struct ObjectStorage;

impl FragmentRenderer for ObjectStorage {
    fn render(&self, ctx: &RenderContext<'_>, component: &ComponentContext<'_>) -> Vec<Block> {
        let options = ObjectStorageOptions::resolve(ctx, component);
        let label = &component.label;

        let mut bucket = Block::resource("alicloud_oss_bucket", label)
            .str("bucket", &options.bucket_name)
            .str("acl", options.acl.canned());
        if let BucketAcl::Custom(policy) = &options.acl {
            bucket = bucket.str("policy", policy);
        }
        if let Some(rule) = &options.lifecycle {
            let mut rule_block = Block::new("lifecycle_rule")
                .str("id", &rule.name)
                .bool("enabled", rule.enabled)
                .block(Block::new("expiration").num("days", i64::from(rule.expiration_days)));
            if let Some(days) = rule.transition_days {
                rule_block = rule_block.block(
                    Block::new("transitions")
                        .num("days", i64::from(days))
                        .str("storage_class", "IA"),
                );
            }
            bucket = bucket.block(rule_block);
        }

        vec![bucket]
    }
}

/// ApsaraDB RDS instance with one database
pub struct Database;

impl FragmentRenderer for Database {
    fn render(&self, ctx: &RenderContext<'_>, component: &ComponentContext<'_>) -> Vec<Block> {
        let options = DatabaseOptions::resolve(ctx, component);
        let label = &component.label;
        let engine = if options.engine.eq_ignore_ascii_case("mysql") {
            "MySQL".to_string()
        } else {
            options.engine.clone()
        };
        let security_ips: Vec<&str> = ctx.networks.iter().map(|n| n.vpc.cidr.as_str()).collect();

        let mut instance = Block::resource("alicloud_db_instance", label)
            .str("engine", engine)
            .str("engine_version", &options.engine_version)
            .str(
                "instance_type",
                options
                    .instance_class
                    .clone()
                    .unwrap_or_else(|| "rds.mysql.s1.small".to_string()),
            )
            .num("instance_storage", i64::from(options.allocated_storage))
            .str("instance_name", &options.identifier);
        if let Some(vswitch) = primary_vswitch(ctx) {
            instance = instance.raw("vswitch_id", vswitch);
        }
        let instance = instance.str_list("security_ips", security_ips);

        vec![
            instance,
            Block::resource("alicloud_db_database", label)
                .raw("instance_id", format!("alicloud_db_instance.{}.id", label))
                .str("name", &options.db_name),
        ]
    }
}

/// Cloud Enterprise Network instance with one attachment per network
pub struct TransitGateway;

impl FragmentRenderer for TransitGateway {
    fn render(&self, ctx: &RenderContext<'_>, component: &ComponentContext<'_>) -> Vec<Block> {
        let options = TransitGatewayOptions::resolve(ctx, component);
        let label = &component.label;

        let mut blocks = vec![Block::resource("alicloud_cen_instance", label)
            .str("cen_instance_name", &options.name)
            .str("description", &options.description)];

        if options.attach_networks {
            for network in &ctx.networks {
                blocks.push(
                    Block::resource(
                        "alicloud_cen_instance_attachment",
                        &format!("{}_{}", label, network.label),
                    )
                    .raw("instance_id", format!("alicloud_cen_instance.{}.id", label))
                    .raw("child_instance_id", ctx.network_attr(network, "id"))
                    .str("child_instance_type", "VPC")
                    .str("child_instance_region_id", &ctx.config.region),
                );
            }
        }

        blocks
    }
}

#[cfg(test)]
mod tests {
    use crate::generator::generate;
    use crate::models::config::DeploymentConfig;
    use serde_json::json;

    fn config(value: serde_json::Value) -> DeploymentConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_components_reference_vswitch() {
        let text = generate(&config(json!({
            "cloudProvider": "alicloud",
            "region": "cn-hangzhou",
            "az": "cn-hangzhou-h",
            "vpc": {"name": "main", "cidr": "172.16.0.0/12"},
            "subnet": {"name": "app", "cidr": "172.16.1.0/24"},
            "components": ["load-balancer", "rds"]
        })))
        .text;

        assert!(text.contains("vswitch_id         = alicloud_vswitch.app.id"));
        assert!(text.contains("protocol         = \"http\""));
        assert!(text.contains("engine           = \"MySQL\""));
        assert!(text.contains("security_ips     = [\"172.16.0.0/12\"]"));
    }

    #[test]
    fn test_cen_attaches_every_network() {
        let text = generate(&config(json!({
            "cloudProvider": "alicloud",
            "region": "cn-hangzhou",
            "allVpcs": [
                {"name": "a", "cidr": "10.0.0.0/16"},
                {"name": "b", "cidr": "10.1.0.0/16"},
                {"name": "c", "cidr": "10.2.0.0/16"}
            ],
            "components": ["transit-gateway"]
        })))
        .text;

        assert_eq!(text.matches("resource \"alicloud_cen_instance_attachment\"").count(), 3);
        assert!(text.contains("child_instance_id        = alicloud_vpc.c.id"));
    }

    #[test]
    fn test_oss_lifecycle_rule() {
        let text = generate(&config(json!({
            "cloudProvider": "alicloud",
            "region": "cn-hangzhou",
            "vpc": {"name": "main", "cidr": "10.0.0.0/16"},
            "components": ["object-storage"],
            "componentConfig": {"bucketPolicyType": "public-read", "enableLifecycleRules": true}
        })))
        .text;

        assert!(text.contains("acl    = \"public-read\""));
        assert!(text.contains("lifecycle_rule {"));
        assert!(text.contains("days = 365"));
    }
}

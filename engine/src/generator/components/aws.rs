//! AWS component renderers

use super::FragmentRenderer;
use crate::generator::hcl::{escape, Block, Value};
use crate::generator::options::{
    BucketAcl, ComputeOptions, DatabaseOptions, LoadBalancerOptions, ObjectStorageOptions,
    TransitGatewayOptions,
};
use crate::generator::{ComponentContext, RenderContext};

/// Elastic load balancing names are limited to 32 characters
fn elb_name(name: &str) -> String {
    let truncated: String = name.chars().take(32).collect();
    truncated.trim_end_matches('-').to_string()
}

fn enable(flag: bool) -> &'static str {
    if flag {
        "enable"
    } else {
        "disable"
    }
}

fn open_egress() -> Block {
    Block::new("egress")
        .num("from_port", 0)
        .num("to_port", 0)
        .str("protocol", "-1")
        .str_list("cidr_blocks", ["0.0.0.0/0"])
}

fn tcp_ingress(port: u32, cidr: &str) -> Block {
    Block::new("ingress")
        .num("from_port", i64::from(port))
        .num("to_port", i64::from(port))
        .str("protocol", "tcp")
        .str_list("cidr_blocks", [cidr])
}

fn primary_subnet_ids(ctx: &RenderContext<'_>) -> Vec<String> {
    ctx.primary_subnets()
        .into_iter()
        .map(|s| ctx.subnet_attr(s, "id"))
        .collect()
}

fn primary_vpc_id(ctx: &RenderContext<'_>) -> String {
    ctx.primary_network()
        .map(|n| ctx.network_attr(n, "id"))
        .unwrap_or_default()
}

/// Application load balancer with one forwarding listener
pub struct LoadBalancer;

impl FragmentRenderer for LoadBalancer {
    fn render(&self, ctx: &RenderContext<'_>, component: &ComponentContext<'_>) -> Vec<Block> {
        let options = LoadBalancerOptions::resolve(ctx, component);
        let label = &component.label;
        let sg_label = format!("{}_lb", label);

        vec![
            Block::resource("aws_security_group", &sg_label)
                .str("name", format!("{}-lb", options.name))
                .str("description", "Load balancer ingress")
                .raw("vpc_id", primary_vpc_id(ctx))
                .block(tcp_ingress(options.listener_port, &options.ingress_cidr))
                .block(open_egress()),
            Block::resource("aws_lb", label)
                .str("name", elb_name(&options.name))
                .bool("internal", false)
                .str("load_balancer_type", "application")
                .raw_list("security_groups", [format!("aws_security_group.{}.id", sg_label)])
                .raw_list("subnets", primary_subnet_ids(ctx))
                .bool("enable_deletion_protection", false),
            Block::resource("aws_lb_target_group", label)
                .str("name", elb_name(&format!("{}-tg", options.name)))
                .num("port", i64::from(options.target_port))
                .str("protocol", &options.protocol)
                .raw("vpc_id", primary_vpc_id(ctx)),
            Block::resource("aws_lb_listener", label)
                .raw("load_balancer_arn", format!("aws_lb.{}.arn", label))
                .num("port", i64::from(options.listener_port))
                .str("protocol", &options.protocol)
                .block(
                    Block::new("default_action")
                        .str("type", "forward")
                        .raw("target_group_arn", format!("aws_lb_target_group.{}.arn", label)),
                ),
        ]
    }
}

/// S3 bucket with access policy and optional lifecycle rule
pub struct ObjectStorage;

impl FragmentRenderer for ObjectStorage {
    fn render(&self, ctx: &RenderContext<'_>, component: &ComponentContext<'_>) -> Vec<Block> {
        let options = ObjectStorageOptions::resolve(ctx, component);
        let label = &component.label;
        let bucket_id = format!("aws_s3_bucket.{}.id", label);

        let mut blocks = vec![Block::resource("aws_s3_bucket", label)
            .str("bucket", &options.bucket_name)
            .name_tag(&options.bucket_name)];

        let public = options.acl.is_public();
        blocks.push(
            Block::resource("aws_s3_bucket_public_access_block", label)
                .raw("bucket", &bucket_id)
                .bool("block_public_acls", !public)
                .bool("block_public_policy", !public)
                .bool("ignore_public_acls", !public)
                .bool("restrict_public_buckets", !public),
        );

        match &options.acl {
            BucketAcl::Private => {}
            BucketAcl::PublicRead | BucketAcl::PublicReadWrite => {
                blocks.push(
                    Block::resource("aws_s3_bucket_ownership_controls", label)
                        .raw("bucket", &bucket_id)
                        .block(
                            Block::new("rule").str("object_ownership", "BucketOwnerPreferred"),
                        ),
                );
                blocks.push(
                    Block::resource("aws_s3_bucket_acl", label)
                        .raw("bucket", &bucket_id)
                        .str("acl", options.acl.canned())
                        .raw_list(
                            "depends_on",
                            [
                                format!("aws_s3_bucket_ownership_controls.{}", label),
                                format!("aws_s3_bucket_public_access_block.{}", label),
                            ],
                        ),
                );
            }
            BucketAcl::Custom(policy) => {
                blocks.push(
                    Block::resource("aws_s3_bucket_policy", label)
                        .raw("bucket", &bucket_id)
                        .attr(
                            "policy",
                            Value::Heredoc {
                                tag: "POLICY".to_string(),
                                body: policy.clone(),
                            },
                        ),
                );
            }
        }

        if let Some(rule) = &options.lifecycle {
            let mut rule_block = Block::new("rule")
                .str("id", &rule.name)
                .str("status", if rule.enabled { "Enabled" } else { "Disabled" })
                .block(Block::new("filter"));
            if let Some(days) = rule.transition_days {
                rule_block = rule_block.block(
                    Block::new("transition")
                        .num("days", i64::from(days))
                        .str("storage_class", &rule.storage_class),
                );
            }
            rule_block = rule_block
                .block(Block::new("expiration").num("days", i64::from(rule.expiration_days)));

            blocks.push(
                Block::resource("aws_s3_bucket_lifecycle_configuration", label)
                    .raw("bucket", &bucket_id)
                    .block(rule_block),
            );
        }

        blocks
    }
}

/// RDS instance in a subnet group spanning the primary network
pub struct Database;

impl FragmentRenderer for Database {
    fn render(&self, ctx: &RenderContext<'_>, component: &ComponentContext<'_>) -> Vec<Block> {
        let options = DatabaseOptions::resolve(ctx, component);
        let label = &component.label;
        let instance_class = options.instance_class.clone().unwrap_or_else(|| {
            format!("db.t3.{}", options.instance_type.as_deref().unwrap_or("micro"))
        });

        vec![
            Block::resource("aws_db_subnet_group", label)
                .str("name", format!("{}-subnets", options.identifier).to_ascii_lowercase())
                .raw_list("subnet_ids", primary_subnet_ids(ctx)),
            Block::resource("aws_db_instance", label)
                .str("identifier", options.identifier.to_ascii_lowercase())
                .num("allocated_storage", i64::from(options.allocated_storage))
                .str("engine", &options.engine)
                .str("engine_version", &options.engine_version)
                .str("instance_class", instance_class)
                .str("db_name", &options.db_name)
                .str("username", options.username.as_deref().unwrap_or("admin"))
                .str("password", &options.password)
                .str("parameter_group_name", format!("default.{}", options.parameter_family()))
                .bool("skip_final_snapshot", true)
                .raw("db_subnet_group_name", format!("aws_db_subnet_group.{}.name", label)),
        ]
    }
}

/// Transit gateway with one attachment per network
pub struct TransitGateway;

impl FragmentRenderer for TransitGateway {
    fn render(&self, ctx: &RenderContext<'_>, component: &ComponentContext<'_>) -> Vec<Block> {
        let options = TransitGatewayOptions::resolve(ctx, component);
        let label = &component.label;
        let tgw_id = format!("aws_ec2_transit_gateway.{}.id", label);
        let default_association = enable(options.default_route_table_association);

        let mut blocks = vec![Block::resource("aws_ec2_transit_gateway", label)
            .str("description", &options.description)
            .str("dns_support", enable(options.dns_support))
            .str("vpn_ecmp_support", enable(options.ecmp_support))
            .str("default_route_table_association", default_association)
            .str("default_route_table_propagation", default_association)
            .name_tag(&options.name)];

        let mut attachments = Vec::new();
        if options.attach_networks {
            for (index, network) in ctx.networks.iter().enumerate() {
                let attachment = format!("{}_{}", label, network.label);
                let subnet_ids: Vec<String> = ctx
                    .subnets_of(index)
                    .map(|s| ctx.subnet_attr(s, "id"))
                    .collect();
                blocks.push(
                    Block::resource("aws_ec2_transit_gateway_vpc_attachment", &attachment)
                        .raw("transit_gateway_id", &tgw_id)
                        .raw("vpc_id", ctx.network_attr(network, "id"))
                        .raw_list("subnet_ids", subnet_ids)
                        .str("ipv6_support", enable(options.ipv6_support))
                        .bool(
                            "transit_gateway_default_route_table_association",
                            options.default_route_table_association,
                        )
                        .name_tag(&format!("{}-{}", options.attachment_name, network.vpc.name)),
                );
                attachments.push(attachment);
            }
        }

        if let Some(route_table) = &options.route_table {
            blocks.push(
                Block::resource("aws_ec2_transit_gateway_route_table", label)
                    .raw("transit_gateway_id", &tgw_id)
                    .name_tag(route_table),
            );
            for attachment in &attachments {
                blocks.push(
                    Block::resource("aws_ec2_transit_gateway_route_table_association", attachment)
                        .raw(
                            "transit_gateway_attachment_id",
                            format!("aws_ec2_transit_gateway_vpc_attachment.{}.id", attachment),
                        )
                        .raw(
                            "transit_gateway_route_table_id",
                            format!("aws_ec2_transit_gateway_route_table.{}.id", label),
                        ),
                );
            }
        }

        blocks
    }
}

/// EC2 instances behind a web security group
pub struct Compute;

impl FragmentRenderer for Compute {
    fn render(&self, ctx: &RenderContext<'_>, component: &ComponentContext<'_>) -> Vec<Block> {
        let options = ComputeOptions::resolve(ctx, component);
        let label = &component.label;
        let sg_label = format!("{}_web", label);

        let instance = Block::resource("aws_instance", label)
            .num("count", i64::from(options.count))
            .str("ami", &options.image)
            .str("instance_type", options.instance_type_in("t3"));
        let instance = match ctx.primary_subnet() {
            Some(subnet) => instance.raw("subnet_id", ctx.subnet_attr(subnet, "id")),
            None => instance,
        };
        let instance = instance
            .raw_list(
                "vpc_security_group_ids",
                [format!("aws_security_group.{}.id", sg_label)],
            )
            .attr(
                "tags",
                Value::Map(vec![(
                    "Name".to_string(),
                    Value::Raw(format!(
                        "\"{}-${{count.index + 1}}\"",
                        escape(&component.selection.name)
                    )),
                )]),
            );

        vec![
            Block::resource("aws_security_group", &sg_label)
                .str("name", format!("{}-web", label))
                .str("description", "Allow web and SSH traffic")
                .raw("vpc_id", primary_vpc_id(ctx))
                .block(tcp_ingress(80, "0.0.0.0/0"))
                .block(tcp_ingress(22, "0.0.0.0/0"))
                .block(open_egress()),
            instance,
        ]
    }
}

//! Provider, network and subnet blocks

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;

use super::hcl::{resource_label, Block, Value};
use super::{NetworkRef, RenderContext, SubnetRef};
use crate::models::config::CloudProvider;

/// Label of the Azure resource group every Azure resource lives in
pub const AZURE_RESOURCE_GROUP: &str = "rg";

const MANAGED_DESCRIPTION: &str = "Managed by landing-zone";

/// Provider name as used in the provider block and resource types
fn provider_name(provider: &CloudProvider) -> String {
    match provider {
        CloudProvider::Other(id) => resource_label(id),
        known => known.terraform_name().to_string(),
    }
}

pub fn provider_block(provider: &CloudProvider, region: &str) -> Block {
    let name = provider_name(provider);
    match provider {
        CloudProvider::Azure => Block::provider(&name).block(Block::new("features")),
        _ => Block::provider(&name).str("region", region),
    }
}

/// Terraform resource type of a virtual network
pub fn network_type(provider: &CloudProvider) -> String {
    match provider {
        CloudProvider::Azure => "azurerm_virtual_network".to_string(),
        other => format!("{}_vpc", provider_name(other)),
    }
}

/// Terraform resource type of a subnet
pub fn subnet_type(provider: &CloudProvider) -> String {
    match provider {
        CloudProvider::Azure => "azurerm_subnet".to_string(),
        CloudProvider::Alicloud => "alicloud_vswitch".to_string(),
        CloudProvider::Huawei => "huaweicloud_vpc_subnet".to_string(),
        other => format!("{}_subnet", provider_name(other)),
    }
}

/// Azure resource group reference, e.g. `azurerm_resource_group.rg.name`
pub fn azure_group(attr: &str) -> String {
    format!("azurerm_resource_group.{}.{}", AZURE_RESOURCE_GROUP, attr)
}

pub fn network_blocks(ctx: &RenderContext<'_>) -> Vec<Block> {
    let mut blocks = Vec::new();

    if ctx.provider == CloudProvider::Azure {
        if let Some(primary) = ctx.primary_network() {
            blocks.push(
                Block::resource("azurerm_resource_group", AZURE_RESOURCE_GROUP)
                    .str("name", format!("rg-{}", primary.vpc.name))
                    .str("location", &ctx.config.region),
            );
        }
    }

    blocks.extend(ctx.networks.iter().map(|network| network_block(ctx, network)));
    blocks
}

fn network_block(ctx: &RenderContext<'_>, network: &NetworkRef<'_>) -> Block {
    let vpc = network.vpc;
    let block = Block::resource(&network_type(&ctx.provider), &network.label);

    match ctx.provider {
        CloudProvider::Aws => block
            .str("cidr_block", &vpc.cidr)
            .bool("enable_dns_support", vpc.enable_dns_support)
            .bool("enable_dns_hostnames", vpc.enable_dns_hostnames)
            .name_tag(&vpc.name),
        CloudProvider::Azure => block
            .str("name", &vpc.name)
            .str_list("address_space", [vpc.cidr.as_str()])
            .raw("location", azure_group("location"))
            .raw("resource_group_name", azure_group("name")),
        CloudProvider::Alicloud | CloudProvider::Volcengine => block
            .str("vpc_name", &vpc.name)
            .str("cidr_block", &vpc.cidr),
        CloudProvider::Huawei => block
            .str("name", &vpc.name)
            .str("cidr", &vpc.cidr)
            .str("description", MANAGED_DESCRIPTION),
        CloudProvider::Baidu | CloudProvider::Tencent | CloudProvider::Other(_) => block
            .str("name", &vpc.name)
            .str("cidr_block", &vpc.cidr),
    }
}

pub fn subnet_blocks(ctx: &RenderContext<'_>) -> Vec<Block> {
    ctx.subnets
        .iter()
        .map(|subnet| subnet_block(ctx, subnet))
        .collect()
}

fn subnet_block(ctx: &RenderContext<'_>, subnet_ref: &SubnetRef<'_>) -> Block {
    let subnet = subnet_ref.subnet;
    let parent = &ctx.networks[subnet_ref.network];
    let vpc_id = ctx.network_attr(parent, "id");
    let block = Block::resource(&subnet_type(&ctx.provider), &subnet_ref.label);

    match ctx.provider {
        CloudProvider::Aws => block
            .raw("vpc_id", vpc_id)
            .str("cidr_block", &subnet.cidr)
            .str("availability_zone", &subnet_ref.zone)
            .bool("map_public_ip_on_launch", subnet.map_public_ip_on_launch)
            .name_tag(&subnet.name),
        CloudProvider::Azure => block
            .str("name", &subnet.name)
            .raw("resource_group_name", azure_group("name"))
            .raw("virtual_network_name", ctx.network_attr(parent, "name"))
            .str_list("address_prefixes", [subnet.cidr.as_str()]),
        CloudProvider::Alicloud => block
            .raw("vpc_id", vpc_id)
            .str("cidr_block", &subnet.cidr)
            .str("zone_id", &subnet_ref.zone)
            .str("vswitch_name", &subnet.name),
        CloudProvider::Baidu => block
            .str("name", &subnet.name)
            .str("zone_name", &subnet_ref.zone)
            .str("cidr", &subnet.cidr)
            .raw("vpc_id", vpc_id)
            .str("description", MANAGED_DESCRIPTION),
        CloudProvider::Huawei => block
            .str("name", &subnet.name)
            .str("cidr", &subnet.cidr)
            .str("gateway_ip", gateway_ip(&subnet.cidr))
            .raw("vpc_id", vpc_id),
        CloudProvider::Tencent => block
            .str("name", &subnet.name)
            .raw("vpc_id", vpc_id)
            .str("cidr_block", &subnet.cidr)
            .str("availability_zone", &subnet_ref.zone),
        CloudProvider::Volcengine => block
            .str("subnet_name", &subnet.name)
            .str("cidr_block", &subnet.cidr)
            .str("zone_id", &subnet_ref.zone)
            .raw("vpc_id", vpc_id),
        CloudProvider::Other(_) => block
            .raw("vpc_id", vpc_id)
            .str("cidr_block", &subnet.cidr)
            .str("zone_id", &subnet_ref.zone),
    }
}

/// First host address of a subnet, used as its gateway
pub fn gateway_ip(cidr: &str) -> String {
    match cidr.trim().parse::<Ipv4Net>() {
        Ok(net) => {
            let first = u32::from(net.network()).saturating_add(1);
            Ipv4Addr::from(first).to_string()
        }
        Err(_) => {
            // Keep the first three octets of whatever was supplied
            let address = cidr.split('/').next().unwrap_or_default();
            let octets: Vec<&str> = address.split('.').take(3).collect();
            format!("{}.1", octets.join("."))
        }
    }
}

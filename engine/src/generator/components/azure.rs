//! Azure component renderers

use super::FragmentRenderer;
use crate::generator::hcl::{escape, Block, Value};
use crate::generator::network::azure_group;
use crate::generator::options::{
    BucketAcl, ComputeOptions, DatabaseOptions, LoadBalancerOptions, ObjectStorageOptions,
};
use crate::generator::{ComponentContext, RenderContext};

fn in_group(block: Block) -> Block {
    block
        .raw("location", azure_group("location"))
        .raw("resource_group_name", azure_group("name"))
}

/// Storage account names are 3-24 lowercase alphanumerics
fn storage_account_name(name: &str) -> String {
    let mut cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .take(24)
        .collect();
    while cleaned.len() < 3 {
        cleaned.push('0');
    }
    cleaned
}

fn inbound_rule(name: &str, priority: i64, port: u32) -> Block {
    Block::new("security_rule")
        .str("name", name)
        .num("priority", priority)
        .str("direction", "Inbound")
        .str("access", "Allow")
        .str("protocol", "Tcp")
        .str("source_port_range", "*")
        .str("destination_port_range", port.to_string())
        .str("source_address_prefix", "*")
        .str("destination_address_prefix", "*")
}

/// Public Standard load balancer with one rule
pub struct LoadBalancer;

impl FragmentRenderer for LoadBalancer {
    fn render(&self, ctx: &RenderContext<'_>, component: &ComponentContext<'_>) -> Vec<Block> {
        let options = LoadBalancerOptions::resolve(ctx, component);
        let label = &component.label;
        let frontend = "PublicIPAddress";

        vec![
            in_group(
                Block::resource("azurerm_public_ip", label).str("name", format!("{}-ip", options.name)),
            )
            .str("allocation_method", "Static")
            .str("sku", "Standard"),
            in_group(Block::resource("azurerm_lb", label).str("name", &options.name))
                .str("sku", "Standard")
                .block(
                    Block::new("frontend_ip_configuration")
                        .str("name", frontend)
                        .raw("public_ip_address_id", format!("azurerm_public_ip.{}.id", label)),
                ),
            Block::resource("azurerm_lb_backend_address_pool", label)
                .raw("loadbalancer_id", format!("azurerm_lb.{}.id", label))
                .str("name", "BackEndAddressPool"),
            Block::resource("azurerm_lb_rule", label)
                .raw("loadbalancer_id", format!("azurerm_lb.{}.id", label))
                .str("name", "LBRule")
                .str("protocol", "Tcp")
                .num("frontend_port", i64::from(options.listener_port))
                .num("backend_port", i64::from(options.target_port))
                .str("frontend_ip_configuration_name", frontend)
                .raw_list(
                    "backend_address_pool_ids",
                    [format!("azurerm_lb_backend_address_pool.{}.id", label)],
                ),
        ]
    }
}

/// Storage account with one container
pub struct ObjectStorage;

impl FragmentRenderer for ObjectStorage {
    fn render(&self, ctx: &RenderContext<'_>, component: &ComponentContext<'_>) -> Vec<Block> {
        let options = ObjectStorageOptions::resolve(ctx, component);
        let label = &component.label;
        let access = match options.acl {
            BucketAcl::PublicRead => "blob",
            BucketAcl::PublicReadWrite => "container",
            BucketAcl::Private | BucketAcl::Custom(_) => "private",
        };

        let mut blocks = vec![
            in_group(
                Block::resource("azurerm_storage_account", label)
                    .str("name", storage_account_name(&options.bucket_name)),
            )
            .str("account_tier", "Standard")
            .str("account_replication_type", "LRS")
            .bool("allow_nested_items_to_be_public", options.acl.is_public()),
            Block::resource("azurerm_storage_container", label)
                .str("name", "content")
                .raw("storage_account_name", format!("azurerm_storage_account.{}.name", label))
                .str("container_access_type", access),
        ];

        if let Some(rule) = &options.lifecycle {
            let mut base_blob = Block::new("base_blob")
                .num("delete_after_days_since_modification_greater_than", i64::from(rule.expiration_days));
            if let Some(days) = rule.transition_days {
                base_blob = base_blob
                    .num("tier_to_cool_after_days_since_modification_greater_than", i64::from(days));
            }

            blocks.push(
                Block::resource("azurerm_storage_management_policy", label)
                    .raw("storage_account_id", format!("azurerm_storage_account.{}.id", label))
                    .block(
                        Block::new("rule")
                            .str("name", &rule.name)
                            .bool("enabled", rule.enabled)
                            .block(Block::new("filters").str_list("blob_types", ["blockBlob"]))
                            .block(Block::new("actions").block(base_blob)),
                    ),
            );
        }

        blocks
    }
}

/// MySQL server with one database
pub struct Database;

impl FragmentRenderer for Database {
    fn render(&self, ctx: &RenderContext<'_>, component: &ComponentContext<'_>) -> Vec<Block> {
        let options = DatabaseOptions::resolve(ctx, component);
        let label = &component.label;
        let sku = options.instance_class.clone().unwrap_or_else(|| {
            format!("B_Gen5_{}", options.instance_type.as_deref().unwrap_or("1"))
        });

        vec![
            in_group(
                Block::resource("azurerm_mysql_server", label)
                    .str("name", options.identifier.to_ascii_lowercase()),
            )
            .str(
                "administrator_login",
                options.username.as_deref().unwrap_or("mysqladmin"),
            )
            .str("administrator_login_password", &options.password)
            .str("sku_name", sku)
            .num("storage_mb", i64::from(options.allocated_storage) * 1024)
            .str("version", &options.engine_version)
            .bool("auto_grow_enabled", true)
            .num("backup_retention_days", 7)
            .bool("geo_redundant_backup_enabled", false)
            .bool("public_network_access_enabled", false)
            .bool("ssl_enforcement_enabled", true)
            .str("ssl_minimal_tls_version_enforced", "TLS1_2"),
            Block::resource("azurerm_mysql_database", label)
                .str("name", &options.db_name)
                .raw("resource_group_name", azure_group("name"))
                .raw("server_name", format!("azurerm_mysql_server.{}.name", label))
                .str("charset", "utf8")
                .str("collation", "utf8_unicode_ci"),
        ]
    }
}

/// Linux virtual machines behind a subnet security group
pub struct Compute;

impl FragmentRenderer for Compute {
    fn render(&self, ctx: &RenderContext<'_>, component: &ComponentContext<'_>) -> Vec<Block> {
        let options = ComputeOptions::resolve(ctx, component);
        let label = &component.label;
        let Some(subnet) = ctx.primary_subnet() else {
            return Vec::new();
        };
        let subnet_id = ctx.subnet_attr(subnet, "id");
        let count = i64::from(options.count);
        let indexed =
            |prefix: &str| Value::Raw(format!("\"{}-${{count.index + 1}}\"", escape(prefix)));
        let size = if options.instance_type.starts_with("Standard_") {
            options.instance_type.clone()
        } else {
            "Standard_B2s".to_string()
        };

        vec![
            in_group(
                Block::resource("azurerm_network_security_group", label)
                    .str("name", format!("{}-nsg", component.selection.name)),
            )
            .block(inbound_rule("HTTP", 100, 80))
            .block(inbound_rule("SSH", 101, 22)),
            Block::resource("azurerm_subnet_network_security_group_association", label)
                .raw("subnet_id", &subnet_id)
                .raw(
                    "network_security_group_id",
                    format!("azurerm_network_security_group.{}.id", label),
                ),
            in_group(
                Block::resource("azurerm_network_interface", label)
                    .num("count", count)
                    .attr("name", indexed(&format!("{}-nic", component.selection.name))),
            )
            .block(
                Block::new("ip_configuration")
                    .str("name", "internal")
                    .raw("subnet_id", &subnet_id)
                    .str("private_ip_address_allocation", "Dynamic"),
            ),
            in_group(
                Block::resource("azurerm_linux_virtual_machine", label)
                    .num("count", count)
                    .attr("name", indexed(&component.selection.name)),
            )
            .str("size", size)
            .str("admin_username", "azureuser")
            .raw_list(
                "network_interface_ids",
                [format!("azurerm_network_interface.{}[count.index].id", label)],
            )
            .block(
                Block::new("admin_ssh_key")
                    .str("username", "azureuser")
                    .raw("public_key", "file(\"~/.ssh/id_rsa.pub\")"),
            )
            .block(
                Block::new("os_disk")
                    .str("caching", "ReadWrite")
                    .str("storage_account_type", "Standard_LRS"),
            )
            .block(
                Block::new("source_image_reference")
                    .str("publisher", "Canonical")
                    .str("offer", "0001-com-ubuntu-server-jammy")
                    .str("sku", "22_04-lts")
                    .str("version", "latest"),
            ),
        ]
    }
}

//! Availability-zone normalization

use crate::models::config::CloudProvider;

/// (region, zone label, zone id) for AWS regions whose zone labels are
/// offered as free text
const AWS_ZONES: &[(&str, &str, &str)] = &[
    ("us-east-1", "可用区A", "us-east-1a"),
    ("us-east-1", "可用区B", "us-east-1b"),
    ("us-east-1", "可用区C", "us-east-1c"),
    ("us-east-2", "可用区A", "us-east-2a"),
    ("us-east-2", "可用区B", "us-east-2b"),
    ("us-east-2", "可用区C", "us-east-2c"),
    ("us-west-1", "可用区A", "us-west-1a"),
    ("us-west-1", "可用区B", "us-west-1c"),
    ("us-west-2", "可用区A", "us-west-2a"),
    ("us-west-2", "可用区B", "us-west-2b"),
    ("us-west-2", "可用区C", "us-west-2c"),
    ("ap-east-1", "可用区A", "ap-east-1a"),
    ("ap-east-1", "可用区B", "ap-east-1b"),
    ("ap-east-1", "可用区C", "ap-east-1c"),
    ("ap-northeast-1", "可用区A", "ap-northeast-1a"),
    ("ap-northeast-1", "可用区B", "ap-northeast-1c"),
    ("ap-northeast-1", "可用区C", "ap-northeast-1d"),
];

/// Outcome of resolving one zone value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedZone {
    pub zone: String,

    /// Set when the value could not be resolved and a fallback was used
    pub warning: Option<String>,
}

impl ResolvedZone {
    fn exact(zone: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            warning: None,
        }
    }
}

/// Resolve a subnet zone for `provider` in `region`
pub fn resolve_zone(provider: &CloudProvider, region: &str, zone: &str) -> ResolvedZone {
    let zone = zone.trim();
    match provider {
        CloudProvider::Aws => resolve_aws_zone(region, zone),
        _ if zone.is_empty() => ResolvedZone::exact(format!("{}-a", region)),
        _ => ResolvedZone::exact(zone),
    }
}

fn resolve_aws_zone(region: &str, zone: &str) -> ResolvedZone {
    if !zone.is_empty() && zone.starts_with(region) {
        return ResolvedZone::exact(zone);
    }

    let label = english_label(zone);
    let found = AWS_ZONES
        .iter()
        .find(|(r, l, _)| *r == region && *l == label.as_deref().unwrap_or(zone))
        .map(|(_, _, id)| *id);

    match found {
        Some(id) => ResolvedZone::exact(id),
        None => {
            let fallback = format!("{}a", region);
            ResolvedZone {
                warning: Some(format!(
                    "Unknown availability zone '{}' for region {}, using {}",
                    zone, region, fallback
                )),
                zone: fallback,
            }
        }
    }
}

/// Map English labels ("Zone A", "zone-b") onto the table's labels
fn english_label(zone: &str) -> Option<String> {
    let lower = zone.to_ascii_lowercase();
    let letter = lower
        .strip_prefix("zone")?
        .trim_start_matches([' ', '-', '_'])
        .to_ascii_uppercase();
    match letter.as_str() {
        "A" | "B" | "C" => Some(format!("可用区{}", letter)),
        _ => None,
    }
}

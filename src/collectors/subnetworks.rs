//! VPC subnetwork collector
//!
//! Subnetworks are regional, so each region is one plain listing call. Rows
//! keep the API listing order, which returns a network's subnets adjacent to
//! each other.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::{str_field, timestamp_field};
use crate::gcp::client::GcpClient;
use crate::inventory::cache::{EntityKind, NameCache};
use crate::inventory::clients::build_region_clients;
use crate::inventory::fetcher;
use crate::inventory::model::{Collector, Column, Resource, ResourceInput};
use crate::inventory::normalize::FieldValue;

const COLUMNS: &[Column] = &[
    Column { header: "Category", extract: |r: &Resource| r.category().to_string() },
    Column { header: "SubCategory", extract: |r: &Resource| r.sub_category().to_string() },
    Column { header: "Name", extract: |r: &Resource| r.name().to_string() },
    Column { header: "Region", extract: |r: &Resource| r.region().to_string() },
    Column { header: "SelfLink", extract: |r: &Resource| r.self_link().to_string() },
    Column { header: "Network", extract: |r: &Resource| r.field("network").to_string() },
    Column { header: "IpCidrRange", extract: |r: &Resource| r.field("ipCidrRange").to_string() },
    Column { header: "GatewayAddress", extract: |r: &Resource| r.field("gatewayAddress").to_string() },
    Column { header: "Purpose", extract: |r: &Resource| r.field("purpose").to_string() },
    Column { header: "StackType", extract: |r: &Resource| r.field("stackType").to_string() },
    Column { header: "PrivateGoogleAccess", extract: |r: &Resource| r.field("privateIpGoogleAccess").to_string() },
    Column { header: "SecondaryRanges", extract: |r: &Resource| r.field("secondaryRanges").to_string() },
    Column { header: "Created", extract: |r: &Resource| r.field("creationTimestamp").to_string() },
];

pub struct SubnetworkCollector {
    clients: HashMap<String, GcpClient>,
    cache: Arc<NameCache>,
}

/// Constructor registered under "subnetworks"
pub fn new_collector(
    client: &GcpClient,
    regions: &[String],
    cache: &Arc<NameCache>,
) -> Result<Arc<dyn Collector>> {
    let clients = build_region_clients(client, regions, |base, region| Ok(base.with_region(region)))?;
    Ok(Arc::new(SubnetworkCollector {
        clients,
        cache: Arc::clone(cache),
    }))
}

#[async_trait]
impl Collector for SubnetworkCollector {
    fn name(&self) -> &'static str {
        "subnetworks"
    }

    fn should_sort(&self) -> bool {
        // Listing order keeps a network's subnets adjacent
        false
    }

    fn columns(&self) -> &'static [Column] {
        COLUMNS
    }

    async fn collect(&self, region: &str) -> Result<Vec<Resource>> {
        let client = self
            .clients
            .get(region)
            .with_context(|| format!("no client configured for region {}", region))?;

        let url = client.compute_regional_url("subnetworks");
        let items = fetcher::fetch_all(client, &url, "items").await?;

        Ok(items
            .iter()
            .map(|item| Resource::from_input(self.input_from_item(region, item)))
            .collect())
    }
}

impl SubnetworkCollector {
    fn input_from_item(&self, region: &str, item: &Value) -> ResourceInput {
        let network = item
            .get("network")
            .and_then(|v| v.as_str())
            .map(|id| self.cache.resolve(EntityKind::Network, region, id));

        let secondary_ranges: Vec<String> = item
            .get("secondaryIpRanges")
            .and_then(|v| v.as_array())
            .map(|ranges| {
                ranges
                    .iter()
                    .filter_map(|range| {
                        let name = range.get("rangeName")?.as_str()?;
                        let cidr = range.get("ipCidrRange")?.as_str()?;
                        Some(format!("{}={}", name, cidr))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let private_access = item
            .get("privateIpGoogleAccess")
            .and_then(|v| v.as_bool())
            .map(FieldValue::Bool)
            .unwrap_or(FieldValue::Missing);

        ResourceInput {
            category: "Network".to_string(),
            sub_category: "Subnetworks".to_string(),
            name: item.get("name").and_then(|v| v.as_str()).map(str::to_string),
            region: region.to_string(),
            self_link: item
                .get("selfLink")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            raw: vec![
                (
                    "network".to_string(),
                    network.map(FieldValue::Str).unwrap_or(FieldValue::Missing),
                ),
                ("ipCidrRange".to_string(), str_field(item, "ipCidrRange")),
                (
                    "gatewayAddress".to_string(),
                    str_field(item, "gatewayAddress"),
                ),
                ("purpose".to_string(), str_field(item, "purpose")),
                ("stackType".to_string(), str_field(item, "stackType")),
                ("privateIpGoogleAccess".to_string(), private_access),
                (
                    "secondaryRanges".to_string(),
                    FieldValue::StrList(secondary_ranges),
                ),
                (
                    "creationTimestamp".to_string(),
                    timestamp_field(item, "creationTimestamp"),
                ),
            ],
        }
    }
}

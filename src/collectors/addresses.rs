//! Reserved IP address collector
//!
//! Addresses are regional; external and internal reservations come back from
//! the same listing.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::{short_name, str_field, timestamp_field};
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
    Column { header: "Address", extract: |r: &Resource| r.field("address").to_string() },
    Column { header: "AddressType", extract: |r: &Resource| r.field("addressType").to_string() },
    Column { header: "Status", extract: |r: &Resource| r.field("status").to_string() },
    Column { header: "Purpose", extract: |r: &Resource| r.field("purpose").to_string() },
    Column { header: "Subnetwork", extract: |r: &Resource| r.field("subnetwork").to_string() },
    Column { header: "UsedBy", extract: |r: &Resource| r.field("users").to_string() },
    Column { header: "Created", extract: |r: &Resource| r.field("creationTimestamp").to_string() },
];

pub struct AddressCollector {
    clients: HashMap<String, GcpClient>,
    cache: Arc<NameCache>,
}

/// Constructor registered under "addresses"
pub fn new_collector(
    client: &GcpClient,
    regions: &[String],
    cache: &Arc<NameCache>,
) -> Result<Arc<dyn Collector>> {
    let clients = build_region_clients(client, regions, |base, region| Ok(base.with_region(region)))?;
    Ok(Arc::new(AddressCollector {
        clients,
        cache: Arc::clone(cache),
    }))
}

#[async_trait]
impl Collector for AddressCollector {
    fn name(&self) -> &'static str {
        "addresses"
    }

    fn columns(&self) -> &'static [Column] {
        COLUMNS
    }

    async fn collect(&self, region: &str) -> Result<Vec<Resource>> {
        let client = self
            .clients
            .get(region)
            .with_context(|| format!("no client configured for region {}", region))?;

        let url = client.compute_regional_url("addresses");
        let items = fetcher::fetch_all(client, &url, "items").await?;

        Ok(items
            .iter()
            .map(|item| Resource::from_input(self.input_from_item(region, item)))
            .collect())
    }
}

impl AddressCollector {
    fn input_from_item(&self, region: &str, item: &Value) -> ResourceInput {
        let subnetwork = item
            .get("subnetwork")
            .and_then(|v| v.as_str())
            .map(|id| self.cache.resolve(EntityKind::Subnetwork, region, id));

        let users: Vec<String> = item
            .get("users")
            .and_then(|v| v.as_array())
            .map(|urls| {
                urls.iter()
                    .filter_map(|u| u.as_str())
                    .map(|u| short_name(u).to_string())
                    .collect()
            })
            .unwrap_or_default();

        ResourceInput {
            category: "Network".to_string(),
            sub_category: "Addresses".to_string(),
            name: item.get("name").and_then(|v| v.as_str()).map(str::to_string),
            region: region.to_string(),
            self_link: item
                .get("selfLink")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            raw: vec![
                ("address".to_string(), str_field(item, "address")),
                ("addressType".to_string(), str_field(item, "addressType")),
                ("status".to_string(), str_field(item, "status")),
                ("purpose".to_string(), str_field(item, "purpose")),
                (
                    "subnetwork".to_string(),
                    subnetwork.map(FieldValue::Str).unwrap_or(FieldValue::Missing),
                ),
                ("users".to_string(), FieldValue::StrList(users)),
                (
                    "creationTimestamp".to_string(),
                    timestamp_field(item, "creationTimestamp"),
                ),
            ],
        }
    }
}

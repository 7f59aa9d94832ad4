//! Compute Engine instance collector
//!
//! Instances are zonal, so enumeration goes through the aggregated listing
//! and keeps the zones belonging to the queried region.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::{gather_strs, json_field, short_field, str_field, timestamp_field};
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
    Column { header: "Status", extract: |r: &Resource| r.field("status").to_string() },
    Column { header: "MachineType", extract: |r: &Resource| r.field("machineType").to_string() },
    Column { header: "Zone", extract: |r: &Resource| r.field("zone").to_string() },
    Column { header: "Created", extract: |r: &Resource| r.field("creationTimestamp").to_string() },
    Column { header: "InternalIp", extract: |r: &Resource| r.field("internalIp").to_string() },
    Column { header: "ExternalIp", extract: |r: &Resource| r.field("externalIp").to_string() },
    Column { header: "Networks", extract: |r: &Resource| r.field("networks").to_string() },
    Column { header: "Subnetworks", extract: |r: &Resource| r.field("subnetworks").to_string() },
    Column { header: "NetworkTags", extract: |r: &Resource| r.field("networkTags").to_string() },
    Column { header: "Labels", extract: |r: &Resource| r.field("labels").to_string() },
];

pub struct InstanceCollector {
    clients: HashMap<String, GcpClient>,
    cache: Arc<NameCache>,
}

/// Constructor registered under "instances"
pub fn new_collector(
    client: &GcpClient,
    regions: &[String],
    cache: &Arc<NameCache>,
) -> Result<Arc<dyn Collector>> {
    let clients = build_region_clients(client, regions, |base, region| Ok(base.with_region(region)))?;
    Ok(Arc::new(InstanceCollector {
        clients,
        cache: Arc::clone(cache),
    }))
}

#[async_trait]
impl Collector for InstanceCollector {
    fn name(&self) -> &'static str {
        "instances"
    }

    fn columns(&self) -> &'static [Column] {
        COLUMNS
    }

    async fn collect(&self, region: &str) -> Result<Vec<Resource>> {
        let client = self
            .clients
            .get(region)
            .with_context(|| format!("no client configured for region {}", region))?;

        let url = client.compute_aggregated_url("instances");
        let items = fetcher::fetch_aggregated(client, &url, region).await?;

        Ok(items
            .iter()
            .map(|item| Resource::from_input(self.input_from_item(region, item)))
            .collect())
    }
}

impl InstanceCollector {
    fn input_from_item(&self, region: &str, item: &Value) -> ResourceInput {
        let nics = item
            .get("networkInterfaces")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let networks = gather_strs(&nics, "network");
        let subnetworks = gather_strs(&nics, "subnetwork");
        let internal_ip = nics
            .first()
            .and_then(|nic| nic.get("networkIP"))
            .and_then(|v| v.as_str());
        let external_ip = nics
            .first()
            .and_then(|nic| nic.get("accessConfigs"))
            .and_then(|v| v.as_array())
            .and_then(|configs| configs.first())
            .and_then(|config| config.get("natIP"))
            .and_then(|v| v.as_str());

        ResourceInput {
            category: "Compute".to_string(),
            sub_category: "Instances".to_string(),
            name: item.get("name").and_then(|v| v.as_str()).map(str::to_string),
            region: region.to_string(),
            self_link: item
                .get("selfLink")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            raw: vec![
                ("status".to_string(), str_field(item, "status")),
                ("machineType".to_string(), short_field(item, "machineType")),
                ("zone".to_string(), short_field(item, "zone")),
                (
                    "creationTimestamp".to_string(),
                    timestamp_field(item, "creationTimestamp"),
                ),
                ("internalIp".to_string(), FieldValue::opt_str(internal_ip)),
                ("externalIp".to_string(), FieldValue::opt_str(external_ip)),
                (
                    "networks".to_string(),
                    FieldValue::StrList(self.cache.resolve_all(
                        EntityKind::Network,
                        region,
                        &networks,
                    )),
                ),
                (
                    "subnetworks".to_string(),
                    FieldValue::StrList(self.cache.resolve_all(
                        EntityKind::Subnetwork,
                        region,
                        &subnetworks,
                    )),
                ),
                (
                    "networkTags".to_string(),
                    item.get("tags")
                        .and_then(|tags| tags.get("items"))
                        .map(FieldValue::from_json)
                        .unwrap_or(FieldValue::Missing),
                ),
                ("labels".to_string(), json_field(item, "labels")),
            ],
        }
    }
}

//! Compute Engine disk collector
//!
//! Disks are zonal; enumeration goes through the aggregated listing the same
//! way instances do. Encryption keys are rendered as names through the
//! shared cache instead of their full KMS resource paths.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::{json_field, short_field, short_name, str_field, timestamp_field};
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
    Column { header: "SizeGb", extract: |r: &Resource| r.field("sizeGb").to_string() },
    Column { header: "Type", extract: |r: &Resource| r.field("type").to_string() },
    Column { header: "Zone", extract: |r: &Resource| r.field("zone").to_string() },
    Column { header: "Created", extract: |r: &Resource| r.field("creationTimestamp").to_string() },
    Column { header: "SourceImage", extract: |r: &Resource| r.field("sourceImage").to_string() },
    Column { header: "AttachedTo", extract: |r: &Resource| r.field("users").to_string() },
    Column { header: "KmsKey", extract: |r: &Resource| r.field("kmsKey").to_string() },
    Column { header: "Labels", extract: |r: &Resource| r.field("labels").to_string() },
];

pub struct DiskCollector {
    clients: HashMap<String, GcpClient>,
    cache: Arc<NameCache>,
}

/// Constructor registered under "disks"
pub fn new_collector(
    client: &GcpClient,
    regions: &[String],
    cache: &Arc<NameCache>,
) -> Result<Arc<dyn Collector>> {
    let clients = build_region_clients(client, regions, |base, region| Ok(base.with_region(region)))?;
    Ok(Arc::new(DiskCollector {
        clients,
        cache: Arc::clone(cache),
    }))
}

#[async_trait]
impl Collector for DiskCollector {
    fn name(&self) -> &'static str {
        "disks"
    }

    fn columns(&self) -> &'static [Column] {
        COLUMNS
    }

    async fn collect(&self, region: &str) -> Result<Vec<Resource>> {
        let client = self
            .clients
            .get(region)
            .with_context(|| format!("no client configured for region {}", region))?;

        let url = client.compute_aggregated_url("disks");
        let items = fetcher::fetch_aggregated(client, &url, region).await?;

        Ok(items
            .iter()
            .map(|item| Resource::from_input(self.input_from_item(region, item)))
            .collect())
    }
}

impl DiskCollector {
    fn input_from_item(&self, region: &str, item: &Value) -> ResourceInput {
        // The API returns sizeGb as a decimal string
        let size_gb = match item
            .get("sizeGb")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<i64>().ok())
        {
            Some(size) => FieldValue::Int(size),
            None => str_field(item, "sizeGb"),
        };

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

        let kms_key = item
            .pointer("/diskEncryptionKey/kmsKeyName")
            .and_then(|v| v.as_str())
            .map(|key| self.cache.resolve(EntityKind::CryptoKey, region, key));

        ResourceInput {
            category: "Compute".to_string(),
            sub_category: "Disks".to_string(),
            name: item.get("name").and_then(|v| v.as_str()).map(str::to_string),
            region: region.to_string(),
            self_link: item
                .get("selfLink")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            raw: vec![
                ("status".to_string(), str_field(item, "status")),
                ("sizeGb".to_string(), size_gb),
                ("type".to_string(), short_field(item, "type")),
                ("zone".to_string(), short_field(item, "zone")),
                (
                    "creationTimestamp".to_string(),
                    timestamp_field(item, "creationTimestamp"),
                ),
                ("sourceImage".to_string(), short_field(item, "sourceImage")),
                ("users".to_string(), FieldValue::StrList(users)),
                (
                    "kmsKey".to_string(),
                    kms_key.map(FieldValue::Str).unwrap_or(FieldValue::Missing),
                ),
                ("labels".to_string(), json_field(item, "labels")),
            ],
        }
    }
}

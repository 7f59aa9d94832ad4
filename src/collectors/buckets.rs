//! Cloud Storage bucket collector
//!
//! Bucket listings are project-wide, not regional: each `collect` call lists
//! every bucket and keeps the ones whose location matches the queried
//! region. Multi-region buckets ("US", "EU") only appear when their location
//! matches a requested region literally.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::{json_field, str_field, timestamp_field};
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
    Column { header: "Location", extract: |r: &Resource| r.field("location").to_string() },
    Column { header: "StorageClass", extract: |r: &Resource| r.field("storageClass").to_string() },
    Column { header: "Versioning", extract: |r: &Resource| r.field("versioning").to_string() },
    Column { header: "UniformAccess", extract: |r: &Resource| r.field("uniformBucketLevelAccess").to_string() },
    Column { header: "DefaultKmsKey", extract: |r: &Resource| r.field("defaultKmsKey").to_string() },
    Column { header: "Created", extract: |r: &Resource| r.field("timeCreated").to_string() },
    Column { header: "Labels", extract: |r: &Resource| r.field("labels").to_string() },
];

pub struct BucketCollector {
    clients: HashMap<String, GcpClient>,
    cache: Arc<NameCache>,
}

/// Constructor registered under "buckets"
pub fn new_collector(
    client: &GcpClient,
    regions: &[String],
    cache: &Arc<NameCache>,
) -> Result<Arc<dyn Collector>> {
    let clients = build_region_clients(client, regions, |base, region| Ok(base.with_region(region)))?;
    Ok(Arc::new(BucketCollector {
        clients,
        cache: Arc::clone(cache),
    }))
}

#[async_trait]
impl Collector for BucketCollector {
    fn name(&self) -> &'static str {
        "buckets"
    }

    fn columns(&self) -> &'static [Column] {
        COLUMNS
    }

    async fn collect(&self, region: &str) -> Result<Vec<Resource>> {
        let client = self
            .clients
            .get(region)
            .with_context(|| format!("no client configured for region {}", region))?;

        let url = client.storage_buckets_url();
        let items = fetcher::fetch_all(client, &url, "items").await?;

        Ok(items
            .iter()
            .filter(|item| Self::in_region(item, region))
            .map(|item| Resource::from_input(self.input_from_item(region, item)))
            .collect())
    }
}

impl BucketCollector {
    fn in_region(item: &Value, region: &str) -> bool {
        item.get("location")
            .and_then(|v| v.as_str())
            .map(|location| location.eq_ignore_ascii_case(region))
            .unwrap_or(false)
    }

    fn input_from_item(&self, region: &str, item: &Value) -> ResourceInput {
        let versioning = item
            .pointer("/versioning/enabled")
            .and_then(|v| v.as_bool())
            .map(FieldValue::Bool)
            .unwrap_or(FieldValue::Missing);

        let uniform_access = item
            .pointer("/iamConfiguration/uniformBucketLevelAccess/enabled")
            .and_then(|v| v.as_bool())
            .map(FieldValue::Bool)
            .unwrap_or(FieldValue::Missing);

        let default_kms_key = item
            .pointer("/encryption/defaultKmsKeyName")
            .and_then(|v| v.as_str())
            .map(|key| self.cache.resolve(EntityKind::CryptoKey, region, key));

        ResourceInput {
            category: "Storage".to_string(),
            sub_category: "Buckets".to_string(),
            name: item.get("name").and_then(|v| v.as_str()).map(str::to_string),
            region: region.to_string(),
            self_link: item
                .get("selfLink")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            raw: vec![
                ("location".to_string(), str_field(item, "location")),
                ("storageClass".to_string(), str_field(item, "storageClass")),
                ("versioning".to_string(), versioning),
                ("uniformBucketLevelAccess".to_string(), uniform_access),
                (
                    "defaultKmsKey".to_string(),
                    default_kms_key
                        .map(FieldValue::Str)
                        .unwrap_or(FieldValue::Missing),
                ),
                (
                    "timeCreated".to_string(),
                    timestamp_field(item, "timeCreated"),
                ),
                ("labels".to_string(), json_field(item, "labels")),
            ],
        }
    }
}

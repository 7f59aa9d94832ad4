//! Name resolution cache
//!
//! Cross-referenced entities (networks, subnetworks, KMS keys) show up in
//! API responses as opaque self-links. Resolving each one with its own
//! describe call would cost one round trip per resource; instead the cache
//! bulk-lists every auxiliary entity type once per region at startup and
//! serves lookups from memory for the rest of the run.
//!
//! The cache is built before any collector is constructed, shared via `Arc`,
//! and never mutated afterward.

use super::clients::build_region_clients;
use super::fetcher;
use crate::gcp::client::GcpClient;
use anyhow::{Context, Result};
use std::collections::HashMap;

/// The auxiliary entity types the cache resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Network,
    Subnetwork,
    CryptoKey,
}

impl EntityKind {
    fn label(&self) -> &'static str {
        match self {
            EntityKind::Network => "network",
            EntityKind::Subnetwork => "subnetwork",
            EntityKind::CryptoKey => "crypto key",
        }
    }
}

type IdTable = HashMap<String, String>;
type RegionTables = HashMap<String, IdTable>;

/// Build-once, read-many id -> name lookup tables, per entity kind and
/// region.
#[derive(Debug)]
pub struct NameCache {
    tables: HashMap<EntityKind, RegionTables>,
}

impl NameCache {
    /// Build the cache for the given regions.
    ///
    /// One bulk listing per (entity kind x region): subnetworks and crypto
    /// keys are regional listings; networks are a single global listing whose
    /// table serves every region key. Any listing failure aborts the build
    /// with an error naming the entity kind and region.
    pub async fn build(base: &GcpClient, regions: &[String]) -> Result<Self> {
        let clients = build_region_clients(base, regions, |b, r| Ok(b.with_region(r)))?;

        let mut tables: HashMap<EntityKind, RegionTables> = HashMap::new();
        if clients.is_empty() {
            return Ok(Self { tables });
        }

        // Networks are global; fetch the table once and key it per region.
        let network_table = fetch_network_table(base)
            .await
            .with_context(|| "building network name table".to_string())?;

        // Regional listings fan out across regions; per-region tables are
        // independent and merge without conflict. Dedup preserves the first
        // occurrence so assembly order is deterministic.
        let mut unique_regions: Vec<&String> = Vec::new();
        for region in regions {
            if !unique_regions.contains(&region) {
                unique_regions.push(region);
            }
        }

        let region_builds = unique_regions
            .iter()
            .map(|region| build_region_tables(&clients[region.as_str()], region.as_str()));
        let per_region = futures::future::try_join_all(region_builds).await?;

        for (region, (subnetworks, crypto_keys)) in unique_regions.iter().zip(per_region) {
            tables
                .entry(EntityKind::Network)
                .or_default()
                .insert(region.to_string(), network_table.clone());
            tables
                .entry(EntityKind::Subnetwork)
                .or_default()
                .insert(region.to_string(), subnetworks);
            tables
                .entry(EntityKind::CryptoKey)
                .or_default()
                .insert(region.to_string(), crypto_keys);
        }

        Ok(Self { tables })
    }

    /// Assemble a cache directly from prebuilt tables.
    pub fn from_tables(tables: HashMap<EntityKind, HashMap<String, HashMap<String, String>>>) -> Self {
        Self { tables }
    }

    /// An empty cache that resolves every id to itself.
    pub fn empty() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Resolve an id to its display name.
    ///
    /// Unknown ids come back unchanged; a miss is not an error.
    pub fn resolve(&self, kind: EntityKind, region: &str, id: &str) -> String {
        self.tables
            .get(&kind)
            .and_then(|regions| regions.get(region))
            .and_then(|table| table.get(id))
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    /// Resolve a batch of ids, preserving input order.
    pub fn resolve_all(&self, kind: EntityKind, region: &str, ids: &[String]) -> Vec<String> {
        ids.iter()
            .map(|id| self.resolve(kind, region, id))
            .collect()
    }
}

/// Fetch the global network table: selfLink -> name.
async fn fetch_network_table(base: &GcpClient) -> Result<IdTable> {
    let url = base.compute_global_url("networks");
    let items = fetcher::fetch_all(base, &url, "items").await?;
    Ok(table_from_items(&items, "selfLink", "name"))
}

/// Fetch one region's subnetwork and crypto key tables.
async fn build_region_tables(client: &GcpClient, region: &str) -> Result<(IdTable, IdTable)> {
    let subnetworks_url = client.compute_regional_url("subnetworks");
    let subnetworks = fetcher::fetch_all(client, &subnetworks_url, "items")
        .await
        .with_context(|| {
            format!(
                "building {} name table for region {}",
                EntityKind::Subnetwork.label(),
                region
            )
        })?;

    let keys_url = client.kms_regional_keys_url();
    let crypto_keys = fetcher::fetch_all(client, &keys_url, "cryptoKeys")
        .await
        .with_context(|| {
            format!(
                "building {} name table for region {}",
                EntityKind::CryptoKey.label(),
                region
            )
        })?;

    Ok((
        table_from_items(&subnetworks, "selfLink", "name"),
        crypto_key_table(&crypto_keys),
    ))
}

/// Build an id -> name table from listed items.
fn table_from_items(items: &[serde_json::Value], id_field: &str, name_field: &str) -> IdTable {
    items
        .iter()
        .filter_map(|item| {
            let id = item.get(id_field)?.as_str()?;
            let name = item.get(name_field)?.as_str()?;
            Some((id.to_string(), name.to_string()))
        })
        .collect()
}

/// KMS keys are identified by their full resource name; the display name is
/// the trailing `keyRing/cryptoKey` pair.
fn crypto_key_table(items: &[serde_json::Value]) -> IdTable {
    items
        .iter()
        .filter_map(|item| {
            let full_name = item.get("name")?.as_str()?;
            Some((full_name.to_string(), short_key_name(full_name)))
        })
        .collect()
}

fn short_key_name(full_name: &str) -> String {
    let mut segments = full_name.rsplit('/');
    let key = segments.next().unwrap_or(full_name);
    segments.next(); // "cryptoKeys" literal
    let key_ring = segments.next().unwrap_or("");

    if key_ring.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", key_ring, key)
    }
}

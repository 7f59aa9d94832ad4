//! Paginated resource fetching
//!
//! Shared listing helpers over the JSON REST responses: `nextPageToken`
//! pagination, dot-path item extraction, and flattening of aggregated
//! compute responses down to one region's entries.

use crate::gcp::client::GcpClient;
use anyhow::Result;
use serde_json::Value;

/// Fetch every page of a listing endpoint and concatenate the items found
/// under `items_path` (dot notation; empty means the response root).
pub async fn fetch_all(client: &GcpClient, url: &str, items_path: &str) -> Result<Vec<Value>> {
    let mut all_items = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page_url = match page_token.as_deref() {
            Some(token) => append_page_token(url, token),
            None => url.to_string(),
        };

        let response = client.get(&page_url).await?;
        all_items.extend(extract_items(&response, items_path));

        page_token = response
            .get("nextPageToken")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        if page_token.is_none() {
            break;
        }
    }

    Ok(all_items)
}

/// Fetch every page of an aggregated compute listing, keeping only the
/// entries scoped to `region` (its regional scope or any of its zones).
pub async fn fetch_aggregated(client: &GcpClient, url: &str, region: &str) -> Result<Vec<Value>> {
    let mut all_items = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page_url = match page_token.as_deref() {
            Some(token) => append_page_token(url, token),
            None => url.to_string(),
        };

        let response = client.get(&page_url).await?;
        all_items.extend(flatten_aggregated(&response, region));

        page_token = response
            .get("nextPageToken")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        if page_token.is_none() {
            break;
        }
    }

    Ok(all_items)
}

fn append_page_token(url: &str, token: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}pageToken={}", url, separator, urlencoding::encode(token))
}

/// Extract items from a response using a dot-notation path
fn extract_items(response: &Value, path: &str) -> Vec<Value> {
    if path.is_empty() {
        return response.as_array().cloned().unwrap_or_default();
    }

    let mut current = response;
    for part in path.split('.') {
        current = match current.get(part) {
            Some(v) => v,
            None => return vec![],
        };
    }

    current.as_array().cloned().unwrap_or_default()
}

/// Flatten an aggregated API response into the queried region's items.
///
/// Aggregated responses have the shape
/// `{ "items": { "zones/us-central1-a": { "instances": [...] }, ... } }`;
/// scope keys are either `zones/<region>-<letter>` or `regions/<region>`.
fn flatten_aggregated(response: &Value, region: &str) -> Vec<Value> {
    let Some(items) = response.get("items").and_then(|v| v.as_object()) else {
        return vec![];
    };

    let zone_prefix = format!("{}-", region);
    let mut region_items: Vec<Value> = Vec::new();

    for (scope_key, scope_data) in items {
        let in_region = match scope_key.split_once('/') {
            Some(("zones", zone)) => zone.starts_with(&zone_prefix),
            Some(("regions", scope_region)) => scope_region == region,
            _ => false,
        };
        if !in_region {
            continue;
        }

        // Each scope entry holds the resource list under its own key
        // ("instances", "disks", ...) next to warning metadata.
        if let Some(obj) = scope_data.as_object() {
            for (key, value) in obj {
                if key == "warning" {
                    continue;
                }
                if let Some(arr) = value.as_array() {
                    region_items.extend(arr.iter().cloned());
                }
            }
        }
    }

    region_items
}

//! Concrete resource collectors
//!
//! Each collector enumerates one resource category and maps API fields onto
//! the shared resource model. New collectors plug in with a single
//! [`ConstructorRegistry::register`] call in [`register_defaults`].

mod addresses;
mod buckets;
mod disks;
mod instances;
mod subnetworks;

use crate::inventory::normalize::FieldValue;
use crate::inventory::registry::ConstructorRegistry;
use serde_json::Value;

/// Register the stock collectors.
pub fn register_defaults(registry: &mut ConstructorRegistry) {
    registry.register("instances", instances::new_collector);
    registry.register("disks", disks::new_collector);
    registry.register("subnetworks", subnetworks::new_collector);
    registry.register("addresses", addresses::new_collector);
    registry.register("buckets", buckets::new_collector);
}

/// Extract the short name from a GCP resource URL
/// e.g., ".../projects/my-project/zones/us-central1-a" -> "us-central1-a"
pub(crate) fn short_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// A string field, `Missing` when absent
pub(crate) fn str_field(item: &Value, field: &str) -> FieldValue {
    FieldValue::opt_str(item.get(field).and_then(|v| v.as_str()))
}

/// A URL-valued field reduced to its short name, `Missing` when absent
pub(crate) fn short_field(item: &Value, field: &str) -> FieldValue {
    FieldValue::opt_str(
        item.get(field)
            .and_then(|v| v.as_str())
            .map(short_name),
    )
}

/// An RFC3339 timestamp field; unparseable values keep their raw text
pub(crate) fn timestamp_field(item: &Value, field: &str) -> FieldValue {
    match item.get(field).and_then(|v| v.as_str()) {
        Some(raw) => match chrono::DateTime::parse_from_rfc3339(raw) {
            Ok(t) => FieldValue::Time(t.with_timezone(&chrono::Utc)),
            Err(_) => FieldValue::Str(raw.to_string()),
        },
        None => FieldValue::Missing,
    }
}

/// A structured field passed through as-is, `Missing` when absent
pub(crate) fn json_field(item: &Value, field: &str) -> FieldValue {
    match item.get(field) {
        Some(value) => FieldValue::from_json(value),
        None => FieldValue::Missing,
    }
}

/// Collect string values of `field` across an array of objects
pub(crate) fn gather_strs(items: &[Value], field: &str) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.get(field).and_then(|v| v.as_str()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_short_name() {
        assert_eq!(
            short_name("https://compute.googleapis.com/compute/v1/projects/p/zones/us-central1-a"),
            "us-central1-a"
        );
        assert_eq!(short_name("plain"), "plain");
    }

    #[test]
    fn test_timestamp_field_parses_offsets_to_utc() {
        let item = json!({"creationTimestamp": "2023-08-15T03:30:00.000-07:00"});
        let value = timestamp_field(&item, "creationTimestamp");
        assert_eq!(
            crate::inventory::normalize::normalize_value(&value),
            "2023-08-15T10:30:00Z"
        );
    }

    #[test]
    fn test_timestamp_field_keeps_unparseable_text() {
        let item = json!({"creationTimestamp": "not-a-date"});
        assert_eq!(
            timestamp_field(&item, "creationTimestamp"),
            FieldValue::Str("not-a-date".to_string())
        );
    }

    #[test]
    fn test_gather_strs() {
        let items = vec![
            json!({"network": "net-a"}),
            json!({"other": true}),
            json!({"network": "net-b"}),
        ];
        assert_eq!(gather_strs(&items, "network"), vec!["net-a", "net-b"]);
    }
}

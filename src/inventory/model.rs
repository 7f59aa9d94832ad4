//! Resource model and collector contract
//!
//! A [`Resource`] is one immutable output row. Collectors never format field
//! values themselves: they assemble a [`ResourceInput`] out of typed values
//! and [`Resource::from_input`] is the single point where normalization
//! happens.

use super::normalize::{self, FieldValue};
use anyhow::Result;
use async_trait::async_trait;

/// The unnormalized form of a row, as collectors build it.
#[derive(Debug, Clone, Default)]
pub struct ResourceInput {
    pub category: String,
    pub sub_category: String,
    pub name: Option<String>,
    pub region: String,
    /// Primary identifier (self-link or full resource name)
    pub self_link: Option<String>,
    /// Typed field values, in display order
    pub raw: Vec<(String, FieldValue)>,
}

/// One normalized, immutable output row.
#[derive(Debug, Clone)]
pub struct Resource {
    category: String,
    sub_category: String,
    name: String,
    region: String,
    self_link: String,
    raw_data: Vec<(String, String)>,
}

impl Resource {
    /// Build a resource from its unnormalized input.
    ///
    /// Identity fields fall back to the empty string when absent; every raw
    /// field runs through the value normalizer.
    pub fn from_input(input: ResourceInput) -> Resource {
        Resource {
            category: input.category,
            sub_category: input.sub_category,
            name: input.name.unwrap_or_default(),
            region: input.region,
            self_link: input.self_link.unwrap_or_default(),
            raw_data: normalize::normalize_record(input.raw),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn sub_category(&self) -> &str {
        &self.sub_category
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn self_link(&self) -> &str {
        &self.self_link
    }

    /// Look up a normalized raw-data field; absent fields read as "".
    pub fn field(&self, name: &str) -> &str {
        self.raw_data
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    /// The normalized raw-data fields, in display order.
    pub fn raw_data(&self) -> &[(String, String)] {
        &self.raw_data
    }
}

/// A named string-extraction rule applied to a [`Resource`].
///
/// Extractors return `""` for absent data and never fail.
#[derive(Clone, Copy)]
pub struct Column {
    pub header: &'static str,
    pub extract: fn(&Resource) -> String,
}

/// The contract every collector implements.
///
/// `collect` must be safe to call concurrently with other `collect` calls:
/// collectors hold only read-only shared state after construction.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Stable machine identifier, also the output file stem
    fn name(&self) -> &'static str;

    /// Whether rows should be alphabetically ordered before output.
    ///
    /// `false` preserves the natural listing order, for collectors whose
    /// adjacent rows belong together.
    fn should_sort(&self) -> bool {
        true
    }

    /// The fixed column list for this collector's rows
    fn columns(&self) -> &'static [Column];

    /// Enumerate this collector's resources in one region
    async fn collect(&self, region: &str) -> Result<Vec<Resource>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_input_normalizes_identity_fields() {
        let resource = Resource::from_input(ResourceInput {
            category: "Compute".to_string(),
            sub_category: "Instances".to_string(),
            name: None,
            region: "us-central1".to_string(),
            self_link: None,
            raw: vec![("status".to_string(), FieldValue::Str("RUNNING".to_string()))],
        });

        assert_eq!(resource.name(), "");
        assert_eq!(resource.self_link(), "");
        assert_eq!(resource.field("status"), "RUNNING");
    }

    #[test]
    fn test_field_lookup_defaults_to_empty() {
        let resource = Resource::from_input(ResourceInput {
            category: "Storage".to_string(),
            sub_category: "Buckets".to_string(),
            name: Some("assets".to_string()),
            region: "us-east1".to_string(),
            self_link: Some("https://storage.googleapis.com/storage/v1/b/assets".to_string()),
            raw: vec![],
        });

        assert_eq!(resource.field("nonexistent"), "");
    }

    #[test]
    fn test_columns_extract_from_resource() {
        const COLUMNS: &[Column] = &[
            Column {
                header: "Name",
                extract: |r: &Resource| r.name().to_string(),
            },
            Column {
                header: "Status",
                extract: |r: &Resource| r.field("status").to_string(),
            },
        ];

        let resource = Resource::from_input(ResourceInput {
            category: "Compute".to_string(),
            sub_category: "Instances".to_string(),
            name: Some("web-1".to_string()),
            region: "us-central1".to_string(),
            self_link: Some("selfLink".to_string()),
            raw: vec![("status".to_string(), FieldValue::Str("RUNNING".to_string()))],
        });

        assert_eq!((COLUMNS[0].extract)(&resource), "web-1");
        assert_eq!((COLUMNS[1].extract)(&resource), "RUNNING");
    }
}

//! Property-based tests using proptest
//!
//! These tests verify the value-normalization rules and the regional client
//! fan-out using randomized inputs.

use proptest::prelude::*;

use gcpinv::gcp::auth::GcpCredentials;
use gcpinv::gcp::client::{GcpClient, GcpEndpoints};
use gcpinv::gcp::http::GcpHttpClient;
use gcpinv::inventory::clients::build_region_clients;
use gcpinv::inventory::normalize::{normalize_record, normalize_value, FieldValue};

/// Generate arbitrary field values for testing
fn arb_field_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Missing),
        "[ -~]{0,40}".prop_map(FieldValue::Str),
        any::<bool>().prop_map(FieldValue::Bool),
        any::<i64>().prop_map(FieldValue::Int),
        prop::collection::vec("[a-z0-9.-]{1,20}", 0..10).prop_map(FieldValue::StrList),
    ]
}

/// Generate region-like identifiers
fn arb_region() -> impl Strategy<Value = String> {
    "[a-z]{2,12}-[a-z]{4,9}[1-9]"
}

proptest! {
    /// Normalization is total - no input panics
    #[test]
    fn normalize_never_panics(value in arb_field_value()) {
        let _ = normalize_value(&value);
    }

    /// Normalizing an already-normalized value is a no-op
    #[test]
    fn normalize_is_idempotent(value in arb_field_value()) {
        let once = normalize_value(&value);
        let twice = normalize_value(&FieldValue::Str(once.clone()));
        prop_assert_eq!(once, twice);
    }

    /// Booleans always render as the bare literals
    #[test]
    fn bools_are_literal(b in any::<bool>()) {
        let rendered = normalize_value(&FieldValue::Bool(b));
        prop_assert!(rendered == "true" || rendered == "false");
        prop_assert_eq!(rendered == "true", b);
    }

    /// Integers render as plain base-10 with no separators
    #[test]
    fn ints_are_plain_decimal(i in any::<i64>()) {
        let rendered = normalize_value(&FieldValue::Int(i));
        prop_assert_eq!(rendered.parse::<i64>().unwrap(), i);
    }

    /// List rendering is insensitive to input order
    #[test]
    fn list_rendering_ignores_input_order(
        mut items in prop::collection::vec("[a-z0-9.-]{1,20}", 0..10)
    ) {
        let forward = normalize_value(&FieldValue::StrList(items.clone()));
        items.reverse();
        let reversed = normalize_value(&FieldValue::StrList(items));
        prop_assert_eq!(forward, reversed);
    }

    /// List rendering is sorted line by line
    #[test]
    fn list_rendering_is_sorted(items in prop::collection::vec("[a-z0-9.-]{1,20}", 1..10)) {
        let rendered = normalize_value(&FieldValue::StrList(items));
        let lines: Vec<&str> = rendered.split('\n').collect();
        let mut sorted = lines.clone();
        sorted.sort();
        prop_assert_eq!(lines, sorted);
    }

    /// Record normalization keeps every field and its order
    #[test]
    fn record_normalization_preserves_shape(
        fields in prop::collection::vec(("[a-zA-Z]{1,12}", arb_field_value()), 0..10)
    ) {
        let names: Vec<String> = fields.iter().map(|(name, _)| name.clone()).collect();
        let normalized = normalize_record(fields);
        let normalized_names: Vec<String> =
            normalized.iter().map(|(name, _)| name.clone()).collect();
        prop_assert_eq!(names, normalized_names);
    }
}

mod fan_out_tests {
    use super::*;

    fn base_client() -> GcpClient {
        GcpClient::with_parts(
            GcpCredentials::fixed("test-token"),
            GcpHttpClient::new().expect("client"),
            "test-project",
            GcpEndpoints::default(),
        )
    }

    proptest! {
        /// Every distinct region gets exactly one client
        #[test]
        fn each_region_key_has_one_client(regions in prop::collection::vec(arb_region(), 0..12)) {
            let clients = build_region_clients(&base_client(), &regions, |base, region| {
                Ok(base.with_region(region))
            })
            .unwrap();

            let mut distinct = regions.clone();
            distinct.sort();
            distinct.dedup();
            prop_assert_eq!(clients.len(), distinct.len());

            for region in &regions {
                prop_assert_eq!(&clients[region.as_str()].region, region);
            }
        }

        /// Duplicated region lists behave like their deduplicated form
        #[test]
        fn duplicate_regions_are_idempotent(regions in prop::collection::vec(arb_region(), 0..6)) {
            let mut doubled = regions.clone();
            doubled.extend(regions.iter().cloned());

            let once = build_region_clients(&base_client(), &regions, |base, region| {
                Ok(base.with_region(region))
            })
            .unwrap();
            let twice = build_region_clients(&base_client(), &doubled, |base, region| {
                Ok(base.with_region(region))
            })
            .unwrap();

            prop_assert_eq!(once.len(), twice.len());
        }
    }
}

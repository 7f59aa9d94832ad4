//! Integration tests for the GCP client, fetcher, and name cache using
//! wiremock
//!
//! These tests verify listing behavior against mocked endpoints, ensuring
//! proper handling of pagination, aggregated responses, error codes, and
//! name-table construction.

use serde_json::json;
use wiremock::matchers::{bearer_token, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gcpinv::gcp::auth::GcpCredentials;
use gcpinv::gcp::client::{GcpClient, GcpEndpoints};
use gcpinv::gcp::http::GcpHttpClient;
use gcpinv::inventory::cache::{EntityKind, NameCache};
use gcpinv::inventory::fetcher;

/// Build a client whose endpoint roots all point at the mock server
fn mock_client(server: &MockServer) -> GcpClient {
    let endpoints = GcpEndpoints {
        compute: format!("{}/compute/v1", server.uri()),
        storage: format!("{}/storage/v1", server.uri()),
        kms: format!("{}/kms/v1", server.uri()),
    };
    GcpClient::with_parts(
        GcpCredentials::fixed("test-token"),
        GcpHttpClient::new().expect("client"),
        "test-project",
        endpoints,
    )
}

mod client_tests {
    use super::*;

    /// Successful GET returns parsed JSON and sends the bearer token
    #[tokio::test]
    async fn test_get_success_returns_json() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/regions/us-central1/subnetworks"))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"name": "sub-1", "ipCidrRange": "10.0.0.0/20"},
                    {"name": "sub-2", "ipCidrRange": "10.0.16.0/20"}
                ]
            })))
            .mount(&server)
            .await;

        let client = mock_client(&server).with_region("us-central1");
        let response = client
            .get(&client.compute_regional_url("subnetworks"))
            .await
            .expect("Request should succeed");

        assert_eq!(response["items"].as_array().unwrap().len(), 2);
        assert_eq!(response["items"][0]["name"], "sub-1");
    }

    /// Non-success statuses surface as errors naming the status
    #[tokio::test]
    async fn test_error_statuses_are_reported() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/global/networks"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "Permission denied"}
            })))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let err = client
            .get(&client.compute_global_url("networks"))
            .await
            .expect_err("403 should fail");

        assert!(err.to_string().contains("403"));
    }
}

mod fetcher_tests {
    use super::*;

    /// fetch_all follows nextPageToken to exhaustion and keeps page order
    #[tokio::test]
    async fn test_pagination_concatenates_pages_in_order() {
        let server = MockServer::start().await;

        // Second page, requested with the token
        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/regions/us-central1/addresses"))
            .and(query_param("pageToken", "token-page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"name": "addr-3"}, {"name": "addr-4"}]
            })))
            .mount(&server)
            .await;

        // First page
        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/regions/us-central1/addresses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"name": "addr-1"}, {"name": "addr-2"}],
                "nextPageToken": "token-page-2"
            })))
            .mount(&server)
            .await;

        let client = mock_client(&server).with_region("us-central1");
        let url = client.compute_regional_url("addresses");
        let items = fetcher::fetch_all(&client, &url, "items")
            .await
            .expect("fetch should succeed");

        let names: Vec<&str> = items.iter().filter_map(|i| i["name"].as_str()).collect();
        assert_eq!(names, vec!["addr-1", "addr-2", "addr-3", "addr-4"]);
    }

    /// Aggregated listings flatten down to the queried region only
    #[tokio::test]
    async fn test_aggregated_fetch_filters_to_region() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/aggregated/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": {
                    "zones/us-central1-a": {"instances": [{"name": "web-1"}]},
                    "zones/us-central1-b": {"instances": [{"name": "web-2"}]},
                    "zones/europe-west1-b": {"instances": [{"name": "eu-1"}]},
                    "zones/asia-east1-a": {"warning": {"code": "NO_RESULTS_ON_PAGE"}}
                }
            })))
            .mount(&server)
            .await;

        let client = mock_client(&server).with_region("us-central1");
        let url = client.compute_aggregated_url("instances");
        let items = fetcher::fetch_aggregated(&client, &url, "us-central1")
            .await
            .expect("fetch should succeed");

        let names: Vec<&str> = items.iter().filter_map(|i| i["name"].as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"web-1"));
        assert!(names.contains(&"web-2"));
    }
}

mod cache_tests {
    use super::*;

    fn empty_kms_mock() -> Mock {
        Mock::given(method("GET"))
            .and(path(
                "/kms/v1/projects/test-project/locations/us-central1/keyRings/-/cryptoKeys",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
    }

    /// One bulk listing per entity type per region builds the lookup tables
    #[tokio::test]
    async fn test_cache_build_resolves_names() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/global/networks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{
                    "name": "prod-vpc",
                    "selfLink": "https://compute.googleapis.com/compute/v1/projects/test-project/global/networks/prod-vpc"
                }]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/regions/us-central1/subnetworks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{
                    "name": "sub-services",
                    "selfLink": "https://compute.googleapis.com/compute/v1/projects/test-project/regions/us-central1/subnetworks/sub-services"
                }]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(
                "/kms/v1/projects/test-project/locations/us-central1/keyRings/-/cryptoKeys",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cryptoKeys": [{
                    "name": "projects/test-project/locations/us-central1/keyRings/ring-1/cryptoKeys/disk-key"
                }]
            })))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let regions = vec!["us-central1".to_string()];
        let cache = NameCache::build(&client, &regions)
            .await
            .expect("cache build should succeed");

        assert_eq!(
            cache.resolve(
                EntityKind::Network,
                "us-central1",
                "https://compute.googleapis.com/compute/v1/projects/test-project/global/networks/prod-vpc"
            ),
            "prod-vpc"
        );
        assert_eq!(
            cache.resolve(
                EntityKind::Subnetwork,
                "us-central1",
                "https://compute.googleapis.com/compute/v1/projects/test-project/regions/us-central1/subnetworks/sub-services"
            ),
            "sub-services"
        );
        assert_eq!(
            cache.resolve(
                EntityKind::CryptoKey,
                "us-central1",
                "projects/test-project/locations/us-central1/keyRings/ring-1/cryptoKeys/disk-key"
            ),
            "ring-1/disk-key"
        );
        // Misses degrade to the id
        assert_eq!(
            cache.resolve(EntityKind::Network, "us-central1", "link/unknown"),
            "link/unknown"
        );
    }

    /// A failing lookup-table fetch fails the whole build and names the region
    #[tokio::test]
    async fn test_cache_build_failure_names_the_region() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/global/networks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/regions/us-central1/subnetworks"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": {"code": 500, "message": "backend error"}
            })))
            .mount(&server)
            .await;

        empty_kms_mock().mount(&server).await;

        let client = mock_client(&server);
        let regions = vec!["us-central1".to_string()];
        let err = NameCache::build(&client, &regions)
            .await
            .expect_err("cache build should fail");

        let message = format!("{:#}", err);
        assert!(message.contains("subnetwork"));
        assert!(message.contains("us-central1"));
    }

    /// An empty region list builds an empty cache without any API calls
    #[tokio::test]
    async fn test_cache_build_with_no_regions_is_offline() {
        let server = MockServer::start().await;
        // No mocks mounted: any request would 404 and fail the build

        let client = mock_client(&server);
        let cache = NameCache::build(&client, &[])
            .await
            .expect("empty build should succeed");

        assert_eq!(
            cache.resolve(EntityKind::Network, "us-central1", "anything"),
            "anything"
        );
    }
}

//! GCP Client
//!
//! Main client for interacting with GCP APIs, combining authentication,
//! HTTP functionality, and API URL construction. A client is scoped to a
//! project and (optionally) a region; re-scoping to another region is a
//! cheap clone and performs no network calls.

use super::auth::GcpCredentials;
use super::http::GcpHttpClient;
use anyhow::{Context, Result};
use serde_json::Value;

/// Root URLs for the GCP services this tool talks to.
///
/// Overridable so the client can be pointed at an emulator or a mock server.
#[derive(Debug, Clone)]
pub struct GcpEndpoints {
    pub compute: String,
    pub storage: String,
    pub kms: String,
}

impl Default for GcpEndpoints {
    fn default() -> Self {
        Self {
            compute: "https://compute.googleapis.com/compute/v1".to_string(),
            storage: "https://storage.googleapis.com/storage/v1".to_string(),
            kms: "https://cloudkms.googleapis.com/v1".to_string(),
        }
    }
}

/// Main GCP client
#[derive(Clone)]
pub struct GcpClient {
    pub credentials: GcpCredentials,
    pub http: GcpHttpClient,
    pub project_id: String,
    pub region: String,
    pub endpoints: GcpEndpoints,
}

impl std::fmt::Debug for GcpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpClient")
            .field("project_id", &self.project_id)
            .field("region", &self.region)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl GcpClient {
    /// Create a new GCP client scoped to a project.
    ///
    /// The returned client has no region; use [`GcpClient::with_region`] to
    /// derive region-scoped clients from it.
    pub async fn new(project_id: &str) -> Result<Self> {
        let credentials = GcpCredentials::new()
            .await
            .context("Failed to initialize GCP credentials")?;

        let http = GcpHttpClient::new()?;

        Ok(Self {
            credentials,
            http,
            project_id: project_id.to_string(),
            region: String::new(),
            endpoints: GcpEndpoints::default(),
        })
    }

    /// Assemble a client from pre-built parts.
    ///
    /// Used to target emulators and mock servers, where credentials and
    /// endpoint roots come from the environment rather than ADC discovery.
    pub fn with_parts(
        credentials: GcpCredentials,
        http: GcpHttpClient,
        project_id: &str,
        endpoints: GcpEndpoints,
    ) -> Self {
        Self {
            credentials,
            http,
            project_id: project_id.to_string(),
            region: String::new(),
            endpoints,
        }
    }

    /// Derive a client scoped to the given region.
    ///
    /// Construction is local: credentials and the HTTP connection pool are
    /// shared with the parent client.
    pub fn with_region(&self, region: &str) -> Self {
        let mut client = self.clone();
        client.region = region.to_string();
        client
    }

    /// Get the current access token
    pub async fn get_token(&self) -> Result<String> {
        self.credentials.get_token().await
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.get(url, &token).await
    }

    // =========================================================================
    // Compute Engine API helpers
    // =========================================================================

    /// Build Compute Engine API URL
    pub fn compute_url(&self, path: &str) -> String {
        format!("{}/projects/{}/{}", self.endpoints.compute, self.project_id, path)
    }

    /// Build regional Compute Engine API URL
    pub fn compute_regional_url(&self, resource: &str) -> String {
        self.compute_url(&format!("regions/{}/{}", self.region, resource))
    }

    /// Build global Compute Engine API URL
    pub fn compute_global_url(&self, resource: &str) -> String {
        self.compute_url(&format!("global/{}", resource))
    }

    /// Build aggregated Compute Engine API URL (all zones and regions)
    pub fn compute_aggregated_url(&self, resource: &str) -> String {
        self.compute_url(&format!("aggregated/{}", resource))
    }

    // =========================================================================
    // Cloud Storage API helpers
    // =========================================================================

    /// Build Cloud Storage API URL
    pub fn storage_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoints.storage, path)
    }

    /// Build the project-scoped bucket listing URL
    pub fn storage_buckets_url(&self) -> String {
        format!(
            "{}?project={}",
            self.storage_url("b"),
            urlencoding::encode(&self.project_id)
        )
    }

    // =========================================================================
    // Cloud KMS API helpers
    // =========================================================================

    /// Build Cloud KMS API URL
    pub fn kms_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoints.kms, path)
    }

    /// Build the region-scoped crypto key listing URL.
    ///
    /// Uses the `keyRings/-` wildcard so all keys in the location come back
    /// from a single listing call.
    pub fn kms_regional_keys_url(&self) -> String {
        self.kms_url(&format!(
            "projects/{}/locations/{}/keyRings/-/cryptoKeys",
            self.project_id, self.region
        ))
    }
}

/// Format a GCP API error for display
pub fn format_gcp_error(error: &anyhow::Error) -> String {
    super::http::format_gcp_error(error)
}

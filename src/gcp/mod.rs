//! GCP API interaction module
//!
//! This module provides the core functionality for interacting with Google
//! Cloud Platform APIs, including authentication, the HTTP client, and API
//! URL construction.
//!
//! # Module Structure
//!
//! - [`auth`] - GCP authentication using Application Default Credentials
//! - [`client`] - Main GCP client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use crate::gcp::client::GcpClient;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = GcpClient::new("my-project").await?;
//!     let regional = client.with_region("us-central1");
//!     let subnets = regional.get(&regional.compute_regional_url("subnetworks")).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;

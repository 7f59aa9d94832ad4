//! gcpinv - cloud inventory exporter for Google Cloud Platform
//!
//! Enumerates GCP resources across a set of target regions through the REST
//! APIs and renders them as normalized CSV tables, one file per resource
//! category.
//!
//! # Architecture
//!
//! - [`gcp`] - authentication, HTTP client, and API URL construction
//! - [`inventory`] - the shared substrate: collector contract, constructor
//!   registry, regional client fan-out, value normalization, and the
//!   name-resolution cache
//! - [`collectors`] - the concrete resource collectors built on top of it
//! - [`export`] - CSV rendering of collected resources
//! - [`config`] - persisted configuration and default resolution

pub mod collectors;
pub mod config;
pub mod export;
pub mod gcp;
pub mod inventory;

/// Version injected at compile time via GCPINV_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("GCPINV_VERSION") {
    Some(v) => v,
    None => "dev",
};

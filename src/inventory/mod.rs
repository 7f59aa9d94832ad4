//! Inventory substrate
//!
//! The shared machinery every collector plugs into. Collectors themselves
//! are mechanical (enumerate one resource category, map fields); everything
//! they have in common lives here.
//!
//! # Module Structure
//!
//! - [`model`] - the resource row, column, and collector contracts
//! - [`normalize`] - canonical string rendering of typed field values
//! - [`clients`] - regional client fan-out from a single factory
//! - [`cache`] - build-once id -> name lookup tables shared by all collectors
//! - [`fetcher`] - paginated listing over the JSON REST responses
//! - [`registry`] - the two-phase constructor/collector registries
//!
//! # Startup sequence
//!
//! ```ignore
//! use crate::inventory::registry::ConstructorRegistry;
//!
//! async fn startup(client: &crate::gcp::client::GcpClient, regions: &[String]) -> anyhow::Result<()> {
//!     let mut constructors = ConstructorRegistry::new();
//!     crate::collectors::register_defaults(&mut constructors);
//!     let registry = constructors.instantiate(client, regions).await?;
//!     for collector in registry.iter() {
//!         // orchestrate collector.collect(region) per region
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod clients;
pub mod fetcher;
pub mod model;
pub mod normalize;
pub mod registry;

pub use cache::{EntityKind, NameCache};
pub use clients::build_region_clients;
pub use model::{Collector, Column, Resource, ResourceInput};
pub use normalize::{normalize_record, normalize_value, FieldValue};
pub use registry::{CollectorRegistry, ConstructorFn, ConstructorRegistry};

//! Collector registry and construction protocol
//!
//! Startup happens in two phases. First every collector constructor is
//! registered under its name; nothing is instantiated yet and registering a
//! name twice silently replaces the earlier entry (deliberate, so variant
//! builds and tests can override a stock collector). Then `instantiate`
//! builds the shared name-resolution cache once and invokes each constructor
//! with `(client, regions, cache)`. The first failure aborts the whole step
//! with the offending collector's name: there is no mode in which the tool
//! runs with a partially initialized collector set.
//!
//! All constructors share one function type, so the construction call site
//! needs no knowledge of concrete collector types and the shape of each
//! constructor is checked at compile time.

use super::cache::NameCache;
use super::model::Collector;
use crate::gcp::client::GcpClient;
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// The uniform constructor shape every collector must expose.
pub type ConstructorFn =
    fn(&GcpClient, &[String], &Arc<NameCache>) -> Result<Arc<dyn Collector>>;

/// Name-keyed table of uninvoked collector constructors.
#[derive(Default)]
pub struct ConstructorRegistry {
    constructors: HashMap<&'static str, ConstructorFn>,
}

impl ConstructorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor under a name. Last write wins.
    pub fn register(&mut self, name: &'static str, constructor: ConstructorFn) {
        self.constructors.insert(name, constructor);
    }

    /// Restrict the registry to the named collectors.
    ///
    /// Requesting an unregistered name is a configuration error and fails
    /// immediately.
    pub fn retain_named(&mut self, names: &[String]) -> Result<()> {
        for name in names {
            if !self.constructors.contains_key(name.as_str()) {
                bail!("unknown collector: {}", name);
            }
        }
        self.constructors
            .retain(|name, _| names.iter().any(|n| n == name));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Instantiate every registered collector.
    ///
    /// Builds the shared name-resolution cache first, then invokes the
    /// constructors in unspecified order. Fail-fast: the first constructor
    /// error aborts and no registry is returned.
    pub async fn instantiate(
        &self,
        client: &GcpClient,
        regions: &[String],
    ) -> Result<CollectorRegistry> {
        let cache = Arc::new(
            NameCache::build(client, regions)
                .await
                .context("building name resolution cache")?,
        );

        let mut collectors: HashMap<String, Arc<dyn Collector>> =
            HashMap::with_capacity(self.constructors.len());

        for (name, constructor) in &self.constructors {
            let collector = constructor(client, regions, &cache)
                .with_context(|| format!("initializing collector {}", name))?;

            // The constructor table and the instance must agree on the name,
            // otherwise the directory would hold entries nobody asked for.
            if collector.name() != *name {
                bail!(
                    "collector constructor registered as {} produced instance named {}",
                    name,
                    collector.name()
                );
            }

            collectors.insert(name.to_string(), collector);
        }

        Ok(CollectorRegistry { collectors })
    }
}

/// Name-keyed directory of live collectors.
///
/// Built once by [`ConstructorRegistry::instantiate`] and read-only
/// afterward; concurrent reads need no synchronization.
pub struct CollectorRegistry {
    collectors: HashMap<String, Arc<dyn Collector>>,
}

impl std::fmt::Debug for CollectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorRegistry")
            .field("collectors", &self.collectors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CollectorRegistry {
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Collector>> {
        self.collectors.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Collector>> {
        self.collectors.values()
    }

    /// Collector names in sorted order, for stable iteration and output.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.collectors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }
}

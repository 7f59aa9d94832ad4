//! Regional client fan-out
//!
//! Builds one client per target region from a single factory function. The
//! factory is expected to be cheap and local (it scopes an existing client,
//! it does not validate connectivity).

use crate::gcp::client::GcpClient;
use anyhow::{Context, Result};
use std::collections::HashMap;

/// Build a region -> client mapping from a base client and a factory.
///
/// The mapping is keyed by region, so duplicate entries in `regions` yield a
/// single client. An empty region list yields an empty mapping. If the
/// factory fails for any region the whole build fails and the partial
/// mapping is discarded.
pub fn build_region_clients<C, F>(
    base: &GcpClient,
    regions: &[String],
    factory: F,
) -> Result<HashMap<String, C>>
where
    F: Fn(&GcpClient, &str) -> Result<C>,
{
    let mut clients = HashMap::with_capacity(regions.len());

    for region in regions {
        if clients.contains_key(region) {
            continue;
        }
        let client = factory(base, region)
            .with_context(|| format!("failed to build client for region {}", region))?;
        clients.insert(region.clone(), client);
    }

    Ok(clients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcp::auth::GcpCredentials;
    use crate::gcp::client::GcpEndpoints;
    use crate::gcp::http::GcpHttpClient;

    fn base_client() -> GcpClient {
        GcpClient::with_parts(
            GcpCredentials::fixed("test-token"),
            GcpHttpClient::new().unwrap(),
            "test-project",
            GcpEndpoints::default(),
        )
    }

    #[test]
    fn test_empty_region_list_yields_empty_map() {
        let clients =
            build_region_clients(&base_client(), &[], |base, region| Ok(base.with_region(region)))
                .unwrap();
        assert!(clients.is_empty());
    }

    #[test]
    fn test_duplicate_regions_share_one_client() {
        let regions = vec![
            "us-central1".to_string(),
            "europe-west1".to_string(),
            "us-central1".to_string(),
        ];
        let clients = build_region_clients(&base_client(), &regions, |base, region| {
            Ok(base.with_region(region))
        })
        .unwrap();

        assert_eq!(clients.len(), 2);
        assert_eq!(clients["us-central1"].region, "us-central1");
    }

    #[test]
    fn test_factory_failure_names_the_region() {
        let regions = vec!["us-central1".to_string(), "bad-region".to_string()];
        let result: Result<HashMap<String, GcpClient>> =
            build_region_clients(&base_client(), &regions, |base, region| {
                if region == "bad-region" {
                    anyhow::bail!("unsupported");
                }
                Ok(base.with_region(region))
            });

        let err = format!("{:#}", result.unwrap_err());
        assert!(err.contains("bad-region"));
    }
}

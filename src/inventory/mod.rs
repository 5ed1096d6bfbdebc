//! Inventory resolution
//!
//! Turns the provider's full record list into the managed set: a record is
//! managed iff its name contains the management token, and it is kept iff
//! its name also contains a `-{code}-` token for a configured location.
//!
//! [`InventoryCache`] holds the first successful non-empty resolution for the
//! life of the process. Its lock is held across the provider call, so two
//! cycles starting together resolve once.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::dns::{DnsProvider, RawRecord};
use crate::error::{Error, Result};
use crate::models::{ManagedRecord, RegionProfile};

/// Filters raw provider records into the managed set
pub struct InventoryResolver {
    dns: Arc<dyn DnsProvider>,
    management_token: String,
    locations: Vec<RegionProfile>,
}

impl InventoryResolver {
    pub fn new(
        dns: Arc<dyn DnsProvider>,
        management_token: impl Into<String>,
        locations: Vec<RegionProfile>,
    ) -> Self {
        Self {
            dns,
            management_token: management_token.into(),
            locations,
        }
    }

    /// Fetch and filter the managed set
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderUnavailable`] if the list call fails
    pub async fn resolve(&self) -> Result<Vec<ManagedRecord>> {
        let raw = self
            .dns
            .list_records()
            .await
            .map_err(|e| Error::provider_unavailable(format!("DNS record listing failed: {e}")))?;

        let managed = filter_managed(&raw, &self.management_token, &self.locations);

        tracing::info!(
            listed = raw.len(),
            managed = managed.len(),
            token = %self.management_token,
            "Resolved managed inventory"
        );

        Ok(managed)
    }
}

/// Select and tag the managed records
///
/// Records carrying the management token but no known location token are
/// dropped. When a name carries several location tokens, the first configured
/// location wins.
pub fn filter_managed(
    records: &[RawRecord],
    management_token: &str,
    locations: &[RegionProfile],
) -> Vec<ManagedRecord> {
    records
        .iter()
        .filter(|r| r.name.contains(management_token))
        .filter_map(|r| {
            let location = locations.iter().find(|l| r.name.contains(&l.name_token()));
            if location.is_none() {
                tracing::debug!(record = %r.name, "Managed record has no location token, skipping");
            }
            location.map(|l| ManagedRecord::new(&r.id, &r.zone_id, &r.name, &l.code))
        })
        .collect()
}

// ============================================================================
// Inventory Cache
// ============================================================================

/// Populate-once holder for the managed set
#[derive(Default)]
pub struct InventoryCache {
    snapshot: Mutex<Option<Arc<Vec<ManagedRecord>>>>,
}

impl InventoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached snapshot, resolving it first if needed
    ///
    /// Failed and empty resolutions are returned to the caller but not
    /// cached; the next call tries again.
    pub async fn get_or_resolve(
        &self,
        resolver: &InventoryResolver,
    ) -> Result<Arc<Vec<ManagedRecord>>> {
        let mut snapshot = self.snapshot.lock().await;

        if let Some(records) = snapshot.as_ref() {
            return Ok(Arc::clone(records));
        }

        let records = Arc::new(resolver.resolve().await?);
        if !records.is_empty() {
            *snapshot = Some(Arc::clone(&records));
        }

        Ok(records)
    }

    /// Cached snapshot, if populated
    pub async fn snapshot(&self) -> Option<Arc<Vec<ManagedRecord>>> {
        self.snapshot.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, name: &str) -> RawRecord {
        RawRecord {
            id: id.to_string(),
            zone_id: "zone".to_string(),
            name: name.to_string(),
            content: "10.0.0.1".to_string(),
        }
    }

    fn locations() -> Vec<RegionProfile> {
        vec![
            RegionProfile::new("jp", "ap-northeast-1", "Ubuntu-1GB-Tokyo-1"),
            RegionProfile::new("sg", "ap-southeast-1", "CentOS-1GB-Singapore-1"),
        ]
    }

    #[test]
    fn test_filter_tags_by_location() {
        let records = vec![
            raw("1", "nasi-campur-jp-1.example.com"),
            raw("2", "nasi-campur-sg-1.example.com"),
        ];
        let managed = filter_managed(&records, "nasi-campur", &locations());

        assert_eq!(managed.len(), 2);
        assert_eq!(managed[0].location, "jp");
        assert_eq!(managed[1].location, "sg");
        assert_eq!(managed[1].id, "2");
    }

    #[test]
    fn test_filter_drops_unmanaged_and_untagged() {
        let records = vec![
            raw("1", "www.example.com"),
            raw("2", "other-jp-1.example.com"),
            raw("3", "nasi-campur-us-1.example.com"),
            raw("4", "nasi-campur-jp-1.example.com"),
        ];
        let managed = filter_managed(&records, "nasi-campur", &locations());

        assert_eq!(managed.len(), 1);
        assert_eq!(managed[0].id, "4");
    }

    #[test]
    fn test_location_token_needs_delimiters() {
        // "jpx" must not be mistaken for "jp"
        let records = vec![raw("1", "nasi-campur-jpx-1.example.com")];
        assert!(filter_managed(&records, "nasi-campur", &locations()).is_empty());
    }
}

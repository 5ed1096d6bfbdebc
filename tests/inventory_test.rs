//! Inventory filtering properties and cache behaviour

mod common;

use std::sync::Arc;

use common::{raw_record, FakeDns};
use proptest::prelude::*;
use repoint::dns::RawRecord;
use repoint::inventory::{filter_managed, InventoryCache, InventoryResolver};
use repoint::models::RegionProfile;

const TOKEN: &str = "nasi-campur";

fn locations() -> Vec<RegionProfile> {
    vec![
        RegionProfile::new("jp", "ap-northeast-1", "Ubuntu-1GB-Tokyo-1"),
        RegionProfile::new("sg", "ap-southeast-1", "CentOS-1GB-Singapore-1"),
    ]
}

fn resolver(dns: &Arc<FakeDns>) -> InventoryResolver {
    InventoryResolver::new(dns.clone(), TOKEN, locations())
}

// ============================================================================
// Filtering Properties
// ============================================================================

fn record_name() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["nasi-campur", "nasi", "campur-nasi", "www"]),
        prop::sample::select(vec!["jp", "sg", "us", "jpx", "sgp", ""]),
        0u8..10,
        prop::sample::select(vec![".example.com", "-jp.example.com", ""]),
    )
        .prop_map(|(prefix, code, n, suffix)| format!("{prefix}-{code}-{n}{suffix}"))
}

proptest! {
    #[test]
    fn managed_iff_both_tokens_present(names in prop::collection::vec(record_name(), 0..20)) {
        let raw: Vec<RawRecord> = names
            .iter()
            .enumerate()
            .map(|(i, name)| raw_record(&i.to_string(), name, "10.0.0.1"))
            .collect();

        let managed = filter_managed(&raw, TOKEN, &locations());

        let expected: Vec<(&str, &str)> = raw
            .iter()
            .filter(|r| r.name.contains(TOKEN))
            .filter_map(|r| {
                if r.name.contains("-jp-") {
                    Some((r.id.as_str(), "jp"))
                } else if r.name.contains("-sg-") {
                    Some((r.id.as_str(), "sg"))
                } else {
                    None
                }
            })
            .collect();

        let actual: Vec<(&str, &str)> = managed
            .iter()
            .map(|m| (m.id.as_str(), m.location.as_str()))
            .collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn managed_records_keep_identity(names in prop::collection::vec(record_name(), 0..20)) {
        let raw: Vec<RawRecord> = names
            .iter()
            .enumerate()
            .map(|(i, name)| raw_record(&i.to_string(), name, "10.0.0.1"))
            .collect();

        for record in filter_managed(&raw, TOKEN, &locations()) {
            let source = raw.iter().find(|r| r.id == record.id).unwrap();
            prop_assert_eq!(&record.name, &source.name);
            prop_assert_eq!(&record.zone_id, &source.zone_id);
            let token = format!("-{}-", record.location);
            prop_assert!(record.name.contains(&token));
        }
    }
}

// ============================================================================
// Cache
// ============================================================================

#[tokio::test]
async fn test_cache_resolves_once() {
    let dns = Arc::new(FakeDns::with_records(vec![raw_record(
        "r1",
        "nasi-campur-jp-1.example.com",
        "10.0.0.1",
    )]));
    let resolver = resolver(&dns);
    let cache = InventoryCache::new();

    let first = cache.get_or_resolve(&resolver).await.unwrap();
    let second = cache.get_or_resolve(&resolver).await.unwrap();

    assert_eq!(first.len(), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(dns.list_calls(), 1);
    assert!(cache.snapshot().await.is_some());
}

#[tokio::test]
async fn test_concurrent_first_use_is_single_flight() {
    let dns = Arc::new(FakeDns::with_records(vec![raw_record(
        "r1",
        "nasi-campur-sg-1.example.com",
        "10.0.0.1",
    )]));
    let resolver = resolver(&dns);
    let cache = InventoryCache::new();

    let (a, b, c) = tokio::join!(
        cache.get_or_resolve(&resolver),
        cache.get_or_resolve(&resolver),
        cache.get_or_resolve(&resolver),
    );

    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(dns.list_calls(), 1);
}

#[tokio::test]
async fn test_failure_is_not_cached() {
    let dns = Arc::new(FakeDns::with_records(vec![raw_record(
        "r1",
        "nasi-campur-jp-1.example.com",
        "10.0.0.1",
    )]));
    dns.set_list_fails(true);
    let resolver = resolver(&dns);
    let cache = InventoryCache::new();

    let err = cache.get_or_resolve(&resolver).await.unwrap_err();
    assert!(matches!(err, repoint::error::Error::ProviderUnavailable(_)));
    assert!(cache.snapshot().await.is_none());

    dns.set_list_fails(false);
    let records = cache.get_or_resolve(&resolver).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(dns.list_calls(), 2);
}

#[tokio::test]
async fn test_empty_result_is_not_cached() {
    let dns = Arc::new(FakeDns::with_records(vec![raw_record(
        "r1",
        "www.example.com",
        "10.0.0.1",
    )]));
    let resolver = resolver(&dns);
    let cache = InventoryCache::new();

    let records = cache.get_or_resolve(&resolver).await.unwrap();
    assert!(records.is_empty());

    cache.get_or_resolve(&resolver).await.unwrap();
    assert_eq!(dns.list_calls(), 2);
}

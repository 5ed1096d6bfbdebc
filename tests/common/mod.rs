//! Common test utilities
//!
//! In-memory providers that behave like the real services where it matters:
//! reservation names are unique per region, DNS updates are applied only
//! when acknowledged, and every call is counted.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use repoint::cloud::{AddressProvider, CloudError, CloudResult, StaticAddress};
use repoint::config::{Config, NotifyConfig, ProbeConfig};
use repoint::dns::{DnsError, DnsProvider, DnsResult, RawRecord, RecordUpdate, UpdateAck};

// ============================================================================
// Fake DNS Provider
// ============================================================================

/// DNS provider holding records in memory
#[derive(Default)]
pub struct FakeDns {
    records: Mutex<Vec<RawRecord>>,
    scripted_acks: Mutex<VecDeque<UpdateAck>>,
    list_fails: Mutex<bool>,
    pub list_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
}

impl FakeDns {
    pub fn with_records(records: Vec<RawRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    /// Make every list call fail until cleared
    pub fn set_list_fails(&self, fails: bool) {
        *self.list_fails.lock().unwrap() = fails;
    }

    /// Queue acknowledgements returned before the default `success: true`
    pub fn script_acks(&self, acks: Vec<UpdateAck>) {
        self.scripted_acks.lock().unwrap().extend(acks);
    }

    pub fn content_of(&self, id: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.content.clone())
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsProvider for FakeDns {
    async fn list_records(&self) -> DnsResult<Vec<RawRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if *self.list_fails.lock().unwrap() {
            return Err(DnsError::Http {
                status: 503,
                message: "service unavailable".into(),
            });
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn update_record(
        &self,
        _zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> DnsResult<UpdateAck> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        let ack = self
            .scripted_acks
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(UpdateAck::ok);

        if ack.success {
            let mut records = self.records.lock().unwrap();
            match records.iter_mut().find(|r| r.id == record_id) {
                Some(record) => record.content = update.content.clone(),
                None => return Ok(UpdateAck::rejected("record not found")),
            }
        }
        Ok(ack)
    }
}

// ============================================================================
// Fake Address Provider
// ============================================================================

/// Address provider enforcing unique reservation names per region
pub struct FakeAddresses {
    reservations: Mutex<HashMap<(String, String), StaticAddress>>,
    next_ips: Mutex<VecDeque<String>>,
    fail_attach: Mutex<bool>,
    pub allocate_calls: AtomicUsize,
    pub release_calls: AtomicUsize,
    pub attach_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
}

impl FakeAddresses {
    /// Hand out `ips` in order, one per successful allocation
    pub fn with_ips(ips: &[&str]) -> Self {
        Self {
            reservations: Mutex::new(HashMap::new()),
            next_ips: Mutex::new(ips.iter().map(|s| s.to_string()).collect()),
            fail_attach: Mutex::new(false),
            allocate_calls: AtomicUsize::new(0),
            release_calls: AtomicUsize::new(0),
            attach_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
        }
    }

    /// Seed a reservation left over from an earlier cycle
    pub fn seed(&self, region: &str, name: &str, ip: &str) {
        self.reservations.lock().unwrap().insert(
            (region.to_string(), name.to_string()),
            StaticAddress {
                name: name.to_string(),
                ip_address: ip.to_string(),
                attached_to: None,
            },
        );
    }

    pub fn set_fail_attach(&self, fail: bool) {
        *self.fail_attach.lock().unwrap() = fail;
    }

    pub fn reservation_count(&self, region: &str) -> usize {
        self.reservations
            .lock()
            .unwrap()
            .keys()
            .filter(|(r, _)| r == region)
            .count()
    }

    pub fn reservation(&self, region: &str, name: &str) -> Option<StaticAddress> {
        self.reservations
            .lock()
            .unwrap()
            .get(&(region.to_string(), name.to_string()))
            .cloned()
    }

    pub fn allocate_calls(&self) -> usize {
        self.allocate_calls.load(Ordering::SeqCst)
    }

    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }

    pub fn attach_calls(&self) -> usize {
        self.attach_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AddressProvider for FakeAddresses {
    async fn allocate(&self, region: &str, name: &str) -> CloudResult<()> {
        self.allocate_calls.fetch_add(1, Ordering::SeqCst);

        let key = (region.to_string(), name.to_string());
        let mut reservations = self.reservations.lock().unwrap();
        if reservations.contains_key(&key) {
            return Err(CloudError::NameInUse(name.to_string()));
        }

        let ip = self
            .next_ips
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| CloudError::Service {
                code: "ServiceException".into(),
                message: "address pool exhausted".into(),
            })?;

        reservations.insert(
            key,
            StaticAddress {
                name: name.to_string(),
                ip_address: ip,
                attached_to: None,
            },
        );
        Ok(())
    }

    async fn release(&self, region: &str, name: &str) -> CloudResult<()> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);

        self.reservations
            .lock()
            .unwrap()
            .remove(&(region.to_string(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| CloudError::Service {
                code: "NotFoundException".into(),
                message: format!("{name} does not exist"),
            })
    }

    async fn attach(&self, region: &str, name: &str, instance: &str) -> CloudResult<()> {
        self.attach_calls.fetch_add(1, Ordering::SeqCst);

        if *self.fail_attach.lock().unwrap() {
            return Err(CloudError::Service {
                code: "InvalidInputException".into(),
                message: format!("{instance} is not running"),
            });
        }

        let mut reservations = self.reservations.lock().unwrap();
        match reservations.get_mut(&(region.to_string(), name.to_string())) {
            Some(reservation) => {
                reservation.attached_to = Some(instance.to_string());
                Ok(())
            }
            None => Err(CloudError::Service {
                code: "NotFoundException".into(),
                message: format!("{name} does not exist"),
            }),
        }
    }

    async fn get(&self, region: &str, name: &str) -> CloudResult<StaticAddress> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        self.reservation(region, name)
            .ok_or_else(|| CloudError::Service {
                code: "NotFoundException".into(),
                message: format!("{name} does not exist"),
            })
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn raw_record(id: &str, name: &str, content: &str) -> RawRecord {
    RawRecord {
        id: id.to_string(),
        zone_id: "zone-1".to_string(),
        name: name.to_string(),
        content: content.to_string(),
    }
}

/// Default configuration with probe and notify aimed at `port`
pub fn test_config(port: u16) -> Config {
    let mut config = Config::default();
    config.probe = ProbeConfig {
        port,
        path: "/actuator/info".to_string(),
        timeout_secs: 1,
    };
    config.notify = NotifyConfig {
        port,
        path: "/updateIp".to_string(),
        timeout_secs: 1,
    };
    config
}

/// HTTP client resolving each of `hosts` to the mock server
pub fn client_resolving(hosts: &[&str], server: SocketAddr) -> reqwest::Client {
    hosts
        .iter()
        .fold(reqwest::Client::builder(), |builder, host| {
            builder.resolve(host, server)
        })
        .build()
        .unwrap()
}

//! Test doubles and common utilities for contract tests
//!
//! The doubles record every call so tests can assert on exactly what the
//! watcher and converger asked of their collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use ifdns_core::config::{Config, RecordType, Target};
use ifdns_core::error::{Error, Result};
use ifdns_core::traits::{
    AddressListener, AddressSource, ChangeBatch, ChangeInfo, ChangeStatus, ZoneLookup, ZoneService,
};
use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Interface reader driven by the test
///
/// Queued snapshots are returned one per call; once the queue is empty the
/// last snapshot keeps being returned.
#[derive(Clone, Default)]
pub struct ScriptedAddressSource {
    state: Arc<Mutex<SourceState>>,
}

#[derive(Default)]
struct SourceState {
    missing: bool,
    queued: VecDeque<Vec<String>>,
    current: Vec<String>,
    fail_next: Option<String>,
    calls: usize,
}

impl ScriptedAddressSource {
    /// Create a source reporting `addresses`
    pub fn new(addresses: &[&str]) -> Self {
        let source = Self::default();
        source.set(addresses);
        source
    }

    /// Replace the reported addresses
    pub fn set(&self, addresses: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.queued.clear();
        state.current = addresses.iter().map(|a| a.to_string()).collect();
    }

    /// Queue snapshots to be returned on the following calls
    pub fn queue(&self, snapshots: &[&[&str]]) {
        let mut state = self.state.lock().unwrap();
        for snapshot in snapshots {
            state
                .queued
                .push_back(snapshot.iter().map(|a| a.to_string()).collect());
        }
    }

    /// Make the next `addresses()` call fail
    pub fn fail_next(&self, message: &str) {
        self.state.lock().unwrap().fail_next = Some(message.to_string());
    }

    /// Make the interface disappear
    pub fn remove_interface(&self) {
        self.state.lock().unwrap().missing = true;
    }

    /// Number of `addresses()` calls
    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }
}

impl AddressSource for ScriptedAddressSource {
    fn interface_exists(&self, _interface: &str) -> Result<bool> {
        Ok(!self.state.lock().unwrap().missing)
    }

    fn addresses(&self, interface: &str) -> Result<Vec<String>> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        if let Some(message) = state.fail_next.take() {
            return Err(Error::interface_lookup(interface, message));
        }
        if state.missing {
            return Err(Error::interface_lookup(interface, "no such interface"));
        }
        if let Some(snapshot) = state.queued.pop_front() {
            state.current = snapshot;
        }
        Ok(state.current.clone())
    }
}

/// Remote DNS service with scripted answers and call recording
pub struct ScriptedZoneService {
    zones: Mutex<HashMap<String, ZoneLookup>>,
    submit_status: Mutex<ChangeStatus>,
    submit_error: Mutex<Option<String>>,
    statuses: Mutex<VecDeque<ChangeStatus>>,
    status_error: Mutex<Option<String>>,
    batches: Mutex<Vec<(String, ChangeBatch)>>,
    status_times: Mutex<Vec<Instant>>,
    find_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

impl ScriptedZoneService {
    /// Create a service that knows no zones and leaves changes pending
    pub fn new() -> Self {
        Self {
            zones: Mutex::new(HashMap::new()),
            submit_status: Mutex::new(ChangeStatus::Pending),
            submit_error: Mutex::new(None),
            statuses: Mutex::new(VecDeque::new()),
            status_error: Mutex::new(None),
            batches: Mutex::new(Vec::new()),
            status_times: Mutex::new(Vec::new()),
            find_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        }
    }

    /// Answer lookups for `zone` with `lookup`
    pub fn with_zone(self, zone: &str, lookup: ZoneLookup) -> Self {
        self.zones.lock().unwrap().insert(zone.to_string(), lookup);
        self
    }

    /// Status reported by `submit_change_batch`
    pub fn with_submit_status(self, status: ChangeStatus) -> Self {
        *self.submit_status.lock().unwrap() = status;
        self
    }

    /// Make every submission fail
    pub fn with_submit_error(self, message: &str) -> Self {
        *self.submit_error.lock().unwrap() = Some(message.to_string());
        self
    }

    /// Statuses returned by successive `get_change_status` calls;
    /// `Pending` once exhausted
    pub fn with_statuses(self, statuses: &[ChangeStatus]) -> Self {
        self.statuses.lock().unwrap().extend(statuses.iter().copied());
        self
    }

    /// Make every status query fail
    pub fn with_status_error(self, message: &str) -> Self {
        *self.status_error.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// Submitted batches with their zone ids
    pub fn batches(&self) -> Vec<(String, ChangeBatch)> {
        self.batches.lock().unwrap().clone()
    }

    /// Virtual time of every status query
    pub fn status_times(&self) -> Vec<Instant> {
        self.status_times.lock().unwrap().clone()
    }
}

#[async_trait]
impl ZoneService for ScriptedZoneService {
    async fn find_zone(&self, dns_name: &str) -> Result<ZoneLookup> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .zones
            .lock()
            .unwrap()
            .get(dns_name)
            .cloned()
            .unwrap_or(ZoneLookup::NotFound))
    }

    async fn submit_change_batch(&self, zone_id: &str, batch: &ChangeBatch) -> Result<ChangeInfo> {
        let n = self.submit_calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(message) = self.submit_error.lock().unwrap().clone() {
            return Err(Error::provider("scripted", message));
        }

        self.batches
            .lock()
            .unwrap()
            .push((zone_id.to_string(), batch.clone()));

        Ok(ChangeInfo {
            id: format!("/change/C{}", n),
            status: *self.submit_status.lock().unwrap(),
        })
    }

    async fn get_change_status(&self, _change_id: &str) -> Result<ChangeStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status_times.lock().unwrap().push(Instant::now());

        if let Some(message) = self.status_error.lock().unwrap().clone() {
            return Err(Error::provider("scripted", message));
        }

        Ok(self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ChangeStatus::Pending))
    }

    fn service_name(&self) -> &'static str {
        "scripted"
    }
}

/// Listener that records every notification
#[derive(Default)]
pub struct RecordingListener {
    calls: Mutex<Vec<Vec<IpAddr>>>,
    started: Mutex<Vec<Instant>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Duration,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener that takes `delay` (virtual time) per notification
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Address lists received so far
    pub fn calls(&self) -> Vec<Vec<IpAddr>> {
        self.calls.lock().unwrap().clone()
    }

    /// Start time of every notification
    pub fn started(&self) -> Vec<Instant> {
        self.started.lock().unwrap().clone()
    }

    /// Highest number of concurrently running notifications
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AddressListener for RecordingListener {
    async fn on_addresses(&self, addresses: Vec<IpAddr>) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.started.lock().unwrap().push(Instant::now());
        self.calls.lock().unwrap().push(addresses);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Parse an address literal
pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid address literal")
}

/// Sorted copy of an address list, for order-insensitive comparison
pub fn sorted(mut addresses: Vec<IpAddr>) -> Vec<IpAddr> {
    addresses.sort();
    addresses
}

/// Helper to create a minimal Config for testing
pub fn minimal_config(record_type: RecordType, targets: Vec<Target>) -> Config {
    let mut config = Config::new("em0").with_record_type(record_type);
    config.targets = targets;
    config.ttl = 60;
    config.interval = Duration::from_secs(5);
    config.patience = Duration::from_secs(15);
    config.retries = 8;
    config
}

//! Contract Test: Target Isolation
//!
//! Verifies that the orchestrator converges every target independently.
//!
//! Constraints verified:
//! - A failing target does not prevent the remaining targets
//! - Targets are processed in configuration order
//! - Unconfirmed syncs are counted apart from failures
//! - Wired behind a watcher, every change reaches every target

mod common;

use common::*;
use ifdns_core::traits::{ChangeStatus, ZoneLookup, ZoneService};
use ifdns_core::{
    AddressListener, AddressSet, Converger, Orchestrator, RecordType, Target, UpdateSummary,
    Watcher,
};
use std::sync::Arc;
use std::time::Duration;

fn converger(service: &Arc<ScriptedZoneService>, max_attempts: u32) -> Arc<Converger> {
    Arc::new(Converger::new(
        Arc::clone(service) as Arc<dyn ZoneService>,
        RecordType::A,
        60,
        Duration::from_secs(15),
        max_attempts,
    ))
}

#[tokio::test(start_paused = true)]
async fn missing_zone_does_not_block_later_targets() {
    let service = Arc::new(
        ScriptedZoneService::new()
            .with_zone("example.com", ZoneLookup::Found("Z1".into()))
            .with_submit_status(ChangeStatus::Synchronized),
    );
    let orchestrator = Orchestrator::new(
        converger(&service, 8),
        vec![
            Target::new("missing.example", ["home"]),
            Target::new("example.com", ["home", "vpn"]),
        ],
    );

    let summary = orchestrator.update_all(&[ip("93.184.216.34")]).await;

    assert_eq!(
        summary,
        UpdateSummary {
            synchronized: 1,
            unconfirmed: 0,
            failed: 1,
        }
    );
    assert_eq!(service.find_calls(), 2);
    assert_eq!(service.submit_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn unconfirmed_sync_is_not_a_failure() {
    let service = Arc::new(
        ScriptedZoneService::new()
            .with_zone("example.com", ZoneLookup::Found("Z1".into()))
            .with_zone("example.net", ZoneLookup::Found("Z2".into())),
    );
    let orchestrator = Orchestrator::new(
        converger(&service, 2),
        vec![
            Target::new("example.com", ["home"]),
            Target::new("example.net", ["home"]),
        ],
    );

    let summary = orchestrator.update_all(&[ip("93.184.216.34")]).await;

    assert_eq!(summary.unconfirmed, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(service.status_calls(), 4);

    let zones: Vec<String> = service.batches().into_iter().map(|(id, _)| id).collect();
    assert_eq!(zones, vec!["Z1", "Z2"]);
}

#[tokio::test(start_paused = true)]
async fn watcher_changes_reach_every_target() {
    let service = Arc::new(
        ScriptedZoneService::new()
            .with_zone("example.com", ZoneLookup::Found("Z1".into()))
            .with_zone("example.net", ZoneLookup::Found("Z2".into()))
            .with_submit_status(ChangeStatus::Synchronized),
    );
    let orchestrator: Arc<dyn AddressListener> = Arc::new(Orchestrator::new(
        converger(&service, 8),
        vec![
            Target::new("example.com", [""]),
            Target::new("example.net", ["www"]),
        ],
    ));

    let source = ScriptedAddressSource::new(&["93.184.216.34", "10.0.0.1"]);
    let set = AddressSet::new("em0", RecordType::A.family(), Box::new(source.clone()));
    let watcher = Watcher::new(set, orchestrator, Duration::from_secs(5)).unwrap();

    assert!(watcher.tick().await);
    source.set(&["93.184.216.34", "8.8.4.4"]);
    assert!(watcher.tick().await);
    assert!(!watcher.tick().await);

    let batches = service.batches();
    assert_eq!(batches.len(), 4);

    let (_, latest) = &batches[3];
    assert_eq!(latest.names(), vec!["www.example.net."]);
    let mut values = latest.changes[0].values.clone();
    values.sort();
    assert_eq!(values, vec!["8.8.4.4", "93.184.216.34"]);
}

#[tokio::test]
async fn config_drives_the_whole_pipeline() {
    let config = minimal_config(
        RecordType::A,
        vec![Target::new("example.com", ["home"])],
    );
    config.validate().unwrap();

    let service = Arc::new(
        ScriptedZoneService::new()
            .with_zone("example.com", ZoneLookup::Found("Z1".into()))
            .with_submit_status(ChangeStatus::Synchronized),
    );
    let converger = Arc::new(Converger::from_config(
        Arc::clone(&service) as Arc<dyn ZoneService>,
        &config,
    ));
    let orchestrator = Arc::new(Orchestrator::new(converger, config.targets.clone()));

    let source = ScriptedAddressSource::new(&["93.184.216.34"]);
    let watcher = Watcher::from_config(&config, Box::new(source), orchestrator).unwrap();

    assert!(watcher.tick().await);
    assert_eq!(service.batches()[0].1.names(), vec!["home.example.com."]);
}

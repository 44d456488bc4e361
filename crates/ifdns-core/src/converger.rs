//! Drive a record update to convergence
//!
//! The converger turns a target and an address list into one upsert batch,
//! submits it, and waits (bounded) for the provider to report the change as
//! synchronized.
//!
//! ## Flow
//!
//! 1. Resolve the zone name to the provider's zone id
//! 2. Build one UPSERT per record name, replacing values, TTL and type
//! 3. Submit the whole batch
//! 4. If the change is still pending: sleep one patience interval, query the
//!    status, repeat until synchronized or the attempt budget is spent
//!
//! Running out of attempts yields [`Error::SyncTimeout`], which callers
//! should report as a warning: the write itself was accepted.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::{Config, RecordType, Target};
use crate::error::{Error, Result};
use crate::traits::{ChangeBatch, ChangeStatus, RecordChange, ZoneLookup, ZoneService};

/// State of one convergence run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAttempt {
    /// Zone name
    pub zone: String,
    /// Provider zone id
    pub zone_id: String,
    /// Fully-qualified record names in the batch
    pub names: Vec<String>,
    /// Desired record values
    pub addresses: Vec<IpAddr>,
    /// Provider change id
    pub change_id: String,
    /// Last observed sync status
    pub status: ChangeStatus,
    /// Status checks left in the budget
    pub attempts_remaining: u32,
    /// Status checks performed after submission
    pub polls: u32,
}

impl UpdateAttempt {
    /// Whether the change was observed in sync
    pub fn is_synchronized(&self) -> bool {
        self.status == ChangeStatus::Synchronized
    }
}

/// Publishes address lists to targets and waits for them to propagate
pub struct Converger {
    /// Remote DNS service
    service: Arc<dyn ZoneService>,

    /// Record type written for every name
    record_type: RecordType,

    /// TTL written for every name
    ttl: u32,

    /// Delay before each status check
    patience: Duration,

    /// Maximum number of status checks
    max_attempts: u32,
}

impl Converger {
    /// Create a converger with explicit settings
    pub fn new(
        service: Arc<dyn ZoneService>,
        record_type: RecordType,
        ttl: u32,
        patience: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            service,
            record_type,
            ttl,
            patience,
            max_attempts,
        }
    }

    /// Create a converger from the process configuration
    pub fn from_config(service: Arc<dyn ZoneService>, config: &Config) -> Self {
        Self::new(
            service,
            config.record_type,
            config.ttl,
            config.patience(),
            config.retries,
        )
    }

    /// Build the upsert batch for a target
    ///
    /// Every record name receives the same complete value set.
    pub fn change_batch(&self, target: &Target, addresses: &[IpAddr]) -> ChangeBatch {
        let values: Vec<String> = addresses.iter().map(ToString::to_string).collect();

        ChangeBatch {
            changes: target
                .fqdns()
                .into_iter()
                .map(|name| RecordChange {
                    name,
                    record_type: self.record_type,
                    ttl: self.ttl,
                    values: values.clone(),
                })
                .collect(),
        }
    }

    /// Publish `addresses` to every record of `target` and wait for sync
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateAttempt)`: the change is synchronized
    /// - `Err(Error::SyncTimeout)`: accepted, not confirmed within budget
    /// - `Err(_)`: zone lookup, submission or status query failed
    pub async fn converge(&self, target: &Target, addresses: &[IpAddr]) -> Result<UpdateAttempt> {
        let zone_id = self.resolve_zone(&target.zone).await?;
        let batch = self.change_batch(target, addresses);

        debug!(
            "{}: submitting {} upsert(s) for {:?}",
            target.zone,
            batch.len(),
            batch.names()
        );

        let info = self
            .service
            .submit_change_batch(&zone_id, &batch)
            .await
            .map_err(|e| Error::submit(&target.zone, e.to_string()))?;

        info!(
            "{}: upsert appeared to succeed (change {}, status {})",
            target.zone, info.id, info.status
        );

        let mut attempt = UpdateAttempt {
            zone: target.zone.clone(),
            zone_id,
            names: target.fqdns(),
            addresses: addresses.to_vec(),
            change_id: info.id,
            status: info.status,
            attempts_remaining: self.max_attempts,
            polls: 0,
        };

        self.wait_for_sync(&mut attempt).await?;
        Ok(attempt)
    }

    async fn resolve_zone(&self, zone: &str) -> Result<String> {
        match self.service.find_zone(zone).await? {
            ZoneLookup::Found(id) => {
                info!("found zone '{}' ID '{}'", zone, id);
                Ok(id)
            }
            ZoneLookup::NotFound => Err(Error::ZoneNotFound(zone.to_string())),
            ZoneLookup::Ambiguous => Err(Error::AmbiguousZone(zone.to_string())),
        }
    }

    async fn wait_for_sync(&self, attempt: &mut UpdateAttempt) -> Result<()> {
        while attempt.status != ChangeStatus::Synchronized {
            if attempt.attempts_remaining == 0 {
                return Err(Error::SyncTimeout {
                    zone: attempt.zone.clone(),
                    change_id: attempt.change_id.clone(),
                    attempts: attempt.polls,
                });
            }

            // We already hold one status from the previous call.
            tokio::time::sleep(self.patience).await;

            attempt.attempts_remaining -= 1;
            attempt.polls += 1;
            attempt.status = self
                .service
                .get_change_status(&attempt.change_id)
                .await
                .map_err(|e| Error::ChangeStatus {
                    zone: attempt.zone.clone(),
                    change_id: attempt.change_id.clone(),
                    message: e.to_string(),
                })?;

            info!("{}: upsert sync status: {}", attempt.zone, attempt.status);
        }

        Ok(())
    }
}

impl std::fmt::Debug for Converger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converger")
            .field("service", &self.service.service_name())
            .field("record_type", &self.record_type)
            .field("ttl", &self.ttl)
            .field("patience", &self.patience)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

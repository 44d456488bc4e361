//! Fan address changes out to every configured target
//!
//! The orchestrator is the watcher's listener. It converges each target in
//! configuration order; one target failing never stops the others.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::config::Target;
use crate::converger::Converger;
use crate::traits::AddressListener;

/// Outcome counts for one round of updates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Targets observed in sync
    pub synchronized: usize,
    /// Targets accepted but not confirmed within the poll budget
    pub unconfirmed: usize,
    /// Targets whose update failed outright
    pub failed: usize,
}

/// Wires watcher notifications to the converger
pub struct Orchestrator {
    converger: Arc<Converger>,
    targets: Vec<Target>,
}

impl Orchestrator {
    /// Create an orchestrator for the given targets
    pub fn new(converger: Arc<Converger>, targets: Vec<Target>) -> Self {
        Self { converger, targets }
    }

    /// Configured targets
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Converge every target to `addresses`
    pub async fn update_all(&self, addresses: &[IpAddr]) -> UpdateSummary {
        let mut summary = UpdateSummary::default();

        for target in &self.targets {
            match self.converger.converge(target, addresses).await {
                Ok(attempt) => {
                    info!(
                        "{}: {:?} in sync after {} check(s)",
                        target.zone, attempt.names, attempt.polls
                    );
                    summary.synchronized += 1;
                }
                Err(e) if !e.is_hard_failure() => {
                    warn!("{}: {}", target.zone, e);
                    summary.unconfirmed += 1;
                }
                Err(e) => {
                    error!("error updating DNS for {:?}: {}", target.fqdns(), e);
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}

#[async_trait]
impl AddressListener for Orchestrator {
    async fn on_addresses(&self, addresses: Vec<IpAddr>) {
        let summary = self.update_all(&addresses).await;
        info!(
            "update round finished: {} in sync, {} unconfirmed, {} failed",
            summary.synchronized, summary.unconfirmed, summary.failed
        );
    }
}

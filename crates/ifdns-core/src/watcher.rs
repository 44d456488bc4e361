//! Periodic interface watcher
//!
//! The watcher owns the [`AddressSet`] for the configured interface, polls it
//! on a fixed interval and hands the full current address list to an
//! [`AddressListener`] whenever something changed.
//!
//! ## Tick Flow
//!
//! ```text
//! interval ──► lock AddressSet ──► update() ──► delta empty? ──► unlock
//!                                     │              │
//!                                   error           no
//!                                     │              ▼
//!                                   warn      log removed/added
//!                                     │              │
//!                                   unlock    listener.on_addresses(full list)
//!                                                    │
//!                                                  unlock
//! ```
//!
//! The listener is awaited with the lock held, so a slow update delays the
//! next tick instead of overlapping it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, info, warn};

use crate::address::AddressSet;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::traits::{AddressListener, AddressSource};

/// Polls one interface and notifies a listener of address changes
pub struct Watcher {
    /// Snapshot of the interface, guarded so ticks never interleave
    addresses: Arc<Mutex<AddressSet>>,

    /// Receiver of changed address lists
    listener: Arc<dyn AddressListener>,

    /// Time between ticks
    interval: Duration,
}

impl Watcher {
    /// Create a watcher for an address set
    ///
    /// Fails if the interface does not exist right now or the interval is
    /// zero; both are startup errors.
    pub fn new(
        addresses: AddressSet,
        listener: Arc<dyn AddressListener>,
        interval: Duration,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::config("watch interval must be > 0"));
        }

        addresses.probe()?;

        info!(
            "Watching {} ({}) every {:?}",
            addresses.interface(),
            addresses.family(),
            interval
        );

        Ok(Self {
            addresses: Arc::new(Mutex::new(addresses)),
            listener,
            interval,
        })
    }

    /// Create a watcher for the interface and family named in the config
    pub fn from_config(
        config: &Config,
        source: Box<dyn AddressSource>,
        listener: Arc<dyn AddressListener>,
    ) -> Result<Self> {
        let addresses = AddressSet::new(config.interface.clone(), config.family(), source);
        Self::new(addresses, listener, config.interval())
    }

    /// Shared handle to the guarded address set
    pub fn address_set(&self) -> Arc<Mutex<AddressSet>> {
        Arc::clone(&self.addresses)
    }

    /// Run one detection cycle
    ///
    /// # Returns
    ///
    /// `true` if the listener was invoked.
    pub async fn tick(&self) -> bool {
        let mut addresses = self.addresses.lock().await;
        let interface = addresses.interface().to_string();

        let delta = match addresses.update() {
            Ok(delta) => delta,
            Err(e) => {
                warn!("{}: skipping tick: {}", interface, e);
                return false;
            }
        };

        if delta.is_empty() {
            return false;
        }

        for removed in &delta.removed {
            info!("{} removed {}", interface, removed);
        }
        for added in &delta.added {
            info!("{} added {}", interface, added);
        }

        let current = addresses.current_list();
        for address in &current {
            debug!("{} current {}", interface, address);
        }

        if current.is_empty() {
            warn!(
                "{}: no publishable addresses left, leaving records untouched",
                interface
            );
            return false;
        }

        self.listener.on_addresses(current).await;
        true
    }

    /// Poll forever
    ///
    /// The first tick fires immediately so the initial address set is
    /// published at startup.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(interval);

        while ticks.next().await.is_some() {
            self.tick().await;
        }
    }

    /// Poll until `shutdown` resolves
    ///
    /// A tick in progress is dropped at its next suspension point; remote
    /// upserts are idempotent so an interrupted update is harmless.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = self.run() => {}
            _ = shutdown => {
                info!("Watcher stopped");
            }
        }
    }
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

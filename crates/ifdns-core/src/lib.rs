// # ifdns-core
//
// Core library for the interface-driven DNS updater.
//
// ## Architecture Overview
//
// - **AddressSet**: Snapshot of one interface's publishable addresses, with deltas
// - **Watcher**: Polls the AddressSet on a fixed interval, notifies on change
// - **Converger**: Upserts records and waits (bounded) for the change to sync
// - **Orchestrator**: Watcher listener that converges every configured target
//
// ## Design Principles
//
// 1. **Full-state writes**: Listeners always receive the complete address list
// 2. **Serialized ticks**: Detection and the resulting update never overlap
// 3. **Contained failures**: A failed tick or target never stops the process
// 4. **Injected collaborators**: Interface reader and DNS service are traits

pub mod address;
pub mod config;
pub mod converger;
pub mod error;
pub mod orchestrator;
pub mod traits;
pub mod watcher;

// Re-export core types for convenience
pub use address::{AddressDelta, AddressSet};
pub use config::{AddressFamily, Config, RecordType, Target};
pub use converger::{Converger, UpdateAttempt};
pub use error::{Error, Result};
pub use orchestrator::{Orchestrator, UpdateSummary};
pub use traits::{AddressListener, AddressSource, ZoneService};
pub use watcher::Watcher;

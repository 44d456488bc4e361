// # Address Listener Trait
//
// Receives the full address list whenever the watcher sees a change.

use async_trait::async_trait;
use std::net::IpAddr;

/// Callback invoked by the [`crate::Watcher`]
///
/// The watcher awaits `on_addresses` while holding its exclusion, so two
/// invocations never overlap and the next tick does not start until the
/// listener returns. The list is always the complete current set, never a
/// delta, and is never empty.
#[async_trait]
pub trait AddressListener: Send + Sync {
    /// Handle a changed address list
    async fn on_addresses(&self, addresses: Vec<IpAddr>);
}

// # Zone Service Trait
//
// Defines the interface to the authoritative DNS service that hosts the
// managed zones.
//
// ## Implementations
//
// - AWS Route 53: `ifdns-provider-route53` crate
//
// ## Usage
//
// ```rust,ignore
// use ifdns_core::traits::{ZoneLookup, ZoneService};
//
// let service = /* ZoneService implementation */;
// if let ZoneLookup::Found(zone_id) = service.find_zone("example.com").await? {
//     let info = service.submit_change_batch(&zone_id, &batch).await?;
//     let status = service.get_change_status(&info.id).await?;
// }
// ```

use async_trait::async_trait;
use std::fmt;

use crate::config::RecordType;

/// Outcome of a name-based zone search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneLookup {
    /// Exactly one hosted zone matches; carries the provider's zone id
    Found(String),
    /// No hosted zone with that name
    NotFound,
    /// The listing was truncated, so more candidates exist than were seen
    Ambiguous,
}

/// Desired state of one record
///
/// Submitted as an upsert: the record is created if absent, otherwise its
/// value set, TTL and type are replaced wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChange {
    /// Fully-qualified record name
    pub name: String,
    /// Record type
    pub record_type: RecordType,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Record values (addresses in textual form)
    pub values: Vec<String>,
}

/// A set of record changes applied atomically by the provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    /// Changes in submission order
    pub changes: Vec<RecordChange>,
}

impl ChangeBatch {
    /// Record names touched by this batch
    pub fn names(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of changes in the batch
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether the batch carries no changes
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Propagation state of a submitted change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    /// Not yet applied on every authoritative server
    Pending,
    /// Applied everywhere (INSYNC)
    Synchronized,
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeStatus::Pending => f.write_str("PENDING"),
            ChangeStatus::Synchronized => f.write_str("INSYNC"),
        }
    }
}

/// Receipt for a submitted change batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeInfo {
    /// Provider change id, used for status queries
    pub id: String,
    /// Status reported at submission time
    pub status: ChangeStatus,
}

/// Trait for the remote DNS service
///
/// # Trust Level: Untrusted
///
/// Every method is a single remote call. Implementations must not retry,
/// sleep, or poll on their own; the [`crate::Converger`] owns the
/// wait-for-sync loop. Transport-level retries configured inside an SDK
/// client are acceptable since they are invisible at this boundary.
#[async_trait]
pub trait ZoneService: Send + Sync {
    /// Resolve a zone name to the provider's zone id
    ///
    /// Only the first page of results is inspected. A truncated listing is
    /// reported as [`ZoneLookup::Ambiguous`] rather than paginated.
    async fn find_zone(&self, dns_name: &str) -> Result<ZoneLookup, crate::Error>;

    /// Submit a batch of upserts to a zone
    ///
    /// # Returns
    ///
    /// - `Ok(ChangeInfo)`: the batch was accepted
    /// - `Err(Error)`: transport or API failure
    async fn submit_change_batch(
        &self,
        zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<ChangeInfo, crate::Error>;

    /// Query the propagation state of a previously submitted change
    async fn get_change_status(&self, change_id: &str) -> Result<ChangeStatus, crate::Error>;

    /// Name of the service (for logging)
    fn service_name(&self) -> &'static str;
}

// # Route 53 Zone Service
//
// This crate implements `ZoneService` on top of Amazon Route 53 via the
// official AWS SDK.
//
// ## Behaviour
//
// - One API call per trait method: ListHostedZonesByName, ChangeResourceRecordSets
//   or GetChange
// - No polling or sleeping here; the converger owns the wait-for-sync loop
// - Transport retries are left to the SDK's standard retry policy, configured
//   with the same attempt budget as the sync checks
// - Dry-run mode (IFDNS_MODE=dry-run) resolves zones for real but never submits
//
// ## Credentials
//
// Credentials and region come from the ambient AWS configuration
// (environment, shared profile, instance metadata). They never appear in logs.
//
// ## API Reference
//
// - ListHostedZonesByName: https://docs.aws.amazon.com/Route53/latest/APIReference/API_ListHostedZonesByName.html
// - ChangeResourceRecordSets: https://docs.aws.amazon.com/Route53/latest/APIReference/API_ChangeResourceRecordSets.html
// - GetChange: https://docs.aws.amazon.com/Route53/latest/APIReference/API_GetChange.html

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::RetryConfig;
use aws_sdk_route53::Client;
use aws_sdk_route53::error::DisplayErrorContext;
use aws_sdk_route53::types;
use ifdns_core::config::RecordType;
use ifdns_core::traits::{ChangeBatch, ChangeInfo, ChangeStatus, ZoneLookup, ZoneService};
use ifdns_core::{Error, Result};

/// Route 53 is a global service; its API lives in us-east-1
const FALLBACK_REGION: &str = "us-east-1";

/// Change id reported for batches that were not submitted
pub const DRY_RUN_CHANGE_ID: &str = "dry-run";

/// Environment variable selecting the run mode
pub const MODE_ENV: &str = "IFDNS_MODE";

const PROVIDER: &str = "route53";

/// Route 53 zone service
///
/// # Trust Level: Untrusted
///
/// Stateless and single-shot. All coordination (sync polling, scheduling,
/// per-target isolation) is owned by the converger and orchestrator.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true the service will:
/// - Perform zone lookups
/// - Log the change batch it would have submitted
/// - Report the change as already synchronized
pub struct Route53Service {
    /// SDK client
    client: Client,

    /// Dry-run mode: if true, resolve zones but skip submissions
    dry_run: bool,
}

impl std::fmt::Debug for Route53Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route53Service")
            .field("credentials", &"<ambient>")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Route53Service {
    /// Wrap an existing SDK client
    pub fn new(client: Client, dry_run: bool) -> Self {
        Self { client, dry_run }
    }

    /// Build a client from the ambient AWS configuration
    ///
    /// `max_attempts` bounds the SDK's own transport retries.
    pub async fn from_env(max_attempts: u32, dry_run: bool) -> Self {
        let region = RegionProviderChain::default_provider().or_else(FALLBACK_REGION);
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .retry_config(RetryConfig::standard().with_max_attempts(max_attempts.max(1)))
            .load()
            .await;

        if dry_run {
            tracing::warn!("Route 53 service running in DRY-RUN mode - no changes will be made");
        }

        Self::new(Client::new(&sdk_config), dry_run)
    }

    /// Whether submissions are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

/// Whether a mode value selects dry-run
pub fn is_dry_run_mode(mode: Option<&str>) -> bool {
    mode.is_some_and(|m| m.trim().eq_ignore_ascii_case("dry-run"))
}

/// Compare zone names, ignoring case and a trailing dot
pub fn zone_name_matches(listed: &str, wanted: &str) -> bool {
    listed
        .trim_end_matches('.')
        .eq_ignore_ascii_case(wanted.trim_end_matches('.'))
}

/// Pick the zone id for `wanted` from one page of a listing
///
/// ListHostedZonesByName returns zones starting at the requested name in
/// lexicographic order, so the first entry is only the answer if its name
/// actually matches.
pub fn select_zone<'a, I>(wanted: &str, truncated: bool, zones: I) -> ZoneLookup
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    if truncated {
        return ZoneLookup::Ambiguous;
    }

    zones
        .into_iter()
        .find(|(name, _)| zone_name_matches(name, wanted))
        .map_or(ZoneLookup::NotFound, |(_, id)| ZoneLookup::Found(id.to_string()))
}

fn rr_type(record_type: RecordType) -> types::RrType {
    match record_type {
        RecordType::A => types::RrType::A,
        RecordType::Aaaa => types::RrType::Aaaa,
    }
}

fn change_status(status: &types::ChangeStatus) -> ChangeStatus {
    match status {
        types::ChangeStatus::Insync => ChangeStatus::Synchronized,
        _ => ChangeStatus::Pending,
    }
}

fn build_error(e: impl std::fmt::Display) -> Error {
    Error::provider(PROVIDER, format!("invalid change batch: {}", e))
}

/// Convert a change batch into its SDK form, one UPSERT per record
pub fn to_sdk_batch(batch: &ChangeBatch) -> Result<types::ChangeBatch> {
    let mut changes = Vec::with_capacity(batch.len());

    for change in &batch.changes {
        let records = change
            .values
            .iter()
            .map(|value| types::ResourceRecord::builder().value(value).build())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(build_error)?;

        let record_set = types::ResourceRecordSet::builder()
            .name(&change.name)
            .r#type(rr_type(change.record_type))
            .ttl(i64::from(change.ttl))
            .set_resource_records(Some(records))
            .build()
            .map_err(build_error)?;

        changes.push(
            types::Change::builder()
                .action(types::ChangeAction::Upsert)
                .resource_record_set(record_set)
                .build()
                .map_err(build_error)?,
        );
    }

    types::ChangeBatch::builder()
        .set_changes(Some(changes))
        .build()
        .map_err(build_error)
}

fn change_info<'a>(
    info: impl Into<Option<&'a types::ChangeInfo>>,
    operation: &str,
) -> Result<ChangeInfo> {
    let info = info.into().ok_or_else(|| {
        Error::provider(PROVIDER, format!("{} response carried no ChangeInfo", operation))
    })?;

    Ok(ChangeInfo {
        id: info.id().to_string(),
        status: change_status(info.status()),
    })
}

#[async_trait]
impl ZoneService for Route53Service {
    async fn find_zone(&self, dns_name: &str) -> Result<ZoneLookup> {
        tracing::debug!("Looking up hosted zone: {}", dns_name);

        let output = self
            .client
            .list_hosted_zones_by_name()
            .dns_name(dns_name)
            .send()
            .await
            .map_err(|e| {
                Error::provider(
                    PROVIDER,
                    format!("unable to find zone: {}", DisplayErrorContext(&e)),
                )
            })?;

        let lookup = select_zone(
            dns_name,
            output.is_truncated(),
            output
                .hosted_zones()
                .iter()
                .map(|zone| (zone.name(), zone.id())),
        );

        if lookup == ZoneLookup::Ambiguous {
            tracing::warn!(
                "zone search for '{}' returned more than one page of results",
                dns_name
            );
        }

        Ok(lookup)
    }

    async fn submit_change_batch(&self, zone_id: &str, batch: &ChangeBatch) -> Result<ChangeInfo> {
        let sdk_batch = to_sdk_batch(batch)?;

        if self.dry_run {
            for change in &batch.changes {
                tracing::info!(
                    "[DRY-RUN] Would UPSERT {} {} ttl {} -> {:?} in {}",
                    change.name,
                    change.record_type,
                    change.ttl,
                    change.values,
                    zone_id
                );
            }
            return Ok(ChangeInfo {
                id: DRY_RUN_CHANGE_ID.to_string(),
                status: ChangeStatus::Synchronized,
            });
        }

        let output = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(zone_id)
            .change_batch(sdk_batch)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, DisplayErrorContext(&e).to_string()))?;

        change_info(output.change_info(), "ChangeResourceRecordSets")
    }

    async fn get_change_status(&self, change_id: &str) -> Result<ChangeStatus> {
        if change_id == DRY_RUN_CHANGE_ID {
            return Ok(ChangeStatus::Synchronized);
        }

        let output = self
            .client
            .get_change()
            .id(change_id)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, DisplayErrorContext(&e).to_string()))?;

        Ok(change_info(output.change_info(), "GetChange")?.status)
    }

    fn service_name(&self) -> &'static str {
        PROVIDER
    }
}

//! Error types for the interface DNS updater
//!
//! Errors fall into three groups: per-tick detection failures, per-target
//! convergence failures and one-time startup failures. Only the last group
//! is ever allowed to stop the process.

use thiserror::Error;

/// Result type alias for ifdns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the interface DNS updater
#[derive(Error, Debug)]
pub enum Error {
    /// The interface does not exist or its addresses cannot be enumerated
    #[error("Interface lookup failed for '{interface}': {message}")]
    InterfaceLookup {
        /// Interface name
        interface: String,
        /// Error message
        message: String,
    },

    /// An address observed on the interface could not be parsed
    #[error("Unable to parse address '{address}' on interface '{interface}'")]
    AddressParse {
        /// Interface name
        interface: String,
        /// The offending address text
        address: String,
    },

    /// No hosted zone matches the configured zone name
    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    /// The provider's zone listing was truncated, so the match is ambiguous
    #[error("Unsupported: zone search for '{0}' returned more than one page of results")]
    AmbiguousZone(String),

    /// The change batch was rejected or could not be delivered
    #[error("{zone}: unable to upsert: {message}")]
    Submit {
        /// Zone name
        zone: String,
        /// Error message
        message: String,
    },

    /// A sync-status query failed while waiting for a change
    #[error("{zone}: error waiting for change {change_id} to be in sync: {message}")]
    ChangeStatus {
        /// Zone name
        zone: String,
        /// Provider change id
        change_id: String,
        /// Error message
        message: String,
    },

    /// The change was accepted but did not report in sync within budget
    #[error("{zone}: change {change_id} still pending after {attempts} sync check(s)")]
    SyncTimeout {
        /// Zone name
        zone: String,
        /// Provider change id
        change_id: String,
        /// Number of status queries made
        attempts: u32,
    },

    /// Provider transport error outside of submission
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// YAML deserialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create an interface lookup error
    pub fn interface_lookup(interface: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InterfaceLookup {
            interface: interface.into(),
            message: message.into(),
        }
    }

    /// Create an address parse error
    pub fn address_parse(interface: impl Into<String>, address: impl Into<String>) -> Self {
        Self::AddressParse {
            interface: interface.into(),
            address: address.into(),
        }
    }

    /// Create a submission error
    pub fn submit(zone: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Submit {
            zone: zone.into(),
            message: message.into(),
        }
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error means the remote write did not happen.
    ///
    /// A sync timeout is reported separately: the change was accepted and
    /// will most likely converge, it just was not observed doing so.
    pub fn is_hard_failure(&self) -> bool {
        !matches!(self, Self::SyncTimeout { .. })
    }
}

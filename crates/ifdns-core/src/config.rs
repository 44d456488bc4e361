//! Configuration types for the interface DNS updater
//!
//! The configuration is loaded once at startup and shared read-only by every
//! component afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Network interface to observe (e.g. "em0")
    pub interface: String,

    /// Record type to publish; also selects the address family
    #[serde(rename = "type", default = "default_record_type")]
    pub record_type: RecordType,

    /// Time-to-live applied to every upserted record
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Time between interface polls, written as a duration ("5s", "1m")
    #[serde(default = "default_interval", with = "duration_text")]
    pub interval: Duration,

    /// Time to wait before each sync-status check
    #[serde(default = "default_patience", with = "duration_text")]
    pub patience: Duration,

    /// Maximum number of sync-status checks per update
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Zones and record names to keep pointed at the interface
    pub targets: Vec<Target>,
}

impl Config {
    /// Create a configuration with defaults for the given interface
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            record_type: default_record_type(),
            ttl: default_ttl(),
            interval: default_interval(),
            patience: default_patience(),
            retries: default_retries(),
            targets: Vec::new(),
        }
    }

    /// Add a target
    pub fn with_target(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    /// Set the record type
    pub fn with_record_type(mut self, record_type: RecordType) -> Self {
        self.record_type = record_type;
        self
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self, crate::Error> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!(
                "unable to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interface.trim().is_empty() {
            return Err(crate::Error::config("No interface configured"));
        }

        if self.targets.is_empty() {
            return Err(crate::Error::config("No targets configured"));
        }

        for target in &self.targets {
            target.validate()?;
        }

        if self.interval.is_zero() {
            return Err(crate::Error::config("interval must be > 0"));
        }

        if self.retries == 0 {
            return Err(crate::Error::config("retries must be > 0"));
        }

        if self.ttl == 0 {
            return Err(crate::Error::config("ttl must be > 0"));
        }

        Ok(())
    }

    /// Address family implied by the record type
    pub fn family(&self) -> AddressFamily {
        self.record_type.family()
    }

    /// Interval between interface polls
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Delay between sync-status checks
    pub fn patience(&self) -> Duration {
        self.patience
    }
}

/// A zone plus the record names inside it that should follow the interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// DNS zone name (e.g. "example.com"), not the provider's zone id
    pub zone: String,

    /// Record name prefixes; "" is the zone apex
    pub names: Vec<String>,
}

impl Target {
    /// Create a new target
    pub fn new<I, S>(zone: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            zone: zone.into(),
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Fully-qualified, dot-terminated name for every configured prefix
    pub fn fqdns(&self) -> Vec<String> {
        let zone = self.zone.trim_end_matches('.');
        self.names
            .iter()
            .map(|name| {
                if name.is_empty() {
                    format!("{}.", zone)
                } else {
                    format!("{}.{}.", name, zone)
                }
            })
            .collect()
    }

    fn validate(&self) -> Result<(), crate::Error> {
        if self.zone.trim_end_matches('.').is_empty() {
            return Err(crate::Error::config("Target zone cannot be empty"));
        }
        if self.names.is_empty() {
            return Err(crate::Error::config(format!(
                "Target {} has no record names",
                self.zone
            )));
        }
        Ok(())
    }
}

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Address family published by this record type
    pub fn family(self) -> AddressFamily {
        match self {
            RecordType::A => AddressFamily::V4,
            RecordType::Aaaa => AddressFamily::V6,
        }
    }

    /// Wire name of the record type
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address family watched on the interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// IPv4 (inet)
    V4,
    /// IPv6 (inet6)
    V6,
}

impl AddressFamily {
    /// Whether the address belongs to this family
    pub fn matches(self, ip: &IpAddr) -> bool {
        match self {
            AddressFamily::V4 => ip.is_ipv4(),
            AddressFamily::V6 => ip.is_ipv6(),
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => f.write_str("inet"),
            AddressFamily::V6 => f.write_str("inet6"),
        }
    }
}

fn default_record_type() -> RecordType {
    RecordType::A
}

fn default_ttl() -> u32 {
    60
}

fn default_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_patience() -> Duration {
    Duration::from_secs(15)
}

fn default_retries() -> u32 {
    8
}

/// Durations in the config file are human-readable strings such as
/// "15s", "1m30s" or "500ms"
mod duration_text {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(text.trim())
            .map_err(|e| D::Error::custom(format!("invalid duration {:?}: {}", text, e)))
    }
}

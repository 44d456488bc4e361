//! Core traits for the interface DNS updater
//!
//! - [`AddressSource`]: Read the addresses bound to an interface
//! - [`ZoneService`]: Talk to the authoritative DNS service
//! - [`AddressListener`]: Receive changed address lists from the watcher

pub mod address_listener;
pub mod address_source;
pub mod zone_service;

pub use address_listener::AddressListener;
pub use address_source::AddressSource;
pub use zone_service::{
    ChangeBatch, ChangeInfo, ChangeStatus, RecordChange, ZoneLookup, ZoneService,
};

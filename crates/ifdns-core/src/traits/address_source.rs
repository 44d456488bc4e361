// # Address Source Trait
//
// Defines the interface for reading the addresses bound to a network
// interface.
//
// ## Implementations
//
// - getifaddrs(3): `ifdns-ifaddrs` crate
//
// ## Usage
//
// ```rust,ignore
// use ifdns_core::AddressSource;
//
// let source = /* AddressSource implementation */;
// if source.interface_exists("em0")? {
//     for addr in source.addresses("em0")? {
//         println!("{addr}");
//     }
// }
// ```

/// Trait for interface address readers
///
/// Implementations report every address bound to the interface, of any
/// family, as text in plain (`2001:db8::1`) or CIDR (`192.0.2.7/24`)
/// notation. Filtering and parsing belong to [`crate::AddressSet`].
///
/// # Trust Level: Semi-Trusted
///
/// Sources perform platform I/O only. They must not:
/// - cache results between calls
/// - decide whether an address is worth publishing
/// - spawn tasks or sleep
///
/// Calls are synchronous and expected to return promptly; the watcher
/// invokes them once per tick.
pub trait AddressSource: Send + Sync {
    /// Check whether the interface currently exists
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: the interface is known to the system
    /// - `Ok(false)`: no such interface
    /// - `Err(Error)`: the system could not be queried
    fn interface_exists(&self, interface: &str) -> Result<bool, crate::Error>;

    /// List the addresses bound to the interface
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<String>)`: textual addresses, possibly empty
    /// - `Err(Error::InterfaceLookup)`: the interface is missing or its
    ///   addresses cannot be enumerated
    fn addresses(&self, interface: &str) -> Result<Vec<String>, crate::Error>;
}

impl<T: AddressSource + ?Sized> AddressSource for Box<T> {
    fn interface_exists(&self, interface: &str) -> Result<bool, crate::Error> {
        (**self).interface_exists(interface)
    }

    fn addresses(&self, interface: &str) -> Result<Vec<String>, crate::Error> {
        (**self).addresses(interface)
    }
}

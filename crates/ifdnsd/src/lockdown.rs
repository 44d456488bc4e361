// # Privilege Reduction
//
// On OpenBSD the daemon restricts itself once the AWS client exists:
//
// - unveil(2): only the CA bundle stays visible, read-only
// - pledge(2): stdio, read-only file access, sockets and DNS
//
// Everything the daemon does afterwards (getifaddrs, HTTPS to Route 53) fits
// inside these promises. Credentials must therefore be resolvable without
// reading files other than the CA bundle, e.g. from the environment.
//
// On every other platform lockdown is a no-op.

use anyhow::Result;

#[cfg(target_os = "openbsd")]
const CA_BUNDLE: &str = "/etc/ssl/cert.pem";

#[cfg(target_os = "openbsd")]
const PROMISES: &str = "stdio rpath inet dns";

/// Restrict filesystem visibility and system calls
#[cfg(target_os = "openbsd")]
pub fn lockdown() -> Result<()> {
    use std::ffi::CString;
    use std::io;

    let path = CString::new(CA_BUNDLE)?;
    let permissions = CString::new("r")?;
    // SAFETY: both arguments are valid NUL-terminated strings.
    if unsafe { libc::unveil(path.as_ptr(), permissions.as_ptr()) } == -1 {
        anyhow::bail!("unveil {}: {}", CA_BUNDLE, io::Error::last_os_error());
    }

    let promises = CString::new(PROMISES)?;
    // SAFETY: promises is NUL-terminated; a null execpromises leaves them unchanged.
    if unsafe { libc::pledge(promises.as_ptr(), std::ptr::null()) } == -1 {
        anyhow::bail!("pledge: {}", io::Error::last_os_error());
    }

    tracing::info!("Locked down: unveil {} (r), pledge \"{}\"", CA_BUNDLE, PROMISES);
    Ok(())
}

/// Restrict filesystem visibility and system calls
#[cfg(not(target_os = "openbsd"))]
pub fn lockdown() -> Result<()> {
    tracing::debug!("Lockdown not supported on this platform, skipping");
    Ok(())
}

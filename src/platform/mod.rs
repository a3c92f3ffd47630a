// SPDX-License-Identifier: GPL-3.0-only
//! OS implementations of the collaborator ports.

#[cfg(windows)]
pub mod windows;

/// Registry wired to the native ports of the running OS.
#[cfg(windows)]
pub fn native_registry() -> crate::registry::MonitorRegistry {
    crate::registry::MonitorRegistry::new(
        Box::new(windows::Win32DdcPort::new()),
        Box::new(windows::WbemWmiPort::new()),
    )
}

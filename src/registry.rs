// SPDX-License-Identifier: GPL-3.0-only
//! The monitor registry: exclusive owner of the entity sequence.
//!
//! Everything the surrounding application does with displays goes
//! through this one type: enumerate, read or set the normalized
//! percentage, refresh cached values, dump diagnostics, destroy. All
//! operations are synchronous and may block for a hardware bus
//! transaction or an instrumentation round trip; the registry holds no
//! internal locks, so concurrent callers must serialize access
//! themselves.

use std::io::Write;

use tracing::{debug, info};

use crate::error::{BrightlinkError, Result};
use crate::monitor::{self, ActiveControlMut, Monitor, MonitorSummary};
use crate::protocols::{DdcPort, WmiPort, ddc, wmi};

/// Owns all display entities and their native handles, and drives the
/// `Empty -> Enumerated -> (Active <-> Refreshed) -> Destroyed`
/// lifecycle. Dropping the registry releases every handle.
pub struct MonitorRegistry {
    monitors: Vec<Monitor>,
    ddc: Box<dyn DdcPort>,
    wmi: Box<dyn WmiPort>,
}

impl MonitorRegistry {
    /// Create an empty registry over the given collaborator ports.
    pub fn new(ddc: Box<dyn DdcPort>, wmi: Box<dyn WmiPort>) -> Self {
        Self {
            monitors: Vec::new(),
            ddc,
            wmi,
        }
    }

    /// Run a full enumeration pass, replacing any prior entity
    /// sequence (indices restart at 0; no identity carries over).
    ///
    /// Order: direct-channel enumeration, then the instrumentation
    /// identify/bind pass, then one instrumentation brightness read.
    /// Completes even when the instrumentation backend is entirely
    /// absent; entities then simply remain unbound. Returns the number
    /// of entities found.
    pub fn enumerate(&mut self) -> Result<usize> {
        self.destroy();
        self.monitors =
            ddc::enumerate(self.ddc.as_mut()).map_err(BrightlinkError::Enumeration)?;
        wmi::identify_and_bind(self.wmi.as_mut(), &mut self.monitors);
        wmi::read_pass(self.wmi.as_mut(), &mut self.monitors);
        info!(count = self.monitors.len(), "enumerated displays");
        Ok(self.monitors.len())
    }

    /// Re-poll cached brightness values.
    ///
    /// The direct channel is re-read for every entity unconditionally
    /// (a successful read also recovers a display whose initial probe
    /// failed). The instrumentation read runs only if at least one
    /// entity is bound, skipping the expensive round trip otherwise.
    pub fn refresh(&mut self) {
        for monitor in &mut self.monitors {
            ddc::refresh(self.ddc.as_mut(), monitor);
        }
        if self.monitors.iter().any(Monitor::is_bound) {
            wmi::read_pass(self.wmi.as_mut(), &mut self.monitors);
        } else {
            debug!("no bound entities, skipping instrumentation refresh");
        }
    }

    /// Normalized brightness of one display, 0-100.
    pub fn percent(&self, index: usize) -> Result<u32> {
        Ok(self.get(index)?.percent())
    }

    /// Set one display's brightness from a 0-100 percentage.
    ///
    /// The native value goes to whichever backend is active (direct
    /// channel preferred); on success the cached current value is
    /// updated locally without a read-back. A display with no usable
    /// backend, or an active backend with a non-positive range, makes
    /// this a no-op. Write failures propagate: they are writes that did
    /// not take effect.
    pub fn set_percent(&mut self, index: usize, percent: u32) -> Result<()> {
        let percent = percent.min(100);
        let Self { monitors, ddc, wmi } = self;
        let monitor = monitors
            .get_mut(index)
            .ok_or(BrightlinkError::MonitorNotFound(index))?;
        let handle = monitor.handle;
        match monitor.active_control_mut() {
            ActiveControlMut::Unsupported => {}
            ActiveControlMut::Direct(direct) => {
                let Some(value) = monitor::native_from_percent(percent, direct.min, direct.max)
                else {
                    return Ok(());
                };
                ddc.write_brightness(handle, value)
                    .map_err(|e| BrightlinkError::DirectControl { index, source: e })?;
                direct.current = value;
            }
            ActiveControlMut::Instrumentation(link) => {
                let Some(value) = monitor::native_from_percent(percent, link.min, link.max)
                else {
                    return Ok(());
                };
                wmi::set_brightness(wmi.as_mut(), &link.instance, value)
                    .map_err(|e| BrightlinkError::Instrumentation { index, source: e })?;
                link.current = value;
            }
        }
        Ok(())
    }

    /// Ordered consumer view of every entity.
    pub fn summary(&self) -> Vec<MonitorSummary> {
        self.monitors.iter().map(Monitor::summary).collect()
    }

    /// Write the diagnostic dump for every entity.
    pub fn dump<W: Write>(&self, w: &mut W) -> Result<()> {
        for monitor in &self.monitors {
            monitor.dump_into(w)?;
        }
        Ok(())
    }

    /// One entity by index.
    pub fn get(&self, index: usize) -> Result<&Monitor> {
        self.monitors
            .get(index)
            .ok_or(BrightlinkError::MonitorNotFound(index))
    }

    /// All entities, in index order.
    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    /// Release every native handle and discard the entity sequence.
    ///
    /// Idempotent and safe on an empty or partially populated registry;
    /// also runs on drop. Handles acquired before a mid-enumeration
    /// failure are released here like any other.
    pub fn destroy(&mut self) {
        if self.monitors.is_empty() {
            return;
        }
        debug!(count = self.monitors.len(), "destroying display entities");
        for monitor in self.monitors.drain(..) {
            self.ddc.release(monitor.handle);
        }
    }
}

impl Drop for MonitorRegistry {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for MonitorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorRegistry")
            .field("monitors", &self.monitors)
            .finish_non_exhaustive()
    }
}

// SPDX-License-Identifier: GPL-3.0-only
//! Backend A: enumeration and brightness over the direct control
//! channel.
//!
//! For every logical surface, every physical display on it is visited
//! in order, so indices stay contiguous across surfaces. Per-display
//! failures are logged and never abort the pass: a display with no
//! brightness capability is still a valid entity (the instrumentation
//! backend may yet cover it), and a surface whose physical query fails
//! simply contributes no entities.

use anyhow::Result;
use tracing::{debug, error};

use crate::correlate;
use crate::monitor::Monitor;
use crate::protocols::{CAP_BRIGHTNESS, DdcPort};

/// Enumerate all physical displays into fresh entities.
///
/// Errors only when the logical-surface enumeration itself fails;
/// everything downstream of that degrades per entity. The returned
/// entities own their native handles; the caller is responsible for
/// releasing them through the port.
pub fn enumerate(port: &mut dyn DdcPort) -> Result<Vec<Monitor>> {
    let surfaces = port.logical_surfaces()?;
    debug!(count = surfaces.len(), "logical surfaces");

    let mut monitors = Vec::new();
    for surface in &surfaces {
        let physical = match port.physical_displays(surface) {
            Ok(physical) => physical,
            Err(e) => {
                error!(surface = %surface.id, "physical display query failed: {e:#}");
                continue;
            }
        };
        for (i, display) in physical.into_iter().enumerate() {
            let paths = port.device_paths(surface, i);
            let key = correlate::derive_key(&paths.device_id);
            let mut monitor =
                Monitor::new(monitors.len(), display, surface.id.clone(), paths, key);
            probe(port, &mut monitor);
            monitors.push(monitor);
        }
    }
    Ok(monitors)
}

/// Initial capability probe for a freshly created entity.
///
/// `supported` becomes true only when the brightness capability bit is
/// present and the initial read succeeds; any failure leaves it false
/// until a later refresh read succeeds.
fn probe(port: &mut dyn DdcPort, monitor: &mut Monitor) {
    match port.capabilities(monitor.handle) {
        Ok(caps) if caps & CAP_BRIGHTNESS != 0 => {
            refresh(port, monitor);
        }
        Ok(_) => {
            debug!(index = monitor.index, "no direct brightness capability");
        }
        Err(e) => {
            // Expected for internal panels without DDC; the
            // instrumentation backend may still bind this entity.
            debug!(index = monitor.index, "capability query failed: {e:#}");
        }
    }
}

/// Re-read the native brightness triplet for one entity.
///
/// A successful read updates the cached values and marks the direct
/// channel supported; a failure changes nothing, so stale values and
/// the supported flag survive transient bus errors.
pub fn refresh(port: &mut dyn DdcPort, monitor: &mut Monitor) {
    match port.read_brightness(monitor.handle) {
        Ok(triplet) => {
            monitor.direct.supported = true;
            monitor.direct.min = triplet.min;
            monitor.direct.current = triplet.current;
            monitor.direct.max = triplet.max;
        }
        Err(e) => {
            debug!(index = monitor.index, "brightness read failed: {e:#}");
        }
    }
}

// SPDX-License-Identifier: GPL-3.0-only
//! Backend B: the management instrumentation client.
//!
//! Three independent passes, each under its own freshly connected
//! session: identify (feeds the correlator), read brightness (fills
//! native ranges for bound entities), and set brightness (remote method
//! invocation). A connect failure abandons that one pass only; the
//! direct-channel entities are untouched and a later refresh may
//! succeed.

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::correlate;
use crate::monitor::Monitor;
use crate::protocols::WmiPort;

/// Command timeout, in seconds, passed to the remote set method.
pub const SET_BRIGHTNESS_TIMEOUT_SECS: u32 = 1;

/// Decode a fixed-width character code array.
///
/// These fields carry no length; the string is bounded by the array
/// itself and an embedded NUL terminator when the name is shorter than
/// the field. Invalid code units decode lossily.
pub fn decode_fixed_width(codes: &[u16]) -> String {
    let end = codes.iter().position(|&c| c == 0).unwrap_or(codes.len());
    String::from_utf16_lossy(&codes[..end])
}

/// Identify pass: query every instrumentation-visible display and run
/// the binding heuristic over the returned instance paths.
///
/// Unavailability is logged and swallowed; entities simply remain
/// unbound for now.
pub fn identify_and_bind(port: &mut dyn WmiPort, monitors: &mut [Monitor]) {
    let mut session = match port.connect() {
        Ok(session) => session,
        Err(e) => {
            warn!("instrumentation unavailable for identify: {e:#}");
            return;
        }
    };
    let records = match session.identify() {
        Ok(records) => records,
        Err(e) => {
            warn!("instrumentation identify failed: {e:#}");
            return;
        }
    };
    drop(session);

    for record in &records {
        debug!(
            instance = %record.instance,
            manufacturer = %decode_fixed_width(&record.manufacturer),
            name = %decode_fixed_width(&record.friendly_name),
            "instrumentation identity"
        );
    }
    correlate::bind_identities(monitors, records.iter().map(|r| r.instance.as_str()));
}

/// Read pass: fill native range and current value for bound entities.
///
/// Rows match entities by exact equality of the full instance path.
/// The default range assumes levels 0..levels-1 in unit steps; when the
/// backend reports an explicit level array with more than one element,
/// its first and last elements override min and max (still assuming
/// uniform unit steps in between; sparse level sets are unsupported).
pub fn read_pass(port: &mut dyn WmiPort, monitors: &mut [Monitor]) {
    let mut session = match port.connect() {
        Ok(session) => session,
        Err(e) => {
            warn!("instrumentation unavailable for brightness read: {e:#}");
            return;
        }
    };
    let rows = match session.read_brightness() {
        Ok(rows) => rows,
        Err(e) => {
            warn!("instrumentation brightness read failed: {e:#}");
            return;
        }
    };
    drop(session);

    for row in rows {
        let matched = monitors
            .iter_mut()
            .find(|m| m.link.as_ref().is_some_and(|l| l.instance == row.instance));
        let Some(monitor) = matched else {
            debug!(instance = %row.instance, "brightness row for unbound instance");
            continue;
        };
        let Some(link) = monitor.link.as_mut() else {
            continue;
        };
        link.current = row.current;
        link.min = 0;
        link.max = row.levels.saturating_sub(1);
        if let Some(levels) = &row.level_values {
            if let [first, .., last] = levels.as_slice() {
                link.min = *first;
                link.max = *last;
            }
        }
    }
}

/// Invoke the remote set-brightness method against one bound instance.
///
/// Unlike the query passes, failure here is a write that did not take
/// effect and must surface to the caller.
pub fn set_brightness(port: &mut dyn WmiPort, instance: &str, level: u32) -> Result<()> {
    let mut session = port
        .connect()
        .context("instrumentation unavailable for set")?;
    session.set_brightness(instance, SET_BRIGHTNESS_TIMEOUT_SECS, level)
}

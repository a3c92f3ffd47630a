// SPDX-License-Identifier: GPL-3.0-only
//! Display entity model and brightness normalization.
//!
//! A [`Monitor`] is one physical display output. Its brightness may be
//! controllable over the direct channel, over the instrumentation
//! interface, or not at all; [`Monitor::active_control`] collapses that
//! into a single capability tag so the 0-100 normalization is written
//! once instead of per call site.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::protocols::{DevicePaths, NativeHandle, PhysicalDisplay};

/// Direct control channel state for one display.
///
/// `supported == false` means the min/current/max values are
/// meaningless and must be ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectControl {
    pub supported: bool,
    pub min: u32,
    pub current: u32,
    pub max: u32,
}

/// Instrumentation binding for one display. Presence means correlation
/// succeeded; the values are valid only after at least one brightness
/// read pass.
#[derive(Debug, Clone)]
pub struct InstrumentationLink {
    /// Full bound instance path, e.g. `DISPLAY\ACME1234\...\_0`.
    pub instance: String,
    pub min: u32,
    pub current: u32,
    pub max: u32,
}

impl InstrumentationLink {
    pub(crate) fn new(instance: String) -> Self {
        Self {
            instance,
            min: 0,
            current: 0,
            max: 0,
        }
    }
}

/// Which backend answers for a display's brightness. Preference order
/// is direct channel first, instrumentation second.
#[derive(Debug)]
pub enum ActiveControl<'a> {
    Unsupported,
    Direct(&'a DirectControl),
    Instrumentation(&'a InstrumentationLink),
}

pub(crate) enum ActiveControlMut<'a> {
    Unsupported,
    Direct(&'a mut DirectControl),
    Instrumentation(&'a mut InstrumentationLink),
}

/// One physical display output.
///
/// Created only during a full enumeration pass and owned exclusively by
/// the registry, along with the native handle.
#[derive(Debug)]
pub struct Monitor {
    pub(crate) index: usize,
    pub(crate) description: String,
    pub(crate) surface: String,
    pub(crate) device_name: String,
    pub(crate) device_id: String,
    pub(crate) correlation_key: String,
    pub(crate) handle: NativeHandle,
    pub(crate) direct: DirectControl,
    pub(crate) link: Option<InstrumentationLink>,
}

impl Monitor {
    pub(crate) fn new(
        index: usize,
        physical: PhysicalDisplay,
        surface: String,
        paths: DevicePaths,
        correlation_key: String,
    ) -> Self {
        Self {
            index,
            description: physical.description,
            surface,
            device_name: paths.device_name,
            device_id: paths.device_id,
            correlation_key,
            handle: physical.handle,
            direct: DirectControl::default(),
            link: None,
        }
    }

    /// Stable position in flattened enumeration order, starting at 0.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Human-readable name reported by the direct channel.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Key derived from the device path, expected to be a leading
    /// substring of some instrumentation instance path. Empty when the
    /// path was undeterminable.
    pub fn correlation_key(&self) -> &str {
        &self.correlation_key
    }

    /// Whether an instrumentation identity has been bound.
    pub fn is_bound(&self) -> bool {
        self.link.is_some()
    }

    /// Whether any backend can control this display's brightness.
    pub fn has_brightness(&self) -> bool {
        self.direct.supported || self.link.is_some()
    }

    /// The backend that answers for this display, direct channel first.
    pub fn active_control(&self) -> ActiveControl<'_> {
        if self.direct.supported {
            ActiveControl::Direct(&self.direct)
        } else if let Some(link) = &self.link {
            ActiveControl::Instrumentation(link)
        } else {
            ActiveControl::Unsupported
        }
    }

    pub(crate) fn active_control_mut(&mut self) -> ActiveControlMut<'_> {
        if self.direct.supported {
            ActiveControlMut::Direct(&mut self.direct)
        } else if let Some(link) = &mut self.link {
            ActiveControlMut::Instrumentation(link)
        } else {
            ActiveControlMut::Unsupported
        }
    }

    /// Normalized brightness on the 0-100 scale.
    ///
    /// A non-positive native range means "no usable brightness" and
    /// yields 0, regardless of the cached current value.
    pub fn percent(&self) -> u32 {
        match self.active_control() {
            ActiveControl::Unsupported => 0,
            ActiveControl::Direct(d) => percent_of(d.current, d.min, d.max),
            ActiveControl::Instrumentation(l) => percent_of(l.current, l.min, l.max),
        }
    }

    /// Consumer-facing view of this entity.
    pub fn summary(&self) -> MonitorSummary {
        MonitorSummary {
            index: self.index,
            description: self.description.clone(),
            has_brightness: self.has_brightness(),
            percent: self.percent(),
        }
    }

    /// Write the diagnostic dump for this display.
    ///
    /// One literal label-value pair per line. The labels are a
    /// diagnostic contract consumed by external tooling; do not rename
    /// them.
    pub fn dump_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "PHYSICAL_MONITOR: description={}", self.description)?;
        writeln!(w, "INFO: hasBrightness={}", self.has_brightness())?;
        writeln!(w, "INFO: brightness={}", self.direct.current)?;
        writeln!(w, "INFO: minBrightness={}", self.direct.min)?;
        writeln!(w, "INFO: maxBrightness={}", self.direct.max)?;
        writeln!(w, "MONITOR: surface={}", self.surface)?;
        writeln!(w, "DISPLAY: deviceName={}", self.device_name)?;
        writeln!(w, "DISPLAY: deviceId={}", self.device_id)?;
        writeln!(w, "WMI: wmiInstancePrefix={}", self.correlation_key)?;
        let (instance, min, current, max) = match &self.link {
            Some(link) => (link.instance.as_str(), link.min, link.current, link.max),
            None => ("", 0, 0, 0),
        };
        writeln!(w, "WMI: wmiInstance={instance}")?;
        writeln!(w, "WMI: wmiHasBrightness={}", self.link.is_some())?;
        writeln!(w, "WMI: wmiBrightness={current}")?;
        writeln!(w, "WMI: wmiMinBrightness={min}")?;
        writeln!(w, "WMI: wmiMaxBrightness={max}")?;
        Ok(())
    }
}

/// Ordered consumer view: index, name, whether brightness is
/// controllable, and the normalized percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSummary {
    pub index: usize,
    pub description: String,
    pub has_brightness: bool,
    pub percent: u32,
}

/// `floor((current - min) * 100 / (max - min))`, clamped to 0-100.
/// Non-positive range yields 0.
pub(crate) fn percent_of(current: u32, min: u32, max: u32) -> u32 {
    let range = i64::from(max) - i64::from(min);
    if range <= 0 {
        return 0;
    }
    let percent = (i64::from(current) - i64::from(min)) * 100 / range;
    percent.clamp(0, 100) as u32
}

/// `floor(percent * (max - min) / 100) + min`, or `None` when the
/// range is non-positive (set becomes a no-op). Integer truncation is
/// intentional; a get/set round trip is exact only to within one
/// division's rounding error.
pub(crate) fn native_from_percent(percent: u32, min: u32, max: u32) -> Option<u32> {
    let range = i64::from(max) - i64::from(min);
    if range <= 0 {
        return None;
    }
    Some((i64::from(percent) * range / 100 + i64::from(min)) as u32)
}

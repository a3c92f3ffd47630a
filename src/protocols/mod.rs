// SPDX-License-Identifier: GPL-3.0-only
//! Display control backends and the OS collaborator ports they consume.
//!
//! Two backends cover every display the OS knows about:
//!
//! - [`ddc`] drives the direct hardware control channel (DDC-style,
//!   standard external monitors).
//! - [`wmi`] drives the management instrumentation interface
//!   (WMI-style, usually the only brightness path for internal panels).
//!
//! Both talk to the operating system through the traits below rather
//! than literal APIs, so the core stays portable and testable; the real
//! implementations live in [`crate::platform`].

pub mod ddc;
pub mod wmi;

use anyhow::Result;

/// Capability bit: the display accepts brightness commands over the
/// direct control channel.
pub const CAP_BRIGHTNESS: u32 = 1 << 0;

/// Opaque native handle for one physical display.
///
/// Acquired during enumeration and owned by the registry; released
/// exactly once, at registry teardown, via [`DdcPort::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(pub isize);

/// One OS-level display output grouping. A single logical surface may
/// multiplex several physical displays.
#[derive(Debug, Clone)]
pub struct LogicalSurface {
    /// Surface identifier, e.g. `\\.\DISPLAY1`.
    pub id: String,
}

/// A physical display attached to a logical surface.
#[derive(Debug, Clone)]
pub struct PhysicalDisplay {
    pub handle: NativeHandle,
    /// Human-readable description, e.g. `Acme 1234`.
    pub description: String,
}

/// The device path for one physical display, in both forms the OS
/// reports it.
#[derive(Debug, Clone, Default)]
pub struct DevicePaths {
    /// Short form, e.g. `\\.\DISPLAY1\Monitor0`.
    pub device_name: String,
    /// Interface form carrying the stable device-interface identifier,
    /// e.g. `\\?\DISPLAY#ACME1234#9&abcdef9&0&UID12345#{...}`. Source
    /// of the correlation key.
    pub device_id: String,
}

/// Native brightness values for one display, in that display's units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrightnessTriplet {
    pub min: u32,
    pub current: u32,
    pub max: u32,
}

/// Direct control channel collaborator.
///
/// Every operation may block for the duration of a hardware bus
/// transaction; there is no internal timeout or cancellation.
pub trait DdcPort {
    /// Enumerate the logical display surfaces currently attached.
    fn logical_surfaces(&mut self) -> Result<Vec<LogicalSurface>>;

    /// Enumerate the physical displays multiplexed onto one surface,
    /// acquiring a native handle for each.
    fn physical_displays(&mut self, surface: &LogicalSurface) -> Result<Vec<PhysicalDisplay>>;

    /// Report the device path of the `index`-th display on a surface.
    /// Either form may be empty when the OS has nothing to say.
    fn device_paths(&mut self, surface: &LogicalSurface, index: usize) -> DevicePaths;

    /// Query the capability bitmask for a display. Failure is treated
    /// as "no capabilities", never as fatal.
    fn capabilities(&mut self, handle: NativeHandle) -> Result<u32>;

    /// Read the native brightness triplet for a display.
    fn read_brightness(&mut self, handle: NativeHandle) -> Result<BrightnessTriplet>;

    /// Write a native brightness value to a display.
    fn write_brightness(&mut self, handle: NativeHandle, value: u32) -> Result<()>;

    /// Release a handle acquired by [`Self::physical_displays`].
    fn release(&mut self, handle: NativeHandle);
}

/// Identity row returned by the instrumentation identify query.
#[derive(Debug, Clone)]
pub struct IdentityRecord {
    /// Full instrumentation instance path, e.g.
    /// `DISPLAY\ACME1234\9&abcdef9&0&UID12345_0`.
    pub instance: String,
    /// Manufacturer name as a fixed-width character code array.
    pub manufacturer: Vec<u16>,
    /// User-friendly model name as a fixed-width character code array.
    pub friendly_name: Vec<u16>,
}

/// Brightness row returned by the instrumentation read query.
#[derive(Debug, Clone)]
pub struct BrightnessRecord {
    pub instance: String,
    pub current: u32,
    /// Count of discrete brightness levels.
    pub levels: u32,
    /// Explicit allowed level values, when the backend reports them.
    pub level_values: Option<Vec<u32>>,
}

/// One connect-query-disconnect cycle against the instrumentation
/// namespace. Dropped at the end of each backend pass; no session is
/// ever held between calls.
pub trait WmiSession {
    /// Query every instrumentation-visible display identity.
    fn identify(&mut self) -> Result<Vec<IdentityRecord>>;

    /// Query current brightness and level structure for every
    /// instrumentation-visible display.
    fn read_brightness(&mut self) -> Result<Vec<BrightnessRecord>>;

    /// Invoke the remote set-brightness method against one instance.
    fn set_brightness(&mut self, instance: &str, timeout_secs: u32, level: u32) -> Result<()>;
}

/// Instrumentation collaborator. [`Self::connect`] failing means the
/// backend is unavailable for this one call; a later call may succeed.
pub trait WmiPort {
    fn connect(&mut self) -> Result<Box<dyn WmiSession + '_>>;
}

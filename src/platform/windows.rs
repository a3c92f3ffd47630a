// SPDX-License-Identifier: GPL-3.0-only
//! Native port implementations for Windows.
//!
//! The direct control channel maps onto the physical monitor
//! configuration API (DDC/CI via Dxva2); the instrumentation port maps
//! onto WMI in the `ROOT\WMI` namespace (`WmiMonitorID`,
//! `WmiMonitorBrightness`, `WmiMonitorBrightnessMethods`).

use std::collections::HashMap;
use std::ffi::c_void;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;
use windows::Win32::Devices::Display::{
    DestroyPhysicalMonitor, GetMonitorBrightness, GetMonitorCapabilities,
    GetNumberOfPhysicalMonitorsFromHMONITOR, GetPhysicalMonitorsFromHMONITOR, PHYSICAL_MONITOR,
    SetMonitorBrightness,
};
use windows::Win32::Foundation::{BOOL, HANDLE, LPARAM, RECT, TRUE};
use windows::Win32::Graphics::Gdi::{
    DISPLAY_DEVICEW, EnumDisplayDevicesW, EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR,
    MONITORINFO, MONITORINFOEXW,
};
use windows::core::PCWSTR;
use wmi::{COMLibrary, Variant, WMIConnection};

use crate::protocols::{
    BrightnessRecord, BrightnessTriplet, CAP_BRIGHTNESS, DdcPort, DevicePaths, IdentityRecord,
    LogicalSurface, NativeHandle, PhysicalDisplay, WmiPort, WmiSession,
};

/// `MC_CAPS_BRIGHTNESS` from highlevelmonitorconfigurationapi.h.
const MC_CAPS_BRIGHTNESS: u32 = 0x0000_0002;
/// `EDD_GET_DEVICE_INTERFACE_NAME` from winuser.h.
const EDD_GET_DEVICE_INTERFACE_NAME: u32 = 0x0000_0001;

fn wide_to_string(wide: &[u16]) -> String {
    let end = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..end])
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Direct control port over the Win32 monitor configuration API.
///
/// Logical surfaces are `HMONITOR`s; physical display handles are the
/// `hPhysicalMonitor` handles from `GetPhysicalMonitorsFromHMONITOR`,
/// released one by one with `DestroyPhysicalMonitor`.
pub struct Win32DdcPort {
    /// Surface id -> HMONITOR, rebuilt on every surface enumeration.
    surfaces: HashMap<String, isize>,
}

impl Win32DdcPort {
    pub fn new() -> Self {
        Self {
            surfaces: HashMap::new(),
        }
    }

    fn hmonitor(&self, surface: &LogicalSurface) -> Result<HMONITOR> {
        let raw = self
            .surfaces
            .get(&surface.id)
            .copied()
            .ok_or_else(|| anyhow!("unknown logical surface {}", surface.id))?;
        Ok(HMONITOR(raw as *mut c_void))
    }
}

impl Default for Win32DdcPort {
    fn default() -> Self {
        Self::new()
    }
}

unsafe extern "system" fn collect_monitors(
    hmonitor: HMONITOR,
    _hdc: HDC,
    _rect: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let out = unsafe { &mut *(lparam.0 as *mut Vec<isize>) };
    out.push(hmonitor.0 as isize);
    TRUE
}

impl DdcPort for Win32DdcPort {
    fn logical_surfaces(&mut self) -> Result<Vec<LogicalSurface>> {
        let mut handles: Vec<isize> = Vec::new();
        let ok = unsafe {
            EnumDisplayMonitors(
                HDC::default(),
                None,
                Some(collect_monitors),
                LPARAM(&mut handles as *mut Vec<isize> as isize),
            )
        };
        if !ok.as_bool() {
            bail!("EnumDisplayMonitors failed");
        }

        self.surfaces.clear();
        let mut surfaces = Vec::with_capacity(handles.len());
        for raw in handles {
            let mut info = MONITORINFOEXW {
                monitorInfo: MONITORINFO {
                    cbSize: std::mem::size_of::<MONITORINFOEXW>() as u32,
                    ..Default::default()
                },
                ..Default::default()
            };
            let ok = unsafe {
                GetMonitorInfoW(
                    HMONITOR(raw as *mut c_void),
                    &mut info.monitorInfo as *mut MONITORINFO,
                )
            };
            if !ok.as_bool() {
                debug!("GetMonitorInfoW failed, skipping surface");
                continue;
            }
            let id = wide_to_string(&info.szDevice);
            self.surfaces.insert(id.clone(), raw);
            surfaces.push(LogicalSurface { id });
        }
        Ok(surfaces)
    }

    fn physical_displays(&mut self, surface: &LogicalSurface) -> Result<Vec<PhysicalDisplay>> {
        let hmonitor = self.hmonitor(surface)?;
        let mut count = 0u32;
        if unsafe { GetNumberOfPhysicalMonitorsFromHMONITOR(hmonitor, &mut count) } == 0 {
            bail!("GetNumberOfPhysicalMonitorsFromHMONITOR failed");
        }
        let mut physical = vec![PHYSICAL_MONITOR::default(); count as usize];
        if count > 0
            && unsafe { GetPhysicalMonitorsFromHMONITOR(hmonitor, &mut physical) } == 0
        {
            bail!("GetPhysicalMonitorsFromHMONITOR failed");
        }
        Ok(physical
            .into_iter()
            .map(|pm| PhysicalDisplay {
                handle: NativeHandle(pm.hPhysicalMonitor.0 as isize),
                description: wide_to_string(&pm.szPhysicalMonitorDescription),
            })
            .collect())
    }

    fn device_paths(&mut self, surface: &LogicalSurface, index: usize) -> DevicePaths {
        let device = to_wide(&surface.id);
        let mut paths = DevicePaths::default();

        let mut dd = DISPLAY_DEVICEW {
            cb: std::mem::size_of::<DISPLAY_DEVICEW>() as u32,
            ..Default::default()
        };
        let ok = unsafe {
            EnumDisplayDevicesW(PCWSTR(device.as_ptr()), index as u32, &mut dd, 0)
        };
        if ok.as_bool() {
            paths.device_name = wide_to_string(&dd.DeviceName);
        }

        let mut ddi = DISPLAY_DEVICEW {
            cb: std::mem::size_of::<DISPLAY_DEVICEW>() as u32,
            ..Default::default()
        };
        let ok = unsafe {
            EnumDisplayDevicesW(
                PCWSTR(device.as_ptr()),
                index as u32,
                &mut ddi,
                EDD_GET_DEVICE_INTERFACE_NAME,
            )
        };
        if ok.as_bool() {
            paths.device_id = wide_to_string(&ddi.DeviceID);
        }
        paths
    }

    fn capabilities(&mut self, handle: NativeHandle) -> Result<u32> {
        let mut caps = 0u32;
        let mut temperatures = 0u32;
        let ok = unsafe {
            GetMonitorCapabilities(HANDLE(handle.0 as *mut c_void), &mut caps, &mut temperatures)
        };
        if ok == 0 {
            // Routine for internal panels without DDC/CI.
            bail!("GetMonitorCapabilities failed");
        }
        let mut mask = 0;
        if caps & MC_CAPS_BRIGHTNESS != 0 {
            mask |= CAP_BRIGHTNESS;
        }
        Ok(mask)
    }

    fn read_brightness(&mut self, handle: NativeHandle) -> Result<BrightnessTriplet> {
        let (mut min, mut current, mut max) = (0u32, 0u32, 0u32);
        let ok = unsafe {
            GetMonitorBrightness(
                HANDLE(handle.0 as *mut c_void),
                &mut min,
                &mut current,
                &mut max,
            )
        };
        if ok == 0 {
            bail!("GetMonitorBrightness failed");
        }
        Ok(BrightnessTriplet { min, current, max })
    }

    fn write_brightness(&mut self, handle: NativeHandle, value: u32) -> Result<()> {
        if unsafe { SetMonitorBrightness(HANDLE(handle.0 as *mut c_void), value) } == 0 {
            bail!("SetMonitorBrightness failed");
        }
        Ok(())
    }

    fn release(&mut self, handle: NativeHandle) {
        unsafe {
            let _ = DestroyPhysicalMonitor(HANDLE(handle.0 as *mut c_void));
        }
    }
}

#[derive(Deserialize)]
#[serde(rename = "WmiMonitorID", rename_all = "PascalCase")]
struct MonitorIdRow {
    instance_name: String,
    manufacturer_name: Option<Vec<u16>>,
    user_friendly_name: Option<Vec<u16>>,
}

#[derive(Deserialize)]
#[serde(rename = "WmiMonitorBrightness", rename_all = "PascalCase")]
struct MonitorBrightnessRow {
    instance_name: String,
    current_brightness: u8,
    levels: u32,
    level: Option<Vec<u8>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SetBrightnessParams {
    timeout: u32,
    brightness: u8,
}

/// Instrumentation port over WMI.
///
/// COM initialization is per thread and sticks around; the WMI
/// connection itself is created fresh on every [`WmiPort::connect`] and
/// dropped with the session, giving each backend pass its own
/// connect-query-disconnect cycle.
pub struct WbemWmiPort {
    com: Option<COMLibrary>,
}

impl WbemWmiPort {
    pub fn new() -> Self {
        Self { com: None }
    }
}

impl Default for WbemWmiPort {
    fn default() -> Self {
        Self::new()
    }
}

impl WmiPort for WbemWmiPort {
    fn connect(&mut self) -> Result<Box<dyn WmiSession + '_>> {
        let com = match self.com {
            Some(com) => com,
            None => {
                let com = COMLibrary::new().context("COM initialization failed")?;
                self.com = Some(com);
                com
            }
        };
        let connection = WMIConnection::with_namespace_path("ROOT\\WMI", com)
            .context("WMI connection failed")?;
        Ok(Box::new(WbemSession { connection }))
    }
}

struct WbemSession {
    connection: WMIConnection,
}

/// Escape an instance path for embedding in a WMI object path literal.
fn escape_instance(instance: &str) -> String {
    instance.replace('\\', "\\\\").replace('"', "\\\"")
}

impl WmiSession for WbemSession {
    fn identify(&mut self) -> Result<Vec<IdentityRecord>> {
        let rows: Vec<MonitorIdRow> = self.connection.query().context("WmiMonitorID query")?;
        Ok(rows
            .into_iter()
            .map(|row| IdentityRecord {
                instance: row.instance_name,
                manufacturer: row.manufacturer_name.unwrap_or_default(),
                friendly_name: row.user_friendly_name.unwrap_or_default(),
            })
            .collect())
    }

    fn read_brightness(&mut self) -> Result<Vec<BrightnessRecord>> {
        let rows: Vec<MonitorBrightnessRow> =
            self.connection.query().context("WmiMonitorBrightness query")?;
        Ok(rows
            .into_iter()
            .map(|row| BrightnessRecord {
                instance: row.instance_name,
                current: u32::from(row.current_brightness),
                levels: row.levels,
                level_values: row
                    .level
                    .map(|levels| levels.into_iter().map(u32::from).collect()),
            })
            .collect())
    }

    fn set_brightness(&mut self, instance: &str, timeout_secs: u32, level: u32) -> Result<()> {
        let object_path = format!(
            "WmiMonitorBrightnessMethods.InstanceName=\"{}\"",
            escape_instance(instance)
        );
        let params = SetBrightnessParams {
            timeout: timeout_secs,
            brightness: u8::try_from(level).unwrap_or(u8::MAX),
        };
        let _out: Option<HashMap<String, Variant>> = self
            .connection
            .exec_method(&object_path, "WmiSetBrightness", &params)
            .context("WmiSetBrightness invocation")?;
        Ok(())
    }
}

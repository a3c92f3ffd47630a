// SPDX-License-Identifier: GPL-3.0-only
//! Normalized brightness control over two display backends.
//!
//! Display brightness is exposed by the operating system through two
//! mutually exclusive mechanisms: a direct hardware control channel
//! (DDC-style, typically external monitors) and a management
//! instrumentation interface (WMI-style, typically internal panels).
//! This crate enumerates physical displays through the direct channel,
//! heuristically correlates them with instrumentation identities via a
//! string transformation of the device path, and presents a single
//! 0-100 percentage scale per display regardless of which backend is
//! in play.
//!
//! The [`registry::MonitorRegistry`] is the only entry point consumers
//! need: it owns the display entities and their native handles, and
//! drives the enumerate / refresh / destroy lifecycle. The OS itself is
//! reached through the port traits in [`protocols`], with real
//! implementations under [`platform`].

pub mod correlate;
pub mod error;
pub mod monitor;
pub mod platform;
pub mod protocols;
pub mod registry;

pub use error::{BrightlinkError, Result};
pub use monitor::{Monitor, MonitorSummary};
pub use registry::MonitorRegistry;

// SPDX-License-Identifier: GPL-3.0-only
//! Error types for the brightness core.

use thiserror::Error;

/// Failures reported by registry operations.
///
/// Unsupported features (no brightness capability, no instrumentation
/// binding) are never errors; an entity without a usable backend simply
/// reports `has_brightness = false` and a percent of 0.
#[derive(Error, Debug)]
pub enum BrightlinkError {
    /// Display enumeration could not start at all.
    #[error("display enumeration failed: {0}")]
    Enumeration(#[source] anyhow::Error),

    /// Direct control channel write failure on one display.
    #[error("direct control failure on display {index}: {source}")]
    DirectControl {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    /// Instrumentation query or method invocation failure.
    #[error("instrumentation failure on display {index}: {source}")]
    Instrumentation {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    /// No entity with the given index exists in the registry.
    #[error("display {0} not found")]
    MonitorNotFound(usize),

    /// I/O error (diagnostic dump).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for [`BrightlinkError`].
pub type Result<T> = std::result::Result<T, BrightlinkError>;

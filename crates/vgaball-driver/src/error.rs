// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for VGA ball driver operations

use thiserror::Error;

/// Result type alias for VGA ball operations
pub type Result<T> = std::result::Result<T, BallError>;

/// Errors that can occur while attaching to or commanding the device
#[derive(Debug, Error)]
pub enum BallError {
    /// Address range already reserved by another owner
    #[error("Address range {start:#x}+{len:#x} unavailable: held by {owner}")]
    ResourceUnavailable {
        /// Start of the requested range
        start: u64,
        /// Length of the requested range
        len: u64,
        /// Current holder of the overlapping range
        owner: String,
    },

    /// Address range could not be mapped
    #[error("Mapping failed: {reason}")]
    MappingFailed {
        /// Reason for failure
        reason: String,
    },

    /// Command issued against a detached or never-attached controller
    #[error("Device not attached")]
    NotAttached,

    /// Coordinate exceeds the device axis width
    #[error("{axis} coordinate {value} out of range (max {max})")]
    OutOfRange {
        /// Axis name, `"x"` or `"y"`
        axis: &'static str,
        /// Rejected value
        value: u16,
        /// Largest addressable value
        max: u16,
    },

    /// Low-level register write failed
    #[error("Hardware fault at offset {offset:#x}: {reason}")]
    HardwareFault {
        /// Register offset of the failed access
        offset: usize,
        /// Reason for failure
        reason: String,
    },

    /// Unknown protocol request code
    #[error("Invalid command request {code:#010x}")]
    InvalidCommand {
        /// Raw request code
        code: u32,
    },

    /// Wire payload has the wrong size
    #[error("Invalid payload: {len} bytes (expected {expected})")]
    InvalidPayload {
        /// Received length
        len: usize,
        /// Required length
        expected: usize,
    },

    /// Malformed configuration value
    #[error("Configuration error: {reason}")]
    Config {
        /// Reason for failure
        reason: String,
    },

    /// I/O error while opening or locking a device file
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },
}

impl BallError {
    /// Create a resource unavailable error
    pub fn resource_unavailable(start: u64, len: u64, owner: impl Into<String>) -> Self {
        Self::ResourceUnavailable {
            start,
            len,
            owner: owner.into(),
        }
    }

    /// Create a mapping failed error
    pub fn mapping_failed(reason: impl Into<String>) -> Self {
        Self::MappingFailed {
            reason: reason.into(),
        }
    }

    /// Create a hardware fault error
    pub fn hardware_fault(offset: usize, reason: impl Into<String>) -> Self {
        Self::HardwareFault {
            offset,
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}

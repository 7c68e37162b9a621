// SPDX-License-Identifier: AGPL-3.0-only

//! Register bus abstraction
//!
//! The seam between the register map and whatever carries bytes to the
//! peripheral: a mapped physical range on real hardware, or a simulated
//! register file for tests and dry runs.

use crate::error::Result;
use std::fmt::Debug;

/// Byte-wide write access to a reserved address span
pub trait RegisterBus: Debug + Send {
    /// Write one byte at `offset` from the start of the span
    ///
    /// # Errors
    ///
    /// Returns `HardwareFault` if the offset is outside the span or the
    /// write cannot be issued.
    fn write_u8(&mut self, offset: usize, value: u8) -> Result<()>;

    /// Length of the accessible span in bytes
    fn span(&self) -> usize;

    /// Bus type for logging
    fn bus_type(&self) -> BusType;
}

/// Bus type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusType {
    /// Physical range mapped from a memory device file
    Mmio,

    /// In-process register file, no hardware required
    Software,
}

impl std::fmt::Display for BusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mmio => write!(f, "MMIO"),
            Self::Software => write!(f, "Software (simulated)"),
        }
    }
}

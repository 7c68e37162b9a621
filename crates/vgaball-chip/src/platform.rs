// SPDX-License-Identifier: AGPL-3.0-only

//! Platform identifiers.
//!
//! The peripheral sits behind the Cyclone V lightweight HPS-to-FPGA bridge on
//! the DE1-SoC. Its physical address is assigned by the FPGA design, so
//! [`TYPICAL_BASE`] is only a starting point; the platform supplies the real
//! one.

/// Name used for resource reservations and log lines.
pub const DRIVER_NAME: &str = "vga_ball";

/// Device-tree `compatible` string of the peripheral.
pub const COMPATIBLE: &str = "csee4840,vga_ball-1.0";

/// Lightweight HPS-to-FPGA bridge base on the DE1-SoC.
pub const LW_BRIDGE_BASE: u64 = 0xFF20_0000;

/// Typical physical base of the register block (may vary per design).
pub const TYPICAL_BASE: u64 = LW_BRIDGE_BASE;

/// Span the platform usually reserves (register block rounded to 8 bytes).
pub const TYPICAL_SPAN: u64 = 8;

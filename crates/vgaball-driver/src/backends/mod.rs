// SPDX-License-Identifier: AGPL-3.0-only

//! Register bus implementations
//!
//! Two buses available:
//! - **Mmio**: maps the reserved physical range from `/dev/mem` or a UIO node
//! - **Software**: simulated register file with a write log and fault injection

pub mod mmio;
pub mod software;

pub use mmio::MmioBus;
pub use software::{RegisterWrite, SoftwareBus};

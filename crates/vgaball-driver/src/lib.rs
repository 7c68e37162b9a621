// SPDX-License-Identifier: AGPL-3.0-only

//! Userspace driver for the VGA ball display coprocessor.
//!
//! The peripheral draws a solid background and a ball on a 640×480 raster.
//! It exposes seven write-only byte registers; this crate owns them, keeps a
//! shadow of what was last written so it can be read back, and serializes
//! every command behind one lock so a position is never half-updated.
//!
//! # Layers
//!
//! ```text
//! caller ─▶ protocol (4 commands, 7-byte record)
//!             └─▶ BallController (validate, shadow, lock)
//!                   └─▶ RegisterMap (fixed offsets, reservation)
//!                         └─▶ RegisterBus: MmioBus | SoftwareBus
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use vgaball_driver::{attach_mmio, Color, DeviceConfig, Position};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DeviceConfig::from_env()?;
//! let ball = attach_mmio(&config)?;
//!
//! ball.set_background(Color::BLACK)?;
//! ball.set_position(Position::new(320, 240))?;
//! assert_eq!(ball.position(), Position::new(320, 240));
//!
//! ball.detach();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod backends;
mod bus;
pub mod config;
mod controller;
mod error;
pub mod platform;
pub mod protocol;
mod regmap;
mod reservation;
mod types;

pub use backends::{MmioBus, RegisterWrite, SoftwareBus};
pub use bus::{BusType, RegisterBus};
pub use config::{parse_address, parse_axis_bits, DeviceConfig, DEFAULT_MEM_PATH};
pub use controller::{BallController, ControllerState};
pub use error::{BallError, Result};
pub use platform::{attach, attach_mmio, attach_simulated, PlatformResource};
pub use protocol::{dispatch, handle_request, Command, WirePayload};
pub use regmap::RegisterMap;
pub use reservation::Reservation;
pub use types::{Color, DeviceState, Position};

/// Silicon constants (re-exported from vgaball-chip).
pub mod chip {
    pub use vgaball_chip::axis::AxisWidth;
    pub use vgaball_chip::display::{HEIGHT, WIDTH};
    pub use vgaball_chip::platform::{COMPATIBLE, DRIVER_NAME};
    pub use vgaball_chip::regs::{Register, REGISTER_SPAN};
}

pub use vgaball_chip::axis::AxisWidth;

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        AxisWidth, BallController, BallError, Color, ControllerState, DeviceConfig, Position,
        Result,
    };
}

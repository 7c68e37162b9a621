// SPDX-License-Identifier: AGPL-3.0-only

//! Attach and detach glue
//!
//! The platform (device tree, a board config, the CLI) decides where the
//! peripheral lives and hands that over as a [`PlatformResource`]. Attaching
//! follows a fixed order:
//!
//! ```text
//! reserve range → map range → build register map → write defaults
//! ```
//!
//! Any failure unwinds whatever was already acquired. Detach is
//! [`BallController::detach`] or dropping the controller.

use crate::backends::{MmioBus, SoftwareBus};
use crate::bus::RegisterBus;
use crate::config::DeviceConfig;
use crate::controller::BallController;
use crate::error::Result;
use crate::regmap::RegisterMap;
use crate::reservation::Reservation;
use std::path::Path;
use vgaball_chip::axis::AxisWidth;

/// Largest register file a simulated attach allocates
const MAX_SIMULATED_SPAN: usize = 4096;

/// Address range handed over by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformResource {
    /// Owner name used for the reservation
    pub name: String,
    /// Physical start address
    pub start: u64,
    /// Length in bytes
    pub len: u64,
}

impl PlatformResource {
    /// Describe a range
    pub fn new(name: impl Into<String>, start: u64, len: u64) -> Self {
        Self {
            name: name.into(),
            start,
            len,
        }
    }
}

impl std::fmt::Display for PlatformResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{:#x}+{:#x}]", self.name, self.start, self.len)
    }
}

/// Reserve, map, and attach a controller over any bus
///
/// `map` is called with the reserved resource and returns the bus covering it.
///
/// # Errors
///
/// Returns `ResourceUnavailable` if the range is taken, whatever `map`
/// returns (normally `MappingFailed`), or `HardwareFault` if the default
/// values cannot be written.
pub fn attach<B, F>(
    resource: &PlatformResource,
    lock_dir: Option<&Path>,
    axis: AxisWidth,
    map: F,
) -> Result<BallController<B>>
where
    B: RegisterBus,
    F: FnOnce(&PlatformResource) -> Result<B>,
{
    let reservation = match lock_dir {
        Some(dir) => Reservation::claim_with_lock_dir(resource, dir)?,
        None => Reservation::claim(resource)?,
    };
    let bus = map(resource)?;
    let registers = RegisterMap::new(reservation, bus)?;
    BallController::attach(registers, axis)
}

/// Attach to real hardware as described by `config`
///
/// # Errors
///
/// As [`attach`].
pub fn attach_mmio(config: &DeviceConfig) -> Result<BallController<MmioBus>> {
    attach(
        &config.resource(),
        config.lock_dir.as_deref(),
        config.axis,
        |r| MmioBus::map(&config.mem_path, r.start, r.len),
    )
}

/// Attach to a simulated register file
///
/// Returns a second handle on the bus for inspecting what was written.
///
/// # Errors
///
/// As [`attach`].
pub fn attach_simulated(
    resource: &PlatformResource,
    axis: AxisWidth,
) -> Result<(BallController<SoftwareBus>, SoftwareBus)> {
    let len = usize::try_from(resource.len).unwrap_or(usize::MAX);
    let bus = SoftwareBus::new(len.min(MAX_SIMULATED_SPAN));
    let observer = bus.clone();
    let controller = attach(resource, None, axis, move |_| Ok(bus))?;
    Ok((controller, observer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerState;
    use crate::error::BallError;
    use crate::types::{Color, Position};

    #[test]
    fn simulated_attach_writes_defaults() {
        let resource = PlatformResource::new("sim", 0x4000_0000, 8);
        let (controller, observer) = attach_simulated(&resource, AxisWidth::Bits10).unwrap();

        assert_eq!(controller.state(), ControllerState::Attached);
        assert_eq!(controller.resource(), Some(&resource));
        assert_eq!(observer.visible_background(), Color::BEIGE);
        assert_eq!(observer.visible_position(AxisWidth::Bits10), Position::HOME);
    }

    #[test]
    fn second_attach_to_same_range_is_refused() {
        let resource = PlatformResource::new("sim-twice", 0x4000_1000, 8);
        let (_first, _) = attach_simulated(&resource, AxisWidth::Bits10).unwrap();

        let err = attach_simulated(&resource, AxisWidth::Bits10).unwrap_err();
        assert!(matches!(err, BallError::ResourceUnavailable { .. }));
    }

    #[test]
    fn mapping_failure_gives_range_back() {
        let resource = PlatformResource::new("unmappable", 0x4000_2000, 8);
        let err = attach::<SoftwareBus, _>(&resource, None, AxisWidth::Bits10, |_| {
            Err(BallError::mapping_failed("no such window"))
        })
        .unwrap_err();
        assert!(matches!(err, BallError::MappingFailed { .. }));

        let _ok = attach_simulated(&resource, AxisWidth::Bits10).unwrap();
    }

    #[test]
    fn dropping_controller_detaches() {
        let resource = PlatformResource::new("dropped", 0x4000_3000, 8);
        let (controller, _) = attach_simulated(&resource, AxisWidth::Bits10).unwrap();
        drop(controller);
        let _again = attach_simulated(&resource, AxisWidth::Bits10).unwrap();
    }
}

// SPDX-License-Identifier: AGPL-3.0-only

//! Command controller for one VGA ball device
//!
//! The only entry point callers use. Holds the register map and the shadow
//! of the write-only registers behind a single lock, so each command is one
//! indivisible step: validate, write registers in order, then update the
//! shadow.
//!
//! ```text
//!   never attached ──┐
//!                    ├─ writes: NotAttached, reads: last shadow
//!   Attached ─detach─┘   (terminal)
//! ```

use crate::bus::RegisterBus;
use crate::error::{BallError, Result};
use crate::platform::PlatformResource;
use crate::regmap::RegisterMap;
use crate::types::{Color, DeviceState, Position};
use std::sync::{Mutex, MutexGuard, PoisonError};
use vgaball_chip::axis::AxisWidth;
use vgaball_chip::regs::{Register, BACKGROUND_SEQUENCE, POSITION_SEQUENCE};

/// Lifecycle state of a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Register map live, commands reach the device
    Attached,

    /// No register map; write commands fail with `NotAttached`
    Detached,
}

#[derive(Debug)]
struct Inner<B: RegisterBus> {
    map: Option<RegisterMap<B>>,
    shadow: DeviceState,
}

/// Controller for one VGA ball device
#[derive(Debug)]
pub struct BallController<B: RegisterBus> {
    inner: Mutex<Inner<B>>,
    axis: AxisWidth,
    resource: Option<PlatformResource>,
}

impl<B: RegisterBus> BallController<B> {
    /// Take over a register map and write the power-on defaults
    ///
    /// # Errors
    ///
    /// Returns `HardwareFault` if the initial writes fail; the map is
    /// released in that case.
    pub fn attach(mut map: RegisterMap<B>, axis: AxisWidth) -> Result<Self> {
        let shadow = DeviceState::default();
        let resource = map.resource();

        tracing::info!(
            "Attaching {} at {:#x} ({axis} axes)",
            resource.name,
            resource.start
        );

        write_sequence(&mut map, &background_writes(shadow.background), None)?;
        write_sequence(&mut map, &position_writes(shadow.position, axis), None)?;

        tracing::info!(
            "Attached {}: background {}, ball {}",
            resource.name,
            shadow.background,
            shadow.position
        );

        Ok(Self {
            inner: Mutex::new(Inner {
                map: Some(map),
                shadow,
            }),
            axis,
            resource: Some(resource),
        })
    }

    /// Controller that never attached; reads report the power-on defaults
    #[must_use]
    pub fn unattached(axis: AxisWidth) -> Self {
        Self {
            inner: Mutex::new(Inner {
                map: None,
                shadow: DeviceState::default(),
            }),
            axis,
            resource: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<B>> {
        // The shadow is only assigned after a command's writes complete
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the background color
    ///
    /// Writes red, green, then blue.
    ///
    /// # Errors
    ///
    /// Returns `NotAttached` after detach, or `HardwareFault` if a register
    /// write fails; the shadow is unchanged on error.
    pub fn set_background(&self, color: Color) -> Result<()> {
        let mut inner = self.lock();
        let Inner { map, shadow } = &mut *inner;
        let map = map.as_mut().ok_or(BallError::NotAttached)?;

        tracing::debug!("SetBackground {color}");

        write_sequence(
            map,
            &background_writes(color),
            Some(&background_writes(shadow.background)),
        )?;
        shadow.background = color;
        Ok(())
    }

    /// Last background written
    pub fn background(&self) -> Color {
        self.lock().shadow.background
    }

    /// Move the ball
    ///
    /// Writes x low, x high, y low, then y high.
    ///
    /// # Errors
    ///
    /// Returns `NotAttached` after detach, `OutOfRange` if a coordinate does
    /// not fit the axis width (nothing is written), or `HardwareFault` if a
    /// register write fails; the shadow is unchanged on error.
    pub fn set_position(&self, position: Position) -> Result<()> {
        let mut inner = self.lock();
        let Inner { map, shadow } = &mut *inner;
        let map = map.as_mut().ok_or(BallError::NotAttached)?;

        self.check_axis("x", position.x)?;
        self.check_axis("y", position.y)?;

        tracing::debug!("SetPosition {position}");

        write_sequence(
            map,
            &position_writes(position, self.axis),
            Some(&position_writes(shadow.position, self.axis)),
        )?;
        shadow.position = position;
        Ok(())
    }

    /// Last ball position written
    pub fn position(&self) -> Position {
        self.lock().shadow.position
    }

    /// Background and position together, from one lock acquisition
    pub fn snapshot(&self) -> DeviceState {
        self.lock().shadow
    }

    /// Release the register map; the controller cannot be attached again
    ///
    /// Returns whether the controller was attached.
    pub fn detach(&self) -> bool {
        let Some(mut map) = self.lock().map.take() else {
            return false;
        };
        map.release();
        if let Some(resource) = &self.resource {
            tracing::info!("Detached {} at {:#x}", resource.name, resource.start);
        }
        true
    }

    /// Current lifecycle state
    pub fn state(&self) -> ControllerState {
        if self.lock().map.is_some() {
            ControllerState::Attached
        } else {
            ControllerState::Detached
        }
    }

    /// Axis width the controller validates against
    pub const fn axis_width(&self) -> AxisWidth {
        self.axis
    }

    /// Address range the controller attached to, if it ever did
    pub const fn resource(&self) -> Option<&PlatformResource> {
        self.resource.as_ref()
    }

    fn check_axis(&self, axis: &'static str, value: u16) -> Result<()> {
        if self.axis.contains(value) {
            Ok(())
        } else {
            tracing::debug!("Rejecting {axis}={value} on {} axes", self.axis);
            Err(BallError::OutOfRange {
                axis,
                value,
                max: self.axis.max(),
            })
        }
    }
}

fn background_writes(color: Color) -> [(Register, u8); 3] {
    let [red, green, blue] = color.channels();
    let [r, g, b] = BACKGROUND_SEQUENCE;
    [(r, red), (g, green), (b, blue)]
}

fn position_writes(position: Position, axis: AxisWidth) -> [(Register, u8); 4] {
    let (x_low, x_high) = axis.split(position.x);
    let (y_low, y_high) = axis.split(position.y);
    let [xl, xh, yl, yh] = POSITION_SEQUENCE;
    [(xl, x_low), (xh, x_high), (yl, y_low), (yh, y_high)]
}

/// Issue `writes` in order; on a fault, put back `previous` for every
/// register up to and including the one that failed
fn write_sequence<B: RegisterBus>(
    map: &mut RegisterMap<B>,
    writes: &[(Register, u8)],
    previous: Option<&[(Register, u8)]>,
) -> Result<()> {
    for (i, &(register, value)) in writes.iter().enumerate() {
        let Err(e) = map.write(register, value) else {
            continue;
        };

        tracing::warn!("Write to {register} failed: {e}");
        if let Some(previous) = previous {
            for &(register, value) in &previous[..=i] {
                if let Err(restore) = map.write(register, value) {
                    tracing::warn!("Could not restore {register}: {restore}");
                }
            }
        }
        return Err(e);
    }
    Ok(())
}

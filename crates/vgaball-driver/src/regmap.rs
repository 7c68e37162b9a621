// SPDX-License-Identifier: AGPL-3.0-only

//! Register map: byte writes at the fixed offsets of the peripheral
//!
//! Owns the reservation and the bus for one device. Offsets are checked
//! against the seven-register block before anything reaches the bus, and
//! after [`release`](RegisterMap::release) every write fails.

use crate::bus::RegisterBus;
use crate::error::{BallError, Result};
use crate::platform::PlatformResource;
use crate::reservation::Reservation;
use vgaball_chip::regs::{Register, REGISTER_SPAN};

/// Live register block of one device
#[derive(Debug)]
pub struct RegisterMap<B: RegisterBus> {
    // Declared before `reservation` so the mapping goes first on drop
    bus: Option<B>,
    reservation: Reservation,
}

impl<B: RegisterBus> RegisterMap<B> {
    /// Bind a mapped bus to the reservation it was mapped under
    ///
    /// # Errors
    ///
    /// Returns `MappingFailed` if the reservation is no longer held or either
    /// the reservation or the bus is shorter than the register block.
    pub fn new(reservation: Reservation, bus: B) -> Result<Self> {
        if !reservation.is_held() {
            return Err(BallError::mapping_failed("reservation already released"));
        }

        let reserved = usize::try_from(reservation.size()).unwrap_or(usize::MAX);
        let span = reserved.min(bus.span());
        if span < REGISTER_SPAN {
            return Err(BallError::mapping_failed(format!(
                "span {span:#x} shorter than register block {REGISTER_SPAN:#x}"
            )));
        }

        tracing::debug!(
            "Register map for {} at {:#x} over {} bus",
            reservation.owner(),
            reservation.start(),
            bus.bus_type()
        );

        Ok(Self {
            bus: Some(bus),
            reservation,
        })
    }

    /// Write one byte at a raw offset
    ///
    /// # Errors
    ///
    /// Returns `HardwareFault` if the map was released, the offset is outside
    /// the register block, or the bus write fails.
    pub fn write_byte(&mut self, offset: usize, value: u8) -> Result<()> {
        let Some(bus) = self.bus.as_mut() else {
            return Err(BallError::hardware_fault(offset, "register map released"));
        };

        if offset >= REGISTER_SPAN {
            return Err(BallError::hardware_fault(
                offset,
                format!("outside register block {REGISTER_SPAN:#x}"),
            ));
        }

        bus.write_u8(offset, value)
    }

    /// Write one byte to a named register
    ///
    /// # Errors
    ///
    /// As [`write_byte`](Self::write_byte).
    pub fn write(&mut self, register: Register, value: u8) -> Result<()> {
        tracing::trace!("{register} <- {value:#04x}");
        self.write_byte(register.offset(), value)
    }

    /// Unmap the bus and give back the reservation; later calls do nothing
    pub fn release(&mut self) {
        if let Some(bus) = self.bus.take() {
            tracing::debug!(
                "Releasing register map for {} ({} bus)",
                self.reservation.owner(),
                bus.bus_type()
            );
            drop(bus);
        }
        self.reservation.release();
    }

    /// Whether writes can still reach the device
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.bus.is_some()
    }

    /// Bus the map writes through, while live
    #[must_use]
    pub const fn bus(&self) -> Option<&B> {
        self.bus.as_ref()
    }

    /// Address range the map was reserved under
    #[must_use]
    pub fn resource(&self) -> PlatformResource {
        PlatformResource::new(
            self.reservation.owner(),
            self.reservation.start(),
            self.reservation.size(),
        )
    }
}

impl<B: RegisterBus> Drop for RegisterMap<B> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{RegisterWrite, SoftwareBus};

    fn map_at(start: u64) -> (RegisterMap<SoftwareBus>, SoftwareBus) {
        let bus = SoftwareBus::new(8);
        let reservation =
            Reservation::claim(&PlatformResource::new("regmap-test", start, 8)).unwrap();
        (RegisterMap::new(reservation, bus.clone()).unwrap(), bus)
    }

    #[test]
    fn writes_reach_the_bus_at_register_offsets() {
        let (mut map, observer) = map_at(0x2000_0000);
        map.write(Register::BallXHigh, 0x01).unwrap();
        map.write_byte(0, 0xFF).unwrap();
        assert_eq!(
            observer.writes(),
            [RegisterWrite::new(4, 0x01), RegisterWrite::new(0, 0xFF)]
        );
    }

    #[test]
    fn offsets_past_the_block_never_reach_the_bus() {
        let (mut map, observer) = map_at(0x2000_1000);
        assert!(matches!(
            map.write_byte(7, 0),
            Err(BallError::HardwareFault { offset: 7, .. })
        ));
        assert!(observer.writes().is_empty());
    }

    #[test]
    fn released_map_faults_and_frees_range() {
        let (mut map, _observer) = map_at(0x2000_2000);
        map.release();
        map.release();
        assert!(!map.is_live());
        assert!(matches!(
            map.write(Register::BgRed, 0),
            Err(BallError::HardwareFault { .. })
        ));

        let _again = Reservation::claim(&PlatformResource::new("next", 0x2000_2000, 8)).unwrap();
    }

    #[test]
    fn short_span_is_a_mapping_failure() {
        let reservation =
            Reservation::claim(&PlatformResource::new("short", 0x2000_3000, 4)).unwrap();
        let err = RegisterMap::new(reservation, SoftwareBus::new(8)).unwrap_err();
        assert!(matches!(err, BallError::MappingFailed { .. }));

        let reservation =
            Reservation::claim(&PlatformResource::new("short-bus", 0x2000_4000, 8)).unwrap();
        let err = RegisterMap::new(reservation, SoftwareBus::new(3)).unwrap_err();
        assert!(matches!(err, BallError::MappingFailed { .. }));
    }
}

// SPDX-License-Identifier: AGPL-3.0-only

//! Software (simulated) register bus
//!
//! Models the peripheral as a byte register file. Every write is appended to
//! an ordered log, so tests can check exactly which bytes a command emitted
//! and in what order, and the register contents can be decoded back into the
//! color and position the display would show.
//!
//! The bus is a cheap handle: clones share one register file. Hand one clone
//! to the controller and keep another to inspect it.

use crate::bus::{BusType, RegisterBus};
use crate::error::{BallError, Result};
use crate::types::{Color, Position};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use vgaball_chip::axis::AxisWidth;
use vgaball_chip::regs;

/// One byte written to the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    /// Offset from the span start
    pub offset: usize,
    /// Byte written
    pub value: u8,
}

impl RegisterWrite {
    /// Create a log entry
    #[must_use]
    pub const fn new(offset: usize, value: u8) -> Self {
        Self { offset, value }
    }
}

#[derive(Debug)]
struct RegisterFile {
    regs: Vec<u8>,
    log: Vec<RegisterWrite>,
    /// Writes remaining before the injected one-shot fault
    fail_after: Option<usize>,
    /// Offset that faults on every write
    fail_offset: Option<usize>,
}

impl RegisterFile {
    /// Byte at `offset`, zero past the end of a short span
    fn byte(&self, offset: usize) -> u8 {
        self.regs.get(offset).copied().unwrap_or(0)
    }
}

/// Simulated register bus
#[derive(Debug, Clone)]
pub struct SoftwareBus {
    span: usize,
    file: Arc<Mutex<RegisterFile>>,
}

impl SoftwareBus {
    /// Create a zeroed register file of `span` bytes
    #[must_use]
    pub fn new(span: usize) -> Self {
        Self {
            span,
            file: Arc::new(Mutex::new(RegisterFile {
                regs: vec![0; span],
                log: Vec::new(),
                fail_after: None,
                fail_offset: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegisterFile> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All writes issued so far, oldest first
    #[must_use]
    pub fn writes(&self) -> Vec<RegisterWrite> {
        self.lock().log.clone()
    }

    /// Forget the write log (register contents are kept)
    pub fn clear_log(&self) {
        self.lock().log.clear();
    }

    /// Current contents of the byte at `offset`
    #[must_use]
    pub fn register(&self, offset: usize) -> Option<u8> {
        self.lock().regs.get(offset).copied()
    }

    /// Background the display currently shows
    #[must_use]
    pub fn visible_background(&self) -> Color {
        let file = self.lock();
        Color::new(
            file.byte(regs::BG_RED),
            file.byte(regs::BG_GREEN),
            file.byte(regs::BG_BLUE),
        )
    }

    /// Ball position the display currently shows
    #[must_use]
    pub fn visible_position(&self, axis: AxisWidth) -> Position {
        let file = self.lock();
        Position::new(
            axis.join(file.byte(regs::BALL_X_LOW), file.byte(regs::BALL_X_HIGH)),
            axis.join(file.byte(regs::BALL_Y_LOW), file.byte(regs::BALL_Y_HIGH)),
        )
    }

    /// Make the write `n` writes from now (0 = the next one) fail once
    pub fn fail_on_write(&self, n: usize) {
        self.lock().fail_after = Some(n);
    }

    /// Make every write to `offset` fail until [`clear_faults`](Self::clear_faults)
    pub fn fail_at_offset(&self, offset: usize) {
        self.lock().fail_offset = Some(offset);
    }

    /// Remove all injected faults
    pub fn clear_faults(&self) {
        let mut file = self.lock();
        file.fail_after = None;
        file.fail_offset = None;
    }
}

impl RegisterBus for SoftwareBus {
    fn write_u8(&mut self, offset: usize, value: u8) -> Result<()> {
        let mut file = self.lock();

        if offset >= file.regs.len() {
            return Err(BallError::hardware_fault(
                offset,
                format!("outside simulated span {:#x}", file.regs.len()),
            ));
        }

        if file.fail_offset == Some(offset) {
            return Err(BallError::hardware_fault(offset, "injected fault"));
        }

        match file.fail_after {
            Some(0) => {
                file.fail_after = None;
                return Err(BallError::hardware_fault(offset, "injected one-shot fault"));
            }
            Some(n) => file.fail_after = Some(n - 1),
            None => {}
        }

        tracing::trace!("Simulated write u8 @ {offset:#x} = {value:#04x}");
        file.regs[offset] = value;
        file.log.push(RegisterWrite::new(offset, value));
        Ok(())
    }

    fn span(&self) -> usize {
        self.span
    }

    fn bus_type(&self) -> BusType {
        BusType::Software
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_registers_and_log() {
        let observer = SoftwareBus::new(8);
        let mut bus = observer.clone();

        bus.write_u8(regs::BG_GREEN, 0x42).unwrap();

        assert_eq!(observer.register(regs::BG_GREEN), Some(0x42));
        assert_eq!(observer.writes(), [RegisterWrite::new(1, 0x42)]);

        observer.clear_log();
        assert!(observer.writes().is_empty());
        assert_eq!(observer.register(regs::BG_GREEN), Some(0x42));
    }

    #[test]
    fn one_shot_fault_fires_once() {
        let observer = SoftwareBus::new(8);
        let mut bus = observer.clone();
        observer.fail_on_write(1);

        bus.write_u8(0, 1).unwrap();
        assert!(bus.write_u8(1, 2).is_err());
        bus.write_u8(1, 3).unwrap();

        assert_eq!(observer.writes(), [RegisterWrite::new(0, 1), RegisterWrite::new(1, 3)]);
    }

    #[test]
    fn offset_fault_persists_until_cleared() {
        let observer = SoftwareBus::new(8);
        let mut bus = observer.clone();
        observer.fail_at_offset(4);

        assert!(bus.write_u8(4, 1).is_err());
        assert!(bus.write_u8(4, 1).is_err());
        observer.clear_faults();
        bus.write_u8(4, 1).unwrap();
    }

    #[test]
    fn out_of_span_write_is_a_fault() {
        let mut bus = SoftwareBus::new(4);
        assert!(matches!(
            bus.write_u8(4, 0),
            Err(BallError::HardwareFault { offset: 4, .. })
        ));
    }

    #[test]
    fn decodes_visible_state() {
        let observer = SoftwareBus::new(8);
        let mut bus = observer.clone();
        for (offset, value) in [(0, 1), (1, 2), (2, 3), (3, 0x2C), (4, 0x01), (5, 0x0A), (6, 0)] {
            bus.write_u8(offset, value).unwrap();
        }
        assert_eq!(observer.visible_background(), Color::new(1, 2, 3));
        assert_eq!(observer.visible_position(AxisWidth::Bits10), Position::new(300, 10));
    }
}

// SPDX-License-Identifier: AGPL-3.0-only

//! Command protocol
//!
//! Four commands, each carrying the same 7-byte record:
//!
//! ```text
//! byte  0    1      2     3      4       5      6
//!       red  green  blue  x_low  x_high  y_low  y_high
//! ```
//!
//! Coordinates travel as full little-endian `u16`; narrowing to the axis
//! width happens at the register layer. Fields a command does not use are
//! ignored on the way in and passed through untouched on the way out.
//!
//! Requests are identified by ioctl-style codes: magic `'q'`, numbers 1–4,
//! write direction for caller→core commands and read direction for
//! core→caller commands, size 7.

use crate::bus::RegisterBus;
use crate::controller::BallController;
use crate::error::{BallError, Result};
use crate::types::{Color, Position};
use bytemuck::{Pod, Zeroable};

/// Request code type field
pub const MAGIC: u8 = b'q';

/// Version of the command set; bumped if a command or the record changes
pub const PROTOCOL_VERSION: u16 = 1;

const NR_SHIFT: u32 = 0;
const TYPE_SHIFT: u32 = 8;
const SIZE_SHIFT: u32 = 16;
const DIR_SHIFT: u32 = 30;
const SIZE_MASK: u32 = 0x3FFF;

/// Transfer direction of a command, seen from the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Caller sends the record to the core
    Write,
    /// Core fills the record for the caller
    Read,
}

impl Direction {
    const fn bits(self) -> u32 {
        match self {
            Self::Write => 1,
            Self::Read => 2,
        }
    }
}

/// One protocol command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Set the background from the record's color fields
    WriteBackground = 1,
    /// Fill the record's color fields from the shadow
    ReadBackground = 2,
    /// Move the ball to the record's position fields
    WritePosition = 3,
    /// Fill the record's position fields from the shadow
    ReadPosition = 4,
}

impl Command {
    /// Every command, in number order
    pub const ALL: [Self; 4] = [
        Self::WriteBackground,
        Self::ReadBackground,
        Self::WritePosition,
        Self::ReadPosition,
    ];

    /// Command number within the magic
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Transfer direction
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::WriteBackground | Self::WritePosition => Direction::Write,
            Self::ReadBackground | Self::ReadPosition => Direction::Read,
        }
    }

    /// Protocol name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::WriteBackground => "WRITE_BACKGROUND",
            Self::ReadBackground => "READ_BACKGROUND",
            Self::WritePosition => "WRITE_POSITION",
            Self::ReadPosition => "READ_POSITION",
        }
    }

    /// Full request code
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn request_code(self) -> u32 {
        (self.direction().bits() << DIR_SHIFT)
            | (((WirePayload::SIZE as u32) & SIZE_MASK) << SIZE_SHIFT)
            | ((MAGIC as u32) << TYPE_SHIFT)
            | ((self.number() as u32) << NR_SHIFT)
    }

    /// Decode a request code
    ///
    /// # Errors
    ///
    /// Returns `InvalidCommand` unless `code` is exactly one of the four
    /// request codes.
    pub fn from_request_code(code: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.request_code() == code)
            .ok_or(BallError::InvalidCommand { code })
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed command record
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct WirePayload {
    /// Background red
    pub red: u8,
    /// Background green
    pub green: u8,
    /// Background blue
    pub blue: u8,
    /// Ball x, bits 7..0
    pub x_low: u8,
    /// Ball x, bits 15..8
    pub x_high: u8,
    /// Ball y, bits 7..0
    pub y_low: u8,
    /// Ball y, bits 15..8
    pub y_high: u8,
}

const _: () = assert!(WirePayload::SIZE == 7);

impl WirePayload {
    /// Record size in bytes
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Record carrying only a color
    #[must_use]
    pub fn from_color(color: Color) -> Self {
        let mut payload = Self::default();
        payload.set_color(color);
        payload
    }

    /// Record carrying only a position
    #[must_use]
    pub fn from_position(position: Position) -> Self {
        let mut payload = Self::default();
        payload.set_position(position);
        payload
    }

    /// Parse a record
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` unless `bytes` is exactly [`SIZE`](Self::SIZE)
    /// long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bytemuck::try_pod_read_unaligned(bytes).map_err(|_| BallError::InvalidPayload {
            len: bytes.len(),
            expected: Self::SIZE,
        })
    }

    /// Record bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Color fields
    #[must_use]
    pub const fn color(&self) -> Color {
        Color::new(self.red, self.green, self.blue)
    }

    /// Position fields
    #[must_use]
    pub const fn position(&self) -> Position {
        Position::new(
            u16::from_le_bytes([self.x_low, self.x_high]),
            u16::from_le_bytes([self.y_low, self.y_high]),
        )
    }

    /// Overwrite the color fields
    pub fn set_color(&mut self, color: Color) {
        [self.red, self.green, self.blue] = color.channels();
    }

    /// Overwrite the position fields
    pub fn set_position(&mut self, position: Position) {
        [self.x_low, self.x_high] = position.x.to_le_bytes();
        [self.y_low, self.y_high] = position.y.to_le_bytes();
    }
}

/// Run `command` against `controller` with a decoded record
///
/// Write commands read their fields from `payload`; read commands fill them.
///
/// # Errors
///
/// Whatever the controller command returns.
pub fn dispatch<B: RegisterBus>(
    controller: &BallController<B>,
    command: Command,
    payload: &mut WirePayload,
) -> Result<()> {
    tracing::debug!("{command}");
    match command {
        Command::WriteBackground => controller.set_background(payload.color()),
        Command::ReadBackground => {
            payload.set_color(controller.background());
            Ok(())
        }
        Command::WritePosition => controller.set_position(payload.position()),
        Command::ReadPosition => {
            payload.set_position(controller.position());
            Ok(())
        }
    }
}

/// Run a raw request: decode `code`, parse `buf`, dispatch, and copy the
/// record back into `buf` for read commands
///
/// # Errors
///
/// Returns `InvalidCommand` or `InvalidPayload` for malformed requests,
/// otherwise whatever [`dispatch`] returns.
pub fn handle_request<B: RegisterBus>(
    controller: &BallController<B>,
    code: u32,
    buf: &mut [u8],
) -> Result<()> {
    let command = Command::from_request_code(code)?;
    let mut payload = WirePayload::from_bytes(buf)?;

    dispatch(controller, command, &mut payload)?;

    if command.direction() == Direction::Read {
        buf.copy_from_slice(payload.as_bytes());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_codes_follow_ioctl_layout() {
        // _IOW('q', 1, 7) and _IOR('q', 2, 7)
        assert_eq!(Command::WriteBackground.request_code(), 0x4007_7101);
        assert_eq!(Command::ReadBackground.request_code(), 0x8007_7102);
        assert_eq!(Command::WritePosition.request_code(), 0x4007_7103);
        assert_eq!(Command::ReadPosition.request_code(), 0x8007_7104);
    }

    #[test]
    fn request_codes_decode() {
        for command in Command::ALL {
            assert_eq!(Command::from_request_code(command.request_code()).unwrap(), command);
        }
        // Right number, wrong direction
        assert!(matches!(
            Command::from_request_code(0x8007_7101),
            Err(BallError::InvalidCommand { code: 0x8007_7101 })
        ));
        assert!(Command::from_request_code(0).is_err());
    }

    #[test]
    fn record_layout_is_color_then_little_endian_axes() {
        let mut payload = WirePayload::from_color(Color::new(1, 2, 3));
        payload.set_position(Position::new(300, 10));
        assert_eq!(payload.as_bytes(), [1, 2, 3, 0x2C, 0x01, 0x0A, 0x00]);
    }

    #[test]
    fn short_record_is_rejected() {
        assert!(matches!(
            WirePayload::from_bytes(&[0; 6]),
            Err(BallError::InvalidPayload { len: 6, expected: 7 })
        ));
        assert!(WirePayload::from_bytes(&[0; 8]).is_err());
    }
}

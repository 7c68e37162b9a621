// SPDX-License-Identifier: AGPL-3.0-only

//! Register map for the VGA ball peripheral.
//!
//! Every register is one byte wide and write-only from the host. The block
//! is contiguous from the mapped base:
//!
//! ```text
//! 0x0  BG_RED       background red channel
//! 0x1  BG_GREEN     background green channel
//! 0x2  BG_BLUE      background blue channel
//! 0x3  BALL_X_LOW   ball x, bits 7..0
//! 0x4  BALL_X_HIGH  ball x, bits 15..8 (masked to the axis width)
//! 0x5  BALL_Y_LOW   ball y, bits 7..0
//! 0x6  BALL_Y_HIGH  ball y, bits 15..8 (masked to the axis width)
//! ```

// ── Background ───────────────────────────────────────────────────────────────

/// Background red channel.
pub const BG_RED: usize = 0x0;
/// Background green channel.
pub const BG_GREEN: usize = 0x1;
/// Background blue channel.
pub const BG_BLUE: usize = 0x2;

// ── Ball position ────────────────────────────────────────────────────────────

/// Ball x coordinate, low byte.
pub const BALL_X_LOW: usize = 0x3;
/// Ball x coordinate, high bits.
pub const BALL_X_HIGH: usize = 0x4;
/// Ball y coordinate, low byte.
pub const BALL_Y_LOW: usize = 0x5;
/// Ball y coordinate, high bits.
pub const BALL_Y_HIGH: usize = 0x6;

/// Number of bytes the register block occupies.
pub const REGISTER_SPAN: usize = 7;

/// Write order for a background update.
pub const BACKGROUND_SEQUENCE: [Register; 3] =
    [Register::BgRed, Register::BgGreen, Register::BgBlue];

/// Write order for a position update.
pub const POSITION_SEQUENCE: [Register; 4] = [
    Register::BallXLow,
    Register::BallXHigh,
    Register::BallYLow,
    Register::BallYHigh,
];

/// One register of the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// [`BG_RED`]
    BgRed,
    /// [`BG_GREEN`]
    BgGreen,
    /// [`BG_BLUE`]
    BgBlue,
    /// [`BALL_X_LOW`]
    BallXLow,
    /// [`BALL_X_HIGH`]
    BallXHigh,
    /// [`BALL_Y_LOW`]
    BallYLow,
    /// [`BALL_Y_HIGH`]
    BallYHigh,
}

impl Register {
    /// All registers in offset order.
    pub const ALL: [Self; REGISTER_SPAN] = [
        Self::BgRed,
        Self::BgGreen,
        Self::BgBlue,
        Self::BallXLow,
        Self::BallXHigh,
        Self::BallYLow,
        Self::BallYHigh,
    ];

    /// Byte offset from the mapped base.
    #[must_use]
    pub const fn offset(self) -> usize {
        match self {
            Self::BgRed => BG_RED,
            Self::BgGreen => BG_GREEN,
            Self::BgBlue => BG_BLUE,
            Self::BallXLow => BALL_X_LOW,
            Self::BallXHigh => BALL_X_HIGH,
            Self::BallYLow => BALL_Y_LOW,
            Self::BallYHigh => BALL_Y_HIGH,
        }
    }

    /// Register at `offset`, if there is one.
    #[must_use]
    pub const fn from_offset(offset: usize) -> Option<Self> {
        if offset < REGISTER_SPAN {
            Some(Self::ALL[offset])
        } else {
            None
        }
    }

    /// Short uppercase name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BgRed => "BG_RED",
            Self::BgGreen => "BG_GREEN",
            Self::BgBlue => "BG_BLUE",
            Self::BallXLow => "BALL_X_LOW",
            Self::BallXHigh => "BALL_X_HIGH",
            Self::BallYLow => "BALL_Y_LOW",
            Self::BallYHigh => "BALL_Y_HIGH",
        }
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{:#x}", self.name(), self.offset())
    }
}

// SPDX-License-Identifier: AGPL-3.0-only

//! Values carried by the command protocol and held in the shadow state

use vgaball_chip::display::{DEFAULT_BACKGROUND, DEFAULT_POSITION};

/// Background color, one byte per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel
    pub red: u8,
    /// Green channel
    pub green: u8,
    /// Blue channel
    pub blue: u8,
}

impl Color {
    /// Black
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// White
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF);
    /// Color written at attach time
    pub const BEIGE: Self = Self::new(
        DEFAULT_BACKGROUND.0,
        DEFAULT_BACKGROUND.1,
        DEFAULT_BACKGROUND.2,
    );

    /// Create a color from its channels
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Channels in register write order
    #[must_use]
    pub const fn channels(self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BEIGE
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

/// Ball position in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Horizontal coordinate
    pub x: u16,
    /// Vertical coordinate
    pub y: u16,
}

impl Position {
    /// Position written at attach time
    pub const HOME: Self = Self::new(DEFAULT_POSITION.0, DEFAULT_POSITION.1);

    /// Create a position
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::HOME
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Shadow of the write-only registers
///
/// Holds exactly what the last successful write command sent to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceState {
    /// Last background written
    pub background: Color,
    /// Last ball position written
    pub position: Position,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_defaults() {
        let state = DeviceState::default();
        assert_eq!(state.background, Color::new(0xF9, 0xE4, 0xB7));
        assert_eq!(state.position, Position::new(160, 120));
    }

    #[test]
    fn display_formats() {
        assert_eq!(Color::BEIGE.to_string(), "#F9E4B7");
        assert_eq!(Position::new(300, 10).to_string(), "(300, 10)");
    }
}

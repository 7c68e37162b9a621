// SPDX-License-Identifier: AGPL-3.0-only

//! Ball coordinate width.
//!
//! The canonical peripheral decodes 10 bits per axis: the low register holds
//! bits 7..0 and the high register only bits 9..8. A later revision widened
//! both axes to the full 16 bits.

/// Number of significant bits the hardware accepts for one coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AxisWidth {
    /// 10-bit axes, high register mask `0x03`.
    #[default]
    Bits10,
    /// 16-bit axes, high register mask `0xFF`.
    Bits16,
}

impl AxisWidth {
    /// Width for a bit count, if the hardware has such a revision.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            10 => Some(Self::Bits10),
            16 => Some(Self::Bits16),
            _ => None,
        }
    }

    /// Significant bits per coordinate.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Bits10 => 10,
            Self::Bits16 => 16,
        }
    }

    /// Mask applied to `coordinate >> 8` for the high register.
    #[must_use]
    pub const fn high_mask(self) -> u8 {
        match self {
            Self::Bits10 => 0x03,
            Self::Bits16 => 0xFF,
        }
    }

    /// Largest addressable coordinate.
    #[must_use]
    pub const fn max(self) -> u16 {
        match self {
            Self::Bits10 => 0x03FF,
            Self::Bits16 => u16::MAX,
        }
    }

    /// Whether `coordinate` fits without losing bits.
    #[must_use]
    pub const fn contains(self, coordinate: u16) -> bool {
        coordinate <= self.max()
    }

    /// Split a coordinate into `(low, high)` register bytes.
    ///
    /// Bits above the axis width are dropped; callers validate with
    /// [`contains`](Self::contains) first.
    #[must_use]
    pub const fn split(self, coordinate: u16) -> (u8, u8) {
        let [low, high] = coordinate.to_le_bytes();
        (low, high & self.high_mask())
    }

    /// Inverse of [`split`](Self::split).
    #[must_use]
    pub const fn join(self, low: u8, high: u8) -> u16 {
        u16::from_le_bytes([low, high & self.high_mask()])
    }
}

impl std::fmt::Display for AxisWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_bit_split_matches_register_layout() {
        assert_eq!(AxisWidth::Bits10.split(300), (0x2C, 0x01));
        assert_eq!(AxisWidth::Bits10.split(10), (0x0A, 0x00));
        assert_eq!(AxisWidth::Bits10.split(1023), (0xFF, 0x03));
    }

    #[test]
    fn sixteen_bit_keeps_full_high_byte() {
        assert_eq!(AxisWidth::Bits16.split(0xABCD), (0xCD, 0xAB));
        assert_eq!(AxisWidth::Bits16.join(0xCD, 0xAB), 0xABCD);
    }

    #[test]
    fn bounds() {
        assert!(AxisWidth::Bits10.contains(1023));
        assert!(!AxisWidth::Bits10.contains(1024));
        assert!(AxisWidth::Bits16.contains(u16::MAX));
    }

    #[test]
    fn from_bits_knows_both_revisions() {
        assert_eq!(AxisWidth::from_bits(10), Some(AxisWidth::Bits10));
        assert_eq!(AxisWidth::from_bits(16), Some(AxisWidth::Bits16));
        assert_eq!(AxisWidth::from_bits(12), None);
    }
}

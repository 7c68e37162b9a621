// SPDX-License-Identifier: AGPL-3.0-only

//! Raster geometry and attach-time defaults.
//!
//! The driver writes [`DEFAULT_BACKGROUND`] and [`DEFAULT_POSITION`] once when
//! it attaches, and reports them for a controller that never attached.

/// Visible width in pixels.
pub const WIDTH: u16 = 640;
/// Visible height in pixels.
pub const HEIGHT: u16 = 480;

/// Background written at attach, `(red, green, blue)`. Beige, `#F9E4B7`.
pub const DEFAULT_BACKGROUND: (u8, u8, u8) = (0xF9, 0xE4, 0xB7);

/// Ball position written at attach, `(x, y)`.
pub const DEFAULT_POSITION: (u16, u16) = (160, 120);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::AxisWidth;

    #[test]
    fn defaults_fit_every_revision() {
        let (x, y) = DEFAULT_POSITION;
        assert!(AxisWidth::Bits10.contains(x));
        assert!(AxisWidth::Bits10.contains(y));
        assert!(x < WIDTH && y < HEIGHT);
    }

    #[test]
    fn raster_fits_ten_bit_axes() {
        assert!(AxisWidth::Bits10.contains(WIDTH - 1));
        assert!(AxisWidth::Bits10.contains(HEIGHT - 1));
    }
}

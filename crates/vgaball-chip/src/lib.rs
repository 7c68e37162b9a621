// SPDX-License-Identifier: AGPL-3.0-only

//! Silicon model for the VGA ball display coprocessor.
//!
//! This crate has **no dependencies** and **no hardware access**. It is a
//! pure model of the peripheral: register offsets, axis widths, power-on
//! defaults, and platform identifiers.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`regs`] | Register map: seven byte-wide write-only registers |
//! | [`axis`] | Ball coordinate width per device revision (10 or 16 bits) |
//! | [`display`] | Raster geometry and the values written at attach time |
//! | [`platform`] | Driver name, device-tree compatible string, typical bridge address |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod axis;
pub mod display;
pub mod platform;
pub mod regs;

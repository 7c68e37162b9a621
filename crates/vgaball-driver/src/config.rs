// SPDX-License-Identifier: AGPL-3.0-only

//! Device configuration
//!
//! Where the register block lives and how to reach it. Defaults describe the
//! DE1-SoC build of the peripheral; each field can be overridden from the
//! environment, and the CLI overrides the environment.
//!
//! | Variable | Field | Format |
//! |----------|-------|--------|
//! | `VGA_BALL_BASE` | `base` | hex (`0x…`) or decimal |
//! | `VGA_BALL_SPAN` | `span` | hex (`0x…`) or decimal |
//! | `VGA_BALL_MEM` | `mem_path` | path |
//! | `VGA_BALL_AXIS_BITS` | `axis` | `10` or `16` |
//! | `VGA_BALL_LOCK_DIR` | `lock_dir` | path |

use crate::error::{BallError, Result};
use crate::platform::PlatformResource;
use std::path::PathBuf;
use vgaball_chip::axis::AxisWidth;
use vgaball_chip::platform::{DRIVER_NAME, TYPICAL_BASE, TYPICAL_SPAN};

/// Environment variable for [`DeviceConfig::base`]
pub const ENV_BASE: &str = "VGA_BALL_BASE";
/// Environment variable for [`DeviceConfig::span`]
pub const ENV_SPAN: &str = "VGA_BALL_SPAN";
/// Environment variable for [`DeviceConfig::mem_path`]
pub const ENV_MEM: &str = "VGA_BALL_MEM";
/// Environment variable for [`DeviceConfig::axis`]
pub const ENV_AXIS_BITS: &str = "VGA_BALL_AXIS_BITS";
/// Environment variable for [`DeviceConfig::lock_dir`]
pub const ENV_LOCK_DIR: &str = "VGA_BALL_LOCK_DIR";

/// Memory device the range is mapped through by default
pub const DEFAULT_MEM_PATH: &str = "/dev/mem";

/// Location and revision of one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Reservation owner name
    pub name: String,
    /// Physical base address of the register block
    pub base: u64,
    /// Bytes reserved from `base`
    pub span: u64,
    /// Memory device file to map through
    pub mem_path: PathBuf,
    /// Axis width of the device revision
    pub axis: AxisWidth,
    /// Directory for a cross-process lock file, if any
    pub lock_dir: Option<PathBuf>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: DRIVER_NAME.to_string(),
            base: TYPICAL_BASE,
            span: TYPICAL_SPAN,
            mem_path: PathBuf::from(DEFAULT_MEM_PATH),
            axis: AxisWidth::default(),
            lock_dir: None,
        }
    }
}

impl DeviceConfig {
    /// Defaults overlaid with the `VGA_BALL_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns `Config` if a variable is set but malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`
    ///
    /// # Errors
    ///
    /// Returns `Config` if a value is malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_BASE) {
            config.base = parse_address(ENV_BASE, &value)?;
        }
        if let Some(value) = lookup(ENV_SPAN) {
            config.span = parse_address(ENV_SPAN, &value)?;
        }
        if let Some(value) = lookup(ENV_MEM) {
            config.mem_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_AXIS_BITS) {
            config.axis = parse_axis_bits(&value)?;
        }
        if let Some(value) = lookup(ENV_LOCK_DIR) {
            config.lock_dir = Some(PathBuf::from(value));
        }

        tracing::debug!(
            "Device config: {} at {:#x}+{:#x} via {} ({} axes)",
            config.name,
            config.base,
            config.span,
            config.mem_path.display(),
            config.axis
        );
        Ok(config)
    }

    /// Address range this config describes
    #[must_use]
    pub fn resource(&self) -> PlatformResource {
        PlatformResource::new(self.name.clone(), self.base, self.span)
    }
}

/// Parse an address or length, hex with `0x` prefix or decimal
///
/// # Errors
///
/// Returns `Config` naming `what` if the value does not parse.
pub fn parse_address(what: &str, value: &str) -> Result<u64> {
    let trimmed = value.trim().replace('_', "");
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };
    parsed.map_err(|e| BallError::config(format!("{what}={value:?}: {e}")))
}

/// Parse an axis width given in bits
///
/// # Errors
///
/// Returns `Config` unless the value is `10` or `16`.
pub fn parse_axis_bits(value: &str) -> Result<AxisWidth> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .and_then(AxisWidth::from_bits)
        .ok_or_else(|| BallError::config(format!("{ENV_AXIS_BITS}={value:?}: expected 10 or 16")))
}

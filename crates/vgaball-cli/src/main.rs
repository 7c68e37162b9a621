// SPDX-License-Identifier: AGPL-3.0-only

//! `vgaball` — command-line interface for the VGA ball peripheral.
//!
//! ```text
//! USAGE:
//!   vgaball info                         Register layout and resolved config
//!   vgaball set <R> <G> <B> <X> <Y>      Set background and ball together
//!   vgaball background <R> <G> <B>       Set the background, ball at home
//!   vgaball position <X> <Y>             Move the ball, background default
//! ```
//!
//! The registers are write-only and the shadow lives in the process, so every
//! invocation attaches, which re-initializes the device to the power-on
//! defaults (beige, ball at (160, 120)), runs one command, and detaches.
//! `set` programs the full state in one attach. Location comes from
//! `VGA_BALL_*` variables, overridden by the flags below. `--simulate` runs
//! against an in-process register file and prints the bytes written.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vgaball_chip::regs::Register;
use vgaball_driver::{
    attach_mmio, attach_simulated, parse_address, parse_axis_bits, BallController, Color,
    DeviceConfig, Position, RegisterBus,
};

#[derive(Parser)]
#[command(name = "vgaball", about = "VGA ball display coprocessor CLI", version)]
struct Cli {
    /// Physical base address of the register block (hex or decimal).
    #[arg(long, global = true, value_parser = parse_base)]
    base: Option<u64>,

    /// Bytes to reserve from the base.
    #[arg(long, global = true, value_parser = parse_span)]
    span: Option<u64>,

    /// Memory device to map through (e.g. /dev/mem, /dev/uio0).
    #[arg(long, global = true)]
    mem: Option<PathBuf>,

    /// Axis width of the device revision: 10 or 16.
    #[arg(long, global = true, value_parser = parse_axis)]
    axis_bits: Option<vgaball_driver::AxisWidth>,

    /// Use a simulated register file instead of hardware.
    #[arg(long, global = true)]
    simulate: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the register layout and the resolved device config.
    Info,
    /// Set background color and ball position in one attach.
    Set {
        /// Red channel.
        red: u8,
        /// Green channel.
        green: u8,
        /// Blue channel.
        blue: u8,
        /// Horizontal coordinate.
        x: u16,
        /// Vertical coordinate.
        y: u16,
    },
    /// Set the background color (ball returns to its home position).
    Background {
        /// Red channel.
        red: u8,
        /// Green channel.
        green: u8,
        /// Blue channel.
        blue: u8,
    },
    /// Move the ball (background returns to the default color).
    Position {
        /// Horizontal coordinate.
        x: u16,
        /// Vertical coordinate.
        y: u16,
    },
}

fn parse_base(s: &str) -> std::result::Result<u64, String> {
    parse_address("--base", s).map_err(|e| e.to_string())
}

fn parse_span(s: &str) -> std::result::Result<u64, String> {
    parse_address("--span", s).map_err(|e| e.to_string())
}

fn parse_axis(s: &str) -> std::result::Result<vgaball_driver::AxisWidth, String> {
    parse_axis_bits(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    tracing::debug!("Resolved config: {config:?}");

    if matches!(cli.command, Cmd::Info) {
        cmd_info(&config);
        return Ok(());
    }

    if cli.simulate {
        let (ball, bus) = attach_simulated(&config.resource(), config.axis)
            .context("attaching simulated device")?;
        bus.clear_log();
        run(&ball, &cli.command)?;
        for write in bus.writes() {
            let name = Register::from_offset(write.offset).map_or("?", Register::name);
            println!("  {name:<12} @ {:#x} <- {:#04x}", write.offset, write.value);
        }
    } else {
        let ball = attach_mmio(&config)
            .with_context(|| format!("attaching {}", config.resource()))?;
        run(&ball, &cli.command)?;
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<DeviceConfig> {
    let mut config = DeviceConfig::from_env()?;
    if let Some(base) = cli.base {
        config.base = base;
    }
    if let Some(span) = cli.span {
        config.span = span;
    }
    if let Some(mem) = &cli.mem {
        config.mem_path.clone_from(mem);
    }
    if let Some(axis) = cli.axis_bits {
        config.axis = axis;
    }
    Ok(config)
}

fn run<B: RegisterBus>(ball: &BallController<B>, command: &Cmd) -> Result<()> {
    println!("Attached   : device re-initialized to power-on defaults");

    match *command {
        Cmd::Info => {}
        Cmd::Set {
            red,
            green,
            blue,
            x,
            y,
        } => {
            ball.set_background(Color::new(red, green, blue))?;
            ball.set_position(Position::new(x, y))?;
        }
        Cmd::Background { red, green, blue } => {
            ball.set_background(Color::new(red, green, blue))?;
        }
        Cmd::Position { x, y } => ball.set_position(Position::new(x, y))?,
    }

    let state = ball.snapshot();
    println!("Background : {}", state.background);
    println!("Ball       : {}", state.position);
    Ok(())
}

fn cmd_info(config: &DeviceConfig) {
    println!("Device     : {}", config.resource());
    println!("Memory     : {}", config.mem_path.display());
    println!("Axes       : {} (max {})", config.axis, config.axis.max());
    println!("Raster     : {}x{}", vgaball_chip::display::WIDTH, vgaball_chip::display::HEIGHT);
    println!("Compatible : {}", vgaball_chip::platform::COMPATIBLE);
    println!("Protocol   : v{}", vgaball_driver::protocol::PROTOCOL_VERSION);
    if let Some(dir) = &config.lock_dir {
        println!("Lock dir   : {}", dir.display());
    }
    println!();
    println!("Registers (write-only):");
    for reg in Register::ALL {
        println!("  {:#x}  {}", reg.offset(), reg.name());
    }
}

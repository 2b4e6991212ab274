use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use medusa_core::band::BandCatalog;
use medusa_core::consts::{DEFAULT_BAUD_RATE, DEFAULT_WHITE_CHANNEL};
use medusa_core::hardware::serial::SerialLightController;
use medusa_core::hardware::LightController;

use super::run::LightModeArg;

#[derive(Clone, Copy, ValueEnum)]
pub enum Switch {
    On,
    Off,
    AllOff,
}

#[derive(Args)]
pub struct LightArgs {
    /// Serial device of the LED controller
    #[arg(long)]
    pub serial: PathBuf,

    /// Line speed of the serial port
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,

    /// What to do
    #[arg(value_enum)]
    pub switch: Switch,

    /// Band label or channel number (ignored for all-off)
    pub band: Option<String>,

    /// How the controller latches LEDs that are switched on
    #[arg(long, value_enum, default_value = "session")]
    pub mode: LightModeArg,
}

pub fn run(args: &LightArgs) -> Result<()> {
    let mut lights = SerialLightController::open(&args.serial, args.baud, args.mode.into())
        .with_context(|| format!("Failed to open LED controller {}", args.serial.display()))?;

    if let Switch::AllOff = args.switch {
        lights.all_off()?;
        println!("All LEDs off");
        return Ok(());
    }

    let name = args
        .band
        .as_deref()
        .context("A band is required to switch a single LED")?;
    let band = BandCatalog::medusa(DEFAULT_WHITE_CHANNEL).resolve(name)?;
    let on = matches!(args.switch, Switch::On);
    lights.set_band(band.channel, on)?;
    println!("{band} {}", if on { "on" } else { "off" });
    Ok(())
}

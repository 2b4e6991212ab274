use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use medusa_core::config::{FrameSourceConfig, MedusaConfig};
use medusa_core::consts::DEFAULT_BAUD_RATE;
use medusa_core::frame::Resolution;
use medusa_core::hardware::LightMode;
use medusa_core::progress::RunEvent;
use medusa_core::timelapse::{RunOutcome, TimelapseController};

use crate::rig::build_rig;
use crate::summary::{print_run_report, print_run_summary};

#[derive(Clone, Copy, ValueEnum)]
pub enum LightModeArg {
    Session,
    Always,
}

impl From<LightModeArg> for LightMode {
    fn from(arg: LightModeArg) -> Self {
        match arg {
            LightModeArg::Session => LightMode::Session,
            LightModeArg::Always => LightMode::Always,
        }
    }
}

#[derive(Args)]
pub struct RunArgs {
    /// Run config file (TOML); overrides every other flag
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of sets to capture
    #[arg(short = 'n', long, default_value = "1")]
    pub sets: usize,

    /// Seconds to wait between sets
    #[arg(short, long, default_value = "0")]
    pub interval: f64,

    /// Comma-separated bands by label or channel (e.g. 419nm,446nm,14)
    #[arg(short, long)]
    pub bands: Option<String>,

    /// Compute three principal component images per set
    #[arg(long)]
    pub pca: bool,

    /// Channel of the white reference LED
    #[arg(long, default_value = "14")]
    pub white: u8,

    /// Serial device of the LED controller (simulated LEDs if omitted)
    #[arg(long)]
    pub serial: Option<PathBuf>,

    /// Line speed of the LED controller's serial port
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,

    /// How the controller latches LEDs that are switched on
    #[arg(long, value_enum, default_value = "session")]
    pub mode: LightModeArg,

    /// Replay frames from a SER recording instead of the simulated camera
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Camera resolution as WIDTHxHEIGHT
    #[arg(long, default_value = "1280x720")]
    pub resolution: String,

    /// Pause after each warm-up frame, in milliseconds
    #[arg(long, default_value = "100")]
    pub warmup_ms: u64,

    /// Fail a frame read that takes longer than this many milliseconds
    #[arg(long)]
    pub frame_timeout_ms: Option<u64>,

    /// Directory for the captured images
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str::<MedusaConfig>(&contents).context("Invalid run config")?
    } else {
        build_config_from_args(args)?
    };
    config.run.validate().context("Invalid run config")?;

    print_run_summary(&config);

    let rig = build_rig(&config.rig, &config.run.capture)?;
    let (mut controller, events) = TimelapseController::new(rig);
    controller.start(config.run.clone())?;

    let bands = config.run.enabled_bands()?.len() as u64;
    let pb = ProgressBar::new(config.run.total_sets as u64 * bands);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:40} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    pb.println("Type q + Enter to stop after the current set.");

    let quit = spawn_quit_listener();
    loop {
        // A run that already ended has nothing to cancel.
        if quit.try_recv().is_ok() && controller.cancel().is_ok() {
            pb.set_message("Cancelling...");
        }
        match events.recv_timeout(Duration::from_millis(100)) {
            Ok(RunEvent::Status(message)) => pb.set_message(message),
            Ok(RunEvent::BandProgress {
                set,
                current,
                ..
            }) => pb.set_position(set as u64 * bands + current as u64),
            Ok(RunEvent::PcaFailed { set, reason }) => {
                pb.println(format!("PCA failed for set {set}: {reason}"));
            }
            Ok(RunEvent::Finished(_)) => break,
            Ok(_) => {}
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    let report = controller.wait()?;
    match report.outcome {
        RunOutcome::Completed => pb.finish_with_message("Done"),
        RunOutcome::Cancelled => pb.abandon_with_message("Cancelled"),
    }
    print_run_report(&report, &config.rig.output_dir);
    Ok(())
}

/// Forward `q` lines from stdin as cancellation requests.
fn spawn_quit_listener() -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().eq_ignore_ascii_case("q") && tx.send(()).is_err() {
                break;
            }
        }
    });
    rx
}

fn build_config_from_args(args: &RunArgs) -> Result<MedusaConfig> {
    let mut config = MedusaConfig::default();

    config.run.total_sets = args.sets;
    config.run.interval_secs = args.interval;
    config.run.pca = args.pca;
    config.run.white_channel = args.white;
    if let Some(ref bands) = args.bands {
        config.run.bands = bands
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    config.run.capture.resolution = parse_resolution(&args.resolution)?;
    config.run.capture.warmup_delay_ms = args.warmup_ms;
    config.run.capture.frame_timeout_ms = args.frame_timeout_ms;

    config.rig.serial_port = args.serial.clone();
    config.rig.baud_rate = args.baud;
    config.rig.light_mode = args.mode.into();
    config.rig.output_dir = args.output.clone();
    if let Some(ref path) = args.replay {
        config.rig.source = FrameSourceConfig::Replay { path: path.clone() };
    }

    Ok(config)
}

fn parse_resolution(s: &str) -> Result<Resolution> {
    let Some((w, h)) = s.split_once(['x', 'X']) else {
        bail!("Resolution must look like 1280x720, got '{s}'");
    };
    let width = w.trim().parse().context("Invalid resolution width")?;
    let height = h.trim().parse().context("Invalid resolution height")?;
    Ok(Resolution::new(width, height))
}

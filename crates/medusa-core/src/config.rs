use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::band::{Band, BandCatalog, STOCK_LABELS};
use crate::consts::{
    DEFAULT_BAUD_RATE, DEFAULT_POLL_INTERVAL, DEFAULT_SETTLE_DELAY, DEFAULT_WARMUP_DELAY,
    DEFAULT_WHITE_CHANNEL, PCA_MIN_BANDS,
};
use crate::error::{MedusaError, Result};
use crate::frame::Resolution;
use crate::hardware::LightMode;

/// Timing and geometry of a single band capture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Expected camera resolution; frames of any other size are rejected.
    pub resolution: Resolution,
    /// Pause after each warm-up read, in milliseconds.
    pub warmup_delay_ms: u64,
    /// Pause before the first set, in milliseconds.
    pub settle_ms: u64,
    /// Upper bound on a single frame read. `None` waits indefinitely.
    pub frame_timeout_ms: Option<u64>,
}

impl CaptureSettings {
    pub fn warmup_delay(&self) -> Duration {
        Duration::from_millis(self.warmup_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn frame_timeout(&self) -> Option<Duration> {
        self.frame_timeout_ms.map(Duration::from_millis)
    }

    /// No delays at all; for simulated hardware.
    pub fn immediate(resolution: Resolution) -> Self {
        Self {
            resolution,
            warmup_delay_ms: 0,
            settle_ms: 0,
            frame_timeout_ms: None,
        }
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            warmup_delay_ms: DEFAULT_WARMUP_DELAY.as_millis() as u64,
            settle_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            frame_timeout_ms: None,
        }
    }
}

/// Parameters of one time-lapse run. Frozen once the run starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of sets to capture.
    pub total_sets: usize,
    /// Wait between the end of one set and the start of the next, in seconds.
    pub interval_secs: f64,
    /// Enabled bands, by label (`632nm`) or channel number, in capture order.
    pub bands: Vec<String>,
    /// Channel of the broadband white LED.
    pub white_channel: u8,
    /// Reduce each set to three principal component images.
    pub pca: bool,
    /// Cancellation polling granularity during waits, in milliseconds.
    pub poll_interval_ms: u64,
    pub capture: CaptureSettings,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            total_sets: 1,
            interval_secs: 0.0,
            bands: STOCK_LABELS
                .iter()
                .filter(|label| **label != "NOT")
                .map(|label| (*label).to_string())
                .collect(),
            white_channel: DEFAULT_WHITE_CHANNEL,
            pca: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            capture: CaptureSettings::default(),
        }
    }
}

impl RunConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_secs.max(0.0))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn catalog(&self) -> BandCatalog {
        BandCatalog::medusa(self.white_channel)
    }

    /// Resolve the configured band names against the rig's catalog.
    pub fn enabled_bands(&self) -> Result<Vec<Band>> {
        let catalog = self.catalog();
        self.bands.iter().map(|name| catalog.resolve(name)).collect()
    }

    /// Number of enabled bands that feed the PCA stack.
    pub fn pca_band_count(&self) -> Result<usize> {
        Ok(self
            .enabled_bands()?
            .iter()
            .filter(|b| !b.is_reference_white)
            .count())
    }

    /// Whether PCA can run at all with the enabled bands.
    pub fn check_pca(&self) -> Result<()> {
        let available = self.pca_band_count()?;
        if available < PCA_MIN_BANDS {
            return Err(MedusaError::InsufficientBands {
                required: PCA_MIN_BANDS,
                available,
            });
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_sets == 0 {
            return Err(MedusaError::InvalidConfig("total_sets must be at least 1".into()));
        }
        if !self.interval_secs.is_finite() || self.interval_secs < 0.0 {
            return Err(MedusaError::InvalidConfig(format!(
                "interval_secs must be a non-negative number, got {}",
                self.interval_secs
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(MedusaError::InvalidConfig("poll_interval_ms must be positive".into()));
        }
        if self.capture.resolution.pixel_count() == 0 {
            return Err(MedusaError::InvalidConfig(format!(
                "invalid resolution {}",
                self.capture.resolution
            )));
        }
        if self.capture.frame_timeout_ms == Some(0) {
            return Err(MedusaError::InvalidConfig("frame_timeout_ms must be positive".into()));
        }

        let bands = self.enabled_bands()?;
        if bands.is_empty() {
            return Err(MedusaError::InvalidConfig("no bands enabled".into()));
        }
        let mut seen = HashSet::new();
        for band in &bands {
            if !seen.insert(band.channel) {
                return Err(MedusaError::InvalidConfig(format!(
                    "band {} enabled more than once",
                    band.label
                )));
            }
        }
        Ok(())
    }
}

/// Where frames come from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FrameSourceConfig {
    /// Synthetic camera wired to the simulated LED board.
    #[default]
    Simulated,
    /// Loop over the frames of a SER recording.
    Replay { path: PathBuf },
}

/// Hardware wiring of the rig.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Serial device of the LED controller. `None` uses simulated LEDs.
    pub serial_port: Option<PathBuf>,
    /// Line speed of the LED controller port.
    pub baud_rate: u32,
    pub light_mode: LightMode,
    pub source: FrameSourceConfig,
    /// Directory receiving `<set>_<band>.png` files.
    pub output_dir: PathBuf,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            serial_port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            light_mode: LightMode::Session,
            source: FrameSourceConfig::Simulated,
            output_dir: PathBuf::from("."),
        }
    }
}

/// Complete on-disk configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedusaConfig {
    pub run: RunConfig,
    pub rig: RigConfig,
}

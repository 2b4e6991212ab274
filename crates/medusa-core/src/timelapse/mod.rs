mod controller;
mod run;

pub use controller::{ControllerState, TimelapseController};
pub use run::run_timelapse;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::hardware::watchdog::WatchdogFrameSource;
use crate::hardware::{FrameSource, LightController};
use crate::io::ImageSink;

/// The hardware handles a run owns exclusively for its whole duration.
pub struct Rig {
    pub lights: Box<dyn LightController + Send>,
    pub camera: Box<dyn FrameSource + Send>,
    pub sink: Box<dyn ImageSink + Send>,
}

impl Rig {
    pub fn new(
        lights: impl LightController + Send + 'static,
        camera: impl FrameSource + Send + 'static,
        sink: impl ImageSink + Send + 'static,
    ) -> Self {
        Self {
            lights: Box::new(lights),
            camera: Box::new(camera),
            sink: Box::new(sink),
        }
    }

    /// Bound every frame read by `timeout`, if one is given.
    pub fn with_frame_timeout(self, timeout: Option<Duration>) -> Result<Self> {
        let Some(timeout) = timeout else {
            return Ok(self);
        };
        let Rig {
            lights,
            camera,
            sink,
        } = self;
        let camera = WatchdogFrameSource::spawn(camera, timeout)?;
        Ok(Self {
            lights,
            camera: Box::new(camera),
            sink,
        })
    }
}

/// Cooperative cancellation flag shared between a run and its controller.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a run that did not fail came to an end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

/// Summary of a finished run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub sets_completed: usize,
    pub total_sets: usize,
    /// `(set, reason)` for every set whose PCA failed.
    pub pca_failures: Vec<(usize, String)>,
    /// Why PCA was switched off for the whole run, if it was requested but impossible.
    pub pca_skipped: Option<String>,
}

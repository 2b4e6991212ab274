#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use ndarray::{Array2, Array3};
use rand::rngs::StdRng;
use rand::Rng;

use medusa_core::config::{CaptureSettings, RunConfig};
use medusa_core::error::{MedusaError, Result};
use medusa_core::frame::{Frame, Resolution};
use medusa_core::hardware::sim::SimulatedRig;
use medusa_core::hardware::FrameSource;
use medusa_core::io::image_io::MemorySink;
use medusa_core::io::{ImageKey, ImageSink};
use medusa_core::progress::ProgressReporter;
use medusa_core::timelapse::{Rig, RunReport};

pub const FRAMES_PER_BAND: usize = 20;

pub fn resolution() -> Resolution {
    Resolution::new(16, 12)
}

pub fn four_bands() -> Vec<String> {
    ["419nm", "446nm", "470nm", "502nm"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Run config for simulated hardware: no delays, fine polling.
pub fn sim_config(total_sets: usize, bands: Vec<String>, pca: bool) -> RunConfig {
    RunConfig {
        total_sets,
        interval_secs: 0.0,
        bands,
        white_channel: 14,
        pca,
        poll_interval_ms: 10,
        capture: CaptureSettings::immediate(resolution()),
    }
}

/// Simulated rig with an in-memory sink. Returns handles to inspect both.
pub fn sim_rig() -> (SimulatedRig, MemorySink, Rig) {
    let sim = SimulatedRig::new(resolution());
    let sink = MemorySink::new();
    let rig = Rig::new(sim.lights(), sim.camera(), sink.clone());
    (sim, sink, rig)
}

/// Camera handing out a fixed sequence of frames, then failing.
pub struct ScriptedCamera {
    frames: VecDeque<Frame>,
}

impl ScriptedCamera {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Ten copies of `dark` followed by ten copies of `lit`.
    pub fn dark_then_lit(dark: Frame, lit: Frame) -> Self {
        let mut frames = vec![dark; 10];
        frames.extend(vec![lit; 10]);
        Self::new(frames)
    }
}

impl FrameSource for ScriptedCamera {
    fn capture_frame(&mut self) -> Result<Frame> {
        self.frames
            .pop_front()
            .ok_or_else(|| MedusaError::FrameAcquisitionFailed("script exhausted".into()))
    }
}

/// Camera returning the same uniform frame forever.
#[derive(Clone)]
pub struct FlatCamera {
    pub resolution: Resolution,
    pub value: u8,
}

impl FrameSource for FlatCamera {
    fn capture_frame(&mut self) -> Result<Frame> {
        Ok(Frame::Color(Array3::from_elem(
            (self.resolution.height, self.resolution.width, 3),
            self.value,
        )))
    }
}

/// Camera that takes `delay` per frame.
pub struct SlowCamera {
    pub delay: Duration,
}

impl FrameSource for SlowCamera {
    fn capture_frame(&mut self) -> Result<Frame> {
        std::thread::sleep(self.delay);
        Ok(Frame::Mono(Array2::zeros((2, 2))))
    }
}

/// In-memory sink whose `fail_at`-th save (1-based) fails like a full disk.
pub struct FailingSink {
    pub inner: MemorySink,
    pub fail_at: usize,
    saves: usize,
}

impl FailingSink {
    pub fn new(inner: MemorySink, fail_at: usize) -> Self {
        Self {
            inner,
            fail_at,
            saves: 0,
        }
    }
}

impl ImageSink for FailingSink {
    fn save(&mut self, key: &ImageKey, image: &Frame) -> Result<()> {
        self.saves += 1;
        if self.saves == self.fail_at {
            return Err(std::io::Error::other("disk full").into());
        }
        self.inner.save(key, image)
    }

    fn remove(&mut self, key: &ImageKey) -> Result<()> {
        self.inner.remove(key)
    }
}

pub fn mono(rows: usize, cols: usize, values: Vec<u8>) -> Frame {
    Frame::Mono(Array2::from_shape_vec((rows, cols), values).unwrap())
}

pub fn random_plane(rng: &mut StdRng, h: usize, w: usize) -> Array2<u8> {
    Array2::from_shape_fn((h, w), |_| rng.random_range(0..=255u8))
}

/// Reporter recording everything it is told.
#[derive(Default)]
pub struct RecordingReporter {
    pub statuses: Mutex<Vec<String>>,
    pub bands: Mutex<Vec<(usize, usize, usize, String)>>,
    pub completed: Mutex<Vec<usize>>,
    pub pca_failures: Mutex<Vec<usize>>,
    pub waits: Mutex<usize>,
    pub finished: Mutex<Option<std::result::Result<RunReport, String>>>,
}

impl ProgressReporter for RecordingReporter {
    fn status(&self, message: &str) {
        self.statuses.lock().unwrap().push(message.to_string());
    }

    fn band_progress(&self, set: usize, current: usize, total: usize, label: &str) {
        self.bands
            .lock()
            .unwrap()
            .push((set, current, total, label.to_string()));
    }

    fn waiting(
        &self,
        _completed: usize,
        _total: usize,
        _elapsed: Duration,
        _interval: Duration,
    ) {
        *self.waits.lock().unwrap() += 1;
    }

    fn set_completed(&self, set: usize) {
        self.completed.lock().unwrap().push(set);
    }

    fn pca_failed(&self, set: usize, _reason: &str) {
        self.pca_failures.lock().unwrap().push(set);
    }

    fn finished(&self, result: std::result::Result<&RunReport, String>) {
        *self.finished.lock().unwrap() = Some(result.cloned());
    }
}

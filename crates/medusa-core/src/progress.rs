use std::sync::mpsc;
use std::time::Duration;

use crate::timelapse::RunReport;

/// Outward stream of run status, consumed by whatever surface drives the rig.
#[derive(Clone, Debug)]
pub enum RunEvent {
    /// Human-readable status line.
    Status(String),
    /// A band of the current set finished: `current` of `total`, 1-based.
    BandProgress {
        set: usize,
        current: usize,
        total: usize,
        label: String,
    },
    /// Time spent so far waiting for the next set.
    Waiting {
        completed_sets: usize,
        total_sets: usize,
        elapsed: Duration,
        interval: Duration,
    },
    SetCompleted { set: usize },
    /// PCA for one set failed; the run carries on.
    PcaFailed { set: usize, reason: String },
    /// The run ended. `Err` carries the rendered failure.
    Finished(Result<RunReport, String>),
}

impl RunEvent {
    /// Share of all sets completed, 0-100.
    pub fn run_percent(completed_sets: usize, total_sets: usize) -> f32 {
        if total_sets == 0 {
            return 100.0;
        }
        100.0 * completed_sets as f32 / total_sets as f32
    }
}

/// Thread-safe progress reporting for a run.
///
/// All methods default to no-ops so implementors pick what they show.
pub trait ProgressReporter: Send + Sync {
    fn status(&self, _message: &str) {}

    fn band_progress(&self, _set: usize, _current: usize, _total: usize, _label: &str) {}

    fn waiting(
        &self,
        _completed_sets: usize,
        _total_sets: usize,
        _elapsed: Duration,
        _interval: Duration,
    ) {
    }

    fn set_completed(&self, _set: usize) {}

    fn pca_failed(&self, _set: usize, _reason: &str) {}

    fn finished(&self, _result: Result<&RunReport, String>) {}
}

/// Discards everything.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Forwards every report as a [`RunEvent`] over an mpsc channel.
pub struct ChannelReporter {
    tx: mpsc::Sender<RunEvent>,
}

impl ChannelReporter {
    pub fn new(tx: mpsc::Sender<RunEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: RunEvent) {
        // The receiver going away must not stop the rig.
        let _ = self.tx.send(event);
    }
}

impl ProgressReporter for ChannelReporter {
    fn status(&self, message: &str) {
        self.send(RunEvent::Status(message.to_string()));
    }

    fn band_progress(&self, set: usize, current: usize, total: usize, label: &str) {
        self.send(RunEvent::BandProgress {
            set,
            current,
            total,
            label: label.to_string(),
        });
    }

    fn waiting(
        &self,
        completed_sets: usize,
        total_sets: usize,
        elapsed: Duration,
        interval: Duration,
    ) {
        self.send(RunEvent::Waiting {
            completed_sets,
            total_sets,
            elapsed,
            interval,
        });
    }

    fn set_completed(&self, set: usize) {
        self.send(RunEvent::SetCompleted { set });
    }

    fn pca_failed(&self, set: usize, reason: &str) {
        self.send(RunEvent::PcaFailed {
            set,
            reason: reason.to_string(),
        });
    }

    fn finished(&self, result: Result<&RunReport, String>) {
        self.send(RunEvent::Finished(result.cloned()));
    }
}

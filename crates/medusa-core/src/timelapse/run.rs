use std::borrow::Borrow;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::capture::{force_all_off, BandCapture, SetSequencer};
use crate::config::RunConfig;
use crate::consts::PCA_COMPONENTS;
use crate::error::Result;
use crate::frame::{CaptureSet, Frame};
use crate::io::{ImageKey, ImageSink};
use crate::pca;
use crate::progress::{ProgressReporter, RunEvent};

use super::{CancelToken, Rig, RunOutcome, RunReport};

/// Mutable progress of the run in flight.
#[derive(Debug, Default)]
struct RunState {
    set_index: usize,
    waited: Duration,
    cancelled: bool,
}

/// Run a whole time-lapse on the calling thread.
///
/// Capture failures end the run with an error; PCA failures are reported and
/// the run carries on. The LEDs are always left off, whatever the outcome.
pub fn run_timelapse(
    rig: &mut Rig,
    config: &RunConfig,
    cancel: &CancelToken,
    reporter: &dyn ProgressReporter,
) -> Result<RunReport> {
    let result = run_sets(rig, config, cancel, reporter);
    force_all_off(&mut *rig.lights);

    match &result {
        Ok(report) => {
            let message = match report.outcome {
                RunOutcome::Completed => "Sets have been captured successfully!".to_string(),
                RunOutcome::Cancelled => format!(
                    "Run cancelled after {} of {} sets",
                    report.sets_completed, report.total_sets
                ),
            };
            reporter.status(&message);
            reporter.finished(Ok(report));
        }
        Err(e) if e.is_hardware() => {
            error!(error = %e, "Rig failure, LEDs forced off");
            reporter.status(&format!("Capture failed: {e}"));
            reporter.finished(Err(e.to_string()));
        }
        Err(e) => {
            warn!(error = %e, "Time-lapse failed");
            reporter.status(&format!("Run failed: {e}"));
            reporter.finished(Err(e.to_string()));
        }
    }
    result
}

fn run_sets(
    rig: &mut Rig,
    config: &RunConfig,
    cancel: &CancelToken,
    reporter: &dyn ProgressReporter,
) -> Result<RunReport> {
    config.validate()?;
    let bands = config.enabled_bands()?;
    let total_sets = config.total_sets;

    let mut report = RunReport {
        outcome: RunOutcome::Completed,
        sets_completed: 0,
        total_sets,
        pca_failures: Vec::new(),
        pca_skipped: None,
    };

    let pca_enabled = config.pca
        && match config.check_pca() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "PCA disabled for this run");
                reporter.status(&format!("PCA disabled: {e}"));
                report.pca_skipped = Some(e.to_string());
                false
            }
        };

    info!(
        sets = total_sets,
        bands = bands.len(),
        interval_secs = config.interval_secs,
        pca = pca_enabled,
        "Starting time-lapse"
    );
    reporter.status("Capturing image sets...");

    let mut state = RunState::default();
    let poll = config.poll_interval();

    if !wait_cancellable(config.capture.settle_delay(), poll, cancel, |_| {}) {
        report.outcome = RunOutcome::Cancelled;
        return Ok(report);
    }
    rig.lights.all_off()?;

    for set in 0..total_sets {
        state.set_index = set;
        if cancel.is_cancelled() {
            state.cancelled = true;
            break;
        }

        info!(set, "Capturing set");
        reporter.status(&format!("Capturing set {} of {}", set + 1, total_sets));

        let capture_set = {
            let capture = BandCapture::new(&mut *rig.lights, &mut *rig.camera, &config.capture);
            SetSequencer::new(capture).capture_set(&bands, set, reporter)?
        };
        persist_set(&mut *rig.sink, &capture_set)?;

        if pca_enabled {
            reporter.status("Processing images for PCA...");
            match reduce_and_persist(&mut *rig.sink, &capture_set) {
                Ok(()) => reporter.status("PCA finished successfully!"),
                Err(e) => {
                    if e.is_pca() {
                        warn!(set, error = %e, "PCA failed");
                    } else {
                        error!(set, error = %e, "Failed to persist principal components");
                    }
                    reporter.pca_failed(set, &e.to_string());
                    report.pca_failures.push((set, e.to_string()));
                }
            }
        }

        report.sets_completed += 1;
        reporter.set_completed(set);

        if set + 1 < total_sets {
            let interval = config.interval();
            let completed = set + 1;
            let finished = wait_cancellable(interval, poll, cancel, |elapsed| {
                state.waited = elapsed;
                reporter.waiting(completed, total_sets, elapsed, interval);
                reporter.status(&format!(
                    "Progress: {} of {} sets -> {:.1}%",
                    completed,
                    total_sets,
                    RunEvent::run_percent(completed, total_sets)
                ));
            });
            if !finished {
                force_all_off(&mut *rig.lights);
                state.cancelled = true;
                break;
            }
        }
    }

    if state.cancelled {
        report.outcome = RunOutcome::Cancelled;
    }
    info!(
        sets_completed = report.sets_completed,
        last_set = state.set_index,
        last_wait_ms = state.waited.as_millis() as u64,
        cancelled = state.cancelled,
        "Time-lapse finished"
    );
    Ok(report)
}

/// Sleep for `duration` in steps of at most `poll`, calling `on_tick` with the
/// elapsed time after each step. Returns `false` as soon as cancellation is seen.
fn wait_cancellable(
    duration: Duration,
    poll: Duration,
    cancel: &CancelToken,
    mut on_tick: impl FnMut(Duration),
) -> bool {
    let start = Instant::now();
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let elapsed = start.elapsed();
        if elapsed >= duration {
            return true;
        }
        thread::sleep(poll.min(duration - elapsed));
        on_tick(start.elapsed().min(duration));
    }
}

fn persist_set(sink: &mut dyn ImageSink, set: &CaptureSet) -> Result<()> {
    let images = set.images().iter().map(|image| {
        let key = ImageKey::Band {
            set: set.index,
            label: image.band.label.clone(),
        };
        (key, &image.image)
    });
    save_all(sink, images)
}

fn reduce_and_persist(sink: &mut dyn ImageSink, set: &CaptureSet) -> Result<()> {
    let output = pca::reduce(&set.band_stack())?;
    let components = output
        .components
        .into_iter()
        .take(PCA_COMPONENTS)
        .enumerate()
        .map(|(i, component)| {
            let key = ImageKey::Component {
                set: set.index,
                rank: i + 1,
            };
            (key, Frame::Mono(component))
        });
    save_all(sink, components)
}

/// Save every image or none: on the first failure, images already saved by
/// this call are removed before the error is returned.
fn save_all<F: Borrow<Frame>>(
    sink: &mut dyn ImageSink,
    images: impl IntoIterator<Item = (ImageKey, F)>,
) -> Result<()> {
    let mut saved = Vec::new();
    for (key, image) in images {
        if let Err(e) = sink.save(&key, image.borrow()) {
            for key in saved.iter().rev() {
                if let Err(remove_err) = sink.remove(key) {
                    warn!(image = %key, error = %remove_err, "Failed to remove partial image");
                }
            }
            warn!(image = %key, discarded = saved.len(), "Discarded partially saved images");
            return Err(e);
        }
        saved.push(key);
    }
    Ok(())
}

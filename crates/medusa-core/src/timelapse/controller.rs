use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use crate::config::RunConfig;
use crate::error::{MedusaError, Result};
use crate::progress::{ChannelReporter, RunEvent};

use super::{run_timelapse, CancelToken, Rig, RunReport};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running,
    /// Cancellation requested; the set in flight is still finishing.
    Cancelling,
}

type WorkerOutput = (Rig, Result<RunReport>);

/// Drives time-lapse runs on a dedicated worker thread.
///
/// The rig moves into the worker for the duration of a run and comes back
/// when the run ends, so nothing else can touch the hardware meanwhile.
/// Progress flows out through the event receiver returned by [`new`](Self::new).
pub struct TimelapseController {
    rig: Option<Rig>,
    worker: Option<JoinHandle<WorkerOutput>>,
    cancel: CancelToken,
    events: mpsc::Sender<RunEvent>,
    last_result: Option<Result<RunReport>>,
}

impl TimelapseController {
    pub fn new(rig: Rig) -> (Self, mpsc::Receiver<RunEvent>) {
        let (tx, rx) = mpsc::channel();
        let controller = Self {
            rig: Some(rig),
            worker: None,
            cancel: CancelToken::new(),
            events: tx,
            last_result: None,
        };
        (controller, rx)
    }

    pub fn state(&mut self) -> ControllerState {
        self.reap();
        match self.worker {
            None => ControllerState::Idle,
            Some(_) if self.cancel.is_cancelled() => ControllerState::Cancelling,
            Some(_) => ControllerState::Running,
        }
    }

    /// Start a run. Only valid while idle.
    pub fn start(&mut self, config: RunConfig) -> Result<()> {
        self.reap();
        if self.worker.is_some() {
            return Err(MedusaError::AlreadyRunning);
        }
        config.validate()?;

        let mut rig = self.rig.take().ok_or_else(|| {
            MedusaError::HardwareUnavailable("rig was lost when an earlier run panicked".into())
        })?;
        self.cancel = CancelToken::new();
        self.last_result = None;

        let token = self.cancel.clone();
        let reporter = ChannelReporter::new(self.events.clone());
        info!(sets = config.total_sets, "Spawning time-lapse worker");

        let worker = thread::Builder::new()
            .name("medusa-timelapse".into())
            .spawn(move || {
                let result = run_timelapse(&mut rig, &config, &token, &reporter);
                (rig, result)
            })?;
        self.worker = Some(worker);
        Ok(())
    }

    /// Ask the running run to stop at its next poll point or set boundary.
    pub fn cancel(&mut self) -> Result<()> {
        self.reap();
        if self.worker.is_none() {
            return Err(MedusaError::NotRunning);
        }
        self.cancel.cancel();
        Ok(())
    }

    /// Block until the current run ends and return its result. Also returns a
    /// result already collected by [`state`](Self::state) and not yet taken.
    pub fn wait(&mut self) -> Result<RunReport> {
        if let Some(worker) = self.worker.take() {
            self.collect(worker);
        }
        self.last_result.take().unwrap_or(Err(MedusaError::NotRunning))
    }

    /// Take the result of a run that ended on its own, if any.
    pub fn take_result(&mut self) -> Option<Result<RunReport>> {
        self.reap();
        self.last_result.take()
    }

    /// Get the rig back once idle.
    pub fn into_rig(mut self) -> Option<Rig> {
        if let Some(worker) = self.worker.take() {
            self.collect(worker);
        }
        self.rig.take()
    }

    fn reap(&mut self) {
        if self.worker.as_ref().is_some_and(|w| w.is_finished()) {
            if let Some(worker) = self.worker.take() {
                self.collect(worker);
            }
        }
    }

    fn collect(&mut self, worker: JoinHandle<WorkerOutput>) {
        match worker.join() {
            Ok((rig, result)) => {
                self.rig = Some(rig);
                self.last_result = Some(result);
            }
            Err(_) => {
                warn!("Time-lapse worker panicked; rig handles are gone");
                self.last_result = Some(Err(MedusaError::WorkerPanicked));
            }
        }
    }
}

impl Drop for TimelapseController {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.cancel.cancel();
            let _ = worker.join();
        }
    }
}

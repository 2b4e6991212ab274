use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::warn;

use crate::error::{MedusaError, Result};
use crate::frame::Frame;

use super::FrameSource;

/// Runs a frame source on its own thread and bounds every read by a timeout.
///
/// Once a read times out the camera is considered stalled: the late frame
/// could otherwise be handed to the next request, so every later read fails.
pub struct WatchdogFrameSource {
    requests: Option<mpsc::Sender<()>>,
    frames: mpsc::Receiver<Result<Frame>>,
    timeout: Duration,
    stalled: bool,
    worker: Option<JoinHandle<()>>,
}

impl WatchdogFrameSource {
    pub fn spawn<F>(source: F, timeout: Duration) -> Result<Self>
    where
        F: FrameSource + Send + 'static,
    {
        let (req_tx, req_rx) = mpsc::channel::<()>();
        let (frame_tx, frame_rx) = mpsc::channel::<Result<Frame>>();

        let worker = thread::Builder::new()
            .name("medusa-camera".into())
            .spawn(move || {
                let mut source = source;
                while req_rx.recv().is_ok() {
                    if frame_tx.send(source.capture_frame()).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            requests: Some(req_tx),
            frames: frame_rx,
            timeout,
            stalled: false,
            worker: Some(worker),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl FrameSource for WatchdogFrameSource {
    fn capture_frame(&mut self) -> Result<Frame> {
        if self.stalled {
            return Err(MedusaError::FrameAcquisitionFailed(
                "camera stalled on an earlier read".into(),
            ));
        }
        let requests = self
            .requests
            .as_ref()
            .ok_or_else(|| MedusaError::HardwareUnavailable("camera worker stopped".into()))?;
        requests
            .send(())
            .map_err(|_| MedusaError::HardwareUnavailable("camera worker exited".into()))?;

        match self.frames.recv_timeout(self.timeout) {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) => {
                self.stalled = true;
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Camera read timed out");
                Err(MedusaError::FrameAcquisitionFailed(format!(
                    "no frame within {} ms",
                    self.timeout.as_millis()
                )))
            }
            Err(RecvTimeoutError::Disconnected) => Err(MedusaError::HardwareUnavailable(
                "camera worker exited".into(),
            )),
        }
    }
}

impl Drop for WatchdogFrameSource {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            // A stalled camera may never return; leave that thread detached.
            if !self.stalled {
                let _ = worker.join();
            }
        }
    }
}

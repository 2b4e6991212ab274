use tracing::info;

use crate::band::Band;
use crate::error::Result;
use crate::frame::CaptureSet;
use crate::progress::ProgressReporter;

use super::{force_all_off, BandCapture};

/// Captures every enabled band once, in order.
pub struct SetSequencer<'a> {
    capture: BandCapture<'a>,
}

impl<'a> SetSequencer<'a> {
    pub fn new(capture: BandCapture<'a>) -> Self {
        Self { capture }
    }

    /// Returns a set only when every band succeeded. A failing band aborts
    /// the whole set with all LEDs off.
    pub fn capture_set(
        &mut self,
        bands: &[Band],
        set_index: usize,
        reporter: &dyn ProgressReporter,
    ) -> Result<CaptureSet> {
        let total = bands.len();
        let mut images = Vec::with_capacity(total);

        for (i, band) in bands.iter().enumerate() {
            reporter.status(&format!(
                "Capturing images, please wait: {} ({} of {})",
                band.label,
                i + 1,
                total
            ));
            match self.capture.capture(band) {
                Ok(image) => images.push(image),
                Err(e) => {
                    force_all_off(self.capture.lights());
                    return Err(e);
                }
            }
            reporter.band_progress(set_index, i + 1, total, &band.label);
        }

        info!(set = set_index, bands = total, "Set captured");
        CaptureSet::assemble(set_index, bands, images)
    }
}

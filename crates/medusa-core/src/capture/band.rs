use std::thread;

use tracing::debug;

use crate::band::Band;
use crate::config::CaptureSettings;
use crate::consts::WARMUP_FRAMES;
use crate::error::Result;
use crate::frame::{saturating_sub, subtract_frames, BandImage, Frame};
use crate::hardware::{FrameSource, LightController};

use super::force_all_off;

/// Captures one dark-subtracted band image.
///
/// Holds the rig's LED controller and camera for as long as it lives.
pub struct BandCapture<'a> {
    lights: &'a mut dyn LightController,
    camera: &'a mut dyn FrameSource,
    settings: &'a CaptureSettings,
}

impl<'a> BandCapture<'a> {
    pub fn new(
        lights: &'a mut dyn LightController,
        camera: &'a mut dyn FrameSource,
        settings: &'a CaptureSettings,
    ) -> Self {
        Self {
            lights,
            camera,
            settings,
        }
    }

    pub fn lights(&mut self) -> &mut dyn LightController {
        &mut *self.lights
    }

    /// Dark frame, then lit frame, then `lit - dark`.
    ///
    /// On any failure every LED is switched off and no image is returned.
    pub fn capture(&mut self, band: &Band) -> Result<BandImage> {
        self.capture_inner(band)
            .inspect_err(|_| force_all_off(&mut *self.lights))
    }

    fn capture_inner(&mut self, band: &Band) -> Result<BandImage> {
        self.lights.all_off()?;
        let dark = self.settled_frame()?;

        self.lights.set_band(band.channel, true)?;
        let lit = self.settled_frame();
        self.lights.set_band(band.channel, false)?;
        let lit = lit?;

        let image = if band.is_reference_white {
            subtract_frames(&lit, &dark)?
        } else {
            Frame::Mono(saturating_sub(&lit.to_luma(), &dark.to_luma()))
        };

        debug!(
            band = %band.label,
            channel = band.channel,
            channels = image.channels(),
            "Band captured"
        );
        Ok(BandImage {
            band: band.clone(),
            image,
        })
    }

    /// Read the warm-up frames and keep the last one.
    fn settled_frame(&mut self) -> Result<Frame> {
        let delay = self.settings.warmup_delay();
        let mut frame = self.read_checked()?;
        thread::sleep(delay);
        for _ in 1..WARMUP_FRAMES {
            frame = self.read_checked()?;
            thread::sleep(delay);
        }
        Ok(frame)
    }

    fn read_checked(&mut self) -> Result<Frame> {
        let frame = self.camera.capture_frame()?;
        frame.ensure_resolution(self.settings.resolution)?;
        Ok(frame)
    }
}

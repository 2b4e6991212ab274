pub mod serial;
pub mod sim;
pub mod watchdog;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::frame::Frame;

/// How the controller firmware should treat a band switched on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightMode {
    /// The LED is on for the duration of one capture.
    #[default]
    Session,
    /// The LED stays latched on until explicitly switched off.
    Always,
}

impl std::fmt::Display for LightMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session => write!(f, "Session"),
            Self::Always => write!(f, "Always"),
        }
    }
}

/// Switches the rig's LEDs.
pub trait LightController {
    fn set_band(&mut self, channel: u8, on: bool) -> Result<()>;

    fn all_off(&mut self) -> Result<()>;
}

/// Delivers frames from the camera at a fixed resolution.
pub trait FrameSource {
    fn capture_frame(&mut self) -> Result<Frame>;
}

impl<T: LightController + ?Sized> LightController for Box<T> {
    fn set_band(&mut self, channel: u8, on: bool) -> Result<()> {
        (**self).set_band(channel, on)
    }

    fn all_off(&mut self) -> Result<()> {
        (**self).all_off()
    }
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn capture_frame(&mut self) -> Result<Frame> {
        (**self).capture_frame()
    }
}

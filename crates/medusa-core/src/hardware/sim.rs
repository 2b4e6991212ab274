//! Simulated rig: an LED board and a camera sharing one illumination state.
//!
//! Every band lights a distinct synthetic pattern on top of a fixed ambient
//! floor, so dark subtraction and PCA see realistic, non-degenerate input.
//! The rig records every switch and frame read, and can inject faults.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ndarray::Array3;

use crate::error::{MedusaError, Result};
use crate::frame::{Frame, Resolution};

use super::{FrameSource, LightController};

/// Something the simulated hardware observed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RigEvent {
    On(u8),
    Off(u8),
    AllOff,
    /// A frame was read while the listed channels were lit.
    Frame(Vec<u8>),
}

#[derive(Debug, Default)]
struct RigState {
    lit: BTreeSet<u8>,
    events: Vec<RigEvent>,
    frames_served: usize,
    max_concurrent: usize,
    fail_frame_at: Option<usize>,
    lights_down: bool,
}

/// Handle to the shared simulated hardware. Clones share state.
#[derive(Clone, Debug)]
pub struct SimulatedRig {
    state: Arc<Mutex<RigState>>,
    resolution: Resolution,
}

impl SimulatedRig {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            state: Arc::new(Mutex::new(RigState::default())),
            resolution,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn lights(&self) -> SimulatedLights {
        SimulatedLights { rig: self.clone() }
    }

    pub fn camera(&self) -> SimulatedCamera {
        SimulatedCamera {
            rig: self.clone(),
            resolution: self.resolution,
        }
    }

    /// Camera returning frames at the wrong size.
    pub fn camera_with_resolution(&self, resolution: Resolution) -> SimulatedCamera {
        SimulatedCamera {
            rig: self.clone(),
            resolution,
        }
    }

    /// Fail the frame read with this 0-based index (counted over the rig's lifetime).
    pub fn fail_frame_at(&self, index: usize) {
        self.state().fail_frame_at = Some(index);
    }

    /// Make every subsequent LED command fail.
    pub fn disconnect_lights(&self) {
        self.state().lights_down = true;
    }

    pub fn events(&self) -> Vec<RigEvent> {
        self.state().events.clone()
    }

    pub fn clear_events(&self) {
        self.state().events.clear();
    }

    pub fn lit_channels(&self) -> Vec<u8> {
        self.state().lit.iter().copied().collect()
    }

    /// Highest number of LEDs that were ever lit at the same time.
    pub fn max_concurrent_on(&self) -> usize {
        self.state().max_concurrent
    }

    pub fn frames_served(&self) -> usize {
        self.state().frames_served
    }

    fn state(&self) -> MutexGuard<'_, RigState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// LED side of a [`SimulatedRig`].
#[derive(Clone, Debug)]
pub struct SimulatedLights {
    rig: SimulatedRig,
}

impl LightController for SimulatedLights {
    fn set_band(&mut self, channel: u8, on: bool) -> Result<()> {
        let mut state = self.rig.state();
        if state.lights_down {
            return Err(MedusaError::HardwareUnavailable(
                "simulated LED controller disconnected".into(),
            ));
        }
        if on {
            state.lit.insert(channel);
            state.events.push(RigEvent::On(channel));
        } else {
            state.lit.remove(&channel);
            state.events.push(RigEvent::Off(channel));
        }
        state.max_concurrent = state.max_concurrent.max(state.lit.len());
        Ok(())
    }

    fn all_off(&mut self) -> Result<()> {
        let mut state = self.rig.state();
        if state.lights_down {
            return Err(MedusaError::HardwareUnavailable(
                "simulated LED controller disconnected".into(),
            ));
        }
        state.lit.clear();
        state.events.push(RigEvent::AllOff);
        Ok(())
    }
}

/// Camera side of a [`SimulatedRig`]. Always produces RGB frames.
#[derive(Clone, Debug)]
pub struct SimulatedCamera {
    rig: SimulatedRig,
    resolution: Resolution,
}

impl FrameSource for SimulatedCamera {
    fn capture_frame(&mut self) -> Result<Frame> {
        let lit: Vec<u8> = {
            let mut state = self.rig.state();
            let index = state.frames_served;
            state.frames_served += 1;
            if state.fail_frame_at == Some(index) {
                return Err(MedusaError::FrameAcquisitionFailed(format!(
                    "simulated camera dropped frame {index}"
                )));
            }
            let lit: Vec<u8> = state.lit.iter().copied().collect();
            state.events.push(RigEvent::Frame(lit.clone()));
            lit
        };
        Ok(render_scene(self.resolution, &lit))
    }
}

const AMBIENT: u8 = 12;

/// Per-channel RGB response of the simulated sensor to each LED.
fn band_tint(channel: u8) -> [f32; 3] {
    match channel % 4 {
        0 => [0.3, 0.5, 1.0],
        1 => [0.4, 1.0, 0.5],
        2 => [1.0, 0.6, 0.3],
        _ => [0.8, 0.8, 0.8],
    }
}

/// Intensity of band `channel` at a pixel; distinct spatial frequency per band.
fn band_signal(channel: u8, row: usize, col: usize) -> f32 {
    let ch = channel as usize;
    let v = (row * (ch + 2) * 7 + col * (ch + 3) * 5 + ch * 11) % 160;
    40.0 + v as f32
}

fn render_scene(resolution: Resolution, lit: &[u8]) -> Frame {
    let data = Array3::from_shape_fn(
        (resolution.height, resolution.width, 3),
        |(row, col, c)| {
            let ambient = AMBIENT as f32 + ((row + col) % 3) as f32;
            let light: f32 = lit
                .iter()
                .map(|&ch| band_signal(ch, row, col) * band_tint(ch)[c])
                .sum();
            (ambient + light).round().clamp(0.0, 255.0) as u8
        },
    );
    Frame::Color(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_frame_is_ambient_only() {
        let rig = SimulatedRig::new(Resolution::new(4, 3));
        let frame = rig.camera().capture_frame().unwrap();
        match frame {
            Frame::Color(data) => {
                assert!(data.iter().all(|&v| (AMBIENT..AMBIENT + 3).contains(&v)))
            }
            Frame::Mono(_) => panic!("simulated camera is color"),
        }
    }

    #[test]
    fn tracks_concurrent_leds() {
        let rig = SimulatedRig::new(Resolution::new(2, 2));
        let mut lights = rig.lights();
        lights.set_band(1, true).unwrap();
        lights.set_band(2, true).unwrap();
        lights.all_off().unwrap();
        assert_eq!(rig.max_concurrent_on(), 2);
        assert!(rig.lit_channels().is_empty());
    }
}

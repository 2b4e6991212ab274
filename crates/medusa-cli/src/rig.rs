use anyhow::{Context, Result};
use medusa_core::config::{CaptureSettings, FrameSourceConfig, RigConfig};
use medusa_core::hardware::serial::SerialLightController;
use medusa_core::hardware::sim::SimulatedRig;
use medusa_core::hardware::{FrameSource, LightController};
use medusa_core::io::image_io::PngSink;
use medusa_core::io::ser::SerFrameSource;
use medusa_core::timelapse::Rig;
use tracing::info;

/// Open the LED controller and camera described by `rig` and wire them to a
/// PNG sink in its output directory.
pub fn build_rig(rig: &RigConfig, capture: &CaptureSettings) -> Result<Rig> {
    let sim = SimulatedRig::new(capture.resolution);

    let lights: Box<dyn LightController + Send> = match rig.serial_port {
        Some(ref port) => {
            info!(
                port = %port.display(),
                baud_rate = rig.baud_rate,
                mode = %rig.light_mode,
                "Opening LED controller"
            );
            Box::new(
                SerialLightController::open(port, rig.baud_rate, rig.light_mode)
                    .with_context(|| format!("Failed to open LED controller {}", port.display()))?,
            )
        }
        None => Box::new(sim.lights()),
    };

    let camera: Box<dyn FrameSource + Send> = match rig.source {
        FrameSourceConfig::Simulated => Box::new(sim.camera()),
        FrameSourceConfig::Replay { ref path } => Box::new(
            SerFrameSource::open(path)
                .with_context(|| format!("Failed to open recording {}", path.display()))?,
        ),
    };

    let sink = PngSink::new(&rig.output_dir).with_context(|| {
        format!("Failed to create output directory {}", rig.output_dir.display())
    })?;

    let rig = Rig {
        lights,
        camera,
        sink: Box::new(sink),
    };
    Ok(rig.with_frame_timeout(capture.frame_timeout())?)
}

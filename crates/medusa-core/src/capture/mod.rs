mod band;
mod set;

pub use band::BandCapture;
pub use set::SetSequencer;

use tracing::warn;

use crate::hardware::LightController;

/// Switch every LED off, logging rather than propagating a failure so the
/// original error reaches the caller.
pub(crate) fn force_all_off(lights: &mut dyn LightController) {
    if let Err(e) = lights.all_off() {
        warn!(error = %e, "Failed to switch all LEDs off");
    }
}

use std::time::Duration;

/// Frames read (and discarded but the last) before a frame is trusted.
/// Lets the sensor's auto-exposure settle after a lighting change.
pub const WARMUP_FRAMES: usize = 10;

/// Default pause after each warm-up read.
pub const DEFAULT_WARMUP_DELAY: Duration = Duration::from_millis(100);

/// Default pause before the first set so the rig reaches a dark steady state.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1500);

/// Default granularity of cancellation polling during inter-set waits.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Default camera resolution (width, height).
pub const DEFAULT_RESOLUTION: (usize, usize) = (1280, 720);

/// Channel wired to the broadband white LED on the stock rig.
pub const DEFAULT_WHITE_CHANNEL: u8 = 14;

/// Line speed of the LED controller firmware (8N1, no flow control).
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Upper bound on a single write to the LED controller.
pub const SERIAL_WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// Pseudo-channel that addresses every LED at once in the controller firmware.
pub const ALL_CHANNELS: u8 = 100;

/// Minimum number of single-channel bands for a meaningful PCA.
pub const PCA_MIN_BANDS: usize = 4;

/// Number of principal component images persisted per set.
pub const PCA_COMPONENTS: usize = 3;

/// Standard deviations below this are treated as a zero-variance band.
pub const EPSILON: f64 = 1e-10;

/// Minimum pixel count (h*w) to use column-level Rayon parallelism in PCA.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// ITU-R BT.601 luminance coefficient for the red channel.
pub const LUMINANCE_R: f32 = 0.299;

/// ITU-R BT.601 luminance coefficient for the green channel.
pub const LUMINANCE_G: f32 = 0.587;

/// ITU-R BT.601 luminance coefficient for the blue channel.
pub const LUMINANCE_B: f32 = 0.114;

/// Number of channels in a color frame (R, G, B).
pub const COLOR_CHANNEL_COUNT: usize = 3;

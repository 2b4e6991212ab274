use thiserror::Error;

#[derive(Error, Debug)]
pub enum MedusaError {
    #[error("Hardware unavailable: {0}")]
    HardwareUnavailable(String),

    #[error("Frame acquisition failed: {0}")]
    FrameAcquisitionFailed(String),

    #[error("Frame resolution {got_width}x{got_height} does not match configured {width}x{height}")]
    ResolutionMismatch {
        width: usize,
        height: usize,
        got_width: usize,
        got_height: usize,
    },

    #[error("Expected a {expected}-channel frame, got {got} channel(s)")]
    UnexpectedChannels { expected: usize, got: usize },

    #[error("Degenerate band {label}: zero variance")]
    DegenerateBand { label: String },

    #[error("PCA needs at least {required} single-channel bands, got {available}")]
    InsufficientBands { required: usize, available: usize },

    #[error("A run is already in progress")]
    AlreadyRunning,

    #[error("No run is in progress")]
    NotRunning,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid SER file: {0}")]
    InvalidSer(String),

    #[error("Capture worker panicked")]
    WorkerPanicked,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),
}

impl MedusaError {
    /// Failures that originate at the rig rather than in storage or configuration.
    pub fn is_hardware(&self) -> bool {
        matches!(
            self,
            Self::HardwareUnavailable(_)
                | Self::FrameAcquisitionFailed(_)
                | Self::ResolutionMismatch { .. }
                | Self::UnexpectedChannels { .. }
        )
    }

    /// Failures caused by the band data itself rather than by persisting results.
    pub fn is_pca(&self) -> bool {
        matches!(
            self,
            Self::DegenerateBand { .. } | Self::InsufficientBands { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MedusaError>;

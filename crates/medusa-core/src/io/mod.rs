pub mod image_io;
pub mod ser;

use crate::error::Result;
use crate::frame::Frame;

/// Where a persisted image belongs within a run.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImageKey {
    /// Dark-subtracted band image.
    Band { set: usize, label: String },
    /// Principal component image, rank starting at 1.
    Component { set: usize, rank: usize },
}

impl ImageKey {
    pub fn set(&self) -> usize {
        match self {
            Self::Band { set, .. } | Self::Component { set, .. } => *set,
        }
    }

    /// `<set>_<label>.png` for bands, `<set>_PC<rank>.png` for components.
    pub fn file_name(&self) -> String {
        match self {
            Self::Band { set, label } => format!("{set}_{label}.png"),
            Self::Component { set, rank } => format!("{set}_PC{rank}.png"),
        }
    }
}

impl std::fmt::Display for ImageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// Persists captured and derived images.
pub trait ImageSink {
    fn save(&mut self, key: &ImageKey, image: &Frame) -> Result<()>;

    /// Discard a previously saved image. Removing a missing key is not an error.
    fn remove(&mut self, key: &ImageKey) -> Result<()>;
}

impl<T: ImageSink + ?Sized> ImageSink for Box<T> {
    fn save(&mut self, key: &ImageKey, image: &Frame) -> Result<()> {
        (**self).save(key, image)
    }

    fn remove(&mut self, key: &ImageKey) -> Result<()> {
        (**self).remove(key)
    }
}

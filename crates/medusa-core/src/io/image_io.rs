use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::{GrayImage, ImageFormat, RgbImage};
use ndarray::Array2;
use tracing::debug;

use crate::error::{MedusaError, Result};
use crate::frame::Frame;

use super::{ImageKey, ImageSink};

/// Save a frame as 8-bit PNG (grayscale or RGB).
pub fn save_png(frame: &Frame, path: &Path) -> Result<()> {
    let w = frame.width() as u32;
    let h = frame.height() as u32;
    match frame {
        Frame::Mono(data) => {
            let pixels: Vec<u8> = data.iter().copied().collect();
            let img = GrayImage::from_raw(w, h, pixels).expect("buffer size matches dimensions");
            img.save_with_format(path, ImageFormat::Png)?;
        }
        Frame::Color(data) => {
            let pixels: Vec<u8> = data.iter().copied().collect();
            let img = RgbImage::from_raw(w, h, pixels).expect("buffer size matches dimensions");
            img.save_with_format(path, ImageFormat::Png)?;
        }
    }
    Ok(())
}

/// Load a persisted band image as single-channel 8-bit luma.
pub fn load_band_image(path: &Path) -> Result<Array2<u8>> {
    let gray = image::open(path)?.to_luma8();
    let (w, h) = gray.dimensions();
    let data = Array2::from_shape_vec((h as usize, w as usize), gray.into_raw())
        .map_err(|e| MedusaError::InvalidConfig(format!("{}: {e}", path.display())))?;
    Ok(data)
}

/// Writes images as PNG files named after their key into one directory.
pub struct PngSink {
    dir: PathBuf,
}

impl PngSink {
    /// Creates the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &ImageKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

impl ImageSink for PngSink {
    fn save(&mut self, key: &ImageKey, image: &Frame) -> Result<()> {
        let path = self.path_for(key);
        save_png(image, &path)?;
        debug!(path = %path.display(), "Saved image");
        Ok(())
    }

    fn remove(&mut self, key: &ImageKey) -> Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Removed image");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps saved images in memory, keyed by file name. Clones share storage.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    images: Arc<Mutex<BTreeMap<String, Frame>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saved file names in lexical order.
    pub fn file_names(&self) -> Vec<String> {
        self.images().keys().cloned().collect()
    }

    pub fn get(&self, file_name: &str) -> Option<Frame> {
        self.images().get(file_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.images().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images().is_empty()
    }

    fn images(&self) -> MutexGuard<'_, BTreeMap<String, Frame>> {
        self.images.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ImageSink for MemorySink {
    fn save(&mut self, key: &ImageKey, image: &Frame) -> Result<()> {
        self.images().insert(key.file_name(), image.clone());
        Ok(())
    }

    fn remove(&mut self, key: &ImageKey) -> Result<()> {
        self.images().remove(&key.file_name());
        Ok(())
    }
}

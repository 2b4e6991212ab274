use ndarray::{Array2, Array3, Zip};
use serde::{Deserialize, Serialize};

use crate::band::Band;
use crate::consts::{COLOR_CHANNEL_COUNT, LUMINANCE_B, LUMINANCE_G, LUMINANCE_R};
use crate::error::{MedusaError, Result};

/// Sensor resolution in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: usize,
    pub height: usize,
}

impl Resolution {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}

impl Default for Resolution {
    fn default() -> Self {
        let (width, height) = crate::consts::DEFAULT_RESOLUTION;
        Self { width, height }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An 8-bit image, either straight from the camera or after dark subtraction.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    /// Shape = (height, width).
    Mono(Array2<u8>),
    /// Shape = (height, width, 3), RGB order.
    Color(Array3<u8>),
}

impl Frame {
    pub fn width(&self) -> usize {
        match self {
            Self::Mono(data) => data.ncols(),
            Self::Color(data) => data.dim().1,
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Self::Mono(data) => data.nrows(),
            Self::Color(data) => data.dim().0,
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            Self::Mono(_) => 1,
            Self::Color(_) => COLOR_CHANNEL_COUNT,
        }
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width(), self.height())
    }

    pub fn ensure_resolution(&self, expected: Resolution) -> Result<()> {
        let got = self.resolution();
        if got != expected {
            return Err(MedusaError::ResolutionMismatch {
                width: expected.width,
                height: expected.height,
                got_width: got.width,
                got_height: got.height,
            });
        }
        Ok(())
    }

    /// Single-channel luma (BT.601 weights, rounded). Mono frames are returned as-is.
    pub fn to_luma(&self) -> Array2<u8> {
        match self {
            Self::Mono(data) => data.clone(),
            Self::Color(data) => {
                let (h, w, _) = data.dim();
                Array2::from_shape_fn((h, w), |(row, col)| {
                    let y = LUMINANCE_R * data[[row, col, 0]] as f32
                        + LUMINANCE_G * data[[row, col, 1]] as f32
                        + LUMINANCE_B * data[[row, col, 2]] as f32;
                    y.round().clamp(0.0, 255.0) as u8
                })
            }
        }
    }
}

/// Pixel-wise `lit - dark`, clamped at zero.
pub fn saturating_sub(lit: &Array2<u8>, dark: &Array2<u8>) -> Array2<u8> {
    Zip::from(lit)
        .and(dark)
        .map_collect(|&l, &d| l.saturating_sub(d))
}

/// Dark-subtract two frames of the same layout, channel by channel.
pub fn subtract_frames(lit: &Frame, dark: &Frame) -> Result<Frame> {
    dark.ensure_resolution(lit.resolution())?;
    match (lit, dark) {
        (Frame::Mono(l), Frame::Mono(d)) => Ok(Frame::Mono(saturating_sub(l, d))),
        (Frame::Color(l), Frame::Color(d)) => Ok(Frame::Color(
            Zip::from(l)
                .and(d)
                .map_collect(|&l, &d| l.saturating_sub(d)),
        )),
        _ => Err(MedusaError::UnexpectedChannels {
            expected: lit.channels(),
            got: dark.channels(),
        }),
    }
}

/// The dark-subtracted image of one band within one set.
#[derive(Clone, Debug)]
pub struct BandImage {
    pub band: Band,
    pub image: Frame,
}

/// One pass over every enabled band.
#[derive(Clone, Debug)]
pub struct CaptureSet {
    pub index: usize,
    images: Vec<BandImage>,
}

impl CaptureSet {
    /// Assemble a set, checking it holds exactly one image per enabled band.
    pub fn assemble(index: usize, bands: &[Band], images: Vec<BandImage>) -> Result<Self> {
        let complete = images.len() == bands.len()
            && bands
                .iter()
                .all(|b| images.iter().filter(|img| img.band.channel == b.channel).count() == 1);
        if !complete {
            return Err(MedusaError::FrameAcquisitionFailed(format!(
                "set {index} is incomplete: {} of {} bands captured",
                images.len(),
                bands.len()
            )));
        }
        Ok(Self { index, images })
    }

    pub fn images(&self) -> &[BandImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn get(&self, channel: u8) -> Option<&BandImage> {
        self.images.iter().find(|img| img.band.channel == channel)
    }

    /// Single-channel images of the non-white bands, in capture order.
    pub fn band_stack(&self) -> BandStack<'_> {
        let layers = self
            .images
            .iter()
            .filter(|img| !img.band.is_reference_white)
            .filter_map(|img| match &img.image {
                Frame::Mono(data) => Some((img.band.label.as_str(), data)),
                Frame::Color(_) => None,
            })
            .collect();
        BandStack { layers }
    }
}

/// Borrowed single-channel planes used as PCA input.
#[derive(Clone, Debug, Default)]
pub struct BandStack<'a> {
    layers: Vec<(&'a str, &'a Array2<u8>)>,
}

impl<'a> BandStack<'a> {
    pub fn new(layers: Vec<(&'a str, &'a Array2<u8>)>) -> Self {
        Self { layers }
    }

    pub fn layers(&self) -> &[(&'a str, &'a Array2<u8>)] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

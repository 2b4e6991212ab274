use std::fs::File;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;
use ndarray::{Array2, Array3};
use tracing::info;

use crate::error::{MedusaError, Result};
use crate::frame::{Frame, Resolution};
use crate::hardware::FrameSource;

const SER_HEADER_SIZE: usize = 178;
const SER_MAGIC: &[u8; 14] = b"LUCAM-RECORDER";

const COLOR_ID_RGB: i32 = 100;
const COLOR_ID_BGR: i32 = 101;

/// The fields of the 178-byte SER header needed to decode frames.
#[derive(Clone, Debug)]
pub struct SerHeader {
    pub color_id: i32,
    pub little_endian: bool,
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub frame_count: u32,
}

impl SerHeader {
    fn bytes_per_sample(&self) -> usize {
        if self.pixel_depth <= 8 { 1 } else { 2 }
    }

    fn planes(&self) -> usize {
        match self.color_id {
            COLOR_ID_RGB | COLOR_ID_BGR => 3,
            _ => 1,
        }
    }

    fn frame_byte_size(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.bytes_per_sample() * self.planes())
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width as usize, self.height as usize)
    }
}

/// Replays a SER recording as if it were a live camera, looping at the end.
///
/// Mono and Bayer recordings yield single-channel frames; RGB/BGR yield
/// color frames. Samples deeper than 8 bits are scaled down to 8 bits.
pub struct SerFrameSource {
    mmap: Mmap,
    header: SerHeader,
    frame_size: usize,
    next: usize,
}

impl SerFrameSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            MedusaError::HardwareUnavailable(format!("{}: {e}", path.display()))
        })?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < SER_HEADER_SIZE {
            return Err(MedusaError::InvalidSer("file too small for SER header".into()));
        }
        if &mmap[0..14] != SER_MAGIC {
            return Err(MedusaError::InvalidSer("missing LUCAM-RECORDER magic".into()));
        }

        let header = parse_header(&mmap[..SER_HEADER_SIZE])?;
        let frame_size = header
            .frame_byte_size()
            .ok_or_else(|| MedusaError::InvalidSer("frame size overflows".into()))?;
        if header.frame_count == 0 {
            return Err(MedusaError::InvalidSer("recording holds no frames".into()));
        }
        let expected = frame_size
            .checked_mul(header.frame_count as usize)
            .and_then(|bytes| bytes.checked_add(SER_HEADER_SIZE))
            .ok_or_else(|| MedusaError::InvalidSer("frame data size overflows".into()))?;
        if mmap.len() < expected {
            return Err(MedusaError::InvalidSer(format!(
                "file truncated: expected at least {expected} bytes, got {}",
                mmap.len()
            )));
        }

        info!(
            path = %path.display(),
            frames = header.frame_count,
            resolution = %header.resolution(),
            "Replaying SER recording"
        );

        Ok(Self {
            mmap,
            header,
            frame_size,
            next: 0,
        })
    }

    pub fn header(&self) -> &SerHeader {
        &self.header
    }

    fn frame(&self, index: usize) -> Frame {
        let offset = SER_HEADER_SIZE + index * self.frame_size;
        let raw = &self.mmap[offset..offset + self.frame_size];
        let h = self.header.height as usize;
        let w = self.header.width as usize;
        let planes = self.header.planes();
        let sample = |i: usize| decode_sample(raw, i, &self.header);

        if planes == 1 {
            Frame::Mono(Array2::from_shape_fn((h, w), |(row, col)| {
                sample(row * w + col)
            }))
        } else {
            let bgr = self.header.color_id == COLOR_ID_BGR;
            Frame::Color(Array3::from_shape_fn((h, w, 3), |(row, col, c)| {
                let plane = if bgr { 2 - c } else { c };
                sample((row * w + col) * 3 + plane)
            }))
        }
    }
}

impl FrameSource for SerFrameSource {
    fn capture_frame(&mut self) -> Result<Frame> {
        let frame = self.frame(self.next);
        self.next = (self.next + 1) % self.header.frame_count as usize;
        Ok(frame)
    }
}

fn decode_sample(raw: &[u8], index: usize, header: &SerHeader) -> u8 {
    if header.bytes_per_sample() == 1 {
        return raw[index];
    }
    let pair = [raw[index * 2], raw[index * 2 + 1]];
    let value = if header.little_endian {
        u16::from_le_bytes(pair)
    } else {
        u16::from_be_bytes(pair)
    };
    (value >> (header.pixel_depth.clamp(9, 16) - 8)) as u8
}

fn parse_header(buf: &[u8]) -> Result<SerHeader> {
    let mut cursor = std::io::Cursor::new(&buf[14..]);

    let _lu_id = cursor.read_i32::<LittleEndian>()?;
    let color_id = cursor.read_i32::<LittleEndian>()?;
    let le_flag = cursor.read_i32::<LittleEndian>()?;
    let width = cursor.read_i32::<LittleEndian>()?;
    let height = cursor.read_i32::<LittleEndian>()?;
    let pixel_depth = cursor.read_i32::<LittleEndian>()?;
    let frame_count = cursor.read_i32::<LittleEndian>()?;

    if width <= 0 || height <= 0 {
        return Err(MedusaError::InvalidSer(format!(
            "invalid dimensions {width}x{height}"
        )));
    }
    if !(1..=16).contains(&pixel_depth) {
        return Err(MedusaError::InvalidSer(format!(
            "unsupported pixel depth {pixel_depth}"
        )));
    }

    // Writers disagree on the endianness flag; 0 is read as little-endian.
    Ok(SerHeader {
        color_id,
        little_endian: le_flag != 1,
        width: width as u32,
        height: height as u32,
        pixel_depth: pixel_depth as u32,
        frame_count: frame_count.max(0) as u32,
    })
}

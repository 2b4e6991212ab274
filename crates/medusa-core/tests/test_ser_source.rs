use std::io::Write;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use medusa_core::error::MedusaError;
use medusa_core::frame::{Frame, Resolution};
use medusa_core::hardware::FrameSource;
use medusa_core::io::ser::SerFrameSource;

/// Write a SER file with the given header fields and raw frame payload.
fn write_ser(
    path: &Path,
    color_id: i32,
    width: i32,
    height: i32,
    depth: i32,
    frames: i32,
    payload: &[u8],
) {
    let mut buf = Vec::with_capacity(178 + payload.len());
    buf.extend_from_slice(b"LUCAM-RECORDER");
    buf.write_i32::<LittleEndian>(0).unwrap();
    buf.write_i32::<LittleEndian>(color_id).unwrap();
    buf.write_i32::<LittleEndian>(0).unwrap();
    buf.write_i32::<LittleEndian>(width).unwrap();
    buf.write_i32::<LittleEndian>(height).unwrap();
    buf.write_i32::<LittleEndian>(depth).unwrap();
    buf.write_i32::<LittleEndian>(frames).unwrap();
    buf.resize(178, 0);
    buf.extend_from_slice(payload);

    let mut file = std::fs::File::create(path).unwrap();
    file.write_all(&buf).unwrap();
}

#[test]
fn test_mono_frames_replay_in_a_loop() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mono.ser");
    let payload: Vec<u8> = (0..12).collect();
    write_ser(&path, 0, 3, 2, 8, 2, &payload);

    let mut source = SerFrameSource::open(&path).unwrap();
    assert_eq!(source.header().resolution(), Resolution::new(3, 2));

    let first = source.capture_frame().unwrap();
    let second = source.capture_frame().unwrap();
    let third = source.capture_frame().unwrap();

    match &first {
        Frame::Mono(data) => {
            assert_eq!(data.dim(), (2, 3));
            assert_eq!(data[[1, 2]], 5);
        }
        Frame::Color(_) => panic!("mono recording"),
    }
    match &second {
        Frame::Mono(data) => assert_eq!(data[[0, 0]], 6),
        Frame::Color(_) => panic!("mono recording"),
    }
    assert_eq!(third, first);
}

#[test]
fn test_bgr_frames_are_reordered() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bgr.ser");
    write_ser(&path, 101, 1, 1, 8, 1, &[10, 20, 30]);

    let frame = SerFrameSource::open(&path).unwrap().capture_frame().unwrap();
    match frame {
        Frame::Color(data) => {
            assert_eq!(data.iter().copied().collect::<Vec<_>>(), vec![30, 20, 10])
        }
        Frame::Mono(_) => panic!("color recording"),
    }
}

#[test]
fn test_deep_samples_are_scaled_to_8_bits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deep.ser");
    let mut payload = Vec::new();
    payload.write_u16::<LittleEndian>(0x0FFF).unwrap();
    payload.write_u16::<LittleEndian>(0x0100).unwrap();
    write_ser(&path, 0, 2, 1, 12, 1, &payload);

    let frame = SerFrameSource::open(&path).unwrap().capture_frame().unwrap();
    match frame {
        Frame::Mono(data) => assert_eq!(data.iter().copied().collect::<Vec<_>>(), vec![255, 16]),
        Frame::Color(_) => panic!("mono recording"),
    }
}

#[test]
fn test_truncated_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.ser");
    write_ser(&path, 0, 4, 4, 8, 3, &[0; 20]);

    assert!(matches!(
        SerFrameSource::open(&path),
        Err(MedusaError::InvalidSer(_))
    ));
}

#[test]
fn test_oversized_header_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.ser");
    // 65535x65535 RGB at 16 bits, i32::MAX frames: the total overflows usize.
    write_ser(&path, 100, 65535, 65535, 16, i32::MAX, &[]);

    assert!(matches!(
        SerFrameSource::open(&path),
        Err(MedusaError::InvalidSer(_))
    ));
}

#[test]
fn test_bad_magic_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.ser");
    std::fs::write(&path, vec![0u8; 200]).unwrap();

    assert!(matches!(
        SerFrameSource::open(&path),
        Err(MedusaError::InvalidSer(_))
    ));
}

#[test]
fn test_missing_recording_is_hardware_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        SerFrameSource::open(&dir.path().join("none.ser")),
        Err(MedusaError::HardwareUnavailable(_))
    ));
}

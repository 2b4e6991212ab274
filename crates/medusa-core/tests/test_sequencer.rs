mod common;

use medusa_core::band::{Band, BandCatalog};
use medusa_core::capture::{BandCapture, SetSequencer};
use medusa_core::config::CaptureSettings;
use medusa_core::error::MedusaError;
use medusa_core::frame::{BandImage, CaptureSet, Frame};
use medusa_core::hardware::sim::{RigEvent, SimulatedRig};
use medusa_core::progress::NoOpReporter;

use common::{resolution, RecordingReporter, FRAMES_PER_BAND};

fn bands(names: &[&str]) -> Vec<Band> {
    let catalog = BandCatalog::medusa(14);
    names.iter().map(|n| catalog.resolve(n).unwrap()).collect()
}

#[test]
fn test_set_holds_one_image_per_band_in_order() {
    let sim = SimulatedRig::new(resolution());
    let mut lights = sim.lights();
    let mut camera = sim.camera();
    let settings = CaptureSettings::immediate(resolution());
    let bands = bands(&["419nm", "446nm", "WHT", "502nm"]);

    let set = SetSequencer::new(BandCapture::new(&mut lights, &mut camera, &settings))
        .capture_set(&bands, 3, &NoOpReporter)
        .unwrap();

    assert_eq!(set.index, 3);
    assert_eq!(set.len(), 4);
    let labels: Vec<_> = set.images().iter().map(|i| i.band.label.as_str()).collect();
    assert_eq!(labels, ["419nm", "446nm", "WHT", "502nm"]);
    assert!(matches!(set.get(14).unwrap().image, Frame::Color(_)));
    assert_eq!(sim.frames_served(), 4 * FRAMES_PER_BAND);
    assert!(sim.max_concurrent_on() <= 1);
}

#[test]
fn test_band_stack_excludes_white() {
    let sim = SimulatedRig::new(resolution());
    let mut lights = sim.lights();
    let mut camera = sim.camera();
    let settings = CaptureSettings::immediate(resolution());
    let bands = bands(&["WHT", "419nm", "446nm"]);

    let set = SetSequencer::new(BandCapture::new(&mut lights, &mut camera, &settings))
        .capture_set(&bands, 0, &NoOpReporter)
        .unwrap();

    let stack = set.band_stack();
    let labels: Vec<_> = stack.layers().iter().map(|(l, _)| *l).collect();
    assert_eq!(labels, ["419nm", "446nm"]);
}

#[test]
fn test_progress_is_reported_per_band() {
    let sim = SimulatedRig::new(resolution());
    let mut lights = sim.lights();
    let mut camera = sim.camera();
    let settings = CaptureSettings::immediate(resolution());
    let bands = bands(&["419nm", "446nm", "470nm"]);
    let reporter = RecordingReporter::default();

    SetSequencer::new(BandCapture::new(&mut lights, &mut camera, &settings))
        .capture_set(&bands, 1, &reporter)
        .unwrap();

    let progress = reporter.bands.lock().unwrap().clone();
    assert_eq!(
        progress,
        vec![
            (1, 1, 3, "419nm".to_string()),
            (1, 2, 3, "446nm".to_string()),
            (1, 3, 3, "470nm".to_string()),
        ]
    );
    let statuses = reporter.statuses.lock().unwrap().clone();
    assert_eq!(statuses.len(), 3);
    assert!(statuses[0].contains("419nm (1 of 3)"));
}

#[test]
fn test_failed_band_aborts_set_with_lights_off() {
    let sim = SimulatedRig::new(resolution());
    // Third band, during its lit warm-up.
    sim.fail_frame_at(2 * FRAMES_PER_BAND + 12);
    let mut lights = sim.lights();
    let mut camera = sim.camera();
    let settings = CaptureSettings::immediate(resolution());
    let bands = bands(&["419nm", "446nm", "470nm", "502nm"]);
    let reporter = RecordingReporter::default();

    let result = SetSequencer::new(BandCapture::new(&mut lights, &mut camera, &settings))
        .capture_set(&bands, 0, &reporter);

    assert!(matches!(result, Err(MedusaError::FrameAcquisitionFailed(_))));
    assert!(sim.lit_channels().is_empty());
    assert_eq!(sim.events().last(), Some(&RigEvent::AllOff));
    // The fourth band is never attempted.
    assert!(!sim.events().contains(&RigEvent::On(3)));
    assert_eq!(reporter.bands.lock().unwrap().len(), 2);
}

#[test]
fn test_assemble_rejects_incomplete_set() {
    let bands = bands(&["419nm", "446nm"]);
    let images = vec![BandImage {
        band: bands[0].clone(),
        image: common::mono(1, 1, vec![0]),
    }];

    let result = CaptureSet::assemble(0, &bands, images);
    assert!(matches!(result, Err(MedusaError::FrameAcquisitionFailed(_))));
}

#[test]
fn test_assemble_rejects_duplicate_band() {
    let bands = bands(&["419nm", "446nm"]);
    let image = BandImage {
        band: bands[0].clone(),
        image: common::mono(1, 1, vec![0]),
    };

    let result = CaptureSet::assemble(0, &bands, vec![image.clone(), image]);
    assert!(result.is_err());
}

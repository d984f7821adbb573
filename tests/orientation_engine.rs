#![cfg(unix)]

mod common;

use common::FakeEngine;
use std::path::Path;
use std::time::{Duration, Instant};
use tesspage::{EngineInvocation, OcrError, OrientationResult};

fn invocation(timeout_ms: u64) -> EngineInvocation {
    EngineInvocation::new(["eng"], Duration::from_millis(timeout_ms))
        .unwrap()
        .with_engine_mode(Some(1))
}

#[test]
fn clockwise_report() {
    let fake = FakeEngine::new(
        "4.1.1",
        "printf 'Page number: 0\\nOrientation in degrees: 90\\nRotate: 270\\nOrientation confidence: 6.25\\nScript: Latin\\nScript confidence: 2.1\\n'",
    );
    let img = fake.image("000001.png", 20, 10);
    let r = fake
        .tesseract()
        .detect_orientation(&img, &invocation(5_000))
        .unwrap();
    assert_eq!(r.angle, 90);
    assert!((r.confidence - 6.25).abs() < 1e-6);

    let osd_call = fake.calls().into_iter().find(|c| c.ends_with("stdout")).unwrap();
    assert!(osd_call.contains("--psm 0"));
    assert!(osd_call.contains("--oem 1"));
    assert!(osd_call.starts_with("-l eng"));
}

#[test]
fn counter_clockwise_report_on_v3() {
    let fake = FakeEngine::new(
        "3.04.00",
        "printf 'Orientation: 90\\nOrientation confidence: 1.5\\n'",
    );
    let img = fake.image("000002.png", 20, 10);
    let r = fake
        .tesseract()
        .detect_orientation(&img, &invocation(5_000))
        .unwrap();
    assert_eq!(r.angle, 270);

    let osd_call = fake.calls().into_iter().find(|c| c.ends_with("stdout")).unwrap();
    assert!(osd_call.contains("-psm 0"));
    assert!(!osd_call.contains("--oem"));
}

#[test]
fn timeout_assumes_upright() {
    let fake = FakeEngine::new("4.1.1", "exec sleep 5");
    let img = fake.image("000003.png", 20, 10);
    let r = fake
        .tesseract()
        .detect_orientation(&img, &invocation(200))
        .unwrap();
    assert_eq!(r, OrientationResult::UNKNOWN);
}

#[test]
fn too_few_characters_assumes_upright() {
    let fake = FakeEngine::new(
        "4.1.1",
        "echo 'Too few characters. Skipping this page' >&2\necho 'Error during processing.' >&2\nexit 1",
    );
    let img = fake.image("000004.png", 20, 10);
    let r = fake
        .tesseract()
        .detect_orientation(&img, &invocation(5_000))
        .unwrap();
    assert_eq!(r, OrientationResult::UNKNOWN);
}

#[test]
fn oversized_image_assumes_upright() {
    let fake = FakeEngine::new("4.1.1", "echo 'Image too large: (40000, 40000)' >&2\nexit 1");
    let img = fake.image("000005.png", 20, 10);
    let r = fake
        .tesseract()
        .detect_orientation(&img, &invocation(5_000))
        .unwrap();
    assert_eq!(r, OrientationResult::UNKNOWN);
}

#[test]
fn other_failure_is_reported_with_page() {
    let fake = FakeEngine::new("4.1.1", "echo 'Segmentation fault' >&2\nexit 139");
    let img = fake.image("000012.png", 20, 10);
    let err = fake
        .tesseract()
        .detect_orientation(&img, &invocation(5_000))
        .unwrap_err();
    match err {
        OcrError::UnclassifiedEngineFailure { page, output, .. } => {
            assert_eq!(page, 12);
            assert!(output.contains("Segmentation fault"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn mixed_schema_is_rejected() {
    let fake = FakeEngine::new("4.1.1", "printf 'Orientation: 90\\nRotate: 270\\n'");
    let img = fake.image("000006.png", 20, 10);
    let err = fake
        .tesseract()
        .detect_orientation(&img, &invocation(5_000))
        .unwrap_err();
    assert!(matches!(err, OcrError::OrientationSchema(_)));
    assert!(!err.halts_run());
}

#[test]
fn timeout_stops_grandchildren_too() {
    let fake = FakeEngine::new("4.1.1", "sleep 4\necho late");
    let img = fake.image("000009.png", 20, 10);
    let tess = fake.tesseract();
    tess.capabilities().unwrap();

    let started = Instant::now();
    let r = tess.detect_orientation(&img, &invocation(200)).unwrap();
    assert_eq!(r, OrientationResult::UNKNOWN);
    assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
}

fn scan_sheet_number(_: &Path) -> u32 {
    42
}

#[test]
fn custom_page_resolver_names_the_page() {
    let fake = FakeEngine::new(
        "4.1.1",
        "echo 'read_params_file: parameter not found: bogus' >&2\nexit 1",
    );
    let img = fake.image("scan-a.png", 20, 10);
    let err = fake
        .tesseract()
        .with_page_resolver(scan_sheet_number)
        .detect_orientation(&img, &invocation(5_000))
        .unwrap_err();
    assert!(matches!(err, OcrError::Configuration { page: 42, .. }));
}

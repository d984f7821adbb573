use tesspage::orientation::{parse_osd, parse_osd_lines, OsdSchema};
use tesspage::OcrError;

const OSD_NEW: &str = "Page number: 0
Orientation in degrees: 90
Rotate: 270
Orientation confidence: 12.87
Script: Latin
Script confidence: 3.31
";

#[test]
fn counter_clockwise_schema_is_converted() {
    let r = parse_osd("Orientation: 90\nOrientation confidence: 4.5\n").unwrap();
    assert_eq!(r.angle, 270);
    assert!((r.confidence - 4.5).abs() < 1e-6);
}

#[test]
fn clockwise_schema_is_kept() {
    let r = parse_osd(OSD_NEW).unwrap();
    assert_eq!(r.angle, 90);
    assert!((r.confidence - 12.87).abs() < 1e-4);
}

#[test]
fn zero_stays_zero() {
    let r = parse_osd("Orientation: 0\n").unwrap();
    assert_eq!(r.angle, 0);
    assert_eq!(r.confidence, 0.0);
}

#[test]
fn both_signature_keys_rejected() {
    let err = parse_osd("Orientation: 90\nRotate: 270\n").unwrap_err();
    assert!(matches!(err, OcrError::OrientationSchema(_)));
}

#[test]
fn neither_signature_key_rejected() {
    let err = parse_osd("Orientation in degrees: 90\nScript: Latin\n").unwrap_err();
    assert!(matches!(err, OcrError::OrientationSchema(_)));
}

#[test]
fn odd_angle_rejected() {
    let err = parse_osd("Orientation in degrees: 45\nRotate: 315\n").unwrap_err();
    assert!(matches!(err, OcrError::OrientationSchema(_)));
}

#[test]
fn lines_with_extra_colons_are_skipped() {
    let osd = parse_osd_lines("Warning: a: b\nRotate: 0\nno colon here\n");
    assert!(!osd.contains_key("Warning"));
    assert_eq!(osd.get("Rotate").map(String::as_str), Some("0"));
    assert_eq!(OsdSchema::detect(&osd).unwrap(), OsdSchema::Clockwise);
}

const OSD_3_03: &str = "Orientation: 3
Orientation in degrees: 90
Orientation confidence: 8.71
Script: 1
Script confidence: 2.34
";

#[test]
fn old_engine_report_uses_degrees_line() {
    let r = parse_osd(OSD_3_03).unwrap();
    assert_eq!(r.angle, 270);
    assert!((r.confidence - 8.71).abs() < 1e-4);
}

#[test]
fn extreme_counter_clockwise_angle_is_an_error_not_a_panic() {
    let err = parse_osd("Orientation: -2147483648\n").unwrap_err();
    assert!(matches!(err, OcrError::OrientationSchema(_)));
    let r = parse_osd("Orientation: -90\n").unwrap();
    assert_eq!(r.angle, 90);
}

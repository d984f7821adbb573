#![cfg(unix)]

mod common;

use common::FakeEngine;
use tesspage::{EngineCommand, OcrError, PsmFlag, Tesseract};

#[test]
fn version_probe_runs_once_under_concurrent_access() {
    let fake = FakeEngine::new("4.1.1", "exit 0");
    let tess = fake.tesseract();

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| tess.capabilities().unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(tess.version().unwrap().as_str(), "4.1.1");
    assert!(std::ptr::eq(tess.version().unwrap(), tess.version().unwrap()));
    assert_eq!(fake.count_calls("--version"), 1);
    assert_eq!(fake.count_calls("--print-parameters"), 0);
}

#[test]
fn v3_engine_capabilities() {
    let fake = FakeEngine::new("3.05.02", "exit 0");
    let caps = fake.tesseract().capabilities().unwrap();
    assert_eq!(caps.psm_flag, PsmFlag::Short);
    assert!(!caps.supports_engine_mode);
    assert!(!caps.supports_text_only_render);
}

#[test]
fn alpha_build_probes_parameters_once() {
    let fake = FakeEngine::with_parameters(
        "4.00.00alpha",
        "textonly_pdf\\t0\\tCreate PDF with only one invisible text layer\\n",
        "exit 0",
    );
    let tess = fake.tesseract();
    assert!(tess.capabilities().unwrap().supports_text_only_render);
    assert!(tess.capabilities().unwrap().supports_text_only_render);
    assert_eq!(fake.count_calls("--print-parameters"), 1);
}

#[test]
fn alpha_build_without_marker_is_unsupported() {
    let fake = FakeEngine::with_parameters("4.00.00alpha", "tessedit_pageseg_mode\\t6\\n", "exit 0");
    let caps = fake.tesseract().capabilities().unwrap();
    assert!(caps.supports_engine_mode);
    assert!(!caps.supports_text_only_render);
}

#[test]
fn missing_program_is_missing_dependency() {
    let tess = Tesseract::new(EngineCommand::new("/nonexistent/bin/tesseract"));
    let err = tess.version().unwrap_err();
    assert!(matches!(err, OcrError::MissingDependency(_)));
    assert!(err.halts_run());
}

#[test]
fn failing_version_query_is_missing_dependency() {
    let fake = FakeEngine::raw("echo 'error while loading shared libraries' >&2\nexit 127\n");
    let err = fake.tesseract().capabilities().unwrap_err();
    assert!(matches!(err, OcrError::MissingDependency(_)));
}

#[test]
fn unrecognized_version_output_is_missing_dependency() {
    let fake = FakeEngine::raw("echo 'usage: something else'\nexit 0\n");
    assert!(matches!(
        fake.tesseract().version(),
        Err(OcrError::MissingDependency(_))
    ));
}

#[test]
fn languages_are_listed_once() {
    let fake = FakeEngine::new("4.1.1", "exit 0");
    let tess = fake.tesseract();
    let langs = tess.languages().unwrap();
    assert_eq!(
        langs.iter().map(String::as_str).collect::<Vec<_>>(),
        ["deu", "eng", "osd"]
    );
    tess.languages().unwrap();
    assert_eq!(fake.count_calls("--list-langs"), 1);
}

#[test]
fn alpha_build_with_failing_parameter_dump_is_missing_dependency() {
    let fake = FakeEngine::raw(
        "case \"$1\" in\n  --version) echo 'tesseract 4.00.00alpha'; exit 0;;\n  --print-parameters) echo 'Segmentation fault' >&2; exit 139;;\nesac\nexit 0\n",
    );
    let tess = fake.tesseract();
    assert_eq!(tess.version().unwrap().as_str(), "4.00.00alpha");
    let err = tess.capabilities().unwrap_err();
    assert!(matches!(err, OcrError::MissingDependency(_)));
    assert!(err.halts_run());
}

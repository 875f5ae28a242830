mod common;

use common::{blank_photo, pipeline_with, plate_photo, Script, ScriptedRecognizer, GLYPHS, PLATE};
use image::{DynamicImage, RgbImage};
use plate_reader::engine::PageMode;
use plate_reader::{LprError, Settings};

fn near(actual: i64, expected: i64, tolerance: i64) -> bool {
    (actual - expected).abs() <= tolerance
}

#[test]
fn test_single_rectangle_yields_single_candidate_at_known_location() {
    let recognizer = ScriptedRecognizer::new(Script::Text("KR 12345"));
    let pipeline = pipeline_with(recognizer, Settings::default());

    let report = pipeline.process(&plate_photo()).unwrap();

    assert_eq!(report.first_layer.len(), 1);
    let candidate = &report.first_layer[0];
    let aspect = candidate.position.aspect_ratio();
    assert!((2.0..=5.0).contains(&aspect), "aspect {}", aspect);

    let rect = candidate.original_position;
    let (x, y, w, h) = PLATE;
    assert!(near(rect.x as i64, x as i64, 8), "x {}", rect.x);
    assert!(near(rect.y as i64, y as i64, 8), "y {}", rect.y);
    assert!(near(rect.width as i64, w as i64, 12), "width {}", rect.width);
    assert!(near(rect.height as i64, h as i64, 12), "height {}", rect.height);
}

#[test]
fn test_blank_image_yields_nothing() {
    let recognizer = ScriptedRecognizer::new(Script::Text("KR 12345"));
    let pipeline = pipeline_with(recognizer.clone(), Settings::default());

    let report = pipeline.process(&blank_photo()).unwrap();

    assert!(report.first_layer.is_empty());
    assert!(report.second_layer.is_empty());
    assert!(report.plates.is_empty());
    assert_eq!(report.annotated.dimensions(), (1600, 1200));
    assert_eq!(recognizer.calls(), 0);
}

#[test]
fn test_plate_is_read_end_to_end() {
    let recognizer = ScriptedRecognizer::new(Script::Text("KR 12345"));
    let pipeline = pipeline_with(recognizer.clone(), Settings::default());

    let report = pipeline.process(&plate_photo()).unwrap();

    assert_eq!(report.second_layer.len(), 1);
    let texts: Vec<&str> = report.plates.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, ["KR 12345"]);
    assert_eq!(recognizer.modes(), [PageMode::WholeBlock]);

    let readings = report.readings();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].rect, report.first_layer[0].original_position);
}

#[test]
fn test_split_variant_reads_glyph_by_glyph() {
    let recognizer = ScriptedRecognizer::new(Script::Chars("KR1234"));
    let settings = Settings {
        split_glyphs: true,
        ..Settings::default()
    };
    let pipeline = pipeline_with(recognizer.clone(), settings);

    let report = pipeline.process(&plate_photo()).unwrap();

    assert_eq!(recognizer.calls(), GLYPHS);
    assert!(recognizer.modes().iter().all(|m| *m == PageMode::SingleChar));
    let texts: Vec<&str> = report.plates.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, ["KR1234"]);
}

#[test]
fn test_grammar_rejection_leaves_no_plate() {
    let recognizer = ScriptedRecognizer::new(Script::Text("1234567"));
    let pipeline = pipeline_with(recognizer.clone(), Settings::default());

    let report = pipeline.process(&plate_photo()).unwrap();

    assert_eq!(recognizer.calls(), 1);
    assert!(report.plates.is_empty());
}

#[test]
fn test_recoverable_recognition_error_skips_candidate() {
    let recognizer = ScriptedRecognizer::new(Script::Fail { fatal: false });
    let pipeline = pipeline_with(recognizer, Settings::default());

    let report = pipeline.process(&plate_photo()).unwrap();

    assert_eq!(report.second_layer.len(), 1);
    assert!(report.plates.is_empty());
}

#[test]
fn test_fatal_recognition_error_propagates() {
    let recognizer = ScriptedRecognizer::new(Script::Fail { fatal: true });
    let pipeline = pipeline_with(recognizer, Settings::default());

    let err = pipeline.process(&plate_photo()).unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn test_zero_dimension_image_is_invalid() {
    let recognizer = ScriptedRecognizer::new(Script::Text("KR 12345"));
    let pipeline = pipeline_with(recognizer, Settings::default());

    let err = pipeline
        .process(&DynamicImage::ImageRgb8(RgbImage::new(0, 0)))
        .unwrap_err();
    assert!(matches!(err, LprError::InvalidImage(_)));
    assert!(!err.is_fatal());
}

#[test]
fn test_fixed_thresholds_find_the_same_plate() {
    let recognizer = ScriptedRecognizer::new(Script::Text("KR 12345"));
    let settings = Settings {
        use_auto_threshold: false,
        ..Settings::default()
    };
    let pipeline = pipeline_with(recognizer, settings);

    let report = pipeline.process(&plate_photo()).unwrap();
    assert_eq!(report.first_layer.len(), 1);
}

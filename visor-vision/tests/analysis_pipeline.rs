//! End-to-end analysis over synthetic frames, exercising the public API the
//! way the HTTP layer does. Model-backed capabilities run in their degraded
//! (model-less) state so the suite needs no artifacts on disk.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use std::sync::Arc;
use visor_core::{CountMethod, CountedObject, VisionConfig};
use visor_vision::objects::CountStrategy;
use visor_vision::{AnalysisOrchestrator, EmotionClassifier, FingerCounter, ObjectCounter};

fn orchestrator() -> AnalysisOrchestrator {
    let config = Arc::new(VisionConfig::default());
    AnalysisOrchestrator::new(
        Arc::new(EmotionClassifier::new(config.clone(), None, None)),
        Arc::new(FingerCounter::new(None)),
        Arc::new(ObjectCounter::new(config)),
    )
}

fn coins_frame() -> RgbImage {
    // Three dark circles on a light background, like coins on a desk.
    let mut img = RgbImage::from_pixel(400, 300, Rgb([230, 230, 230]));
    draw_filled_circle_mut(&mut img, (80, 80), 35, Rgb([40, 35, 30]));
    draw_filled_circle_mut(&mut img, (220, 120), 30, Rgb([50, 45, 40]));
    draw_filled_circle_mut(&mut img, (320, 220), 40, Rgb([35, 30, 25]));
    img
}

#[test]
fn contour_strategy_counts_coins() {
    let (analysis, _) = orchestrator().count_objects(&coins_frame(), CountStrategy::Contour, false);
    assert_eq!(analysis.method, CountMethod::Contour);
    assert_eq!(analysis.count, 3);
    assert_eq!(analysis.count, analysis.objects.len());

    for object in &analysis.objects {
        match object {
            CountedObject::Contour { area, circularity, .. } => {
                assert!(*area > 500.0);
                assert!(circularity.expect("contours report circularity") > 0.5);
            }
            other => panic!("contour strategy emitted {other:?}"),
        }
    }
}

#[test]
fn blob_strategy_counts_coins() {
    let (analysis, _) = orchestrator().count_objects(&coins_frame(), CountStrategy::Blob, false);
    assert_eq!(analysis.method, CountMethod::Blob);
    assert_eq!(analysis.count, 3);
    for object in &analysis.objects {
        match object {
            CountedObject::Blob { size, .. } => assert!(*size > 30.0),
            other => panic!("blob strategy emitted {other:?}"),
        }
    }
}

#[test]
fn combined_analysis_degrades_per_capability() {
    let (combined, _) = orchestrator().analyze_all(&coins_frame(), false);

    // Vision models are absent: those capabilities carry error records.
    assert!(combined.emotion.error.is_some());
    assert_eq!(combined.emotion.faces_detected, 0);
    assert!(combined.fingers.error.is_some());
    assert_eq!(combined.fingers.total_fingers, 0);

    // Object counting needs no model and still works.
    assert_eq!(combined.objects.count, 3);
}

#[test]
fn combined_json_shape() {
    let (combined, _) = orchestrator().analyze_all(&coins_frame(), false);
    let json = serde_json::to_value(&combined).unwrap();

    assert!(json["emotion"]["error"].is_string());
    assert!(json["fingers"]["error"].is_string());
    assert_eq!(json["objects"]["count"], 3);
    assert_eq!(json["objects"]["method"], "contour");
    // Raw contour geometry never leaks into responses.
    for object in json["objects"]["objects"].as_array().unwrap() {
        assert!(object.get("contour").is_none());
        assert!(object.get("bbox").is_some());
    }
}

#[test]
fn annotation_leaves_source_frame_untouched() {
    let frame = coins_frame();
    let pristine = frame.clone();
    let (_, annotated) = orchestrator().analyze_all(&frame, true);
    let annotated = annotated.expect("annotated copy requested");

    assert_eq!(frame.as_raw(), pristine.as_raw());
    assert_ne!(annotated.as_raw(), frame.as_raw());
    assert_eq!((annotated.width(), annotated.height()), (frame.width(), frame.height()));
}

#[test]
fn color_counting_matches_only_named_color() {
    let mut frame = RgbImage::from_pixel(300, 200, Rgb([255, 255, 255]));
    draw_filled_rect_mut(&mut frame, Rect::at(30, 30).of_size(60, 60), Rgb([0, 180, 0]));
    draw_filled_rect_mut(&mut frame, Rect::at(180, 30).of_size(60, 60), Rgb([0, 0, 200]));

    let orchestrator = orchestrator();
    let (green, _) = orchestrator.count_by_color(&frame, "green", false).unwrap();
    assert_eq!(green.count, 1);
    assert_eq!(green.method, CountMethod::ColorDetection);

    let (blue, _) = orchestrator.count_by_color(&frame, "blue", false).unwrap();
    assert_eq!(blue.count, 1);

    let (red, _) = orchestrator.count_by_color(&frame, "red", false).unwrap();
    assert_eq!(red.count, 0);

    assert!(orchestrator.count_by_color(&frame, "teal", false).is_err());
}

#[test]
fn tiny_frame_is_handled() {
    let frame = RgbImage::from_pixel(2, 2, Rgb([128, 128, 128]));
    let (combined, annotated) = orchestrator().analyze_all(&frame, true);
    assert_eq!(combined.objects.count, 0);
    assert!(annotated.is_some());
}

//! Request-level orchestration of the three analyzers
//!
//! One orchestrator instance is shared by every request. Analyzers run on an
//! immutable borrow of the decoded frame; annotation, when requested, happens
//! on a fresh copy in a fixed order (emotion, then fingers, then objects) so
//! combined overlays are deterministic.

use crate::annotate::Annotator;
use crate::emotion::EmotionClassifier;
use crate::fingers::FingerCounter;
use crate::objects::{CountStrategy, ObjectCounter};
use image::RgbImage;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use visor_core::{CombinedAnalysis, EmotionAnalysis, FingerAnalysis, ObjectAnalysis, Result};

/// Which capabilities came up with their models, reported by the health
/// endpoint. Object counting needs no model and is always available.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CapabilityStatus {
    pub emotion: bool,
    pub fingers: bool,
    pub objects: bool,
}

pub struct AnalysisOrchestrator {
    emotion: Arc<EmotionClassifier>,
    fingers: Arc<FingerCounter>,
    objects: Arc<ObjectCounter>,
    annotator: Annotator,
}

impl AnalysisOrchestrator {
    pub fn new(
        emotion: Arc<EmotionClassifier>,
        fingers: Arc<FingerCounter>,
        objects: Arc<ObjectCounter>,
    ) -> Self {
        Self { emotion, fingers, objects, annotator: Annotator::new() }
    }

    pub fn capabilities(&self) -> CapabilityStatus {
        CapabilityStatus {
            emotion: self.emotion.is_available(),
            fingers: self.fingers.is_available(),
            objects: true,
        }
    }

    /// Classify face emotions, optionally returning an annotated copy.
    pub fn detect_emotion(
        &self,
        image: &RgbImage,
        annotate: bool,
    ) -> (EmotionAnalysis, Option<RgbImage>) {
        let analysis = self.emotion.classify(image);
        let annotated = annotate.then(|| {
            let mut copy = image.clone();
            self.emotion.draw_results(&self.annotator, &mut copy, &analysis);
            copy
        });
        (analysis, annotated)
    }

    /// Count raised fingers, optionally returning an annotated copy.
    pub fn count_fingers(
        &self,
        image: &RgbImage,
        annotate: bool,
    ) -> (FingerAnalysis, Option<RgbImage>) {
        let analysis = self.fingers.count(image);
        let annotated = annotate.then(|| {
            let mut copy = image.clone();
            self.fingers.draw_results(&self.annotator, &mut copy, &analysis);
            copy
        });
        (analysis, annotated)
    }

    /// Count objects with an explicit strategy.
    pub fn count_objects(
        &self,
        image: &RgbImage,
        strategy: CountStrategy,
        annotate: bool,
    ) -> (ObjectAnalysis, Option<RgbImage>) {
        let analysis = self.objects.count(image, strategy);
        let annotated = annotate.then(|| {
            let mut copy = image.clone();
            self.objects.draw_results(&self.annotator, &mut copy, &analysis);
            copy
        });
        (analysis, annotated)
    }

    /// Count objects with the contour/blob ensemble. Callers opt into this
    /// explicitly; the default strategy is contour.
    pub fn count_objects_auto(
        &self,
        image: &RgbImage,
        annotate: bool,
    ) -> (ObjectAnalysis, Option<RgbImage>) {
        let analysis = self.objects.analyze(image);
        let annotated = annotate.then(|| {
            let mut copy = image.clone();
            self.objects.draw_results(&self.annotator, &mut copy, &analysis);
            copy
        });
        (analysis, annotated)
    }

    /// Count objects of one named colour.
    pub fn count_by_color(
        &self,
        image: &RgbImage,
        color: &str,
        annotate: bool,
    ) -> Result<(ObjectAnalysis, Option<RgbImage>)> {
        let analysis = self.objects.count_by_color(image, color)?;
        let annotated = annotate.then(|| {
            let mut copy = image.clone();
            self.objects.draw_results(&self.annotator, &mut copy, &analysis);
            copy
        });
        Ok((analysis, annotated))
    }

    /// Run all three capabilities over one frame.
    ///
    /// A capability whose model is missing contributes its error record; the
    /// others still run. Object counting uses the contour default.
    pub fn analyze_all(
        &self,
        image: &RgbImage,
        annotate: bool,
    ) -> (CombinedAnalysis, Option<RgbImage>) {
        let emotion = self.emotion.classify(image);
        let fingers = self.fingers.count(image);
        let objects = self.objects.count(image, CountStrategy::Contour);
        debug!(
            "Combined analysis: {} faces, {} hands, {} objects",
            emotion.faces_detected, fingers.hands_detected, objects.count
        );

        let annotated = annotate.then(|| {
            let mut copy = image.clone();
            self.emotion.draw_results(&self.annotator, &mut copy, &emotion);
            self.fingers.draw_results(&self.annotator, &mut copy, &fingers);
            self.objects.draw_results(&self.annotator, &mut copy, &objects);
            copy
        });

        (CombinedAnalysis { emotion, fingers, objects }, annotated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::draw_filled_circle_mut;
    use visor_core::{CountMethod, VisionConfig};

    fn orchestrator_without_models() -> AnalysisOrchestrator {
        let config = Arc::new(VisionConfig::default());
        AnalysisOrchestrator::new(
            Arc::new(EmotionClassifier::new(config.clone(), None, None)),
            Arc::new(FingerCounter::new(None)),
            Arc::new(ObjectCounter::new(config)),
        )
    }

    fn frame_with_circle() -> RgbImage {
        let mut img = RgbImage::from_pixel(200, 200, Rgb([255, 255, 255]));
        draw_filled_circle_mut(&mut img, (100, 100), 40, Rgb([0, 0, 0]));
        img
    }

    #[test]
    fn test_missing_models_degrade_without_failing() {
        let orchestrator = orchestrator_without_models();
        let (combined, annotated) = orchestrator.analyze_all(&frame_with_circle(), false);
        assert!(combined.emotion.error.is_some());
        assert!(combined.fingers.error.is_some());
        assert_eq!(combined.objects.count, 1);
        assert!(annotated.is_none());
    }

    #[test]
    fn test_capabilities_reflect_model_state() {
        let status = orchestrator_without_models().capabilities();
        assert!(!status.emotion);
        assert!(!status.fingers);
        assert!(status.objects);
    }

    #[test]
    fn test_annotated_copy_differs_and_input_untouched() {
        let orchestrator = orchestrator_without_models();
        let image = frame_with_circle();
        let before = image.clone();
        let (analysis, annotated) =
            orchestrator.count_objects(&image, CountStrategy::Contour, true);
        assert_eq!(analysis.count, 1);
        let annotated = annotated.expect("annotation requested");
        assert_ne!(annotated.as_raw(), image.as_raw());
        assert_eq!(image.as_raw(), before.as_raw());
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let orchestrator = orchestrator_without_models();
        let image = frame_with_circle();
        let (first, _) = orchestrator.analyze_all(&image, false);
        let (second, _) = orchestrator.analyze_all(&image, false);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_analyze_all_counts_with_contour_default() {
        // A dark centre fading smoothly into the background. The adaptive
        // threshold sees no local contrast; only the blob strategy would
        // segment it, and the combined operation must not switch to it.
        let frame = RgbImage::from_fn(200, 200, |x, y| {
            let dx = x as f32 - 100.0;
            let dy = y as f32 - 100.0;
            let t = ((dx * dx + dy * dy).sqrt() / 80.0).min(1.0);
            let s = t * t * (3.0 - 2.0 * t);
            let v = (30.0 + 200.0 * s) as u8;
            Rgb([v, v, v])
        });
        let orchestrator = orchestrator_without_models();
        let (combined, _) = orchestrator.analyze_all(&frame, false);
        assert_eq!(combined.objects.method, CountMethod::Contour);
        assert_eq!(combined.objects.count, 0);
    }

    #[test]
    fn test_color_count_propagates_input_error() {
        let orchestrator = orchestrator_without_models();
        let result = orchestrator.count_by_color(&frame_with_circle(), "mauve", false);
        assert!(result.is_err());
    }
}

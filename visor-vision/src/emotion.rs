//! Facial emotion classification
//!
//! Two-stage pipeline: SeetaFace frontal detection over the grayscale frame,
//! then a 48x48 CNN classifier per detected face. Either model can be absent,
//! in which case the analysis carries an error record instead of failing the
//! request.

use crate::annotate::{Annotator, GREEN};
use crate::color::rgb_to_gray;
use crate::models::EmotionNet;
use image::{imageops, GrayImage, RgbImage};
use imageproc::contrast::equalize_histogram;
use ndarray::Array4;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use visor_core::{BoundingBox, EmotionAnalysis, EmotionResult, Result, VisionConfig, VisionError};

/// Padding in pixels added around a detected face before cropping.
const FACE_PADDING: u32 = 10;

/// Load a SeetaFace detection model from disk.
pub fn load_face_model(path: &Path) -> Result<rustface::Model> {
    let bytes = fs::read(path)?;
    rustface::read_model(Cursor::new(bytes))
        .map_err(|e| VisionError::ModelUnavailable(format!("unreadable face model: {e}")))
}

/// Classifies the emotion of every detected face in a frame.
pub struct EmotionClassifier {
    config: Arc<VisionConfig>,
    face_model: Option<rustface::Model>,
    net: Option<EmotionNet>,
}

impl EmotionClassifier {
    pub fn new(
        config: Arc<VisionConfig>,
        face_model: Option<rustface::Model>,
        net: Option<EmotionNet>,
    ) -> Self {
        Self { config, face_model, net }
    }

    pub fn is_available(&self) -> bool {
        self.face_model.is_some() && self.net.is_some()
    }

    /// Detect frontal faces in a grayscale frame.
    ///
    /// The rustface detector is stateful, so one is built per call from the
    /// shared immutable model.
    pub fn detect_faces(&self, gray: &GrayImage) -> Vec<BoundingBox> {
        let Some(model) = &self.face_model else {
            return Vec::new();
        };
        let mut detector = rustface::create_detector_with_model(model.clone());
        detector.set_min_face_size(self.config.face_min_size);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(1.0 / self.config.face_scale_factor);
        detector.set_slide_window_step(4, 4);

        let faces =
            detector.detect(&rustface::ImageData::new(gray.as_raw(), gray.width(), gray.height()));
        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                BoundingBox::new(bbox.x(), bbox.y(), bbox.width(), bbox.height())
            })
            .collect()
    }

    /// Classify the emotion of every face in the frame.
    ///
    /// Zero faces is a healthy empty result. Per-face inference failures skip
    /// that face rather than aborting the rest.
    pub fn classify(&self, image: &RgbImage) -> EmotionAnalysis {
        if self.face_model.is_none() {
            return EmotionAnalysis::unavailable("face detection model not available");
        }
        let Some(net) = &self.net else {
            return EmotionAnalysis::unavailable("emotion model not loaded");
        };

        let gray = rgb_to_gray(image);
        // Detection runs on the equalized frame; crops come from the raw
        // grayscale and are equalized again per-face after resizing.
        let equalized = equalize_histogram(&gray);
        let faces = self.detect_faces(&equalized);
        debug!("Detected {} faces", faces.len());

        let mut emotions = Vec::new();
        for bbox in &faces {
            let padded = bbox.expanded(FACE_PADDING).clamped(gray.width(), gray.height());
            if padded.is_empty() {
                continue;
            }
            let face = imageops::crop_imm(
                &gray,
                padded.x as u32,
                padded.y as u32,
                padded.width,
                padded.height,
            )
            .to_image();
            let tensor = preprocess_face(&face);
            match net.infer(tensor) {
                Ok(probs) => emotions.push(EmotionResult::from_probabilities(&probs, *bbox)),
                Err(e) => warn!("Emotion inference failed for face at {:?}: {e}", bbox),
            }
        }

        EmotionAnalysis { error: None, faces_detected: faces.len(), emotions }
    }

    /// Draw face boxes and emotion labels onto the frame.
    pub fn draw_results(
        &self,
        annotator: &Annotator,
        image: &mut RgbImage,
        analysis: &EmotionAnalysis,
    ) {
        for result in &analysis.emotions {
            annotator.draw_box_with_corners(image, &result.bbox, GREEN, 3);
            let label = format!("{}  {}%", result.emotion.to_uppercase(), result.confidence);
            // Label above the box when it fits, tucked inside otherwise.
            let y = if result.bbox.y >= 26 { result.bbox.y - 26 } else { result.bbox.y + 8 };
            annotator.draw_label(image, &label, result.bbox.x, y, GREEN);
        }
    }
}

/// Prepare a cropped face for the classifier: resize to 48x48, equalize the
/// histogram, scale to [0, 1], shape as NCHW.
pub fn preprocess_face(face: &GrayImage) -> Array4<f32> {
    let side = EmotionNet::INPUT_SIZE;
    let resized = imageops::resize(face, side, side, imageops::FilterType::Triangle);
    let equalized = equalize_histogram(&resized);
    let side = side as usize;
    Array4::from_shape_fn((1, 1, side, side), |(_, _, y, x)| {
        equalized.get_pixel(x as u32, y as u32).0[0] as f32 / 255.0
    })
}

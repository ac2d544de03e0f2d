//! Analysis result records
//!
//! These are the field-level contract the analyzers produce and the HTTP
//! layer serializes. Every record is created fresh per request; nothing here
//! is persisted or cached.

use crate::geometry::BoundingBox;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Emotion categories in class-index order. This order is the contract
/// between the classifier's output vector and the reported label and must
/// match the training label order exactly.
pub const EMOTION_LABELS: [&str; 7] =
    ["angry", "disgust", "fear", "happy", "sad", "surprise", "neutral"];

/// Finger names in fixed reporting order.
pub const FINGER_NAMES: [&str; 5] = ["Thumb", "Index", "Middle", "Ring", "Pinky"];

/// Round to two decimal places (percentage precision used throughout).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One classified face.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionResult {
    pub emotion: String,
    /// Percentage in [0, 100], two decimals. Always equals
    /// `all_probabilities[emotion]`.
    pub confidence: f64,
    pub bbox: BoundingBox,
    /// All seven categories, percentage scale, two decimals.
    pub all_probabilities: BTreeMap<String, f64>,
}

impl EmotionResult {
    /// Build a result from a raw 7-way probability vector ([0, 1] scale).
    pub fn from_probabilities(probs: &[f32; 7], bbox: BoundingBox) -> Self {
        let mut best = 0usize;
        for (i, p) in probs.iter().enumerate() {
            if *p > probs[best] {
                best = i;
            }
        }
        let all_probabilities: BTreeMap<String, f64> = EMOTION_LABELS
            .iter()
            .zip(probs.iter())
            .map(|(label, p)| (label.to_string(), round2(*p as f64 * 100.0)))
            .collect();
        let emotion = EMOTION_LABELS[best].to_string();
        let confidence = all_probabilities[&emotion];
        Self { emotion, confidence, bbox, all_probabilities }
    }
}

/// Emotion capability output: zero or more classified faces, or a structured
/// error when the model is not loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub faces_detected: usize,
    pub emotions: Vec<EmotionResult>,
}

impl EmotionAnalysis {
    pub fn empty() -> Self {
        Self { error: None, faces_detected: 0, emotions: Vec::new() }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self { error: Some(message.into()), faces_detected: 0, emotions: Vec::new() }
    }
}

/// Which hand a landmark set belongs to, as reported by the landmark model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
    Unknown,
}

impl std::fmt::Display for Handedness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handedness::Left => write!(f, "Left"),
            Handedness::Right => write!(f, "Right"),
            Handedness::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Per-hand raised-finger record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerState {
    pub hand: Handedness,
    /// Count of raised fingers, 0-5.
    pub fingers_up: u8,
    /// Names of raised fingers in [`FINGER_NAMES`] order.
    pub raised_fingers: Vec<String>,
    /// All five fingers mapped to their raised state.
    pub finger_status: BTreeMap<String, bool>,
}

/// Finger capability output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub hands_detected: usize,
    pub total_fingers: u32,
    pub hands: Vec<FingerState>,
}

impl FingerAnalysis {
    pub fn empty() -> Self {
        Self { error: None, hands_detected: 0, total_fingers: 0, hands: Vec::new() }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self { error: Some(message.into()), hands_detected: 0, total_fingers: 0, hands: Vec::new() }
    }
}

/// Detection strategy recorded on an [`ObjectAnalysis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountMethod {
    Contour,
    Blob,
    ColorDetection,
}

/// One counted object. The variant is determined by the method on the
/// containing result; a result never mixes variants.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CountedObject {
    Contour {
        bbox: BoundingBox,
        /// Enclosed area in pixels.
        area: f64,
        /// 4*pi*area/perimeter^2; absent for colour-filtered results.
        #[serde(skip_serializing_if = "Option::is_none")]
        circularity: Option<f64>,
        /// Raw boundary points. Large intermediate geometry carried on the
        /// internal record, never serialized.
        #[serde(skip_serializing)]
        contour: Vec<(i32, i32)>,
    },
    Blob {
        center: BlobCenter,
        /// Diameter-like measure in pixels.
        size: f64,
        /// Detector confidence score.
        response: f64,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BlobCenter {
    pub x: f64,
    pub y: f64,
}

/// Object capability output.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectAnalysis {
    pub count: usize,
    pub method: CountMethod,
    pub objects: Vec<CountedObject>,
}

/// Merged output of the combined operation, keyed by capability.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedAnalysis {
    pub emotion: EmotionAnalysis,
    pub fingers: FingerAnalysis,
    pub objects: ObjectAnalysis,
}

//! Hand landmark network (ONNX)

use crate::fingers::{HandLandmarks, Landmark, LANDMARK_COUNT};
use image::{imageops, RgbImage};
use ndarray::Array4;
use ort::inputs;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;
use visor_core::{Handedness, Result, VisionConfig, VisionError};

/// One detected hand: 21 ordered landmarks plus a handedness label.
#[derive(Debug, Clone)]
pub struct HandDetection {
    pub landmarks: HandLandmarks,
    pub handedness: Handedness,
    pub presence: f32,
}

/// Landmark localizer producing up to `max_hands` hands per frame.
///
/// Inference needs a mutable session, so concurrent calls serialize behind
/// the internal mutex.
pub struct HandNet {
    session: Mutex<Session>,
    max_hands: usize,
    presence_threshold: f32,
}

impl HandNet {
    /// Input side length of the landmark network.
    pub const INPUT_SIZE: u32 = 224;

    pub fn load(path: &Path, config: &VisionConfig) -> Result<Self> {
        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(2))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| {
                VisionError::Inference(format!("failed to load hand landmark network: {e}"))
            })?;
        Ok(Self {
            session: Mutex::new(session),
            max_hands: config.max_hands,
            presence_threshold: config.hand_presence_threshold,
        })
    }

    /// Detect hands and their landmark sets in a frame.
    ///
    /// Zero hands is an empty result, not an error. Candidates below the
    /// presence threshold are dropped; at most `max_hands` survive.
    pub fn detect(&self, image: &RgbImage) -> Result<Vec<HandDetection>> {
        let tensor = self.preprocess(image);
        let input = inputs![
            "input" => Tensor::from_array(tensor)
                .map_err(|e| VisionError::Inference(format!("bad input tensor: {e}")))?
        ];
        let mut session = self
            .session
            .lock()
            .map_err(|_| VisionError::Inference("hand session poisoned".into()))?;
        let outputs = session
            .run(input)
            .map_err(|e| VisionError::Inference(format!("hand inference failed: {e}")))?;

        let extract = |name: &str| -> Result<Vec<f32>> {
            let value = outputs.get(name).ok_or_else(|| {
                VisionError::Inference(format!("hand network produced no {name} output"))
            })?;
            let array = value
                .try_extract_array::<f32>()
                .map_err(|e| VisionError::Inference(format!("bad {name} tensor: {e}")))?;
            Ok(array.iter().copied().collect())
        };

        let landmarks = extract("landmarks")?;
        let presence = extract("presence")?;
        let handedness = extract("handedness")?;

        let per_hand = LANDMARK_COUNT * 3;
        let candidates = landmarks.len() / per_hand;
        debug!("Hand network emitted {} candidates", candidates);

        let mut hands = Vec::new();
        for i in 0..candidates {
            if hands.len() >= self.max_hands {
                break;
            }
            let score = presence.get(i).copied().unwrap_or(0.0);
            if score < self.presence_threshold {
                continue;
            }
            let row = &landmarks[i * per_hand..(i + 1) * per_hand];
            let mut set = [Landmark::default(); LANDMARK_COUNT];
            for (j, point) in set.iter_mut().enumerate() {
                // Coordinates come out in input-pixel space; normalize so
                // the geometry below is resolution-independent.
                point.x = row[j * 3] / Self::INPUT_SIZE as f32;
                point.y = row[j * 3 + 1] / Self::INPUT_SIZE as f32;
                point.z = row[j * 3 + 2] / Self::INPUT_SIZE as f32;
            }
            let label = match handedness.get(i) {
                Some(score) if *score >= 0.5 => Handedness::Right,
                Some(_) => Handedness::Left,
                None => Handedness::Unknown,
            };
            hands.push(HandDetection { landmarks: set, handedness: label, presence: score });
        }
        Ok(hands)
    }

    fn preprocess(&self, image: &RgbImage) -> Array4<f32> {
        let resized = imageops::resize(
            image,
            Self::INPUT_SIZE,
            Self::INPUT_SIZE,
            imageops::FilterType::Triangle,
        );
        let side = Self::INPUT_SIZE as usize;
        Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
            resized.get_pixel(x as u32, y as u32).0[c] as f32 / 255.0
        })
    }
}

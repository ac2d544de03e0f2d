//! Emotion classification network (ONNX)

use ndarray::Array4;
use ort::inputs;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;
use visor_core::{Result, VisionError};

/// 7-way emotion classifier over a preprocessed 1x1x48x48 face tensor.
///
/// Inference needs a mutable session, so concurrent calls serialize behind
/// the internal mutex.
pub struct EmotionNet {
    session: Mutex<Session>,
}

impl EmotionNet {
    /// Input side length of the classifier (48x48 grayscale).
    pub const INPUT_SIZE: u32 = 48;

    pub fn load(path: &Path) -> Result<Self> {
        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(2))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| VisionError::Inference(format!("failed to load emotion network: {e}")))?;
        Ok(Self { session: Mutex::new(session) })
    }

    /// Run the classifier on one preprocessed face.
    ///
    /// The input must already satisfy the training contract: 48x48,
    /// histogram-equalized, scaled to [0, 1].
    pub fn infer(&self, face: Array4<f32>) -> Result<[f32; 7]> {
        debug!("Running emotion classification");
        let input = inputs![
            "input" => Tensor::from_array(face)
                .map_err(|e| VisionError::Inference(format!("bad input tensor: {e}")))?
        ];
        let mut session = self
            .session
            .lock()
            .map_err(|_| VisionError::Inference("emotion session poisoned".into()))?;
        let outputs = session
            .run(input)
            .map_err(|e| VisionError::Inference(format!("emotion inference failed: {e}")))?;
        let value = outputs
            .get("output")
            .ok_or_else(|| VisionError::Inference("emotion network produced no output".into()))?;
        let array = value
            .try_extract_array::<f32>()
            .map_err(|e| VisionError::Inference(format!("bad output tensor: {e}")))?;

        let flat: Vec<f32> = array.iter().copied().collect();
        if flat.len() < 7 {
            return Err(VisionError::Inference(format!(
                "emotion network emitted {} values, expected 7",
                flat.len()
            )));
        }
        let mut probs = [0.0f32; 7];
        probs.copy_from_slice(&flat[..7]);
        Ok(probs)
    }
}

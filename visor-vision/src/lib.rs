//! visor-vision: image analysis pipelines for the Visor service
//!
//! Three independent analyzers over a decoded RGB frame — facial emotion
//! classification, hand-landmark finger counting, and contour/blob object
//! counting — plus the orchestrator that runs any subset and composites
//! annotations in a fixed order.
//!
//! Analyzers are constructed once at startup (see [`bootstrap_analyzers`])
//! and shared across concurrent requests; ONNX sessions serialize their
//! calls internally.

pub mod annotate;
pub mod color;
pub mod emotion;
pub mod fingers;
pub mod models;
pub mod objects;
pub mod orchestrator;

pub use emotion::EmotionClassifier;
pub use fingers::FingerCounter;
pub use objects::{ColorRange, CountStrategy, ObjectCounter, COLOR_RANGES};
pub use orchestrator::AnalysisOrchestrator;

use std::sync::Arc;
use tracing::{info, warn};
use visor_core::VisionConfig;

/// Build all analyzers, acquiring model artifacts as needed.
///
/// This is the one-time startup step: the face model is fetched into the
/// cache directory if absent, the hand-landmark model is taken from the
/// cache (or from the configured override URL), and the emotion network is
/// searched for locally. A model that cannot be acquired degrades its
/// capability to an explicit error state; the orchestrator itself always
/// comes up.
pub async fn bootstrap_analyzers(config: Arc<VisionConfig>) -> AnalysisOrchestrator {
    let manager = models::ModelManager::new(config.clone());

    let face_model = match manager.get_face_model().await {
        Ok(path) => match emotion::load_face_model(&path) {
            Ok(model) => Some(model),
            Err(e) => {
                warn!("Face detection model failed to load: {e}");
                None
            }
        },
        Err(e) => {
            warn!("Face detection model unavailable: {e}");
            None
        }
    };

    let emotion_net = match manager.locate_emotion_model() {
        Some(path) => match models::EmotionNet::load(&path) {
            Ok(net) => {
                info!("Emotion network loaded from {:?}", path);
                Some(net)
            }
            Err(e) => {
                warn!("Emotion network failed to load: {e}");
                None
            }
        },
        None => {
            warn!("No trained emotion network found in {:?}; emotion capability degraded", config.model_dir);
            None
        }
    };

    let hand_net = match manager.get_hand_landmark_model().await {
        Ok(path) => match models::HandNet::load(&path, &config) {
            Ok(net) => {
                info!("Hand landmark network loaded from {:?}", path);
                Some(net)
            }
            Err(e) => {
                warn!("Hand landmark network failed to load: {e}");
                None
            }
        },
        Err(e) => {
            warn!("Hand landmark model unavailable: {e}");
            None
        }
    };

    let emotion = Arc::new(EmotionClassifier::new(config.clone(), face_model, emotion_net));
    let fingers = Arc::new(FingerCounter::new(hand_net));
    let objects = Arc::new(ObjectCounter::new(config.clone()));

    AnalysisOrchestrator::new(emotion, fingers, objects)
}

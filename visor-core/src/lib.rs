//! visor-core: shared vocabulary for the Visor vision-analysis service
//!
//! Geometry, analysis result records, the error taxonomy, and runtime
//! configuration. This crate performs no I/O; the analyzers live in
//! `visor-vision` and the HTTP surface in `visor-server`.

pub mod analysis;
pub mod config;
pub mod error;
pub mod geometry;

pub use analysis::{
    BlobCenter, CombinedAnalysis, CountMethod, CountedObject, EmotionAnalysis, EmotionResult,
    FingerAnalysis, FingerState, Handedness, ObjectAnalysis, EMOTION_LABELS, FINGER_NAMES,
};
pub use config::VisionConfig;
pub use error::{Result, VisionError};
pub use geometry::BoundingBox;

//! Runtime configuration for the analyzers

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Vision pipeline configuration.
///
/// Built once at startup; analyzers hold it behind `Arc` and never mutate it
/// after initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Directory where model artifacts are stored/cached.
    pub model_dir: PathBuf,
    /// Maximum hands reported per frame.
    pub max_hands: usize,
    /// Minimum hand detection/presence confidence.
    pub hand_presence_threshold: f32,
    /// Minimum hand tracking confidence. Carried for parity with the
    /// landmark model's configuration surface; single-frame calls do not
    /// track.
    pub hand_tracking_threshold: f32,
    /// Minimum face size in pixels for the cascade-style detector.
    pub face_min_size: u32,
    /// Per-level scale step of the detection pyramid.
    pub face_scale_factor: f32,
    /// Minimum area (px^2) for a contour or blob to count as an object.
    pub min_contour_area: f64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        let model_dir = dirs::home_dir()
            .map(|mut p| {
                p.push(".visor");
                p.push("models");
                p
            })
            .unwrap_or_else(|| PathBuf::from("./models"));

        Self {
            model_dir,
            max_hands: 2,
            hand_presence_threshold: 0.7,
            hand_tracking_threshold: 0.5,
            face_min_size: 30,
            face_scale_factor: 1.1,
            min_contour_area: 500.0,
        }
    }
}

impl VisionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_hands == 0 || self.max_hands > 4 {
            return Err("max_hands must be between 1 and 4".to_string());
        }

        if !(0.0..=1.0).contains(&self.hand_presence_threshold) {
            return Err("hand_presence_threshold must be in [0, 1]".to_string());
        }

        if !(0.0..=1.0).contains(&self.hand_tracking_threshold) {
            return Err("hand_tracking_threshold must be in [0, 1]".to_string());
        }

        if self.face_min_size == 0 || self.face_min_size > 1024 {
            return Err("face_min_size must be between 1 and 1024".to_string());
        }

        if self.face_scale_factor <= 1.0 || self.face_scale_factor > 2.0 {
            return Err("face_scale_factor must be in (1, 2]".to_string());
        }

        if self.min_contour_area < 0.0 || !self.min_contour_area.is_finite() {
            return Err("min_contour_area must be a non-negative finite number".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = VisionConfig::default();
        assert_eq!(config.max_hands, 2);
        assert_eq!(config.hand_presence_threshold, 0.7);
        assert_eq!(config.hand_tracking_threshold, 0.5);
        assert_eq!(config.face_min_size, 30);
        assert_eq!(config.face_scale_factor, 1.1);
        assert_eq!(config.min_contour_area, 500.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_max_hands() {
        let mut config = VisionConfig::default();
        config.max_hands = 0;
        assert!(config.validate().is_err());
        config.max_hands = 5;
        assert!(config.validate().is_err());
        config.max_hands = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_thresholds() {
        let mut config = VisionConfig::default();
        config.hand_presence_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = VisionConfig::default();
        config.hand_tracking_threshold = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_face_detector() {
        let mut config = VisionConfig::default();
        config.face_min_size = 0;
        assert!(config.validate().is_err());

        let mut config = VisionConfig::default();
        config.face_scale_factor = 1.0;
        assert!(config.validate().is_err());
        config.face_scale_factor = 2.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_contour_area() {
        let mut config = VisionConfig::default();
        config.min_contour_area = -1.0;
        assert!(config.validate().is_err());
        config.min_contour_area = f64::NAN;
        assert!(config.validate().is_err());
        config.min_contour_area = 0.0;
        assert!(config.validate().is_ok());
    }
}

//! Finger counting from hand landmarks
//!
//! Counting is pure geometry over the 21-point landmark set: a non-thumb
//! finger is raised when its tip sits above its PIP joint, and the thumb is
//! raised when its tip is farther from the wrist horizontally than the joint
//! below it. Image coordinates grow downward, so "above" means smaller y.

use crate::annotate::{Annotator, GREEN};
use crate::models::hand_net::{HandDetection, HandNet};
use image::RgbImage;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use visor_core::{FingerAnalysis, FingerState, FINGER_NAMES};

/// Number of landmarks per hand in the MediaPipe topology.
pub const LANDMARK_COUNT: usize = 21;

/// Wrist landmark index.
pub const WRIST: usize = 0;

/// Tip landmark index per finger: thumb, index, middle, ring, pinky.
pub const FINGER_TIPS: [usize; 5] = [4, 8, 12, 16, 20];

/// Lower-joint index per finger. The thumb uses its IP joint, the rest
/// use the PIP joint.
pub const FINGER_PIPS: [usize; 5] = [3, 6, 10, 14, 18];

/// One landmark in normalized image coordinates ([0, 1] on each axis).
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// The 21 landmarks of one hand, in MediaPipe order.
pub type HandLandmarks = [Landmark; LANDMARK_COUNT];

/// Whether finger `index` (0 = thumb .. 4 = pinky) is raised.
pub fn is_finger_raised(landmarks: &HandLandmarks, index: usize) -> bool {
    let tip = landmarks[FINGER_TIPS[index]];
    let joint = landmarks[FINGER_PIPS[index]];
    if index == 0 {
        // The thumb extends sideways rather than upward.
        let wrist = landmarks[WRIST];
        (tip.x - wrist.x).abs() > (joint.x - wrist.x).abs()
    } else {
        tip.y < joint.y
    }
}

/// Per-hand finger state from one landmark set.
pub fn count_raised_fingers(landmarks: &HandLandmarks) -> (u8, Vec<String>, BTreeMap<String, bool>) {
    let mut raised = Vec::new();
    let mut status = BTreeMap::new();
    for (i, name) in FINGER_NAMES.iter().enumerate() {
        let up = is_finger_raised(landmarks, i);
        status.insert(name.to_string(), up);
        if up {
            raised.push(name.to_string());
        }
    }
    (raised.len() as u8, raised, status)
}

/// Counts raised fingers per detected hand.
pub struct FingerCounter {
    net: Option<HandNet>,
}

impl FingerCounter {
    pub fn new(net: Option<HandNet>) -> Self {
        Self { net }
    }

    pub fn is_available(&self) -> bool {
        self.net.is_some()
    }

    /// Run landmark detection and finger counting on a frame.
    ///
    /// A missing or failing network yields an analysis with an error record
    /// instead of propagating.
    pub fn count(&self, image: &RgbImage) -> FingerAnalysis {
        let Some(net) = &self.net else {
            return FingerAnalysis::unavailable("hand landmark model not available");
        };

        let detections = match net.detect(image) {
            Ok(hands) => hands,
            Err(e) => {
                warn!("Hand landmark detection failed: {e}");
                return FingerAnalysis::unavailable(e.to_string());
            }
        };

        let hands: Vec<FingerState> = detections.iter().map(hand_state).collect();
        let total: u32 = hands.iter().map(|h| h.fingers_up as u32).sum();
        debug!("Counted {} fingers across {} hands", total, hands.len());

        FingerAnalysis { error: None, hands_detected: hands.len(), total_fingers: total, hands }
    }

    /// Draw the total and one line per hand onto the frame. Text only, no
    /// landmark skeleton.
    pub fn draw_results(
        &self,
        annotator: &Annotator,
        image: &mut RgbImage,
        analysis: &FingerAnalysis,
    ) {
        if analysis.hands_detected == 0 {
            return;
        }
        let total = format!("Fingers: {}", analysis.total_fingers);
        annotator.draw_label(image, &total, 10, 30, GREEN);

        let mut y = 80;
        for hand in &analysis.hands {
            let line = format!("{}: {} fingers", hand.hand, hand.fingers_up);
            annotator.draw_label(image, &line, 10, y, GREEN);
            y += 40;
        }
    }
}

fn hand_state(detection: &HandDetection) -> FingerState {
    let (fingers_up, raised_fingers, finger_status) = count_raised_fingers(&detection.landmarks);
    FingerState { hand: detection.handedness, fingers_up, raised_fingers, finger_status }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_hand() -> HandLandmarks {
        // Wrist at the bottom center, all five fingers extended upward,
        // thumb pushed out to the side.
        let mut lm = [Landmark::default(); LANDMARK_COUNT];
        lm[WRIST] = Landmark { x: 0.5, y: 0.9, z: 0.0 };
        for i in 0..5 {
            let x = 0.3 + 0.1 * i as f32;
            lm[FINGER_PIPS[i]] = Landmark { x, y: 0.5, z: 0.0 };
            lm[FINGER_TIPS[i]] = Landmark { x, y: 0.3, z: 0.0 };
        }
        // Thumb tip farther from the wrist than its joint.
        lm[FINGER_PIPS[0]] = Landmark { x: 0.35, y: 0.6, z: 0.0 };
        lm[FINGER_TIPS[0]] = Landmark { x: 0.2, y: 0.55, z: 0.0 };
        lm
    }

    fn fist() -> HandLandmarks {
        let mut lm = flat_hand();
        // Curl every finger: tip below joint, thumb tucked toward the wrist.
        for i in 1..5 {
            lm[FINGER_TIPS[i]].y = lm[FINGER_PIPS[i]].y + 0.1;
        }
        lm[FINGER_TIPS[0]] = Landmark { x: 0.45, y: 0.6, z: 0.0 };
        lm
    }

    #[test]
    fn test_open_hand_counts_five() {
        let (count, raised, status) = count_raised_fingers(&flat_hand());
        assert_eq!(count, 5);
        assert_eq!(raised.len(), 5);
        assert!(status.values().all(|&up| up));
    }

    #[test]
    fn test_fist_counts_zero() {
        let (count, raised, status) = count_raised_fingers(&fist());
        assert_eq!(count, 0);
        assert!(raised.is_empty());
        assert!(status.values().all(|&up| !up));
    }

    #[test]
    fn test_index_only() {
        let mut lm = fist();
        lm[FINGER_TIPS[1]].y = lm[FINGER_PIPS[1]].y - 0.2;
        let (count, raised, _) = count_raised_fingers(&lm);
        assert_eq!(count, 1);
        assert_eq!(raised, vec!["Index".to_string()]);
    }

    #[test]
    fn test_thumb_uses_horizontal_distance() {
        let mut lm = fist();
        assert!(!is_finger_raised(&lm, 0));
        // Push the tip out past the joint.
        lm[FINGER_TIPS[0]].x = 0.1;
        assert!(is_finger_raised(&lm, 0));
    }

    #[test]
    fn test_status_has_all_finger_names() {
        let (_, _, status) = count_raised_fingers(&flat_hand());
        assert_eq!(status.len(), FINGER_NAMES.len());
        for name in FINGER_NAMES {
            assert!(status.contains_key(name));
        }
    }

    #[test]
    fn test_missing_model_reports_error() {
        let counter = FingerCounter::new(None);
        let image = RgbImage::new(32, 32);
        let analysis = counter.count(&image);
        assert!(analysis.error.is_some());
        assert_eq!(analysis.hands_detected, 0);
        assert_eq!(analysis.total_fingers, 0);
        assert!(!counter.is_available());
    }

    #[test]
    fn test_draw_skips_empty_analysis() {
        let counter = FingerCounter::new(None);
        let annotator = Annotator::new();
        let mut image = RgbImage::new(64, 64);
        counter.draw_results(&annotator, &mut image, &FingerAnalysis::empty());
        assert!(image.pixels().all(|p| p.0 == [0, 0, 0]));
    }
}

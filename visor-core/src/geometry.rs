//! Pixel-space geometry shared by the analyzers

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box, integer pixels, top-left origin.
///
/// Boxes produced by detectors may poke past the image edges once padded;
/// callers must [`BoundingBox::clamped`] a box before cropping or drawing
/// with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Grow the box by `padding` pixels on every side.
    pub fn expanded(&self, padding: u32) -> Self {
        Self {
            x: self.x - padding as i32,
            y: self.y - padding as i32,
            width: self.width + 2 * padding,
            height: self.height + 2 * padding,
        }
    }

    /// Clamp the box to `[0, image_width] x [0, image_height]`.
    ///
    /// The result satisfies `0 <= x`, `0 <= y`, `x + width <= image_width`
    /// and `y + height <= image_height`; a box fully outside the image
    /// collapses to zero size at the nearest edge.
    pub fn clamped(&self, image_width: u32, image_height: u32) -> Self {
        let x0 = self.x.clamp(0, image_width as i32);
        let y0 = self.y.clamp(0, image_height as i32);
        let x1 = (self.x + self.width as i32).clamp(0, image_width as i32);
        let y1 = (self.y + self.height as i32).clamp(0, image_height as i32);
        Self {
            x: x0,
            y: y0,
            width: (x1 - x0).max(0) as u32,
            height: (y1 - y0).max(0) as u32,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_then_clamp_stays_in_bounds() {
        // Face near the top-left corner, padded by 10px.
        let bbox = BoundingBox::new(3, 5, 40, 40).expanded(10).clamped(640, 480);
        assert!(bbox.x >= 0 && bbox.y >= 0);
        assert!(bbox.right() <= 640 && bbox.bottom() <= 480);
        assert_eq!(bbox.x, 0);
        assert_eq!(bbox.y, 0);

        // And near the bottom-right corner.
        let bbox = BoundingBox::new(610, 450, 40, 40).expanded(10).clamped(640, 480);
        assert!(bbox.right() <= 640 && bbox.bottom() <= 480);
        assert_eq!(bbox.right(), 640);
        assert_eq!(bbox.bottom(), 480);
    }

    #[test]
    fn test_clamp_interior_box_unchanged() {
        let bbox = BoundingBox::new(100, 100, 50, 60);
        assert_eq!(bbox.clamped(640, 480), bbox);
    }

    #[test]
    fn test_clamp_fully_outside_collapses() {
        let bbox = BoundingBox::new(700, 500, 30, 30).clamped(640, 480);
        assert!(bbox.is_empty());
        assert!(bbox.x <= 640 && bbox.y <= 480);
    }

    #[test]
    fn test_expanded_dimensions() {
        let bbox = BoundingBox::new(50, 50, 20, 30).expanded(10);
        assert_eq!(bbox.x, 40);
        assert_eq!(bbox.y, 40);
        assert_eq!(bbox.width, 40);
        assert_eq!(bbox.height, 50);
    }
}

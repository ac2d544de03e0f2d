//! Object counting over contours, blobs, and colour masks
//!
//! Three strategies over one decoded frame:
//!
//! * `contour` segments dark-on-light structure with an adaptive threshold
//!   and counts cleaned-up external contours,
//! * `blob` segments with a global Otsu threshold and applies stricter shape
//!   filters (area, circularity, convexity, inertia),
//! * colour counting masks one named HSV range and counts the regions left.
//!
//! All areas and perimeters are polygon measures over the traced boundary,
//! so a hollow segmentation of a solid object still reports the full area.

use crate::annotate::{Annotator, GREEN};
use crate::color::{rgb_pixel_to_hsv, rgb_to_gray};
use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::convex_hull;
use imageproc::morphology::{close, open};
use imageproc::point::Point;
use std::f64::consts::PI;
use std::sync::Arc;
use tracing::debug;
use visor_core::{
    BlobCenter, BoundingBox, CountMethod, CountedObject, ObjectAnalysis, Result, VisionConfig,
    VisionError,
};

/// Upper area bound for the blob strategy (px^2).
const BLOB_MAX_AREA: f64 = 100_000.0;
const BLOB_MIN_CIRCULARITY: f64 = 0.1;
const BLOB_MIN_CONVEXITY: f64 = 0.5;
const BLOB_MIN_INERTIA: f64 = 0.01;

/// One named HSV colour band (OpenCV scaling: H in [0, 180)).
///
/// Red wraps around the hue circle, so it carries a second band.
pub struct ColorRange {
    pub name: &'static str,
    pub lower: (u8, u8, u8),
    pub upper: (u8, u8, u8),
    pub wrap: Option<((u8, u8, u8), (u8, u8, u8))>,
}

/// Colours accepted by the colour-counting operation.
pub const COLOR_RANGES: [ColorRange; 5] = [
    ColorRange {
        name: "red",
        lower: (0, 50, 50),
        upper: (10, 255, 255),
        wrap: Some(((170, 50, 50), (180, 255, 255))),
    },
    ColorRange { name: "green", lower: (40, 40, 40), upper: (80, 255, 255), wrap: None },
    ColorRange { name: "blue", lower: (100, 50, 50), upper: (130, 255, 255), wrap: None },
    ColorRange { name: "yellow", lower: (20, 100, 100), upper: (30, 255, 255), wrap: None },
    ColorRange { name: "orange", lower: (10, 100, 100), upper: (20, 255, 255), wrap: None },
];

/// Segmentation strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountStrategy {
    Contour,
    Blob,
}

impl CountStrategy {
    /// Parse a strategy name; anything unrecognized falls back to contour.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "blob" => CountStrategy::Blob,
            _ => CountStrategy::Contour,
        }
    }
}

/// Counts distinct objects in a frame. Stateless apart from configuration.
pub struct ObjectCounter {
    config: Arc<VisionConfig>,
}

impl ObjectCounter {
    pub fn new(config: Arc<VisionConfig>) -> Self {
        Self { config }
    }

    /// Count objects using the requested strategy.
    pub fn count(&self, image: &RgbImage, strategy: CountStrategy) -> ObjectAnalysis {
        match strategy {
            CountStrategy::Contour => self.count_contours(image),
            CountStrategy::Blob => self.count_blobs(image),
        }
    }

    /// Run both strategies and keep the richer result. Advisory: callers get
    /// this only by asking for it, and the contour strategy wins ties.
    pub fn analyze(&self, image: &RgbImage) -> ObjectAnalysis {
        let contours = self.count_contours(image);
        let blobs = self.count_blobs(image);
        debug!("Ensemble: contour={} blob={}", contours.count, blobs.count);
        if contours.count >= blobs.count {
            contours
        } else {
            blobs
        }
    }

    /// Adaptive-threshold contour counting.
    pub fn count_contours(&self, image: &RgbImage) -> ObjectAnalysis {
        let gray = rgb_to_gray(image);
        let blurred = gaussian_blur_f32(&gray, 1.1);
        let mask = adaptive_threshold_inv(&blurred, 2.0, 2.0);
        // Close small gaps, then drop speckles.
        let mask = close(&mask, Norm::LInf, 2);
        let mask = open(&mask, Norm::LInf, 1);

        let mut objects = Vec::new();
        for contour in find_contours::<i32>(&mask) {
            if contour.border_type != BorderType::Outer {
                continue;
            }
            let points = &contour.points;
            let area = contour_area(points);
            if area <= self.config.min_contour_area {
                continue;
            }
            let circularity = contour_circularity(points).map(round3);
            objects.push(CountedObject::Contour {
                bbox: contour_bbox(points),
                area,
                circularity,
                contour: points.iter().map(|p| (p.x, p.y)).collect(),
            });
        }

        ObjectAnalysis { count: objects.len(), method: CountMethod::Contour, objects }
    }

    /// Otsu-threshold blob counting with shape filters.
    pub fn count_blobs(&self, image: &RgbImage) -> ObjectAnalysis {
        let gray = rgb_to_gray(image);
        let blurred = gaussian_blur_f32(&gray, 1.1);
        let level = otsu_level(&blurred);
        // Dark regions are the blobs.
        let mask = threshold(&blurred, level, ThresholdType::BinaryInverted);
        let mask = close(&mask, Norm::LInf, 1);

        let mut objects = Vec::new();
        for contour in find_contours::<i32>(&mask) {
            if contour.border_type != BorderType::Outer {
                continue;
            }
            let points = &contour.points;
            let area = contour_area(points);
            if area < self.config.min_contour_area || area > BLOB_MAX_AREA {
                continue;
            }
            let Some(circularity) = contour_circularity(points) else {
                continue;
            };
            if circularity < BLOB_MIN_CIRCULARITY {
                continue;
            }
            let hull = convex_hull(points.as_slice());
            let hull_area = contour_area(&hull);
            if hull_area <= 0.0 || area / hull_area < BLOB_MIN_CONVEXITY {
                continue;
            }
            if inertia_ratio(points) < BLOB_MIN_INERTIA {
                continue;
            }
            let (cx, cy) = contour_centroid(points);
            objects.push(CountedObject::Blob {
                center: BlobCenter { x: round3(cx), y: round3(cy) },
                size: round3(2.0 * (area / PI).sqrt()),
                response: round3(circularity),
            });
        }

        ObjectAnalysis { count: objects.len(), method: CountMethod::Blob, objects }
    }

    /// Count regions of a named colour.
    pub fn count_by_color(&self, image: &RgbImage, color: &str) -> Result<ObjectAnalysis> {
        let wanted = color.trim().to_ascii_lowercase();
        let range = COLOR_RANGES.iter().find(|r| r.name == wanted).ok_or_else(|| {
            let known: Vec<&str> = COLOR_RANGES.iter().map(|r| r.name).collect();
            VisionError::Input(format!(
                "unknown color {color:?}; supported colors: {}",
                known.join(", ")
            ))
        })?;

        let mask = GrayImage::from_fn(image.width(), image.height(), |x, y| {
            let hsv = rgb_pixel_to_hsv(*image.get_pixel(x, y));
            let hit = in_band(hsv, range.lower, range.upper)
                || range.wrap.is_some_and(|(lo, hi)| in_band(hsv, lo, hi));
            Luma([if hit { 255 } else { 0 }])
        });
        let mask = close(&mask, Norm::LInf, 2);
        let mask = open(&mask, Norm::LInf, 1);

        let mut objects = Vec::new();
        for contour in find_contours::<i32>(&mask) {
            if contour.border_type != BorderType::Outer {
                continue;
            }
            let points = &contour.points;
            let area = contour_area(points);
            if area <= self.config.min_contour_area {
                continue;
            }
            objects.push(CountedObject::Contour {
                bbox: contour_bbox(points),
                area,
                circularity: None,
                contour: points.iter().map(|p| (p.x, p.y)).collect(),
            });
        }

        Ok(ObjectAnalysis {
            count: objects.len(),
            method: CountMethod::ColorDetection,
            objects,
        })
    }

    /// Draw detected objects and the total count onto the frame.
    pub fn draw_results(
        &self,
        annotator: &Annotator,
        image: &mut RgbImage,
        analysis: &ObjectAnalysis,
    ) {
        if analysis.count == 0 {
            return;
        }
        for object in &analysis.objects {
            match object {
                CountedObject::Contour { bbox, area, .. } => {
                    annotator.draw_rect_outline(image, bbox, GREEN, 2);
                    let label = format!("Area: {}", *area as i64);
                    annotator.draw_label(image, &label, bbox.x, bbox.y - 26, GREEN);
                }
                CountedObject::Blob { center, size, .. } => {
                    annotator.draw_circle_outline(
                        image,
                        center.x as i32,
                        center.y as i32,
                        (*size).max(1.0) as i32,
                        GREEN,
                        2,
                    );
                }
            }
        }
        let label = format!("Objects: {}", analysis.count);
        annotator.draw_label(image, &label, 10, 30, GREEN);
    }
}

fn in_band(hsv: (u8, u8, u8), lower: (u8, u8, u8), upper: (u8, u8, u8)) -> bool {
    hsv.0 >= lower.0
        && hsv.0 <= upper.0
        && hsv.1 >= lower.1
        && hsv.1 <= upper.1
        && hsv.2 >= lower.2
        && hsv.2 <= upper.2
}

/// Inverse adaptive threshold: a pixel turns white when it is darker than
/// its Gaussian-weighted neighbourhood mean by more than `c`.
fn adaptive_threshold_inv(gray: &GrayImage, sigma: f32, c: f32) -> GrayImage {
    let local_mean = gaussian_blur_f32(gray, sigma);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let src = gray.get_pixel(x, y).0[0] as f32;
        let mean = local_mean.get_pixel(x, y).0[0] as f32;
        Luma([if src <= mean - c { 255 } else { 0 }])
    })
}

/// Polygon area of a closed contour (shoelace formula).
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        sum += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    (sum.abs() as f64) / 2.0
}

/// Perimeter of a closed contour.
pub fn contour_perimeter(points: &[Point<i32>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        let (dx, dy) = ((q.x - p.x) as f64, (q.y - p.y) as f64);
        sum += (dx * dx + dy * dy).sqrt();
    }
    sum
}

/// `4*pi*area/perimeter^2`, or `None` for a degenerate boundary with zero
/// perimeter.
pub fn contour_circularity(points: &[Point<i32>]) -> Option<f64> {
    let perimeter = contour_perimeter(points);
    (perimeter > 0.0).then(|| 4.0 * PI * contour_area(points) / (perimeter * perimeter))
}

/// Mean of the boundary points.
pub fn contour_centroid(points: &[Point<i32>]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let n = points.len() as f64;
    let sx: i64 = points.iter().map(|p| p.x as i64).sum();
    let sy: i64 = points.iter().map(|p| p.y as i64).sum();
    (sx as f64 / n, sy as f64 / n)
}

/// Tight axis-aligned box around the contour.
pub fn contour_bbox(points: &[Point<i32>]) -> BoundingBox {
    let min_x = points.iter().map(|p| p.x).min().unwrap_or(0);
    let min_y = points.iter().map(|p| p.y).min().unwrap_or(0);
    let max_x = points.iter().map(|p| p.x).max().unwrap_or(0);
    let max_y = points.iter().map(|p| p.y).max().unwrap_or(0);
    BoundingBox::new(min_x, min_y, (max_x - min_x + 1).max(0) as u32, (max_y - min_y + 1).max(0) as u32)
}

/// Ratio of the minor to major axis of the boundary point cloud, in [0, 1].
/// An elongated contour scores near 0, a circle near 1.
pub fn inertia_ratio(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let (cx, cy) = contour_centroid(points);
    let (mut mu20, mut mu02, mut mu11) = (0.0f64, 0.0f64, 0.0f64);
    for p in points {
        let (dx, dy) = (p.x as f64 - cx, p.y as f64 - cy);
        mu20 += dx * dx;
        mu02 += dy * dy;
        mu11 += dx * dy;
    }
    let common = ((mu20 - mu02).powi(2) + 4.0 * mu11 * mu11).sqrt();
    let major = (mu20 + mu02 + common) / 2.0;
    if major <= 0.0 {
        return 0.0;
    }
    let minor = (mu20 + mu02 - common) / 2.0;
    (minor / major).clamp(0.0, 1.0)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

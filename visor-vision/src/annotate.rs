//! Drawing primitives for annotated result images
//!
//! All drawing happens on a caller-owned copy of the decoded frame; the
//! original is never modified. Coordinates are clamped so detections that
//! poke past the frame edge never panic the renderer.

use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_circle_mut, draw_hollow_rect_mut, draw_text_mut,
};
use imageproc::rect::Rect;
use visor_core::BoundingBox;

/// Annotation colour used across all overlays.
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);

const LABEL_FONT_SIZE: f32 = 20.0;
const LABEL_TEXT_HEIGHT: i32 = 24;
// Average glyph width at LABEL_FONT_SIZE, rough estimate.
const LABEL_CHAR_WIDTH: f32 = 11.0;
const LABEL_TEXT_VERTICAL_PADDING: i32 = 2;

/// Side length of the corner accents drawn on face boxes.
const CORNER_LENGTH: i32 = 16;

pub struct Annotator {
    font: FontRef<'static>,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new()
    }
}

impl Annotator {
    pub fn new() -> Self {
        let font_data = include_bytes!("../assets/DejaVuSans.ttf");
        let font = FontRef::try_from_slice(font_data).expect("embedded font is valid");
        Self { font }
    }

    /// Estimated pixel width of a label string.
    pub fn text_width(&self, text: &str) -> i32 {
        (text.len() as f32 * LABEL_CHAR_WIDTH) as i32
    }

    /// Draw text on a filled background at (x, y), clamped into the frame.
    pub fn draw_label(&self, image: &mut RgbImage, text: &str, x: i32, y: i32, color: Rgb<u8>) {
        let (w, h) = (image.width() as i32, image.height() as i32);
        let text_width = self.text_width(text);

        let label_x = x.clamp(0, (w - text_width).max(0));
        let label_y = y.clamp(0, (h - LABEL_TEXT_HEIGHT).max(0));
        let label_width = text_width.min(w - label_x).max(0) as u32;
        let label_height = (LABEL_TEXT_HEIGHT.min(h - label_y)).max(0) as u32;
        if label_width == 0 || label_height == 0 {
            return;
        }

        let rect = Rect::at(label_x, label_y).of_size(label_width, label_height);
        draw_filled_rect_mut(image, rect, color);
        draw_text_mut(
            image,
            Rgb([0, 0, 0]),
            label_x,
            label_y + LABEL_TEXT_VERTICAL_PADDING,
            PxScale::from(LABEL_FONT_SIZE),
            &self.font,
            text,
        );
    }

    /// Hollow rectangle with the given edge thickness, drawn inward.
    pub fn draw_rect_outline(
        &self,
        image: &mut RgbImage,
        bbox: &BoundingBox,
        color: Rgb<u8>,
        thickness: u32,
    ) {
        let clamped = bbox.clamped(image.width(), image.height());
        if clamped.is_empty() {
            return;
        }
        for inset in 0..thickness {
            let width = clamped.width.saturating_sub(2 * inset);
            let height = clamped.height.saturating_sub(2 * inset);
            if width == 0 || height == 0 {
                break;
            }
            let rect =
                Rect::at(clamped.x + inset as i32, clamped.y + inset as i32).of_size(width, height);
            draw_hollow_rect_mut(image, rect, color);
        }
    }

    /// Thin rectangle plus thick corner accents, the face-box style.
    pub fn draw_box_with_corners(
        &self,
        image: &mut RgbImage,
        bbox: &BoundingBox,
        color: Rgb<u8>,
        thickness: u32,
    ) {
        let clamped = bbox.clamped(image.width(), image.height());
        if clamped.is_empty() {
            return;
        }
        self.draw_rect_outline(image, &clamped, color, 1);

        let run = CORNER_LENGTH.min(clamped.width as i32).min(clamped.height as i32);
        let t = thickness.max(1);
        let (x0, y0) = (clamped.x, clamped.y);
        let (x1, y1) = (clamped.right() - 1, clamped.bottom() - 1);
        let arms = [
            // (corner x, corner y, horizontal arm x, vertical arm y)
            (x0, y0, x0, y0),
            (x1 - run + 1, y0, x1, y0),
            (x0, y1, x0, y1 - run + 1),
            (x1 - run + 1, y1, x1, y1 - run + 1),
        ];
        for (hx, hy, vx, vy) in arms {
            let horizontal = Rect::at(hx, hy - t as i32 / 2).of_size(run as u32, t);
            let vertical = Rect::at(vx - t as i32 / 2, vy).of_size(t, run as u32);
            self.draw_clipped_rect(image, horizontal, color);
            self.draw_clipped_rect(image, vertical, color);
        }
    }

    /// Hollow circle with the given stroke thickness.
    pub fn draw_circle_outline(
        &self,
        image: &mut RgbImage,
        cx: i32,
        cy: i32,
        radius: i32,
        color: Rgb<u8>,
        thickness: u32,
    ) {
        for ring in 0..thickness as i32 {
            let r = radius - ring;
            if r <= 0 {
                break;
            }
            draw_hollow_circle_mut(image, (cx, cy), r, color);
        }
    }

    fn draw_clipped_rect(&self, image: &mut RgbImage, rect: Rect, color: Rgb<u8>) {
        let frame = Rect::at(0, 0).of_size(image.width(), image.height());
        if let Some(clipped) = frame.intersect(rect) {
            draw_filled_rect_mut(image, clipped, color);
        }
    }
}

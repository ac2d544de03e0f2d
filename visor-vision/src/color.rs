//! Colour space conversions shared by the analyzers

use image::{GrayImage, Rgb, RgbImage};

/// Convert an RGB frame to 8-bit grayscale using BT.601 luma weights.
pub fn rgb_to_gray(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgb([r, g, b]) = *image.get_pixel(x, y);
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        image::Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}

/// Convert one RGB pixel to HSV with OpenCV's 8-bit scaling:
/// H in [0, 180), S and V in [0, 255].
pub fn rgb_pixel_to_hsv(pixel: Rgb<u8>) -> (u8, u8, u8) {
    let Rgb([r, g, b]) = pixel;
    let (r, g, b) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let value = max;
    let saturation = if max > 0.0 { delta / max } else { 0.0 };
    let hue_deg = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta) % 6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let hue_deg = if hue_deg < 0.0 { hue_deg + 360.0 } else { hue_deg };

    (
        (hue_deg / 2.0).round().min(179.0) as u8,
        (saturation * 255.0).round() as u8,
        (value * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_conversion_weights() {
        let mut img = RgbImage::new(3, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 0]));
        img.put_pixel(2, 0, Rgb([0, 0, 255]));
        let gray = rgb_to_gray(&img);
        assert_eq!(gray.get_pixel(0, 0).0[0], 76); // 0.299 * 255
        assert_eq!(gray.get_pixel(1, 0).0[0], 150); // 0.587 * 255
        assert_eq!(gray.get_pixel(2, 0).0[0], 29); // 0.114 * 255
    }

    #[test]
    fn test_gray_conversion_extremes() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([0, 0, 0]));
        img.put_pixel(1, 0, Rgb([255, 255, 255]));
        let gray = rgb_to_gray(&img);
        assert_eq!(gray.get_pixel(0, 0).0[0], 0);
        assert_eq!(gray.get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn test_hsv_primary_colors() {
        // Pure red: H=0, full saturation and value.
        assert_eq!(rgb_pixel_to_hsv(Rgb([255, 0, 0])), (0, 255, 255));
        // Pure green: 120 degrees -> 60 in OpenCV scaling.
        assert_eq!(rgb_pixel_to_hsv(Rgb([0, 255, 0])), (60, 255, 255));
        // Pure blue: 240 degrees -> 120.
        assert_eq!(rgb_pixel_to_hsv(Rgb([0, 0, 255])), (120, 255, 255));
    }

    #[test]
    fn test_hsv_achromatic() {
        let (_, s, v) = rgb_pixel_to_hsv(Rgb([128, 128, 128]));
        assert_eq!(s, 0);
        assert_eq!(v, 128);
        let (h, s, v) = rgb_pixel_to_hsv(Rgb([0, 0, 0]));
        assert_eq!((h, s, v), (0, 0, 0));
    }
}

use crate::error::LprError;
use crate::geometry::{Original, Rect, ResizeRatios};
use crate::pipeline::AcceptedPlate;
use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use std::path::Path;

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Fonts tried when none is configured
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Load the configured font, or the first system font found.
///
/// A configured font that cannot be read is an error. Finding no system font
/// is not: the overlay then carries boxes only.
pub fn load_font(path: Option<&Path>) -> Result<Option<FontVec>, LprError> {
    if let Some(path) = path {
        let bytes = std::fs::read(path).map_err(|e| LprError::io(path, e))?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| LprError::Config(format!("Invalid font {}: {}", path.display(), e)))?;
        return Ok(Some(font));
    }

    for candidate in SYSTEM_FONTS {
        let Ok(bytes) = std::fs::read(candidate) else {
            continue;
        };
        if let Ok(font) = FontVec::try_from_vec(bytes) {
            tracing::debug!(font = candidate, "using system font for overlays");
            return Ok(Some(font));
        }
    }

    tracing::warn!("No overlay font found; annotated images will carry boxes without text");
    Ok(None)
}

/// Draws accepted plates onto a copy of the source image
pub struct OverlayRenderer {
    font: Option<FontVec>,
}

impl OverlayRenderer {
    pub fn new(font: Option<FontVec>) -> Self {
        Self { font }
    }

    pub fn render(&self, original: &RgbImage, plates: &[AcceptedPlate], ratios: ResizeRatios) -> RgbImage {
        let mut annotated = original.clone();
        let thickness = (original.width() / 400).max(2);

        for plate in plates {
            let rect = ratios.to_original(&plate.position);
            draw_box(&mut annotated, rect, thickness);

            if let Some(font) = &self.font {
                let size = (rect.height as f32 * 0.6).max(24.0);
                let y = (rect.y - size as i32 - thickness as i32).max(0);
                draw_text_mut(
                    &mut annotated,
                    BOX_COLOR,
                    rect.x,
                    y,
                    PxScale::from(size),
                    font,
                    &plate.text,
                );
            }
        }

        annotated
    }
}

fn draw_box(canvas: &mut RgbImage, rect: Rect<Original>, thickness: u32) {
    for inset in 0..thickness {
        let grown: Rect<Original> = Rect::new(
            rect.x - inset as i32,
            rect.y - inset as i32,
            rect.width + 2 * inset,
            rect.height + 2 * inset,
        );
        draw_hollow_rect_mut(canvas, grown.to_imageproc(), BOX_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn plate() -> AcceptedPlate {
        AcceptedPlate {
            position: Rect::new(100, 100, 100, 25),
            original_position: Rect::new(200, 200, 200, 50),
            text: "KR 12345".to_string(),
            glyph_image: GrayImage::from_pixel(10, 10, Luma([255])),
        }
    }

    #[test]
    fn test_box_drawn_in_original_coordinates() {
        let original = RgbImage::from_pixel(800, 600, Rgb([10, 10, 10]));
        let ratios = ResizeRatios::between((800, 600), (400, 300));
        let renderer = OverlayRenderer::new(None);

        let annotated = renderer.render(&original, &[plate()], ratios);
        assert_eq!(annotated.get_pixel(200, 200), &BOX_COLOR);
        assert_eq!(annotated.get_pixel(399, 249), &BOX_COLOR);
        assert_eq!(annotated.get_pixel(300, 225), &Rgb([10, 10, 10]));
        // Source image is untouched
        assert_eq!(original.get_pixel(200, 200), &Rgb([10, 10, 10]));
    }

    #[test]
    fn test_no_plates_is_plain_copy() {
        let original = RgbImage::from_pixel(50, 40, Rgb([1, 2, 3]));
        let renderer = OverlayRenderer::new(None);
        let ratios = ResizeRatios::between((50, 40), (50, 40));
        assert_eq!(renderer.render(&original, &[], ratios), original);
    }

    #[test]
    fn test_unreadable_configured_font_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.ttf");
        assert!(load_font(Some(&missing)).is_err());

        let garbage = dir.path().join("garbage.ttf");
        std::fs::write(&garbage, b"not a font").unwrap();
        assert!(matches!(load_font(Some(&garbage)), Err(LprError::Config(_))));
    }
}

//! Pixel to normalized device coordinate conversion

use glam::Vec2;

/// Size of one pixel in NDC units: `(2 / width, 2 / height)`
#[inline]
pub fn ndc_scale(width: usize, height: usize) -> Vec2 {
    Vec2::new(2.0 / width as f32, 2.0 / height as f32)
}

/// Map a pixel position to NDC using a precomputed [`ndc_scale`].
/// Pixel (0, 0) maps to (-1, -1).
#[inline]
pub fn pixel_to_ndc(x: usize, y: usize, scale: Vec2) -> Vec2 {
    Vec2::new(x as f32 * scale.x - 1.0, y as f32 * scale.y - 1.0)
}

/// Inverse of [`pixel_to_ndc`], without rounding
#[inline]
pub fn ndc_to_pixel(ndc: Vec2, width: usize, height: usize) -> Vec2 {
    Vec2::new(
        (ndc.x + 1.0) * 0.5 * width as f32,
        (ndc.y + 1.0) * 0.5 * height as f32,
    )
}

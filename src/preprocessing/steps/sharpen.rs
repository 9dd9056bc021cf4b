use image::GrayImage;
use imageproc::filter::filter3x3;

/// 3x3 sharpening kernel
/// Center weight 9, all eight neighbors -1; sums to 1 so flat areas keep their level
pub const KERNEL: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 9.0, -1.0, -1.0, -1.0, -1.0];

/// Sharpen the lightness plane
/// Border pixels are replicated and results are clamped to 0..=255
pub fn apply(lightness: &GrayImage) -> GrayImage {
    filter3x3(lightness, &KERNEL)
}

use image::{GrayImage, Luma, RgbImage};
use imageproc::filter::gaussian_blur_f32;
use imageproc::map::map_colors;

use crate::config::SharpenConfig;

/// Unsharp mask in place with the stock parameters (sigma 3, weights 3 / -2)
pub fn sharpen(img: &mut RgbImage) {
    sharpen_with(img, &SharpenConfig::default());
}

/// Unsharp mask in place: each channel becomes
/// `saturate(original_weight * orig + blurred_weight * blur + offset)`.
pub fn sharpen_with(img: &mut RgbImage, cfg: &SharpenConfig) {
    if img.width() == 0 || img.height() == 0 {
        return;
    }
    let blurred = gaussian_blur_f32(&*img, cfg.sigma);
    for (dst, &b) in img.iter_mut().zip(blurred.iter()) {
        let v = cfg.original_weight * *dst as f32 + cfg.blurred_weight * b as f32 + cfg.offset;
        *dst = v.round().clamp(0.0, 255.0) as u8;
    }
}

/// Rec.601 luma (0.299 R + 0.587 G + 0.114 B), same dimensions as the input
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    map_colors(img, |p| {
        let [r, g, b] = p.0;
        let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([y.round().clamp(0.0, 255.0) as u8])
    })
}

/// Sharpen both images identically and return their grayscale versions
/// as `(object, scene)`
pub fn preprocess_pair(object: &mut RgbImage, scene: &mut RgbImage, cfg: &SharpenConfig) -> (GrayImage, GrayImage) {
    sharpen_with(object, cfg);
    sharpen_with(scene, cfg);
    (to_grayscale(object), to_grayscale(scene))
}

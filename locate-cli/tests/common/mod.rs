#![allow(dead_code)]

use image::{Rgb, RgbImage};
use rand::prelude::*;

/// Grey background covered with overlapping flat rectangles; plenty of
/// high-contrast corners and no repeated structure
pub fn textured_scene(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut img = RgbImage::from_pixel(width, height, Rgb([128, 128, 128]));
    let palette = [10u8, 50, 90, 170, 210, 250];
    let count = (width * height / 600).max(20);
    for _ in 0..count {
        let w = rng.gen_range(6..width / 5);
        let h = rng.gen_range(6..height / 5);
        let x0 = rng.gen_range(0..width - w);
        let y0 = rng.gen_range(0..height - h);
        let c = Rgb([
            palette[rng.gen_range(0..palette.len())],
            palette[rng.gen_range(0..palette.len())],
            palette[rng.gen_range(0..palette.len())],
        ]);
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.put_pixel(x, y, c);
            }
        }
    }
    img
}

pub fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(color))
}

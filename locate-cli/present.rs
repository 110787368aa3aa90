use std::io::BufRead;
use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut};
use locate_core::{BoxError, Keypoint, Match};
use locate_geometry::Point2;
use rand::prelude::*;

use crate::config::PresentConfig;

/// Inputs of the final visualization, borrowed from the run
#[derive(Debug, Clone, Copy)]
pub struct Presentation<'a> {
    pub object: &'a RgbImage,
    pub scene: &'a RgbImage,
    pub object_keypoints: &'a [Keypoint],
    pub scene_keypoints: &'a [Keypoint],
    pub good_matches: &'a [Match],
    pub scene_corners: &'a [Point2<f64>; 4],
}

/// Shows (or stores) a finished localization
pub trait Presenter {
    fn present(&mut self, view: &Presentation<'_>) -> Result<(), BoxError>;

    /// Block until the shown result is dismissed; runs after `present` was reported
    fn wait(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Liang-Barsky clip of a segment to `[-margin, size + margin]`; `None` when
/// nothing is left or an endpoint is not finite
fn clip_segment(a: (f32, f32), b: (f32, f32), width: u32, height: u32) -> Option<((f32, f32), (f32, f32))> {
    if ![a.0, a.1, b.0, b.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    const MARGIN: f32 = 8.0;
    let (xmin, ymin) = (-MARGIN, -MARGIN);
    let (xmax, ymax) = (width as f32 + MARGIN, height as f32 + MARGIN);
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);

    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;
    for (p, q) in [
        (-dx, a.0 - xmin),
        (dx, xmax - a.0),
        (-dy, a.1 - ymin),
        (dy, ymax - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some(((a.0 + t0 * dx, a.1 + t0 * dy), (a.0 + t1 * dx, a.1 + t1 * dy)))
}

fn draw_segment(canvas: &mut RgbImage, a: (f32, f32), b: (f32, f32), color: Rgb<u8>) {
    let (w, h) = canvas.dimensions();
    if let Some((a, b)) = clip_segment(a, b, w, h) {
        draw_line_segment_mut(canvas, a, b, color);
    }
}

/// Segment `thickness` pixels wide: parallel one-pixel lines plus round caps
fn draw_thick_segment(canvas: &mut RgbImage, a: (f32, f32), b: (f32, f32), thickness: u32, color: Rgb<u8>) {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = (dx * dx + dy * dy).sqrt();
    if !len.is_finite() {
        return;
    }
    let (nx, ny) = if len > 0.0 { (-dy / len, dx / len) } else { (0.0, 0.0) };
    let half = (thickness as f32 - 1.0) / 2.0;
    for k in 0..thickness {
        let off = k as f32 - half;
        draw_segment(
            canvas,
            (a.0 + nx * off, a.1 + ny * off),
            (b.0 + nx * off, b.1 + ny * off),
            color,
        );
    }

    let (w, h) = canvas.dimensions();
    let radius = (thickness / 2) as i32;
    for p in [a, b] {
        if radius > 0 && clip_segment(p, p, w, h).is_some() {
            draw_filled_circle_mut(canvas, (p.0.round() as i32, p.1.round() as i32), radius, color);
        }
    }
}

/// Object on the left, scene on the right, one random-coloured line per
/// match and the located outline drawn over the scene half.
///
/// `scene_corners` are in scene coordinates; they are shifted right by the
/// object width to land on the scene half of the canvas.
pub fn compose_matches(view: &Presentation<'_>, cfg: &PresentConfig) -> RgbImage {
    let (ow, oh) = view.object.dimensions();
    let (sw, sh) = view.scene.dimensions();
    let mut canvas = RgbImage::new(ow + sw, oh.max(sh));
    image::imageops::replace(&mut canvas, view.object, 0, 0);
    image::imageops::replace(&mut canvas, view.scene, ow as i64, 0);

    let shift = ow as f32;
    let mut rng = StdRng::seed_from_u64(cfg.color_seed);
    for m in view.good_matches {
        let (Some(o), Some(s)) = (
            view.object_keypoints.get(m.object_idx),
            view.scene_keypoints.get(m.scene_idx),
        ) else {
            log::warn!("skipping match {:?} with no keypoint", m);
            continue;
        };
        let color = Rgb([rng.r#gen(), rng.r#gen(), rng.r#gen()]);
        let a = (o.x, o.y);
        let b = (s.x + shift, s.y);
        draw_segment(&mut canvas, a, b, color);
        if cfg.keypoint_radius > 0 {
            for p in [a, b] {
                draw_hollow_circle_mut(&mut canvas, (p.0.round() as i32, p.1.round() as i32), cfg.keypoint_radius, color);
            }
        }
    }

    let outline = Rgb(cfg.outline_color);
    let corners: Vec<(f32, f32)> = view
        .scene_corners
        .iter()
        .map(|c| (c.x as f32 + shift, c.y as f32))
        .collect();
    for i in 0..corners.len() {
        let next = (i + 1) % corners.len();
        draw_thick_segment(&mut canvas, corners[i], corners[next], cfg.outline_thickness, outline);
    }

    canvas
}

/// Writes the composite to a file and optionally waits for Enter
#[derive(Debug, Clone)]
pub struct ImageFilePresenter {
    config: PresentConfig,
}

impl ImageFilePresenter {
    pub fn new(config: PresentConfig) -> Self {
        Self { config }
    }

    pub fn output(&self) -> &Path {
        &self.config.output
    }

    /// Consume one line from `input` when waiting is enabled
    fn wait_on<R: BufRead>(&self, mut input: R) -> std::io::Result<()> {
        if self.config.wait {
            eprintln!("press Enter to exit");
            let mut line = String::new();
            input.read_line(&mut line)?;
        }
        Ok(())
    }
}

impl Presenter for ImageFilePresenter {
    fn present(&mut self, view: &Presentation<'_>) -> Result<(), BoxError> {
        let canvas = compose_matches(view, &self.config);
        canvas.save(&self.config.output)?;
        log::info!(
            "wrote {}x{} composite to {}",
            canvas.width(),
            canvas.height(),
            self.config.output.display()
        );
        Ok(())
    }

    fn wait(&mut self) -> Result<(), BoxError> {
        self.wait_on(std::io::stdin().lock())?;
        Ok(())
    }
}

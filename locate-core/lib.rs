#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Boxed error used at the capability seams so back-ends can bring their own error types
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Borrowed row-major 8-bit grayscale image
#[derive(Debug, Clone, Copy)]
pub struct GrayView<'a> {
    pub data: &'a [u8],
    pub width: usize,
    pub height: usize,
}

impl<'a> GrayView<'a> {
    pub fn new(data: &'a [u8], width: usize, height: usize) -> Self {
        Self { data, width, height }
    }

    /// True when the buffer length matches `width * height`
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Sample with coordinates clamped to the image border
    #[inline]
    pub fn get_clamped(&self, x: i32, y: i32) -> u8 {
        let xx = x.clamp(0, self.width as i32 - 1) as usize;
        let yy = y.clamp(0, self.height as i32 - 1) as usize;
        self.data[yy * self.width + xx]
    }
}

/// Key-point ≙ corner + orientation (radians) with subpixel precision
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    /// Detector response, larger is more salient
    pub response: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, angle: 0.0, response: 0.0 }
    }
}

/// 256-bit binary descriptor = 32 bytes
pub type Descriptor = [u8; 32];

/// Number of bits in a [`Descriptor`]
pub const DESCRIPTOR_BITS: usize = 256;

/// Correspondence between one object keypoint and one scene keypoint.
///
/// `distance` is non-negative; smaller means more similar.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Match {
    pub object_idx: usize,
    pub scene_idx: usize,
    pub distance: f32,
}

/// Keypoint detection and description.
///
/// `describe` must return exactly one descriptor per keypoint, in keypoint order.
pub trait FeatureDetector {
    fn detect(&self, img: GrayView<'_>) -> Result<Vec<Keypoint>, BoxError>;

    fn describe(&self, img: GrayView<'_>, keypoints: &[Keypoint]) -> Result<Vec<Descriptor>, BoxError>;

    /// Detect keypoints and generate descriptors in one step
    fn detect_and_describe(&self, img: GrayView<'_>) -> Result<(Vec<Keypoint>, Vec<Descriptor>), BoxError> {
        let kps = self.detect(img)?;
        let desc = self.describe(img, &kps)?;
        Ok((kps, desc))
    }
}

/// Nearest-neighbour search from object descriptors into scene descriptors.
///
/// Implementations return one match per object descriptor (its best scene
/// neighbour) in object order, or nothing when either side is empty.
pub trait DescriptorMatcher {
    fn best_matches(&self, object: &[Descriptor], scene: &[Descriptor]) -> Vec<Match>;
}

/// Number of worker threads to use when none is configured
pub fn default_threads() -> usize {
    num_cpus::get().max(1)
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}

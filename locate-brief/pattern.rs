use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};

use locate_core::DESCRIPTOR_BITS;

/// One intensity comparison: bit is set when `I(p1) < I(p2)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestPair {
    pub x1: i8,
    pub y1: i8,
    pub x2: i8,
    pub y2: i8,
}

/// The 256 point-pair tests of a BRIEF descriptor.
///
/// Offsets are drawn from an isotropic Gaussian with sigma = patch / 5
/// (BRIEF "G II" sampling) and clipped to the patch. The same seed always
/// yields the same pattern, so descriptors from different images compare.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingPattern {
    pairs: Vec<TestPair>,
    patch_size: usize,
}

impl SamplingPattern {
    pub fn generate(patch_size: usize, seed: u64) -> Self {
        let half = (patch_size / 2) as f64;
        let mut rng = StdRng::seed_from_u64(seed);
        let sigma = patch_size as f64 / 5.0;
        let draw = |rng: &mut StdRng| {
            let z: f64 = StandardNormal.sample(rng);
            (z * sigma).round().clamp(-half, half) as i8
        };

        let mut pairs = Vec::with_capacity(DESCRIPTOR_BITS);
        while pairs.len() < DESCRIPTOR_BITS {
            let pair = TestPair {
                x1: draw(&mut rng),
                y1: draw(&mut rng),
                x2: draw(&mut rng),
                y2: draw(&mut rng),
            };
            // A pair comparing a point with itself carries no information
            if (pair.x1, pair.y1) != (pair.x2, pair.y2) {
                pairs.push(pair);
            }
        }

        Self { pairs, patch_size }
    }

    pub fn pairs(&self) -> &[TestPair] {
        &self.pairs
    }

    pub fn patch_size(&self) -> usize {
        self.patch_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_is_deterministic() {
        let a = SamplingPattern::generate(31, 7);
        let b = SamplingPattern::generate(31, 7);
        assert_eq!(a, b);
        assert_ne!(a, SamplingPattern::generate(31, 8));
    }

    #[test]
    fn test_pattern_stays_inside_patch() {
        let pattern = SamplingPattern::generate(15, 0);
        assert_eq!(pattern.pairs().len(), DESCRIPTOR_BITS);
        for p in pattern.pairs() {
            for v in [p.x1, p.y1, p.x2, p.y2] {
                assert!((-7..=7).contains(&v));
            }
            assert!((p.x1, p.y1) != (p.x2, p.y2));
        }
    }
}

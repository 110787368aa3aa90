use locate_core::{DESCRIPTOR_BITS, Descriptor, DescriptorMatcher, Match};
use rayon::prelude::*;

/// Number of differing bits between two descriptors
#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.chunks_exact(8)
        .zip(b.chunks_exact(8))
        .map(|(x, y)| {
            let mut xa = [0u8; 8];
            let mut ya = [0u8; 8];
            xa.copy_from_slice(x);
            ya.copy_from_slice(y);
            (u64::from_le_bytes(xa) ^ u64::from_le_bytes(ya)).count_ones()
        })
        .sum()
}

/// Hamming distance scaled to `[0, 1]` by the descriptor length
#[inline]
pub fn normalized_distance(a: &Descriptor, b: &Descriptor) -> f32 {
    hamming_distance(a, b) as f32 / DESCRIPTOR_BITS as f32
}

/// Exhaustive nearest-neighbour search in Hamming space.
///
/// Exact, so it satisfies any approximate-search contract; ties go to the
/// lowest scene index.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceMatcher;

impl BruteForceMatcher {
    pub fn new() -> Self {
        Self
    }

    fn nearest(query: &Descriptor, scene: &[Descriptor]) -> (usize, u32) {
        let mut best = (0usize, u32::MAX);
        for (j, candidate) in scene.iter().enumerate() {
            let d = hamming_distance(query, candidate);
            if d < best.1 {
                best = (j, d);
                if d == 0 {
                    break;
                }
            }
        }
        best
    }
}

impl DescriptorMatcher for BruteForceMatcher {
    fn best_matches(&self, object: &[Descriptor], scene: &[Descriptor]) -> Vec<Match> {
        if object.is_empty() || scene.is_empty() {
            return Vec::new();
        }

        object
            .par_iter()
            .enumerate()
            .map(|(i, query)| {
                let (scene_idx, bits) = Self::nearest(query, scene);
                Match {
                    object_idx: i,
                    scene_idx,
                    distance: bits as f32 / DESCRIPTOR_BITS as f32,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn desc(fill: u8) -> Descriptor {
        [fill; 32]
    }

    #[test]
    fn test_hamming_distance() {
        assert_eq!(hamming_distance(&desc(0), &desc(0)), 0);
        assert_eq!(hamming_distance(&desc(0), &desc(0xFF)), 256);
        assert_eq!(hamming_distance(&desc(0b1010_1010), &desc(0b0101_0101)), 256);
        let mut one_bit = desc(0);
        one_bit[17] = 0b0001_0000;
        assert_eq!(hamming_distance(&desc(0), &one_bit), 1);
        assert!((normalized_distance(&desc(0), &one_bit) - 1.0 / 256.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_one_match_per_object_descriptor() {
        let object = vec![desc(0), desc(0xFF), desc(0x0F)];
        let scene = vec![desc(0xFF), desc(0x0F), desc(0x01), desc(0)];
        let matches = BruteForceMatcher.best_matches(&object, &scene);
        assert_eq!(matches.len(), object.len());
        assert_eq!(matches[0].scene_idx, 3);
        assert_eq!(matches[1].scene_idx, 0);
        assert_eq!(matches[2].scene_idx, 1);
        for (i, m) in matches.iter().enumerate() {
            assert_eq!(m.object_idx, i);
            assert_eq!(m.distance, 0.0);
        }
    }

    #[test]
    fn test_ties_prefer_lowest_scene_index() {
        let object = vec![desc(0)];
        let scene = vec![desc(0x03), desc(0x0C), desc(0x30)];
        let matches = BruteForceMatcher.best_matches(&object, &scene);
        assert_eq!(matches[0].scene_idx, 0);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(BruteForceMatcher.best_matches(&[], &[desc(1)]).is_empty());
        assert!(BruteForceMatcher.best_matches(&[desc(1)], &[]).is_empty());
    }

    proptest! {
        #[test]
        fn prop_cardinality_and_distance_range(
            object in prop::collection::vec(prop::array::uniform32(any::<u8>()), 1..40),
            scene in prop::collection::vec(prop::array::uniform32(any::<u8>()), 1..40),
        ) {
            let matches = BruteForceMatcher.best_matches(&object, &scene);
            prop_assert_eq!(matches.len(), object.len());
            for (i, m) in matches.iter().enumerate() {
                prop_assert_eq!(m.object_idx, i);
                prop_assert!(m.scene_idx < scene.len());
                prop_assert!((0.0..=1.0).contains(&m.distance));
                let best = scene.iter().map(|s| hamming_distance(&object[i], s)).min().unwrap();
                prop_assert_eq!(hamming_distance(&object[i], &scene[m.scene_idx]), best);
            }
        }
    }
}

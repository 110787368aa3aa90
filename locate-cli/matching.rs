use locate_core::Match;

use crate::config::MatchFilterConfig;

/// Starting value of the running minimum, larger than any normalized distance
pub const MIN_DISTANCE_SENTINEL: f32 = 100.0;
/// Starting value of the running maximum
pub const MAX_DISTANCE_SENTINEL: f32 = 0.0;

/// Smallest and largest distance over all raw matches.
///
/// `max` is reported for diagnostics only; acceptance depends on `min` alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceRange {
    pub min: f32,
    pub max: f32,
}

impl Default for DistanceRange {
    fn default() -> Self {
        Self {
            min: MIN_DISTANCE_SENTINEL,
            max: MAX_DISTANCE_SENTINEL,
        }
    }
}

pub fn distance_range(matches: &[Match]) -> DistanceRange {
    matches.iter().fold(DistanceRange::default(), |r, m| DistanceRange {
        min: r.min.min(m.distance),
        max: r.max.max(m.distance),
    })
}

/// `distance <= max(2 * min_observed, floor)`
#[inline]
pub fn match_acceptance(distance: f32, min_observed: f32, floor: f32) -> bool {
    distance <= (2.0 * min_observed).max(floor)
}

/// Accepted matches together with the distance statistics they were judged by
#[derive(Debug, Clone, PartialEq)]
pub struct GoodMatches {
    pub matches: Vec<Match>,
    pub range: DistanceRange,
}

impl GoodMatches {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Scan `matches` in order, accepting by [`match_acceptance`] and stopping
/// as soon as more than `cfg.cap` are held, so at most `cap + 1` survive.
///
/// The scan order is the input order unless `rank_before_cap` is set, in
/// which case matches are stably sorted by distance first.
pub fn filter_good_matches(matches: &[Match], cfg: &MatchFilterConfig) -> GoodMatches {
    let range = distance_range(matches);

    let mut ordered: Vec<&Match> = matches.iter().collect();
    if cfg.rank_before_cap {
        ordered.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    }

    let mut accepted = Vec::with_capacity(cfg.cap + 1);
    for m in ordered {
        if accepted.len() > cfg.cap {
            break;
        }
        if match_acceptance(m.distance, range.min, cfg.distance_floor) {
            accepted.push(*m);
        }
    }

    log::debug!(
        "matches: {} raw, distance range [{:.4}, {:.4}], {} accepted",
        matches.len(),
        range.min,
        range.max,
        accepted.len()
    );

    GoodMatches {
        matches: accepted,
        range,
    }
}

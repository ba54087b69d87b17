//! Interval rarity statistics over the scale catalog
//!
//! Counts how many catalog scales use each interval and orders the distinct
//! intervals from rarest to most common. The position in that order is the
//! interval's rarity rank: root candidates built from high-ranked (common)
//! intervals are tried first by the key matcher.
//!
//! A reverse index maps each interval to the scales that contain it, in
//! catalog order.

use crate::interval::Interval;
use crate::scale::{ScaleCatalog, ScaleType};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Distinct intervals across `patterns`, rarest first
///
/// The unison is dropped. Ties in occurrence count are ordered by label so
/// the result is stable for a fixed catalog.
pub fn rank_intervals(patterns: &[ScaleType]) -> Vec<Interval> {
    let mut counts: HashMap<Interval, usize> = HashMap::new();
    for interval in patterns.iter().flat_map(|scale| scale.intervals()) {
        if interval.is_unison() {
            continue;
        }
        *counts.entry(*interval).or_insert(0) += 1;
    }

    let mut ranked: Vec<(Interval, usize)> = counts.into_iter().collect();
    ranked.sort_by(|(a, count_a), (b, count_b)| {
        count_a
            .cmp(count_b)
            .then_with(|| a.to_string().cmp(&b.to_string()))
    });
    ranked.into_iter().map(|(interval, _)| interval).collect()
}

/// Map each ranked interval to the scales in `patterns` containing it
pub fn rank_scales(
    ranked: &[Interval],
    patterns: &[ScaleType],
) -> HashMap<Interval, Vec<ScaleType>> {
    ranked
        .iter()
        .map(|interval| {
            let scales = patterns
                .iter()
                .copied()
                .filter(|scale| scale.contains(*interval))
                .collect();
            (*interval, scales)
        })
        .collect()
}

/// Immutable rarity ranking and reverse index for one catalog
#[derive(Debug, Clone)]
pub struct IntervalStatistics {
    ranked: Vec<Interval>,
    rank_of: HashMap<Interval, usize>,
    scales_by_interval: HashMap<Interval, Vec<ScaleType>>,
}

static SHARED: OnceLock<Arc<IntervalStatistics>> = OnceLock::new();

impl IntervalStatistics {
    /// Compute statistics for a catalog, leaving out the chromatic pattern
    pub fn build(catalog: &ScaleCatalog) -> Self {
        let patterns = catalog.ranked_scales();
        let ranked = rank_intervals(&patterns);
        let scales_by_interval = rank_scales(&ranked, &patterns);
        let rank_of = ranked
            .iter()
            .enumerate()
            .map(|(rank, interval)| (*interval, rank))
            .collect();

        tracing::debug!(
            "Interval statistics built: {} scales, {} distinct intervals",
            patterns.len(),
            ranked.len()
        );

        Self {
            ranked,
            rank_of,
            scales_by_interval,
        }
    }

    /// Statistics for the standard catalog, built on first use
    pub fn shared() -> Arc<IntervalStatistics> {
        SHARED
            .get_or_init(|| Arc::new(Self::build(&ScaleCatalog::standard())))
            .clone()
    }

    /// Distinct intervals, rarest first
    pub fn ranked(&self) -> &[Interval] {
        &self.ranked
    }

    /// Rarity rank of an interval (higher = more common), if it occurs at all
    pub fn rank(&self, interval: Interval) -> Option<usize> {
        self.rank_of.get(&interval).copied()
    }

    /// Scales containing the interval, in catalog order
    pub fn scales_containing(&self, interval: Interval) -> &[ScaleType] {
        self.scales_by_interval
            .get(&interval)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Default for IntervalStatistics {
    fn default() -> Self {
        Self::build(&ScaleCatalog::standard())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::join_intervals;

    fn iv(s: &str) -> Interval {
        s.parse().unwrap()
    }

    #[test]
    fn test_rank_intervals_order() {
        let ranked = rank_intervals(&ScaleCatalog::standard().ranked_scales());
        assert_eq!(
            join_intervals(&ranked),
            "4A 5d 2m 3M 6m 7M 6M 7m 3m 2M 4P 5P"
        );
    }

    #[test]
    fn test_rank_intervals_deterministic() {
        let patterns = ScaleCatalog::standard().ranked_scales();
        let first = rank_intervals(&patterns);
        for _ in 0..10 {
            assert_eq!(rank_intervals(&patterns), first);
        }
    }

    #[test]
    fn test_rank_intervals_drops_unison() {
        let ranked = rank_intervals(&[ScaleType::Major]);
        assert_eq!(ranked.len(), 6);
        assert!(!ranked.contains(&Interval::UNISON));
        // Equal counts fall back to label order
        assert_eq!(join_intervals(&ranked), "2M 3M 4P 5P 6M 7M");
    }

    #[test]
    fn test_rank_scales_catalog_order() {
        let patterns = ScaleCatalog::standard().ranked_scales();
        let ranked = rank_intervals(&patterns);
        let index = rank_scales(&ranked, &patterns);

        assert_eq!(index[&iv("4A")], vec![ScaleType::Lydian]);
        assert_eq!(
            index[&iv("5P")],
            vec![
                ScaleType::Lydian,
                ScaleType::Major,
                ScaleType::Mixolydian,
                ScaleType::Dorian,
                ScaleType::Minor,
                ScaleType::Phrygian,
                ScaleType::HarmonicMinor,
                ScaleType::MelodicMinor,
            ]
        );
    }

    #[test]
    fn test_chromatic_excluded() {
        let stats = IntervalStatistics::default();
        for interval in stats.ranked() {
            assert!(!stats
                .scales_containing(*interval)
                .contains(&ScaleType::Chromatic));
        }
    }

    #[test]
    fn test_rank_lookup() {
        let stats = IntervalStatistics::default();
        assert_eq!(stats.rank(iv("4A")), Some(0));
        assert_eq!(stats.rank(iv("5P")), Some(11));
        assert!(stats.rank(iv("5P")) > stats.rank(iv("4P")));
        assert_eq!(stats.rank(iv("2A")), None);
        assert!(stats.scales_containing(iv("2A")).is_empty());
    }

    #[test]
    fn test_shared_is_cached() {
        let a = IntervalStatistics::shared();
        let b = IntervalStatistics::shared();
        assert!(Arc::ptr_eq(&a, &b));
    }
}

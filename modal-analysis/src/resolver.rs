//! Relating matches to each other
//!
//! Helpers for narrowing a list of key matches: keep only the best-rated ones,
//! or find the candidates closest to a reference key (used to relate
//! consecutive segments).

use crate::matcher::MatchRanking;

/// Every ranking whose match ratio equals the highest in the list
///
/// Order is preserved, so applying this twice gives the same list.
pub fn filter_highest_matches(rankings: &[MatchRanking]) -> Vec<MatchRanking> {
    let Some(best) = rankings
        .iter()
        .map(|r| r.match_ratio)
        .reduce(f64::max)
    else {
        return Vec::new();
    };

    rankings
        .iter()
        .filter(|r| r.match_ratio == best)
        .cloned()
        .collect()
}

/// Candidates sharing the most with `reference`
///
/// Candidates are first narrowed to those sharing the most pitch classes with
/// the reference key, then to those sharing the most scale intervals.
pub fn find_closest_matches(
    reference: &MatchRanking,
    candidates: &[MatchRanking],
) -> Vec<MatchRanking> {
    let reference_pitches = reference.pitch_classes();
    let reference_intervals = reference.scale.intervals();

    let scored: Vec<(usize, usize, &MatchRanking)> = candidates
        .iter()
        .map(|candidate| {
            let shared_pitches = candidate
                .pitch_classes()
                .iter()
                .filter(|p| reference_pitches.iter().any(|r| r.is_enharmonic_to(p)))
                .count();
            let shared_intervals = candidate
                .scale
                .intervals()
                .iter()
                .filter(|i| reference_intervals.contains(i))
                .count();
            (shared_pitches, shared_intervals, candidate)
        })
        .collect();

    let Some(most_pitches) = scored.iter().map(|(p, _, _)| *p).max() else {
        return Vec::new();
    };
    let by_pitches: Vec<_> = scored
        .into_iter()
        .filter(|(p, _, _)| *p == most_pitches)
        .collect();

    let most_intervals = by_pitches.iter().map(|(_, i, _)| *i).max().unwrap_or(0);
    by_pitches
        .into_iter()
        .filter(|(_, i, _)| *i == most_intervals)
        .map(|(_, _, candidate)| candidate.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Interval;
    use crate::matcher::KeyMatcher;
    use crate::pitch::PitchClass;
    use crate::scale::ScaleType;

    fn ranking(root: &str, scale: ScaleType, match_ratio: f64) -> MatchRanking {
        MatchRanking {
            root: PitchClass::parse(root).unwrap(),
            scale,
            match_ratio,
            intervals: vec![Interval::UNISON],
        }
    }

    #[test]
    fn test_filter_highest_empty() {
        assert!(filter_highest_matches(&[]).is_empty());
    }

    #[test]
    fn test_filter_highest_keeps_ties_in_order() {
        let rankings = vec![
            ranking("D", ScaleType::Dorian, 0.75),
            ranking("A", ScaleType::Minor, 1.0),
            ranking("G", ScaleType::Mixolydian, 0.5),
            ranking("C", ScaleType::Major, 1.0),
        ];
        let best = filter_highest_matches(&rankings);
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].scale, ScaleType::Minor);
        assert_eq!(best[1].scale, ScaleType::Major);
    }

    #[test]
    fn test_filter_highest_idempotent() {
        let matcher = KeyMatcher::default();
        let rankings = matcher.find_matching_symbols(&["C", "E", "G#", "B"]).unwrap();
        let once = filter_highest_matches(&rankings);
        let twice = filter_highest_matches(&once);
        assert!(!once.is_empty());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_closest_prefers_shared_pitches() {
        let reference = ranking("C", ScaleType::Major, 1.0);
        let candidates = vec![
            ranking("Eb", ScaleType::Major, 1.0),
            ranking("G", ScaleType::Major, 1.0),
            ranking("F#", ScaleType::Major, 1.0),
        ];
        let closest = find_closest_matches(&reference, &candidates);
        assert_eq!(closest.len(), 1);
        assert_eq!(closest[0].root.to_string(), "G");
    }

    #[test]
    fn test_closest_breaks_ties_on_intervals() {
        // A Minor and D Dorian both use the white keys; only the D Dorian
        // pattern shares six intervals with G Mixolydian.
        let reference = ranking("G", ScaleType::Mixolydian, 1.0);
        let candidates = vec![
            ranking("A", ScaleType::Minor, 1.0),
            ranking("D", ScaleType::Dorian, 1.0),
        ];
        let closest = find_closest_matches(&reference, &candidates);
        assert_eq!(closest.len(), 1);
        assert_eq!(closest[0].scale, ScaleType::Dorian);
    }

    #[test]
    fn test_closest_returns_all_full_ties() {
        let reference = ranking("C", ScaleType::Major, 1.0);
        let candidates = vec![
            ranking("F", ScaleType::Major, 1.0),
            ranking("G", ScaleType::Major, 1.0),
        ];
        let closest = find_closest_matches(&reference, &candidates);
        assert_eq!(closest.len(), 2);
    }

    #[test]
    fn test_closest_empty_candidates() {
        let reference = ranking("C", ScaleType::Major, 1.0);
        assert!(find_closest_matches(&reference, &[]).is_empty());
    }
}

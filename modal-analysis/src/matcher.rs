//! Key matching for a set of pitch classes
//!
//! Finds every (root, scale) pairing that explains a set of notes:
//! 1. Put the notes in a canonical diatonic order
//! 2. Treat each note in turn as the root and measure intervals to the others
//! 3. Score each root by the rarity ranks of its intervals (common = higher)
//! 4. For each root, best score first, collect the catalog scales that contain
//!    its intervals and rate them by the fraction of intervals explained

use crate::interval::{join_intervals, Interval};
use crate::pitch::{ParseError, PitchClass, Spelling};
use crate::scale::ScaleType;
use crate::statistics::IntervalStatistics;
use std::cmp::Ordering;
use std::sync::Arc;

/// A candidate key for a set of notes
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRanking {
    /// Hypothesized tonal center
    pub root: PitchClass,
    /// Scale shape on that root
    pub scale: ScaleType,
    /// Fraction of the input intervals (root excluded) found in the scale (0.0 - 1.0)
    pub match_ratio: f64,
    /// The unison followed by the input intervals the scale contains
    pub intervals: Vec<Interval>,
}

impl MatchRanking {
    /// Display name of the scale (e.g. "Minor")
    pub fn type_name(&self) -> &'static str {
        self.scale.name()
    }

    /// The scale's interval pattern (e.g. "1P 2M 3m 4P 5P 6m 7m")
    pub fn scale_pattern(&self) -> String {
        self.scale.pattern()
    }

    /// The matched intervals as a pattern string (e.g. "1P 2M 6m 7m")
    pub fn interval_pattern(&self) -> String {
        join_intervals(&self.intervals)
    }

    /// Concrete pitch classes of the matched key
    pub fn pitch_classes(&self) -> Vec<PitchClass> {
        self.scale.pitch_classes(self.root)
    }
}

/// One note tried as the root, with its intervals and rarity score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootCandidate {
    pub root: PitchClass,
    /// Intervals from the root to every other note, in rotation order
    pub intervals: Vec<Option<Interval>>,
    /// Sum of the rarity ranks of the intervals
    pub score: usize,
}

impl RootCandidate {
    /// Label of the form "B 2M 6m 7m"
    pub fn label(&self) -> String {
        let mut parts = vec![self.root.to_string()];
        parts.extend(
            self.intervals
                .iter()
                .map(|i| i.map_or_else(|| "?".to_string(), |i| i.to_string())),
        );
        parts.join(" ")
    }

    fn defined_intervals(&self) -> impl Iterator<Item = Interval> + '_ {
        self.intervals.iter().flatten().copied()
    }
}

/// Ranks keys against a shared, immutable set of interval statistics
#[derive(Debug, Clone)]
pub struct KeyMatcher {
    statistics: Arc<IntervalStatistics>,
}

impl KeyMatcher {
    /// Create a matcher over the given statistics
    pub fn new(statistics: Arc<IntervalStatistics>) -> Self {
        Self { statistics }
    }

    /// The statistics this matcher ranks against
    pub fn statistics(&self) -> &IntervalStatistics {
        &self.statistics
    }

    /// Parse pitch symbols (octaves allowed, e.g. "A3") and match them
    pub fn find_matching_symbols<S: AsRef<str>>(
        &self,
        symbols: &[S],
    ) -> Result<Vec<MatchRanking>, ParseError> {
        let notes = symbols
            .iter()
            .map(|s| PitchClass::parse(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.find_matching_keys(&notes))
    }

    /// Every plausible (root, scale) pairing for the notes, best match first
    ///
    /// Fewer than two distinct pitch classes leave nothing to compare and
    /// produce an empty result.
    pub fn find_matching_keys(&self, notes: &[PitchClass]) -> Vec<MatchRanking> {
        let mut distinct: Vec<PitchClass> = Vec::with_capacity(notes.len());
        for note in notes {
            if !distinct.iter().any(|n| n.is_enharmonic_to(note)) {
                distinct.push(*note);
            }
        }
        if distinct.len() < 2 {
            return Vec::new();
        }

        let ordered = order_diatonically(&distinct);
        let candidates = self.root_candidates(&ordered);

        let mut rankings = Vec::new();
        for candidate in &candidates {
            let total = candidate.intervals.len();
            let scales = self.candidate_scales(candidate);
            tracing::trace!(
                "Root candidate '{}' (score {}): {} scales",
                candidate.label(),
                candidate.score,
                scales.len()
            );

            for scale in scales {
                let matched: Vec<Interval> = candidate
                    .defined_intervals()
                    .filter(|i| scale.contains(*i))
                    .collect();
                let match_ratio = matched.len() as f64 / total as f64;

                let mut intervals = Vec::with_capacity(matched.len() + 1);
                intervals.push(Interval::UNISON);
                intervals.extend(matched);

                rankings.push(MatchRanking {
                    root: candidate.root,
                    scale,
                    match_ratio,
                    intervals,
                });
            }
        }

        // Stable: equal ratios keep the higher-scored root first
        rankings.sort_by(|a, b| {
            b.match_ratio
                .partial_cmp(&a.match_ratio)
                .unwrap_or(Ordering::Equal)
        });
        rankings
    }

    /// Score every rotation of the ordered notes, best score first
    pub fn root_candidates(&self, ordered: &[PitchClass]) -> Vec<RootCandidate> {
        let mut candidates: Vec<RootCandidate> = (0..ordered.len())
            .map(|start| {
                let root = ordered[start];
                let intervals: Vec<Option<Interval>> = ordered[start + 1..]
                    .iter()
                    .chain(&ordered[..start])
                    .map(|note| Interval::between(root, *note))
                    .collect();
                let score = intervals
                    .iter()
                    .flatten()
                    .filter_map(|i| self.statistics.rank(*i))
                    .sum();
                RootCandidate {
                    root,
                    intervals,
                    score,
                }
            })
            .collect();

        candidates.sort_by(|a, b| b.score.cmp(&a.score));
        candidates
    }

    /// Scales sharing the largest consistent subset of a candidate's intervals
    ///
    /// Intervals are intersected from most to least common. An interval that
    /// would leave no scale standing is skipped, and so is one no scale uses.
    fn candidate_scales(&self, candidate: &RootCandidate) -> Vec<ScaleType> {
        let mut ranked: Vec<(usize, Interval)> = candidate
            .defined_intervals()
            .filter_map(|i| self.statistics.rank(i).map(|rank| (rank, i)))
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        let mut scales: Option<Vec<ScaleType>> = None;
        for (_, interval) in ranked {
            let containing = self.statistics.scales_containing(interval);
            let next: Vec<ScaleType> = match &scales {
                None => containing.to_vec(),
                Some(current) => current
                    .iter()
                    .copied()
                    .filter(|s| containing.contains(s))
                    .collect(),
            };
            if next.is_empty() {
                tracing::trace!("Interval {} conflicts with '{}'", interval, candidate.label());
            } else {
                scales = Some(next);
            }
        }
        scales.unwrap_or_default()
    }
}

impl Default for KeyMatcher {
    fn default() -> Self {
        Self::new(IntervalStatistics::shared())
    }
}

/// Canonical starting order for a note set
///
/// Notes are sorted by name, then rotated to start at the first of them found
/// walking down the chromatic scale from B, spelled with sharps or flats to
/// match the input (naturals only when it has neither).
pub fn order_diatonically(notes: &[PitchClass]) -> Vec<PitchClass> {
    let spelling = if notes.iter().any(|n| n.is_sharp()) {
        Some(Spelling::Sharps)
    } else if notes.iter().any(|n| n.is_flat()) {
        Some(Spelling::Flats)
    } else {
        None
    };

    let descending: Vec<PitchClass> = (0..12u8)
        .rev()
        .map(|chroma| PitchClass::from_chroma(chroma, spelling.unwrap_or(Spelling::Sharps)))
        .filter(|p| spelling.is_some() || p.is_natural())
        .collect();

    let mut sorted = notes.to_vec();
    sorted.sort_by_key(|n| n.to_string());

    let lead = descending
        .iter()
        .find_map(|canonical| sorted.iter().position(|n| n == canonical))
        .unwrap_or(0);
    sorted.rotate_left(lead);
    sorted
}

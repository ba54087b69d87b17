//! Scale catalog
//!
//! Every scale shape the analyzer knows about, as a closed set. The catalog
//! order is significant: it is the order in which matching scales are
//! reported for a root, so brighter modes are listed first.

use crate::interval::{join_intervals, Degree, Interval, Quality};
use crate::pitch::PitchClass;
use std::fmt;
use std::str::FromStr;

const P1: Interval = Interval::of(Degree::Unison, Quality::Perfect);
const M2: Interval = Interval::of(Degree::Second, Quality::Major);
const MIN2: Interval = Interval::of(Degree::Second, Quality::Minor);
const M3: Interval = Interval::of(Degree::Third, Quality::Major);
const MIN3: Interval = Interval::of(Degree::Third, Quality::Minor);
const P4: Interval = Interval::of(Degree::Fourth, Quality::Perfect);
const A4: Interval = Interval::of(Degree::Fourth, Quality::Augmented);
const D5: Interval = Interval::of(Degree::Fifth, Quality::Diminished);
const P5: Interval = Interval::of(Degree::Fifth, Quality::Perfect);
const M6: Interval = Interval::of(Degree::Sixth, Quality::Major);
const MIN6: Interval = Interval::of(Degree::Sixth, Quality::Minor);
const M7: Interval = Interval::of(Degree::Seventh, Quality::Major);
const MIN7: Interval = Interval::of(Degree::Seventh, Quality::Minor);

/// Named scale shape, independent of root
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScaleType {
    Lydian,
    Major,
    Mixolydian,
    Dorian,
    Minor,
    Phrygian,
    Locrian,
    HarmonicMinor,
    MelodicMinor,
    /// All twelve tones. Matches anything, so it never takes part in ranking.
    Chromatic,
}

impl ScaleType {
    /// Every scale type, in catalog order
    pub const ALL: [ScaleType; 10] = [
        ScaleType::Lydian,
        ScaleType::Major,
        ScaleType::Mixolydian,
        ScaleType::Dorian,
        ScaleType::Minor,
        ScaleType::Phrygian,
        ScaleType::Locrian,
        ScaleType::HarmonicMinor,
        ScaleType::MelodicMinor,
        ScaleType::Chromatic,
    ];

    /// Intervals from the root, starting with the unison
    pub fn intervals(&self) -> &'static [Interval] {
        use ScaleType::*;
        match self {
            Lydian => &[P1, M2, M3, A4, P5, M6, M7],
            Major => &[P1, M2, M3, P4, P5, M6, M7],
            Mixolydian => &[P1, M2, M3, P4, P5, M6, MIN7],
            Dorian => &[P1, M2, MIN3, P4, P5, M6, MIN7],
            Minor => &[P1, M2, MIN3, P4, P5, MIN6, MIN7],
            Phrygian => &[P1, MIN2, MIN3, P4, P5, MIN6, MIN7],
            Locrian => &[P1, MIN2, MIN3, P4, D5, MIN6, MIN7],
            HarmonicMinor => &[P1, M2, MIN3, P4, P5, MIN6, M7],
            MelodicMinor => &[P1, M2, MIN3, P4, P5, M6, M7],
            Chromatic => &[P1, MIN2, M2, MIN3, M3, P4, D5, P5, MIN6, M6, MIN7, M7],
        }
    }

    /// Display name (e.g. "Dorian")
    pub fn name(&self) -> &'static str {
        use ScaleType::*;
        match self {
            Lydian => "Lydian",
            Major => "Major",
            Mixolydian => "Mixolydian",
            Dorian => "Dorian",
            Minor => "Minor",
            Phrygian => "Phrygian",
            Locrian => "Locrian",
            HarmonicMinor => "Harmonic Minor",
            MelodicMinor => "Melodic Minor",
            Chromatic => "Chromatic",
        }
    }

    /// Space-joined interval pattern (e.g. "1P 2M 3m 4P 5P 6M 7m")
    pub fn pattern(&self) -> String {
        join_intervals(self.intervals())
    }

    /// Whether the pattern contains the interval
    pub fn contains(&self, interval: Interval) -> bool {
        self.intervals().contains(&interval)
    }

    /// Concrete pitch classes of this scale on a root
    ///
    /// Degrees that cannot be spelled from the root are left out.
    pub fn pitch_classes(&self, root: PitchClass) -> Vec<PitchClass> {
        self.intervals()
            .iter()
            .filter_map(|interval| root.transpose(*interval))
            .collect()
    }

    /// Find a scale type by its interval pattern
    pub fn from_pattern(pattern: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.pattern() == pattern.trim())
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ScaleType {
    type Err = String;

    /// Parse a display name, case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|scale| scale.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown scale type '{}'", s))
    }
}

/// Ordered collection of scale types the analyzer ranks against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleCatalog {
    scales: Vec<ScaleType>,
}

impl ScaleCatalog {
    /// Build a catalog from scale types in the given order
    pub fn new(scales: Vec<ScaleType>) -> Self {
        Self { scales }
    }

    /// The full catalog in its canonical order
    pub fn standard() -> Self {
        Self::new(ScaleType::ALL.to_vec())
    }

    /// All scale types, including the chromatic pattern
    pub fn scales(&self) -> &[ScaleType] {
        &self.scales
    }

    /// Scale types that take part in ranking (everything but chromatic)
    pub fn ranked_scales(&self) -> Vec<ScaleType> {
        self.scales
            .iter()
            .copied()
            .filter(|s| *s != ScaleType::Chromatic)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }
}

impl Default for ScaleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_start_at_unison() {
        for scale in ScaleType::ALL {
            assert_eq!(scale.intervals()[0], Interval::UNISON, "{}", scale);
        }
    }

    #[test]
    fn test_pattern_strings() {
        assert_eq!(ScaleType::Minor.pattern(), "1P 2M 3m 4P 5P 6m 7m");
        assert_eq!(ScaleType::Lydian.pattern(), "1P 2M 3M 4A 5P 6M 7M");
        assert_eq!(
            ScaleType::from_pattern("1P 2M 3m 4P 5P 6M 7m"),
            Some(ScaleType::Dorian)
        );
        assert_eq!(ScaleType::from_pattern("1P 3M 5P"), None);
    }

    #[test]
    fn test_parse_name() {
        assert_eq!("dorian".parse::<ScaleType>(), Ok(ScaleType::Dorian));
        assert_eq!(
            "Harmonic Minor".parse::<ScaleType>(),
            Ok(ScaleType::HarmonicMinor)
        );
        assert!("Bebop".parse::<ScaleType>().is_err());
    }

    #[test]
    fn test_pitch_classes() {
        let root = PitchClass::parse("D").unwrap();
        let notes: Vec<String> = ScaleType::Dorian
            .pitch_classes(root)
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(notes, vec!["D", "E", "F", "G", "A", "B", "C"]);

        let root = PitchClass::parse("F#").unwrap();
        let notes: Vec<String> = ScaleType::Lydian
            .pitch_classes(root)
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(notes, vec!["F#", "G#", "A#", "B#", "C#", "D#", "E#"]);
    }

    #[test]
    fn test_ranked_scales_exclude_chromatic() {
        let catalog = ScaleCatalog::standard();
        assert_eq!(catalog.len(), 10);
        let ranked = catalog.ranked_scales();
        assert_eq!(ranked.len(), 9);
        assert!(!ranked.contains(&ScaleType::Chromatic));
        assert_eq!(ranked[0], ScaleType::Lydian);
    }
}

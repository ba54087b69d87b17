//! Intervals measured upward from a root
//!
//! An interval is a diatonic degree plus a quality, written like "3m" or "4A".
//! Degrees come from letter distance and qualities from the semitone count,
//! so C->D# is "2A" while C->Eb is "3m".

use crate::pitch::PitchClass;
use std::fmt;
use std::str::FromStr;

/// Diatonic degree within one octave
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Degree {
    Unison,
    Second,
    Third,
    Fourth,
    Fifth,
    Sixth,
    Seventh,
}

impl Degree {
    /// Degree number (1-7)
    pub fn number(&self) -> u8 {
        use Degree::*;
        match self {
            Unison => 1,
            Second => 2,
            Third => 3,
            Fourth => 4,
            Fifth => 5,
            Sixth => 6,
            Seventh => 7,
        }
    }

    /// Degree for a number (1-7)
    pub fn from_number(number: u8) -> Option<Self> {
        use Degree::*;
        match number {
            1 => Some(Unison),
            2 => Some(Second),
            3 => Some(Third),
            4 => Some(Fourth),
            5 => Some(Fifth),
            6 => Some(Sixth),
            7 => Some(Seventh),
            _ => None,
        }
    }

    /// Unison, fourth and fifth take perfect qualities
    pub fn is_perfect(&self) -> bool {
        matches!(self, Degree::Unison | Degree::Fourth | Degree::Fifth)
    }

    /// Semitones of the perfect or major form of this degree
    fn reference_semitones(&self) -> i8 {
        use Degree::*;
        match self {
            Unison => 0,
            Second => 2,
            Third => 4,
            Fourth => 5,
            Fifth => 7,
            Sixth => 9,
            Seventh => 11,
        }
    }
}

/// Interval quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quality {
    DoublyDiminished,
    Diminished,
    Minor,
    Perfect,
    Major,
    Augmented,
    DoublyAugmented,
}

impl Quality {
    fn symbol(&self) -> &'static str {
        use Quality::*;
        match self {
            DoublyDiminished => "dd",
            Diminished => "d",
            Minor => "m",
            Perfect => "P",
            Major => "M",
            Augmented => "A",
            DoublyAugmented => "AA",
        }
    }

    fn from_symbol(s: &str) -> Option<Self> {
        use Quality::*;
        match s {
            "dd" => Some(DoublyDiminished),
            "d" => Some(Diminished),
            "m" => Some(Minor),
            "P" => Some(Perfect),
            "M" => Some(Major),
            "A" => Some(Augmented),
            "AA" => Some(DoublyAugmented),
            _ => None,
        }
    }
}

/// Labeled distance from a root, e.g. "5P" or "7m"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    degree: Degree,
    quality: Quality,
}

impl Interval {
    /// The unison "1P"
    pub const UNISON: Interval = Interval::of(Degree::Unison, Quality::Perfect);

    /// Unchecked constructor for static tables
    pub(crate) const fn of(degree: Degree, quality: Quality) -> Self {
        Self { degree, quality }
    }

    /// Create an interval, rejecting quality/degree mismatches (e.g. "3P", "5M")
    pub fn new(degree: Degree, quality: Quality) -> Option<Self> {
        let valid = match quality {
            Quality::Perfect => degree.is_perfect(),
            Quality::Major | Quality::Minor => !degree.is_perfect(),
            _ => true,
        };
        valid.then_some(Self { degree, quality })
    }

    /// Interval from `root` up to `note`
    ///
    /// Returns None when the spelling pair would need a quality beyond
    /// doubly augmented or doubly diminished.
    pub fn between(root: PitchClass, note: PitchClass) -> Option<Self> {
        let steps = (note.letter().step() + 7 - root.letter().step()) % 7;
        let degree = Degree::from_number(steps + 1)?;
        let semitones = (note.chroma() + 12 - root.chroma()) % 12;

        let mut diff = semitones as i8 - degree.reference_semitones();
        if diff > 6 {
            diff -= 12;
        } else if diff < -6 {
            diff += 12;
        }

        use Quality::*;
        let quality = if degree.is_perfect() {
            match diff {
                -2 => DoublyDiminished,
                -1 => Diminished,
                0 => Perfect,
                1 => Augmented,
                2 => DoublyAugmented,
                _ => return None,
            }
        } else {
            match diff {
                -3 => DoublyDiminished,
                -2 => Diminished,
                -1 => Minor,
                0 => Major,
                1 => Augmented,
                2 => DoublyAugmented,
                _ => return None,
            }
        };

        Some(Self { degree, quality })
    }

    pub fn degree(&self) -> Degree {
        self.degree
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn is_unison(&self) -> bool {
        self.degree == Degree::Unison
    }

    /// Size in semitones, reduced into a single octave (0-11)
    pub fn semitones(&self) -> u8 {
        use Quality::*;
        let adjust: i8 = if self.degree.is_perfect() {
            match self.quality {
                DoublyDiminished => -2,
                Diminished => -1,
                Augmented => 1,
                DoublyAugmented => 2,
                _ => 0,
            }
        } else {
            match self.quality {
                DoublyDiminished => -3,
                Diminished => -2,
                Minor => -1,
                Augmented => 1,
                DoublyAugmented => 2,
                _ => 0,
            }
        };
        (self.degree.reference_semitones() + adjust).rem_euclid(12) as u8
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.degree.number(), self.quality.symbol())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| format!("missing quality in interval '{}'", s))?;
        let (number, quality) = s.split_at(split);
        let degree = number
            .parse::<u8>()
            .ok()
            .and_then(Degree::from_number)
            .ok_or_else(|| format!("invalid degree in interval '{}'", s))?;
        let quality =
            Quality::from_symbol(quality).ok_or_else(|| format!("invalid quality in interval '{}'", s))?;
        Interval::new(degree, quality).ok_or_else(|| format!("invalid interval '{}'", s))
    }
}

/// Render intervals as a space-joined pattern string ("1P 2M 3m")
pub fn join_intervals(intervals: &[Interval]) -> String {
    intervals
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

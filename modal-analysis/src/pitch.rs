//! Pitch classes and their spellings
//!
//! A pitch class is a letter plus an accidental. Two spellings of the same
//! chromatic tone (e.g. C# and Db) are distinct values that share a chroma.

use crate::interval::Interval;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while parsing a pitch symbol
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty pitch symbol")]
    Empty,
    #[error("Invalid note letter: {0}")]
    InvalidLetter(char),
    #[error("Invalid accidental: {0}")]
    InvalidAccidental(String),
    #[error("Invalid octave: {0}")]
    InvalidOctave(String),
}

/// Natural note letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    /// All letters in ascending diatonic order starting from C
    pub const ALL: [Letter; 7] = [
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::A,
        Letter::B,
    ];

    /// Diatonic step index (0-6, where 0=C)
    pub fn step(&self) -> u8 {
        use Letter::*;
        match self {
            C => 0,
            D => 1,
            E => 2,
            F => 3,
            G => 4,
            A => 5,
            B => 6,
        }
    }

    /// Letter at the given diatonic step (wraps modulo 7)
    pub fn from_step(step: u8) -> Self {
        Self::ALL[(step % 7) as usize]
    }

    /// Chroma of the natural note (0-11, where 0=C)
    pub fn natural_chroma(&self) -> u8 {
        use Letter::*;
        match self {
            C => 0,
            D => 2,
            E => 4,
            F => 5,
            G => 7,
            A => 9,
            B => 11,
        }
    }

    fn from_char(c: char) -> Option<Self> {
        use Letter::*;
        match c.to_ascii_uppercase() {
            'C' => Some(C),
            'D' => Some(D),
            'E' => Some(E),
            'F' => Some(F),
            'G' => Some(G),
            'A' => Some(A),
            'B' => Some(B),
            _ => None,
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Letter::*;
        let s = match self {
            C => "C",
            D => "D",
            E => "E",
            F => "F",
            G => "G",
            A => "A",
            B => "B",
        };
        write!(f, "{}", s)
    }
}

/// Accidental applied to a letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Accidental {
    DoubleFlat,
    Flat,
    Natural,
    Sharp,
    DoubleSharp,
}

impl Accidental {
    /// Semitone offset from the natural letter
    pub fn offset(&self) -> i8 {
        use Accidental::*;
        match self {
            DoubleFlat => -2,
            Flat => -1,
            Natural => 0,
            Sharp => 1,
            DoubleSharp => 2,
        }
    }

    /// Accidental for a semitone offset, if one exists
    pub fn from_offset(offset: i8) -> Option<Self> {
        use Accidental::*;
        match offset {
            -2 => Some(DoubleFlat),
            -1 => Some(Flat),
            0 => Some(Natural),
            1 => Some(Sharp),
            2 => Some(DoubleSharp),
            _ => None,
        }
    }

    fn symbol(&self) -> &'static str {
        use Accidental::*;
        match self {
            DoubleFlat => "bb",
            Flat => "b",
            Natural => "",
            Sharp => "#",
            DoubleSharp => "##",
        }
    }
}

/// Which accidental family is used to name black keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Spelling {
    Sharps,
    Flats,
}

impl Spelling {
    /// Lowercase name used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            Spelling::Sharps => "sharps",
            Spelling::Flats => "flats",
        }
    }

    /// Parse from "sharps" / "flats" (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sharps" | "sharp" | "#" => Some(Spelling::Sharps),
            "flats" | "flat" | "b" => Some(Spelling::Flats),
            _ => None,
        }
    }
}

const SHARP_NAMES: [(Letter, Accidental); 12] = [
    (Letter::C, Accidental::Natural),
    (Letter::C, Accidental::Sharp),
    (Letter::D, Accidental::Natural),
    (Letter::D, Accidental::Sharp),
    (Letter::E, Accidental::Natural),
    (Letter::F, Accidental::Natural),
    (Letter::F, Accidental::Sharp),
    (Letter::G, Accidental::Natural),
    (Letter::G, Accidental::Sharp),
    (Letter::A, Accidental::Natural),
    (Letter::A, Accidental::Sharp),
    (Letter::B, Accidental::Natural),
];

const FLAT_NAMES: [(Letter, Accidental); 12] = [
    (Letter::C, Accidental::Natural),
    (Letter::D, Accidental::Flat),
    (Letter::D, Accidental::Natural),
    (Letter::E, Accidental::Flat),
    (Letter::E, Accidental::Natural),
    (Letter::F, Accidental::Natural),
    (Letter::G, Accidental::Flat),
    (Letter::G, Accidental::Natural),
    (Letter::A, Accidental::Flat),
    (Letter::A, Accidental::Natural),
    (Letter::B, Accidental::Flat),
    (Letter::B, Accidental::Natural),
];

/// One of the 12 chromatic pitch classes, with a concrete spelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PitchClass {
    letter: Letter,
    accidental: Accidental,
}

impl PitchClass {
    /// Create a pitch class from a letter and accidental
    pub const fn new(letter: Letter, accidental: Accidental) -> Self {
        Self { letter, accidental }
    }

    /// Natural pitch class for a letter
    pub const fn natural(letter: Letter) -> Self {
        Self::new(letter, Accidental::Natural)
    }

    /// Parse a pitch symbol such as "C#", "Bb" or "A3"
    ///
    /// A trailing octave number (optionally negative) is accepted and discarded.
    pub fn parse(symbol: &str) -> Result<Self, ParseError> {
        let symbol = symbol.trim();
        let mut chars = symbol.chars();
        let first = chars.next().ok_or(ParseError::Empty)?;
        let letter = Letter::from_char(first).ok_or(ParseError::InvalidLetter(first))?;

        let rest = chars.as_str();
        let split = rest
            .find(|c: char| c.is_ascii_digit() || c == '-')
            .unwrap_or(rest.len());
        let (accidental_part, octave_part) = rest.split_at(split);

        if !octave_part.is_empty() && octave_part.parse::<i32>().is_err() {
            return Err(ParseError::InvalidOctave(octave_part.to_string()));
        }

        let accidental = match accidental_part {
            "" => Accidental::Natural,
            "#" => Accidental::Sharp,
            "##" | "x" => Accidental::DoubleSharp,
            "b" => Accidental::Flat,
            "bb" => Accidental::DoubleFlat,
            other => return Err(ParseError::InvalidAccidental(other.to_string())),
        };

        Ok(Self::new(letter, accidental))
    }

    /// Spell a chroma (0-11) using the given accidental family
    pub fn from_chroma(chroma: u8, spelling: Spelling) -> Self {
        let table = match spelling {
            Spelling::Sharps => &SHARP_NAMES,
            Spelling::Flats => &FLAT_NAMES,
        };
        let (letter, accidental) = table[(chroma % 12) as usize];
        Self::new(letter, accidental)
    }

    /// Pitch class of a MIDI note number
    pub fn from_midi(midi: u8, spelling: Spelling) -> Self {
        Self::from_chroma(midi % 12, spelling)
    }

    /// The letter of this pitch class
    pub fn letter(&self) -> Letter {
        self.letter
    }

    /// The accidental of this pitch class
    pub fn accidental(&self) -> Accidental {
        self.accidental
    }

    /// Chroma (0-11, where 0=C)
    pub fn chroma(&self) -> u8 {
        (self.letter.natural_chroma() as i8 + self.accidental.offset()).rem_euclid(12) as u8
    }

    pub fn is_natural(&self) -> bool {
        self.accidental == Accidental::Natural
    }

    pub fn is_sharp(&self) -> bool {
        self.accidental.offset() > 0
    }

    pub fn is_flat(&self) -> bool {
        self.accidental.offset() < 0
    }

    /// The letter with its accidental stripped (e.g. C# -> C)
    pub fn natural_letter(&self) -> Letter {
        self.letter
    }

    /// Alternate spelling of the same chroma
    ///
    /// Sharp-side spellings map into the flat table and flat-side spellings
    /// into the sharp table, so C# <-> Db, E# -> F, Cb -> B. Naturals are
    /// their own alternate.
    pub fn enharmonic(&self) -> Self {
        if self.is_sharp() {
            Self::from_chroma(self.chroma(), Spelling::Flats)
        } else if self.is_flat() {
            Self::from_chroma(self.chroma(), Spelling::Sharps)
        } else {
            *self
        }
    }

    /// Whether both spellings name the same chromatic tone
    pub fn is_enharmonic_to(&self, other: &PitchClass) -> bool {
        self.chroma() == other.chroma()
    }

    /// Rewrite into sharp-or-natural or flat-or-natural form
    pub fn respell(&self, spelling: Spelling) -> Self {
        match spelling {
            Spelling::Sharps if self.is_flat() => self.enharmonic(),
            Spelling::Flats if self.is_sharp() => self.enharmonic(),
            _ => *self,
        }
    }

    /// Transpose up by an interval, keeping the letter arithmetic
    ///
    /// Returns None when the result would need more than two accidentals.
    pub fn transpose(&self, interval: Interval) -> Option<Self> {
        let letter = Letter::from_step(self.letter.step() + interval.degree().number() - 1);
        let target = (self.chroma() + interval.semitones()) % 12;
        let mut offset = target as i8 - letter.natural_chroma() as i8;
        if offset > 6 {
            offset -= 12;
        } else if offset < -6 {
            offset += 12;
        }
        Accidental::from_offset(offset).map(|accidental| Self::new(letter, accidental))
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter, self.accidental.symbol())
    }
}

impl FromStr for PitchClass {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::{Degree, Quality};

    fn pc(s: &str) -> PitchClass {
        PitchClass::parse(s).unwrap()
    }

    #[test]
    fn test_parse_strips_octave() {
        assert_eq!(pc("A3"), pc("A"));
        assert_eq!(pc("C#3"), PitchClass::new(Letter::C, Accidental::Sharp));
        assert_eq!(pc("Bb-1"), PitchClass::new(Letter::B, Accidental::Flat));
        assert_eq!(pc("f##"), PitchClass::new(Letter::F, Accidental::DoubleSharp));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(PitchClass::parse(""), Err(ParseError::Empty));
        assert_eq!(PitchClass::parse("H"), Err(ParseError::InvalidLetter('H')));
        assert!(matches!(
            PitchClass::parse("C#b"),
            Err(ParseError::InvalidAccidental(_))
        ));
        assert!(matches!(
            PitchClass::parse("C4-"),
            Err(ParseError::InvalidOctave(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(pc("C#").to_string(), "C#");
        assert_eq!(pc("Ebb").to_string(), "Ebb");
        assert_eq!(pc("g4").to_string(), "G");
    }

    #[test]
    fn test_chroma() {
        assert_eq!(pc("C").chroma(), 0);
        assert_eq!(pc("B#").chroma(), 0);
        assert_eq!(pc("Cb").chroma(), 11);
        assert_eq!(pc("F##").chroma(), 7);
    }

    #[test]
    fn test_from_midi() {
        assert_eq!(PitchClass::from_midi(61, Spelling::Sharps), pc("C#"));
        assert_eq!(PitchClass::from_midi(61, Spelling::Flats), pc("Db"));
        assert_eq!(PitchClass::from_midi(69, Spelling::Flats), pc("A"));
    }

    #[test]
    fn test_enharmonic_pairs() {
        assert_eq!(pc("C#").enharmonic(), pc("Db"));
        assert_eq!(pc("Db").enharmonic(), pc("C#"));
        assert_eq!(pc("E#").enharmonic(), pc("F"));
        assert_eq!(pc("Cb").enharmonic(), pc("B"));
        assert_eq!(pc("G").enharmonic(), pc("G"));
        assert!(pc("A#").is_enharmonic_to(&pc("Bb")));
        assert!(!pc("A#").is_enharmonic_to(&pc("B")));
    }

    #[test]
    fn test_respell() {
        assert_eq!(pc("Gb").respell(Spelling::Sharps), pc("F#"));
        assert_eq!(pc("Fb").respell(Spelling::Sharps), pc("E"));
        assert_eq!(pc("G#").respell(Spelling::Flats), pc("Ab"));
        assert_eq!(pc("G#").respell(Spelling::Sharps), pc("G#"));
        assert_eq!(pc("D").respell(Spelling::Flats), pc("D"));
    }

    #[test]
    fn test_transpose() {
        let fifth = Interval::new(Degree::Fifth, Quality::Perfect).unwrap();
        let minor_third = Interval::new(Degree::Third, Quality::Minor).unwrap();
        let aug_fourth = Interval::new(Degree::Fourth, Quality::Augmented).unwrap();
        assert_eq!(pc("F#").transpose(fifth), Some(pc("C#")));
        assert_eq!(pc("B").transpose(minor_third), Some(pc("D")));
        assert_eq!(pc("F#").transpose(aug_fourth), Some(pc("B#")));
        assert_eq!(pc("B#").transpose(aug_fourth), Some(pc("E##")));
        assert_eq!(pc("B##").transpose(aug_fourth), None);
    }

    #[test]
    fn test_spelling_parse() {
        assert_eq!(Spelling::parse("Sharps"), Some(Spelling::Sharps));
        assert_eq!(Spelling::parse(" flats "), Some(Spelling::Flats));
        assert_eq!(Spelling::parse("mixed"), None);
        assert_eq!(Spelling::parse(Spelling::Flats.as_str()), Some(Spelling::Flats));
    }
}

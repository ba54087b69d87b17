//! Key analysis module for Modal
//!
//! Ranks which keys and modes best explain a set of pitches, and splits a
//! time-ordered note stream into consecutive windows that each hold a single
//! best-fit key.

mod interval;
mod matcher;
mod pitch;
mod resolver;
mod scale;
mod segmenter;
mod statistics;

pub use interval::{join_intervals, Degree, Interval, Quality};
pub use matcher::{order_diatonically, KeyMatcher, MatchRanking, RootCandidate};
pub use pitch::{Accidental, Letter, ParseError, PitchClass, Spelling};
pub use resolver::{filter_highest_matches, find_closest_matches};
pub use scale::{ScaleCatalog, ScaleType};
pub use segmenter::{
    resolve_accidentals, AnalysisSegment, NoteEvent, Segmenter, SegmenterConfig, SegmenterError,
};
pub use statistics::{rank_intervals, rank_scales, IntervalStatistics};

//! Key segmentation of a note stream
//!
//! Walks a time-ordered list of note events once, growing a segment until a
//! note makes the best key match worse, then starts the next segment at that
//! note.
//!
//! # Algorithm
//!
//! 1. Skip notes whose pitch class is already in the open segment
//! 2. Add the note; once the segment has enough notes, settle its spelling
//!    (sharps or flats) and match keys against it
//! 3. If the spelling flipped, take the new best ratio as the reference
//! 4. If the best ratio dropped, close the segment before this note and open
//!    a new one seeded with it
//! 5. After the last note, fold single-note tails into the segment before
//!    them and compute the final matches for every segment

use crate::matcher::{KeyMatcher, MatchRanking};
use crate::pitch::{Letter, PitchClass, Spelling};
use crate::resolver::filter_highest_matches;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur when building a segmenter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmenterError {
    #[error("No note events to analyze")]
    EmptyInput,
}

/// A note onset in a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteEvent {
    /// MIDI note number
    pub midi: u8,
    /// Onset tick
    pub time: u64,
    /// Tick at which the following event begins
    pub next: u64,
}

impl NoteEvent {
    pub fn new(midi: u8, time: u64, next: u64) -> Self {
        Self { midi, time, next }
    }
}

/// A time window assigned its best-fitting keys
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisSegment {
    /// First tick of the window
    pub start: u64,
    /// Tick where the window ends (the next segment's start)
    pub end: u64,
    /// Distinct pitch classes in arrival order
    pub notes: Vec<PitchClass>,
    /// Events that contributed a note, parallel to `notes`
    pub events: Vec<NoteEvent>,
    /// Best key matches for `notes` (all tied at the highest ratio)
    pub matches: Vec<MatchRanking>,
}

impl AnalysisSegment {
    fn seeded(note: PitchClass, event: NoteEvent) -> Self {
        Self {
            start: event.time,
            end: event.time,
            notes: vec![note],
            events: vec![event],
            matches: Vec::new(),
        }
    }

    fn contains_pitch(&self, note: &PitchClass) -> bool {
        self.notes.iter().any(|n| n.is_enharmonic_to(note))
    }

    /// Length of the window in ticks
    pub fn duration(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// The top match, if any
    pub fn best_match(&self) -> Option<&MatchRanking> {
        self.matches.first()
    }
}

/// Tuning for the segmenter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmenterConfig {
    /// Notes a segment needs before its key is scored (at least 2)
    pub min_scoring_notes: usize,
    /// Spelling used to name MIDI pitches while a segment's spelling is unknown
    pub default_spelling: Spelling,
    /// Fold single-note segments into the segment before them when done
    pub merge_single_note_tails: bool,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_scoring_notes: 3,
            default_spelling: Spelling::Flats,
            merge_single_note_tails: true,
        }
    }
}

/// Settle a segment's spelling from the letters it would use
///
/// Builds a sharp-or-natural and a flat-or-natural version of the notes and
/// keeps whichever uses more distinct letters. On a tie the notes and the
/// current spelling are left alone, so the outcome can depend on the order in
/// which notes arrived.
pub fn resolve_accidentals(
    notes: &mut Vec<PitchClass>,
    current: Option<Spelling>,
) -> Option<Spelling> {
    let sharps: Vec<PitchClass> = notes.iter().map(|n| n.respell(Spelling::Sharps)).collect();
    let flats: Vec<PitchClass> = notes.iter().map(|n| n.respell(Spelling::Flats)).collect();

    let sharp_letters = distinct_letters(&sharps);
    let flat_letters = distinct_letters(&flats);

    if sharp_letters > flat_letters {
        *notes = sharps;
        Some(Spelling::Sharps)
    } else if flat_letters > sharp_letters {
        *notes = flats;
        Some(Spelling::Flats)
    } else {
        current
    }
}

fn distinct_letters(notes: &[PitchClass]) -> usize {
    notes
        .iter()
        .map(|n| n.natural_letter())
        .collect::<HashSet<Letter>>()
        .len()
}

/// Mutable state while walking the event list
struct SegmentBuilder<'a> {
    matcher: &'a KeyMatcher,
    config: &'a SegmenterConfig,
    closed: Vec<AnalysisSegment>,
    open: AnalysisSegment,
    score: f64,
    spelling: Option<Spelling>,
}

impl<'a> SegmentBuilder<'a> {
    fn new(matcher: &'a KeyMatcher, config: &'a SegmenterConfig, start: u64) -> Self {
        Self {
            matcher,
            config,
            closed: Vec::new(),
            open: AnalysisSegment {
                start,
                end: start,
                ..Default::default()
            },
            score: 0.0,
            spelling: None,
        }
    }

    fn min_notes(&self) -> usize {
        self.config.min_scoring_notes.max(2)
    }

    fn push(&mut self, event: NoteEvent) {
        let note = PitchClass::from_midi(
            event.midi,
            self.spelling.unwrap_or(self.config.default_spelling),
        );
        if self.open.contains_pitch(&note) {
            tracing::trace!("t={} {} already in segment, skipped", event.time, note);
            return;
        }

        let previous = self.spelling;
        self.open.notes.push(note);
        self.open.events.push(event);

        if self.open.notes.len() < self.min_notes() {
            return;
        }
        self.spelling = resolve_accidentals(&mut self.open.notes, self.spelling);

        let matches = filter_highest_matches(&self.matcher.find_matching_keys(&self.open.notes));
        let Some(best) = matches.first() else {
            return;
        };
        let new_score = best.match_ratio;

        if self.spelling != previous {
            tracing::trace!(
                "t={} spelling now {:?}, score re-anchored at {:.3}",
                event.time,
                self.spelling,
                new_score
            );
            self.score = new_score;
        } else if new_score < self.score {
            self.close_at(note, event, previous);
        } else {
            self.score = new_score;
        }
    }

    /// Close the open segment just before `event`, which seeds the next one
    fn close_at(&mut self, note: PitchClass, event: NoteEvent, spelling: Option<Spelling>) {
        self.open.end = event.time;
        self.open.notes.pop();
        self.open.events.pop();
        resolve_accidentals(&mut self.open.notes, spelling);

        tracing::debug!(
            "Segment boundary at t={}: {} notes in [{}, {}), score was {:.3}",
            event.time,
            self.open.notes.len(),
            self.open.start,
            self.open.end,
            self.score
        );

        let closed = std::mem::replace(&mut self.open, AnalysisSegment::seeded(note, event));
        self.closed.push(closed);
        self.spelling = None;
        self.score = 0.0;
    }

    fn finish(mut self, last: NoteEvent) -> Vec<AnalysisSegment> {
        self.open.end = last.next;
        let mut segments = self.closed;
        segments.push(self.open);

        let mut merged: Vec<AnalysisSegment> = Vec::with_capacity(segments.len());
        for segment in segments {
            match merged.last_mut() {
                Some(previous)
                    if self.config.merge_single_note_tails && segment.notes.len() == 1 =>
                {
                    tracing::debug!(
                        "Merging single-note segment at t={} into previous",
                        segment.start
                    );
                    absorb(previous, segment);
                }
                _ => merged.push(segment),
            }
        }

        for segment in &mut merged {
            segment.matches =
                filter_highest_matches(&self.matcher.find_matching_keys(&segment.notes));
        }
        merged
    }
}

/// Fold a single-note tail into the segment before it
///
/// The previous segment keeps all of its own notes and events, so its start
/// is unchanged; only the end moves out to cover the tail.
fn absorb(previous: &mut AnalysisSegment, tail: AnalysisSegment) {
    for (note, event) in tail.notes.into_iter().zip(tail.events) {
        if !previous.contains_pitch(&note) {
            previous.notes.push(note);
            previous.events.push(event);
        }
    }
    previous.end = previous.end.max(tail.end);
}

/// Key segmentation of a complete, time-ordered event list
#[derive(Debug, Clone)]
pub struct Segmenter {
    segments: Vec<AnalysisSegment>,
}

impl Segmenter {
    /// Segment events with the default configuration and shared statistics
    pub fn new(events: &[NoteEvent]) -> Result<Self, SegmenterError> {
        Self::with_config(events, &SegmenterConfig::default(), &KeyMatcher::default())
    }

    /// Segment events with an explicit configuration and matcher
    pub fn with_config(
        events: &[NoteEvent],
        config: &SegmenterConfig,
        matcher: &KeyMatcher,
    ) -> Result<Self, SegmenterError> {
        let (first, last) = match (events.first(), events.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(SegmenterError::EmptyInput),
        };

        if events.windows(2).any(|pair| pair[1].time < pair[0].time) {
            tracing::warn!("Note events are not sorted by onset; segments may overlap");
        }

        let mut builder = SegmentBuilder::new(matcher, config, first.time);
        for event in events {
            builder.push(*event);
        }
        let segments = builder.finish(last);

        tracing::debug!(
            "Segmented {} events into {} segments",
            events.len(),
            segments.len()
        );
        Ok(Self { segments })
    }

    /// The segments, in time order
    pub fn analysis(&self) -> &[AnalysisSegment] {
        &self.segments
    }

    /// Best matches per segment, parallel to `analysis()`
    pub fn matches(&self) -> Vec<&[MatchRanking]> {
        self.segments.iter().map(|s| s.matches.as_slice()).collect()
    }

    pub fn into_segments(self) -> Vec<AnalysisSegment> {
        self.segments
    }
}

//! SQLite cache for segmented note streams
//!
//! Stores the segments found for a named stream together with a fingerprint of
//! its events, so an unchanged stream is not segmented twice.

use modal_analysis::{AnalysisSegment, NoteEvent, PitchClass, ScaleType, SegmenterConfig};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored segment with its top key match
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSegment {
    /// First tick of the window
    pub start: u64,
    /// Tick where the window ends
    pub end: u64,
    /// Pitch classes in the segment, as spelled by the segmenter
    pub notes: Vec<PitchClass>,
    /// Root of the best match (None if the segment was never scored)
    pub root: Option<PitchClass>,
    /// Scale type of the best match
    pub scale: Option<ScaleType>,
    /// Match ratio of the best match (0.0-1.0)
    pub match_ratio: Option<f64>,
}

impl CachedSegment {
    /// Human-readable key, e.g. "D Dorian"
    pub fn key_label(&self) -> Option<String> {
        match (self.root, self.scale) {
            (Some(root), Some(scale)) => Some(format!("{} {}", root, scale)),
            _ => None,
        }
    }
}

impl From<&AnalysisSegment> for CachedSegment {
    fn from(segment: &AnalysisSegment) -> Self {
        let best = segment.best_match();
        Self {
            start: segment.start,
            end: segment.end,
            notes: segment.notes.clone(),
            root: best.map(|m| m.root),
            scale: best.map(|m| m.scale),
            match_ratio: best.map(|m| m.match_ratio),
        }
    }
}

/// SHA-256 of an event list and the settings it is segmented with, as hex
///
/// Any change to an event or to the config gives a different fingerprint.
/// Fields are fed in a fixed little-endian layout, so the value is stable
/// across builds and stored fingerprints stay valid.
pub fn fingerprint(events: &[NoteEvent], config: &SegmenterConfig) -> String {
    let mut hasher = Sha256::new();
    for event in events {
        hasher.update([event.midi]);
        hasher.update(event.time.to_le_bytes());
        hasher.update(event.next.to_le_bytes());
    }
    hasher.update((config.min_scoring_notes as u64).to_le_bytes());
    hasher.update(config.default_spelling.as_str().as_bytes());
    hasher.update([config.merge_single_note_tails as u8]);
    format!("{:x}", hasher.finalize())
}

/// Segment cache backed by SQLite
pub struct SegmentCache {
    conn: Connection,
}

impl SegmentCache {
    /// SQL schema for the streams and segments tables
    const SCHEMA: &'static str = r#"
        CREATE TABLE IF NOT EXISTS streams (
            id INTEGER PRIMARY KEY,
            name TEXT UNIQUE NOT NULL,
            fingerprint TEXT NOT NULL,
            event_count INTEGER NOT NULL,
            analyzed_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS segments (
            stream_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            start_tick INTEGER NOT NULL,
            end_tick INTEGER NOT NULL,
            notes TEXT NOT NULL,
            root TEXT,
            scale TEXT,
            match_ratio REAL,
            PRIMARY KEY (stream_id, position)
        );
        CREATE INDEX IF NOT EXISTS idx_stream_name ON streams(name);
        CREATE INDEX IF NOT EXISTS idx_segment_key ON segments(root, scale);
    "#;

    /// Open or create a cache database at the given path
    pub fn open(db_path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch(Self::SCHEMA)?;
        tracing::debug!("Opened segment cache at {}", db_path.display());
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(Self::SCHEMA)?;
        Ok(Self { conn })
    }

    /// Get cached segments if the stream hasn't changed
    ///
    /// Returns None if the stream is not cached or its fingerprint differs.
    pub fn get(&self, name: &str, fingerprint: &str) -> Option<Vec<CachedSegment>> {
        let stream_id: i64 = self
            .conn
            .query_row(
                "SELECT id FROM streams WHERE name = ?1 AND fingerprint = ?2",
                params![name, fingerprint],
                |row| row.get(0),
            )
            .optional()
            .ok()
            .flatten()?;

        self.segments_of(stream_id).ok()
    }

    /// Store the segments of a stream
    ///
    /// Replaces anything previously stored under the same name.
    pub fn store(
        &self,
        name: &str,
        fingerprint: &str,
        event_count: usize,
        segments: &[AnalysisSegment],
    ) -> Result<(), CacheError> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM segments WHERE stream_id IN (SELECT id FROM streams WHERE name = ?1)",
            [name],
        )?;
        tx.execute(
            r#"INSERT OR REPLACE INTO streams (name, fingerprint, event_count, analyzed_at)
               VALUES (?1, ?2, ?3, ?4)"#,
            params![name, fingerprint, event_count, now],
        )?;
        let stream_id = tx.last_insert_rowid();

        for (position, segment) in segments.iter().enumerate() {
            let cached = CachedSegment::from(segment);
            tx.execute(
                r#"INSERT INTO segments
                   (stream_id, position, start_tick, end_tick, notes, root, scale, match_ratio)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
                params![
                    stream_id,
                    position,
                    cached.start,
                    cached.end,
                    join_notes(&cached.notes),
                    cached.root.map(|r| r.to_string()),
                    cached.scale.map(|s| s.name()),
                    cached.match_ratio,
                ],
            )?;
        }

        tx.commit()?;
        tracing::debug!("Cached {} segments for '{}'", segments.len(), name);
        Ok(())
    }

    /// Names of streams with at least one segment whose best match is this key
    ///
    /// Roots compare by spelling, so "D#" and "Eb" are different keys here.
    pub fn streams_in_key(
        &self,
        root: PitchClass,
        scale: ScaleType,
    ) -> Result<Vec<String>, CacheError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT s.name
             FROM streams s
             JOIN segments g ON g.stream_id = s.id
             WHERE g.root = ?1 AND g.scale = ?2
             ORDER BY s.name ASC",
        )?;

        let names = stmt
            .query_map(params![root.to_string(), scale.name()], |row| row.get(0))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(names)
    }

    /// Get the number of cached streams
    pub fn count(&self) -> Result<usize, CacheError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM streams", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Remove a stream and its segments from the cache
    pub fn remove(&self, name: &str) -> Result<bool, CacheError> {
        self.conn.execute(
            "DELETE FROM segments WHERE stream_id IN (SELECT id FROM streams WHERE name = ?1)",
            [name],
        )?;
        let affected = self
            .conn
            .execute("DELETE FROM streams WHERE name = ?1", [name])?;
        Ok(affected > 0)
    }

    /// Clear all cached data
    pub fn clear(&self) -> Result<(), CacheError> {
        self.conn.execute_batch("DELETE FROM segments; DELETE FROM streams;")?;
        Ok(())
    }

    fn segments_of(&self, stream_id: i64) -> Result<Vec<CachedSegment>, CacheError> {
        let mut stmt = self.conn.prepare(
            "SELECT start_tick, end_tick, notes, root, scale, match_ratio
             FROM segments
             WHERE stream_id = ?1
             ORDER BY position ASC",
        )?;

        let segments = stmt
            .query_map([stream_id], |row| {
                let notes: String = row.get(2)?;
                let root: Option<String> = row.get(3)?;
                let scale: Option<String> = row.get(4)?;
                Ok(CachedSegment {
                    start: row.get(0)?,
                    end: row.get(1)?,
                    notes: split_notes(&notes),
                    root: root.and_then(|r| PitchClass::parse(&r).ok()),
                    scale: scale.and_then(|s| s.parse().ok()),
                    match_ratio: row.get(5)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(segments)
    }
}

fn join_notes(notes: &[PitchClass]) -> String {
    notes
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn split_notes(notes: &str) -> Vec<PitchClass> {
    notes
        .split_whitespace()
        .filter_map(|n| PitchClass::parse(n).ok())
        .collect()
}

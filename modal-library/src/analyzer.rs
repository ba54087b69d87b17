//! Cached stream analysis
//!
//! Segments a named note stream, reusing stored segments when the stream and
//! the segmenter settings are unchanged.

use crate::cache::{fingerprint, CacheError, CachedSegment, SegmentCache};
use crate::config::Config;
use modal_analysis::{KeyMatcher, NoteEvent, Segmenter, SegmenterConfig, SegmenterError};
use thiserror::Error;

/// Errors that can occur while analyzing a stream
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Segmentation failed: {0}")]
    Segmenter(#[from] SegmenterError),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Result of analyzing one stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamAnalysis {
    pub segments: Vec<CachedSegment>,
    /// True if the segments came from the cache
    pub from_cache: bool,
}

/// Segments streams through a cache
pub struct StreamAnalyzer {
    cache: SegmentCache,
    matcher: KeyMatcher,
    config: SegmenterConfig,
}

impl StreamAnalyzer {
    pub fn new(cache: SegmentCache, config: SegmenterConfig) -> Self {
        Self {
            cache,
            matcher: KeyMatcher::default(),
            config,
        }
    }

    /// Open the cache named by `config` and use its segmenter settings
    pub fn open(config: &Config) -> Result<Self, CacheError> {
        let cache = SegmentCache::open(&config.cache_db_path())?;
        Ok(Self::new(cache, config.segmenter.clone()))
    }

    /// Replace the key matcher
    pub fn with_matcher(mut self, matcher: KeyMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn cache(&self) -> &SegmentCache {
        &self.cache
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Segment a stream, or return its cached segments if nothing changed
    pub fn analyze(
        &self,
        name: &str,
        events: &[NoteEvent],
    ) -> Result<StreamAnalysis, AnalyzeError> {
        let print = fingerprint(events, &self.config);

        if let Some(segments) = self.cache.get(name, &print) {
            tracing::debug!("Cache hit for '{}' ({} segments)", name, segments.len());
            return Ok(StreamAnalysis {
                segments,
                from_cache: true,
            });
        }

        tracing::debug!("Cache miss for '{}', segmenting {} events", name, events.len());
        let segmenter = Segmenter::with_config(events, &self.config, &self.matcher)?;
        let analysis = segmenter.analysis();

        if let Err(e) = self.cache.store(name, &print, events.len(), analysis) {
            tracing::warn!("Failed to cache segments for '{}': {}", name, e);
        }

        Ok(StreamAnalysis {
            segments: analysis.iter().map(CachedSegment::from).collect(),
            from_cache: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modal_analysis::{PitchClass, ScaleType, Spelling};

    const D_DORIAN: [u8; 7] = [62, 64, 65, 67, 69, 71, 72];
    const EB_DORIAN: [u8; 7] = [63, 65, 66, 68, 70, 72, 73];

    fn events(midis: &[u8], start: u64) -> Vec<NoteEvent> {
        midis
            .iter()
            .enumerate()
            .map(|(i, &midi)| {
                let time = start + i as u64 * 10;
                NoteEvent::new(midi, time, time + 10)
            })
            .collect()
    }

    fn analyzer(config: SegmenterConfig) -> StreamAnalyzer {
        StreamAnalyzer::new(SegmentCache::in_memory().unwrap(), config)
    }

    #[test]
    fn test_analyze_then_hit() {
        let analyzer = analyzer(SegmenterConfig::default());
        let mut input = events(&D_DORIAN, 0);
        input.extend(events(&EB_DORIAN, 70));

        let first = analyzer.analyze("etude", &input).unwrap();
        assert!(!first.from_cache);
        assert_eq!(first.segments.len(), 2);
        assert_eq!(first.segments[0].scale, Some(ScaleType::Dorian));
        assert_eq!(first.segments[1].root, Some(PitchClass::parse("Eb").unwrap()));

        let second = analyzer.analyze("etude", &input).unwrap();
        assert!(second.from_cache);
        assert_eq!(second.segments, first.segments);
        assert_eq!(analyzer.cache().count().unwrap(), 1);
    }

    #[test]
    fn test_changed_stream_is_reanalyzed() {
        let analyzer = analyzer(SegmenterConfig::default());
        analyzer.analyze("etude", &events(&D_DORIAN, 0)).unwrap();

        let edited = events(&EB_DORIAN, 0);
        let result = analyzer.analyze("etude", &edited).unwrap();
        assert!(!result.from_cache);
        assert_eq!(result.segments[0].root, Some(PitchClass::parse("Eb").unwrap()));
        assert_eq!(analyzer.cache().count().unwrap(), 1);
    }

    #[test]
    fn test_config_spelling_applies() {
        let config = SegmenterConfig {
            default_spelling: Spelling::Sharps,
            ..Default::default()
        };
        let analyzer = analyzer(config);
        // D# F G A# settles on sharps and merges the trailing A# back in
        let input = events(&[63, 65, 67, 70], 0);

        let result = analyzer.analyze("riff", &input).unwrap();
        assert_eq!(result.segments.len(), 1);
        let names: Vec<String> = result.segments[0].notes.iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["D#", "F", "G", "A#"]);
    }

    #[test]
    fn test_empty_stream_fails() {
        let analyzer = analyzer(SegmenterConfig::default());
        let err = analyzer.analyze("silence", &[]).unwrap_err();
        assert!(matches!(err, AnalyzeError::Segmenter(SegmenterError::EmptyInput)));
        assert_eq!(analyzer.cache().count().unwrap(), 0);
    }
}

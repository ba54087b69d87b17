//! Segment library for Modal - configuration and caching

mod analyzer;
mod cache;
mod config;

pub use analyzer::{AnalyzeError, StreamAnalysis, StreamAnalyzer};
pub use cache::{fingerprint, CacheError, CachedSegment, SegmentCache};
pub use config::Config;

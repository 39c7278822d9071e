//! Content segmentation: topic boundaries, text chunks, and video segments.
//!
//! This crate provides:
//! - [`boundary`]: embedding-similarity topic-shift detection
//! - [`chunking`]: propositions → boundary-delimited text [`Chunk`]s
//! - [`video`]: transcript units → duration-bounded [`VideoSegment`]s
//!
//! [`Chunk`]: feedforge_shared::Chunk
//! [`VideoSegment`]: feedforge_shared::VideoSegment

pub mod boundary;
pub mod chunking;
pub mod video;

#[cfg(test)]
pub(crate) mod testing;

pub use boundary::{BoundaryDetection, BoundaryDetector, BoundaryStats, cosine_similarity};
pub use chunking::{ChunkingPipeline, build_chunks, normalize_boundaries};
pub use video::VideoSegmenter;

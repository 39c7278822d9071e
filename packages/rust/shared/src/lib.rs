//! Shared types, error model, and configuration for FeedForge.
//!
//! This crate is the foundation depended on by all other FeedForge crates.
//! It provides:
//! - [`FeedForgeError`] and [`ErrorCode`], the unified error taxonomy
//! - Domain types ([`Chunk`], [`VideoSegment`], [`TranscriptUnit`], [`Concept`])
//! - Configuration ([`AppConfig`], runtime configs, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BoundaryConfig, BoundarySection, EmbeddingSection, FeedConfig, FeedSection,
    LlmSection, VideoSection, VideoSegmenterConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, resolve_api_key,
};
pub use error::{ErrorCode, FeedForgeError, Result};
pub use types::{
    AssessmentSpec, Chunk, Concept, QuestionType, SampleQuestion, TranscriptUnit, VideoSegment,
};

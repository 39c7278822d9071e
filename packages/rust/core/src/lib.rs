//! Core pipeline orchestration for FeedForge.
//!
//! This crate ties together segmentation and feed assembly into one
//! end-to-end workflow ([`pipeline::FeedPipeline::build`]).

pub mod pipeline;

pub use pipeline::{
    FeedBuildResult, FeedPipeline, FeedRequest, ProgressReporter, SilentProgress, SourceContent,
};

//! Feed assembly for FeedForge.
//!
//! Turns segmented content (video segments or text chunks) into a paced feed
//! that interleaves content with quizzes, facts, and synthesis checkpoints.
//!
//! - [`plan`]: the pattern-driven planner state machine
//! - [`assembler`]: renders planned items, static or performance-adaptive
//! - [`pretest`]: prerequisite diagnostics prepended to the feed
//! - [`splice`]: mini-lesson and sandbox insertion into an existing feed

pub mod assembler;
pub mod content;
pub mod item;
pub mod plan;
pub mod pretest;
pub mod quiz;
pub mod splice;
pub mod synthesis;

pub use assembler::FeedAssembler;
pub use content::{ContentSource, ContentUnit};
pub use item::{FeedItem, ItemPrefix, Recommendation, item_id};
pub use pretest::{Prerequisite, PrerequisiteData, PretestQuestion};
pub use splice::{MiniLesson, SandboxExercise, insert_mini_lessons, insert_sandbox_exercises};
pub use synthesis::{SynthesisConcept, SynthesisPhaseGenerator};

//! External provider seams: embeddings, text generation, and proposition
//! decomposition.
//!
//! The pipeline treats every provider as an opaque text-in / vector-or-text-out
//! service behind an async trait. This crate provides those traits plus
//! OpenAI-compatible HTTP clients:
//! - [`EmbeddingProvider`] / [`OpenAiEmbeddings`]
//! - [`TextGenerator`] / [`ChatCompletions`]
//! - [`Decomposer`] / [`LlmDecomposer`], which splits oversized prose before
//!   asking the LLM for atomic propositions

pub mod decomposer;
pub mod embedding;
pub mod llm;

mod http;

pub use decomposer::{Decomposer, LlmDecomposer, split_for_decomposition};
pub use embedding::{EmbeddingProvider, IndexedEmbedding, OpenAiEmbeddings};
pub use llm::{ChatCompletions, TextGenerator};

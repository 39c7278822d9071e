//! In-crate test doubles for the embedding provider.

use std::sync::Mutex;

use async_trait::async_trait;

use feedforge_providers::{EmbeddingProvider, IndexedEmbedding};
use feedforge_shared::{FeedForgeError, Result};

/// Embeds a text as the one-hot vector of the topic named by its first word.
pub(crate) struct TopicEmbedder {
    reverse: bool,
    fail: bool,
    batches: Mutex<Vec<usize>>,
}

impl TopicEmbedder {
    pub(crate) fn new() -> Self {
        Self {
            reverse: false,
            fail: false,
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Answers each batch in reverse order, like a provider that reorders.
    pub(crate) fn reversed() -> Self {
        Self {
            reverse: true,
            ..Self::new()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Sizes of the batches requested so far.
    pub(crate) fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }
}

fn topic_vector(text: &str) -> Vec<f32> {
    let topic = text.split_whitespace().next().unwrap_or_default();
    match topic.to_lowercase().as_str() {
        "ocean" => vec![1.0, 0.0, 0.0, 0.0],
        "volcano" => vec![0.0, 1.0, 0.0, 0.0],
        "forest" => vec![0.0, 0.0, 1.0, 0.0],
        "desert" => vec![0.0, 0.0, 0.0, 1.0],
        _ => vec![0.5, 0.5, 0.5, 0.5],
    }
}

#[async_trait]
impl EmbeddingProvider for TopicEmbedder {
    fn model(&self) -> &str {
        "topic-test"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<IndexedEmbedding>> {
        self.batches.lock().unwrap().push(texts.len());
        if self.fail {
            return Err(FeedForgeError::Provider("HTTP 503: unavailable".into()));
        }

        let mut out: Vec<IndexedEmbedding> = texts
            .iter()
            .enumerate()
            .map(|(index, text)| IndexedEmbedding {
                index,
                vector: topic_vector(text),
            })
            .collect();
        if self.reverse {
            out.reverse();
        }
        Ok(out)
    }
}

pub(crate) fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

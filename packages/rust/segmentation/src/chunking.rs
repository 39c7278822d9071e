//! Article chunking: prose → propositions → boundary-delimited chunks.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use feedforge_providers::{Decomposer, LlmDecomposer, OpenAiEmbeddings};
use feedforge_shared::{AppConfig, BoundaryConfig, Chunk, FeedForgeError, Result};

use crate::boundary::BoundaryDetector;

/// Orchestrates proposition decomposition and boundary detection.
#[derive(Clone)]
pub struct ChunkingPipeline {
    decomposer: Arc<dyn Decomposer>,
    detector: BoundaryDetector,
}

impl ChunkingPipeline {
    pub fn new(decomposer: Arc<dyn Decomposer>, detector: BoundaryDetector) -> Self {
        Self {
            decomposer,
            detector,
        }
    }

    /// Build the pipeline over the configured HTTP providers.
    ///
    /// Missing API keys surface here, not on the first call.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        let decomposer = LlmDecomposer::from_config(&config.llm)?;
        let embeddings = OpenAiEmbeddings::from_config(&config.embedding)?;
        let detector = BoundaryDetector::new(Arc::new(embeddings), BoundaryConfig::from(config));
        Ok(Self::new(Arc::new(decomposer), detector))
    }

    /// Split `raw_text` into topic-coherent chunks of propositions.
    ///
    /// Blank input yields no chunks and makes no provider calls.
    #[instrument(skip_all, fields(chars = raw_text.len()))]
    pub async fn chunk_text(&self, raw_text: &str) -> Result<Vec<Chunk>> {
        if raw_text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let propositions = self
            .decomposer
            .decompose(raw_text)
            .await
            .map_err(FeedForgeError::decomposition_failed)?;

        if propositions.len() < 2 {
            debug!(
                propositions = propositions.len(),
                "skipping boundary detection"
            );
            return Ok(build_chunks(&propositions, &[]));
        }

        let detection = self
            .detector
            .detect(&propositions)
            .await
            .map_err(FeedForgeError::boundary_detection_failed)?;

        let chunks = build_chunks(&propositions, &detection.boundaries);
        info!(
            propositions = propositions.len(),
            chunks = chunks.len(),
            "chunking complete"
        );
        Ok(chunks)
    }
}

/// Keep boundaries inside `(0, n)`, sorted and deduplicated.
pub fn normalize_boundaries(raw: &[usize], n: usize) -> Vec<usize> {
    let mut boundaries: Vec<usize> = raw.iter().copied().filter(|&b| b > 0 && b < n).collect();
    boundaries.sort_unstable();
    boundaries.dedup();
    boundaries
}

/// Materialize one chunk per span between consecutive cut points
/// `[0, ..boundaries, n]`.
///
/// Always returns at least one chunk, even for an empty proposition list.
pub fn build_chunks(propositions: &[String], boundaries: &[usize]) -> Vec<Chunk> {
    let n = propositions.len();
    let mut cuts = Vec::with_capacity(boundaries.len() + 2);
    cuts.push(0);
    cuts.extend(normalize_boundaries(boundaries, n));
    cuts.push(n);

    cuts.windows(2)
        .enumerate()
        .map(|(id, w)| {
            let slice = propositions[w[0]..w[1]].to_vec();
            Chunk {
                id,
                text: slice.join(" "),
                propositions: slice,
                start_index: w[0],
                end_index: w[1],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::testing::{TopicEmbedder, texts};
    use feedforge_shared::ErrorCode;

    struct FixedDecomposer {
        result: Mutex<Option<Result<Vec<String>>>>,
        calls: Mutex<usize>,
    }

    impl FixedDecomposer {
        fn new(result: Result<Vec<String>>) -> Self {
            Self {
                result: Mutex::new(Some(result)),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Decomposer for FixedDecomposer {
        async fn decompose(&self, _text: &str) -> Result<Vec<String>> {
            *self.calls.lock().unwrap() += 1;
            self.result
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn pipeline(
        decomposer: Arc<FixedDecomposer>,
        embedder: Arc<TopicEmbedder>,
    ) -> ChunkingPipeline {
        ChunkingPipeline::new(
            decomposer,
            BoundaryDetector::new(embedder, BoundaryConfig::default()),
        )
    }

    #[test]
    fn normalize_drops_invalid_and_duplicates() {
        assert_eq!(normalize_boundaries(&[4, 0, 2, 2, 7, 5], 5), vec![2, 4]);
        assert!(normalize_boundaries(&[0, 5], 5).is_empty());
    }

    #[test]
    fn build_chunks_partitions_propositions() {
        let props = texts(&["a.", "b.", "c.", "d.", "e."]);
        let chunks = build_chunks(&props, &[3, 1, 3]);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].propositions, texts(&["a."]));
        assert_eq!(chunks[1].text, "b. c.");
        assert_eq!((chunks[2].start_index, chunks[2].end_index), (3, 5));
        assert_eq!(chunks.iter().map(|c| c.id).collect::<Vec<_>>(), vec![0, 1, 2]);

        let rebuilt: Vec<String> = chunks.iter().flat_map(|c| c.propositions.clone()).collect();
        assert_eq!(rebuilt, props);
    }

    #[test]
    fn build_chunks_for_empty_input_is_one_empty_chunk() {
        let chunks = build_chunks(&[], &[]);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].text.is_empty());
        assert_eq!((chunks[0].start_index, chunks[0].end_index), (0, 0));
    }

    #[tokio::test]
    async fn chunk_text_splits_on_topic_shift() {
        let props = texts(&[
            "ocean Tides follow the moon.",
            "ocean Waves carry energy.",
            "ocean Salt water is dense.",
            "volcano Magma rises from the mantle.",
            "volcano Lava cools into basalt.",
            "volcano Eruptions release gas.",
        ]);
        let decomposer = Arc::new(FixedDecomposer::new(Ok(props.clone())));
        let embedder = Arc::new(TopicEmbedder::new());

        let chunks = pipeline(decomposer, embedder)
            .chunk_text("Some article text.")
            .await
            .unwrap();

        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            assert_eq!(chunk.text, chunk.propositions.join(" "));
        }
        let rebuilt: Vec<String> = chunks.iter().flat_map(|c| c.propositions.clone()).collect();
        assert_eq!(rebuilt, props);
    }

    #[tokio::test]
    async fn single_proposition_skips_detection() {
        let decomposer = Arc::new(FixedDecomposer::new(Ok(texts(&["ocean Only one."]))));
        let embedder = Arc::new(TopicEmbedder::new());

        let chunks = pipeline(decomposer, embedder.clone())
            .chunk_text("Only one.")
            .await
            .unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "ocean Only one.");
        assert!(embedder.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn blank_input_makes_no_calls() {
        let decomposer = Arc::new(FixedDecomposer::new(Ok(texts(&["x"]))));
        let embedder = Arc::new(TopicEmbedder::new());

        let chunks = pipeline(decomposer.clone(), embedder)
            .chunk_text("  \n\t ")
            .await
            .unwrap();

        assert!(chunks.is_empty());
        assert_eq!(decomposer.calls(), 0);
    }

    #[tokio::test]
    async fn decomposition_failure_is_coded() {
        let decomposer = Arc::new(FixedDecomposer::new(Err(FeedForgeError::Network(
            "dns failure".into(),
        ))));
        let embedder = Arc::new(TopicEmbedder::new());

        let err = pipeline(decomposer, embedder)
            .chunk_text("text")
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::DecompositionFailed);
        assert!(err.to_string().contains("dns failure"));
    }

    #[tokio::test]
    async fn detection_failure_keeps_original_code() {
        let decomposer = Arc::new(FixedDecomposer::new(Ok(texts(&["ocean a", "volcano b"]))));
        let embedder = Arc::new(TopicEmbedder::failing());

        let err = pipeline(decomposer, embedder)
            .chunk_text("text")
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::BoundaryDetectionFailed);
        assert_eq!(err.original_code(), Some(ErrorCode::EmbeddingFailed));
    }
}

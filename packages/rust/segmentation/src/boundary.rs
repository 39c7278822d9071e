//! Topic-shift detection over an ordered sequence of text units.
//!
//! Each valid unit is embedded, consecutive pairs are compared with cosine
//! similarity, and a pair whose similarity falls below
//! `min(mean - k * stddev, mean - min_drop)` marks a boundary before the
//! second unit of the pair.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use feedforge_providers::EmbeddingProvider;
use feedforge_shared::{BoundaryConfig, FeedForgeError, Result};

/// Aggregate statistics over the consecutive-pair similarity series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BoundaryStats {
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Effective threshold a similarity must fall below to mark a boundary.
    pub threshold: f64,
}

/// Result of one detection run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoundaryDetection {
    /// Ascending, deduplicated indices into the caller's unit sequence. Index
    /// `i` means a topic shift occurs immediately before unit `i`.
    pub boundaries: Vec<usize>,
    /// Similarity of each consecutive pair of non-blank units.
    pub similarities: Vec<f64>,
    pub stats: BoundaryStats,
}

/// Embedding-based topic boundary detector.
#[derive(Clone)]
pub struct BoundaryDetector {
    provider: Arc<dyn EmbeddingProvider>,
    config: BoundaryConfig,
}

impl BoundaryDetector {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: BoundaryConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &BoundaryConfig {
        &self.config
    }

    /// Detect topic boundaries in `units`.
    ///
    /// Blank units are ignored for similarity purposes; returned indices still
    /// refer to positions in `units`. Fewer than two non-blank units yields an
    /// empty, zeroed result without contacting the provider.
    #[instrument(skip_all, fields(units = units.len(), model = %self.provider.model()))]
    pub async fn detect(&self, units: &[String]) -> Result<BoundaryDetection> {
        let valid: Vec<(usize, &String)> = units
            .iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .collect();

        if valid.len() < 2 {
            debug!(valid = valid.len(), "too few units for boundary detection");
            return Ok(BoundaryDetection::default());
        }

        let texts: Vec<String> = valid.iter().map(|(_, text)| (*text).clone()).collect();
        let vectors = self.embed_all(&texts).await?;

        let similarities = vectors
            .windows(2)
            .map(|pair| cosine_similarity(&pair[0], &pair[1]))
            .collect::<Result<Vec<f64>>>()?;

        let stats = similarity_stats(&similarities, &self.config);
        let boundaries: Vec<usize> = find_boundaries(&similarities, stats.threshold)
            .into_iter()
            .map(|pos| valid[pos].0)
            .collect();

        info!(
            valid_units = valid.len(),
            boundaries = boundaries.len(),
            mean = stats.mean,
            std_dev = stats.std_dev,
            threshold = stats.threshold,
            "boundary detection complete"
        );

        Ok(BoundaryDetection {
            boundaries,
            similarities,
            stats,
        })
    }

    /// Embed every text, one batch at a time, restoring input order.
    async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let batch_size = self.config.batch_size.max(1);
        let mut vectors = Vec::with_capacity(texts.len());

        for (batch_no, batch) in texts.chunks(batch_size).enumerate() {
            let mut embedded = self
                .provider
                .embed(batch)
                .await
                .map_err(FeedForgeError::embedding_failed)?;

            if embedded.len() != batch.len() {
                return Err(FeedForgeError::embedding_failed(FeedForgeError::validation(
                    format!(
                        "provider returned {} embeddings for {} inputs",
                        embedded.len(),
                        batch.len()
                    ),
                )));
            }

            if embedded.windows(2).any(|w| w[0].index > w[1].index) {
                warn!(batch = batch_no, "provider returned embeddings out of order");
            }
            embedded.sort_by_key(|e| e.index);

            if embedded.iter().enumerate().any(|(i, e)| e.index != i) {
                return Err(FeedForgeError::embedding_failed(FeedForgeError::validation(
                    "provider returned inconsistent embedding indices",
                )));
            }

            debug!(batch = batch_no, size = batch.len(), "embedding batch complete");
            vectors.extend(embedded.into_iter().map(|e| e.vector));
        }

        Ok(vectors)
    }
}

/// Cosine similarity of two equal-length vectors.
///
/// Zero-magnitude input yields exactly `0.0`. Empty or mismatched vectors are
/// a validation error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.is_empty() || b.is_empty() {
        return Err(FeedForgeError::validation(
            "cannot compare empty embedding vectors",
        ));
    }
    if a.len() != b.len() {
        return Err(FeedForgeError::validation(format!(
            "embedding vectors differ in length: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Mean, population standard deviation, and effective threshold.
fn similarity_stats(similarities: &[f64], config: &BoundaryConfig) -> BoundaryStats {
    if similarities.is_empty() {
        return BoundaryStats::default();
    }

    let n = similarities.len() as f64;
    let mean = similarities.iter().sum::<f64>() / n;
    let variance = similarities.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    let statistical = mean - config.std_dev_multiplier * std_dev;
    let absolute = mean - config.min_similarity_drop;

    BoundaryStats {
        mean,
        std_dev,
        threshold: statistical.min(absolute),
    }
}

/// Positions (in the similarity series' unit numbering) that start a new topic.
fn find_boundaries(similarities: &[f64], threshold: f64) -> Vec<usize> {
    similarities
        .iter()
        .enumerate()
        .filter(|(_, s)| **s < threshold)
        .map(|(i, _)| i + 1)
        .collect()
}

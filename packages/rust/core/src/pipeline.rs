//! End-to-end feed pipeline: source → (segment | chunk) → assemble → feed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use feedforge_feed::{
    ContentUnit, FeedAssembler, FeedItem, PrerequisiteData, SynthesisPhaseGenerator,
};
use feedforge_segmentation::{ChunkingPipeline, VideoSegmenter};
use feedforge_shared::{
    Chunk, Concept, ErrorCode, FeedConfig, FeedForgeError, Result, TranscriptUnit, VideoSegment,
};

/// Learning material in whichever stage it arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceContent {
    /// Raw timed transcript; segmented before assembly.
    Transcript {
        units: Vec<TranscriptUnit>,
        total_duration_secs: f64,
    },
    /// Raw prose; chunked before assembly.
    Article { text: String },
    /// Already segmented video.
    Segments { segments: Vec<VideoSegment> },
    /// Already chunked text.
    Chunks { chunks: Vec<Chunk> },
}

impl SourceContent {
    fn kind(&self) -> &'static str {
        match self {
            Self::Transcript { .. } => "transcript",
            Self::Article { .. } => "article",
            Self::Segments { .. } => "segments",
            Self::Chunks { .. } => "chunks",
        }
    }
}

/// One feed build.
#[derive(Debug, Clone)]
pub struct FeedRequest {
    /// Embedded in every feed item id.
    pub source_id: String,
    pub source: SourceContent,
    pub concepts: Vec<Concept>,
    /// Learner performance (0-100). Selects adaptive synthesis when a
    /// generator is configured.
    pub performance: Option<f64>,
    /// Prepends a pretest; requires a synthesis phase generator.
    pub prerequisites: Option<PrerequisiteData>,
    /// Seed for quiz selection. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl FeedRequest {
    pub fn new(source_id: impl Into<String>, source: SourceContent) -> Self {
        Self {
            source_id: source_id.into(),
            source,
            concepts: Vec::new(),
            performance: None,
            prerequisites: None,
            seed: None,
        }
    }
}

/// Result of a feed build.
#[derive(Debug)]
pub struct FeedBuildResult {
    pub feed: Vec<FeedItem>,
    /// Segments or chunks the feed was assembled from.
    pub content_units: usize,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, result: &FeedBuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _result: &FeedBuildResult) {}
}

/// Runs segmentation (when the source needs it) and feed assembly.
#[derive(Clone, Default)]
pub struct FeedPipeline {
    segmenter: Option<VideoSegmenter>,
    chunker: Option<ChunkingPipeline>,
    synthesis: Option<Arc<dyn SynthesisPhaseGenerator>>,
    config: FeedConfig,
}

impl FeedPipeline {
    pub fn new(config: FeedConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_segmenter(mut self, segmenter: VideoSegmenter) -> Self {
        self.segmenter = Some(segmenter);
        self
    }

    pub fn with_chunker(mut self, chunker: ChunkingPipeline) -> Self {
        self.chunker = Some(chunker);
        self
    }

    pub fn with_synthesis_generator(mut self, generator: Arc<dyn SynthesisPhaseGenerator>) -> Self {
        self.synthesis = Some(generator);
        self
    }

    /// Build the feed for `request`.
    #[instrument(skip_all, fields(source_id = %request.source_id, source = request.source.kind()))]
    pub async fn build(
        &self,
        request: &FeedRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<FeedBuildResult> {
        let start = Instant::now();
        info!("starting feed build");

        let content = self.content_units(&request.source, progress).await?;
        let content_units = content.len();

        progress.phase("Assembling feed");
        let assembler = FeedAssembler::new(request.source_id.clone(), self.config.clone());
        let mut rng = match request.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // Empty prerequisite data means no pretest phase at all.
        let prerequisites = request.prerequisites.as_ref().filter(|p| !p.is_empty());
        let feed = match (&self.synthesis, prerequisites, request.performance) {
            (Some(generator), Some(prerequisites), performance) => {
                assembler
                    .assemble_with_pretest(
                        &content,
                        &request.concepts,
                        performance.unwrap_or(0.0),
                        prerequisites,
                        generator.as_ref(),
                        &mut rng,
                    )
                    .await?
            }
            (None, Some(_), _) => {
                return Err(FeedForgeError::feed_build(
                    ErrorCode::BuildFailed,
                    "a pretest requires a synthesis phase generator",
                ));
            }
            (Some(generator), None, Some(performance)) => {
                assembler
                    .assemble_adaptive(
                        &content,
                        &request.concepts,
                        performance,
                        generator.as_ref(),
                        &mut rng,
                    )
                    .await?
            }
            _ => assembler.assemble(&content, &request.concepts, &mut rng)?,
        };

        let result = FeedBuildResult {
            feed,
            content_units,
            elapsed: start.elapsed(),
        };
        info!(
            items = result.feed.len(),
            content_units,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "feed build complete"
        );
        progress.done(&result);
        Ok(result)
    }

    /// Turn the source into content units, segmenting or chunking raw input.
    async fn content_units(
        &self,
        source: &SourceContent,
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<ContentUnit>> {
        match source {
            SourceContent::Transcript {
                units,
                total_duration_secs,
            } => {
                if units.is_empty() {
                    return Ok(Vec::new());
                }
                if units.iter().all(|u| u.text.trim().is_empty()) {
                    return Err(no_chapters());
                }
                let segmenter = self.segmenter.as_ref().ok_or_else(|| {
                    FeedForgeError::feed_build(
                        ErrorCode::BuildFailed,
                        "transcript source needs a video segmenter",
                    )
                })?;

                progress.phase("Segmenting transcript");
                let segments = segmenter.segment(units, *total_duration_secs).await?;
                debug!(segments = segments.len(), "transcript segmented");
                video_units(segments)
            }

            SourceContent::Article { text } => {
                if text.trim().is_empty() {
                    return Ok(Vec::new());
                }
                let chunker = self.chunker.as_ref().ok_or_else(|| {
                    FeedForgeError::feed_build(
                        ErrorCode::BuildFailed,
                        "article source needs a chunking pipeline",
                    )
                })?;

                progress.phase("Chunking article");
                let chunks = chunker.chunk_text(text).await?;
                debug!(chunks = chunks.len(), "article chunked");
                text_units(chunks)
            }

            SourceContent::Segments { segments } => video_units(segments.clone()),
            SourceContent::Chunks { chunks } => text_units(chunks.clone()),
        }
    }
}

fn no_chapters() -> FeedForgeError {
    FeedForgeError::feed_build(ErrorCode::NoChapters, "transcript has no usable text")
}

/// Non-blank segments as content units. Non-empty input that is entirely
/// blank is `NO_CHAPTERS`.
fn video_units(segments: Vec<VideoSegment>) -> Result<Vec<ContentUnit>> {
    if segments.is_empty() {
        return Ok(Vec::new());
    }
    let units: Vec<ContentUnit> = segments
        .into_iter()
        .filter(|s| !s.text.trim().is_empty())
        .map(ContentUnit::video)
        .collect();
    if units.is_empty() {
        return Err(no_chapters());
    }
    Ok(units)
}

/// Non-blank chunks as content units. Non-empty input that is entirely blank
/// is `NO_TEXT_CHUNKS`.
fn text_units(chunks: Vec<Chunk>) -> Result<Vec<ContentUnit>> {
    if chunks.is_empty() {
        return Ok(Vec::new());
    }
    let units: Vec<ContentUnit> = chunks
        .into_iter()
        .filter(|c| !c.text.trim().is_empty())
        .map(ContentUnit::text)
        .collect();
    if units.is_empty() {
        return Err(FeedForgeError::feed_build(
            ErrorCode::NoTextChunks,
            "article produced no text chunks",
        ));
    }
    Ok(units)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use feedforge_feed::{Prerequisite, PretestQuestion, SynthesisConcept};
    use feedforge_providers::{Decomposer, EmbeddingProvider, IndexedEmbedding};
    use feedforge_segmentation::BoundaryDetector;
    use feedforge_shared::{BoundaryConfig, VideoSegmenterConfig};

    /// One-hot embedding by first word.
    struct FirstWordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FirstWordEmbedder {
        fn model(&self) -> &str {
            "first-word"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<IndexedEmbedding>> {
            Ok(texts
                .iter()
                .enumerate()
                .map(|(index, text)| {
                    let vector = match text.split_whitespace().next() {
                        Some("ocean") => vec![1.0, 0.0, 0.0],
                        Some("volcano") => vec![0.0, 1.0, 0.0],
                        _ => vec![0.0, 0.0, 1.0],
                    };
                    IndexedEmbedding { index, vector }
                })
                .collect())
        }
    }

    struct FixedDecomposer(Vec<String>);

    #[async_trait]
    impl Decomposer for FixedDecomposer {
        async fn decompose(&self, _text: &str) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl SynthesisPhaseGenerator for EchoGenerator {
        async fn generate(
            &self,
            concepts: &[SynthesisConcept],
            _performance_pct: u8,
        ) -> Result<Vec<serde_json::Value>> {
            Ok(concepts
                .iter()
                .map(|c| serde_json::json!({ "concept": c.id }))
                .collect())
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        phases: Mutex<Vec<String>>,
        done: Mutex<Option<usize>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.phases.lock().unwrap().push(name.to_string());
        }

        fn done(&self, result: &FeedBuildResult) {
            *self.done.lock().unwrap() = Some(result.feed.len());
        }
    }

    fn detector() -> BoundaryDetector {
        BoundaryDetector::new(Arc::new(FirstWordEmbedder), BoundaryConfig::default())
    }

    fn segmenter() -> VideoSegmenter {
        VideoSegmenter::new(detector(), VideoSegmenterConfig::default()).unwrap()
    }

    fn chunker(propositions: &[&str]) -> ChunkingPipeline {
        let props = propositions.iter().map(|s| s.to_string()).collect();
        ChunkingPipeline::new(Arc::new(FixedDecomposer(props)), detector())
    }

    fn transcript(topics: &[(&str, usize)], secs_each: f64) -> SourceContent {
        let mut units = Vec::new();
        for (topic, count) in topics {
            for i in 0..*count {
                let n = units.len() as f64;
                units.push(TranscriptUnit {
                    text: format!("{topic} line {i}"),
                    start: n * secs_each,
                    end: (n + 1.0) * secs_each,
                });
            }
        }
        let total_duration_secs = units.last().map(|u| u.end).unwrap_or(0.0);
        SourceContent::Transcript {
            units,
            total_duration_secs,
        }
    }

    fn request(source: SourceContent) -> FeedRequest {
        FeedRequest {
            seed: Some(7),
            ..FeedRequest::new("src-1", source)
        }
    }

    #[tokio::test]
    async fn transcript_is_segmented_then_assembled() {
        let pipeline = FeedPipeline::default().with_segmenter(segmenter());
        let progress = RecordingProgress::default();

        let result = pipeline
            .build(&request(transcript(&[("ocean", 5), ("volcano", 5)], 60.0)), &progress)
            .await
            .unwrap();

        assert_eq!(result.content_units, 2);
        assert!(result.feed.iter().filter(|i| i.is_content()).all(|i| i.id().starts_with("video-src-1-")));
        assert_eq!(
            *progress.phases.lock().unwrap(),
            vec!["Segmenting transcript", "Assembling feed"]
        );
        assert_eq!(*progress.done.lock().unwrap(), Some(result.feed.len()));
    }

    #[tokio::test]
    async fn article_is_chunked_then_assembled() {
        let pipeline = FeedPipeline::default().with_chunker(chunker(&[
            "ocean Tides rise.",
            "ocean Waves break.",
            "volcano Magma rises.",
            "volcano Lava flows.",
        ]));
        let source = SourceContent::Article {
            text: "Some prose.".into(),
        };

        let result = pipeline.build(&request(source), &SilentProgress).await.unwrap();

        assert_eq!(result.content_units, 2);
        assert_eq!(result.feed[0].id(), "text-src-1-0");
    }

    #[tokio::test]
    async fn raw_source_without_segmenter_fails() {
        let err = FeedPipeline::default()
            .build(&request(transcript(&[("ocean", 3)], 100.0)), &SilentProgress)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BuildFailed);
    }

    #[tokio::test]
    async fn blank_transcript_has_no_chapters() {
        let source = SourceContent::Transcript {
            units: vec![TranscriptUnit {
                text: "  ".into(),
                start: 0.0,
                end: 10.0,
            }],
            total_duration_secs: 10.0,
        };
        let err = FeedPipeline::default()
            .with_segmenter(segmenter())
            .build(&request(source), &SilentProgress)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoChapters);
    }

    #[tokio::test]
    async fn article_without_propositions_has_no_text_chunks() {
        let source = SourceContent::Article {
            text: "Filler.".into(),
        };
        let err = FeedPipeline::default()
            .with_chunker(chunker(&[]))
            .build(&request(source), &SilentProgress)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoTextChunks);
    }

    #[tokio::test]
    async fn empty_sources_yield_empty_feeds() {
        let pipeline = FeedPipeline::default();
        for source in [
            SourceContent::Transcript {
                units: vec![],
                total_duration_secs: 0.0,
            },
            SourceContent::Article { text: " ".into() },
            SourceContent::Chunks { chunks: vec![] },
        ] {
            let result = pipeline.build(&request(source), &SilentProgress).await.unwrap();
            assert!(result.feed.is_empty());
        }
    }

    fn one_prerequisite() -> PrerequisiteData {
        PrerequisiteData {
            prerequisites: vec![Prerequisite {
                id: "p1".into(),
                name: "Basics".into(),
                questions: vec![PretestQuestion {
                    question_text: "Ready?".into(),
                    options: vec!["yes".into(), "no".into()],
                    correct_index: 0,
                    explanation: String::new(),
                }],
            }],
        }
    }

    fn segments(n: usize) -> Vec<VideoSegment> {
        (0..n)
            .map(|i| {
                VideoSegment::new(
                    i,
                    i as f64 * 200.0,
                    (i + 1) as f64 * 200.0,
                    vec![format!("Part {i}.")],
                    i,
                    i + 1,
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn pretest_needs_generator() {
        let req = FeedRequest {
            prerequisites: Some(one_prerequisite()),
            ..request(SourceContent::Segments {
                segments: segments(3),
            })
        };
        let err = FeedPipeline::default()
            .build(&req, &SilentProgress)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BuildFailed);
    }

    #[tokio::test]
    async fn empty_prerequisites_build_the_plain_feed() {
        let pipeline = FeedPipeline::default();
        let plain = request(SourceContent::Segments {
            segments: segments(3),
        });
        let with_empty = FeedRequest {
            prerequisites: Some(PrerequisiteData::default()),
            ..plain.clone()
        };

        let expected = pipeline.build(&plain, &SilentProgress).await.unwrap();
        let result = pipeline.build(&with_empty, &SilentProgress).await.unwrap();

        assert_eq!(result.feed.len(), expected.feed.len());
        let ids = |feed: &[FeedItem]| feed.iter().map(|i| i.id().to_string()).collect::<Vec<_>>();
        assert_eq!(ids(&result.feed), ids(&expected.feed));
        assert!(!result.feed.iter().any(|i| matches!(i, FeedItem::Pretest(_))));
    }

    #[tokio::test]
    async fn generator_and_prerequisites_give_pretest_feed() {
        let req = FeedRequest {
            performance: Some(85.0),
            prerequisites: Some(one_prerequisite()),
            ..request(SourceContent::Segments {
                segments: segments(6),
            })
        };

        let result = FeedPipeline::default()
            .with_synthesis_generator(Arc::new(EchoGenerator))
            .build(&req, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(result.feed[0].id(), "pretest-src-1-0");
        assert_eq!(result.feed[1].id(), "pretest-results-src-1-1");
        assert_eq!(result.feed[2].id(), "video-src-1-2");
        assert!(
            result
                .feed
                .iter()
                .any(|i| matches!(i, FeedItem::SynthesisPhase(_)))
        );
    }

    #[test]
    fn source_content_round_trips_through_json() {
        let json = r#"{"kind":"article","text":"Hello."}"#;
        let source: SourceContent = serde_json::from_str(json).unwrap();
        assert_eq!(
            source,
            SourceContent::Article {
                text: "Hello.".into()
            }
        );
    }
}

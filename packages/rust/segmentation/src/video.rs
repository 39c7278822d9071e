//! Transcript segmentation onto wall-clock video time.
//!
//! Topic boundaries from [`BoundaryDetector`] become initial spans, which are
//! then merged up to the minimum duration and split down to the maximum.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use feedforge_providers::OpenAiEmbeddings;
use feedforge_shared::{
    AppConfig, BoundaryConfig, FeedForgeError, Result, TranscriptUnit, VideoSegment,
    VideoSegmenterConfig,
};

use crate::boundary::BoundaryDetector;
use crate::chunking::normalize_boundaries;

/// Produces duration-bounded, time-coded segments from transcript units.
#[derive(Clone)]
pub struct VideoSegmenter {
    detector: BoundaryDetector,
    config: VideoSegmenterConfig,
}

impl VideoSegmenter {
    /// Fails with `INITIALIZATION_FAILED` when the duration bounds are unusable.
    pub fn new(detector: BoundaryDetector, config: VideoSegmenterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { detector, config })
    }

    /// Build a segmenter over the configured embedding provider.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        let embeddings = OpenAiEmbeddings::from_config(&config.embedding)?;
        let detector = BoundaryDetector::new(Arc::new(embeddings), BoundaryConfig::from(config));
        Self::new(detector, VideoSegmenterConfig::from(config))
    }

    pub fn config(&self) -> &VideoSegmenterConfig {
        &self.config
    }

    /// Segment `units` covering `total_duration_secs` of video.
    #[instrument(skip_all, fields(units = units.len(), total = total_duration_secs))]
    pub async fn segment(
        &self,
        units: &[TranscriptUnit],
        total_duration_secs: f64,
    ) -> Result<Vec<VideoSegment>> {
        let (Some(first), Some(last)) = (units.first(), units.last()) else {
            return Ok(Vec::new());
        };

        if total_duration_secs <= self.config.min_duration_secs || units.len() == 1 {
            debug!("single segment short-circuit");
            return Ok(vec![VideoSegment::new(
                0,
                first.start,
                last.end,
                unit_texts(units),
                0,
                units.len(),
            )]);
        }

        let texts = unit_texts(units);
        let detection = self
            .detector
            .detect(&texts)
            .await
            .map_err(FeedForgeError::segmentation_failed)?;

        let initial = spans_from_boundaries(units, &detection.boundaries);
        let initial_count = initial.len();
        let merged = merge_short(initial, self.config.min_duration_secs);
        let mut segments = split_long(merged, self.config.max_duration_secs);
        for (id, segment) in segments.iter_mut().enumerate() {
            segment.id = id;
        }

        info!(
            boundaries = detection.boundaries.len(),
            initial = initial_count,
            segments = segments.len(),
            "video segmentation complete"
        );
        Ok(segments)
    }
}

fn unit_texts(units: &[TranscriptUnit]) -> Vec<String> {
    units.iter().map(|u| u.text.clone()).collect()
}

/// One segment per index range between consecutive boundaries.
fn spans_from_boundaries(units: &[TranscriptUnit], boundaries: &[usize]) -> Vec<VideoSegment> {
    let n = units.len();
    let mut cuts = vec![0];
    cuts.extend(normalize_boundaries(boundaries, n));
    cuts.push(n);

    cuts.windows(2)
        .enumerate()
        .map(|(id, w)| {
            let slice = &units[w[0]..w[1]];
            VideoSegment::new(
                id,
                slice[0].start,
                slice[slice.len() - 1].end,
                unit_texts(slice),
                w[0],
                w[1],
            )
        })
        .collect()
}

/// Concatenate two adjacent segments into one spanning both.
fn absorb(front: VideoSegment, back: VideoSegment) -> VideoSegment {
    let mut sentences = front.sentences;
    sentences.extend(back.sentences);
    VideoSegment::new(
        front.id,
        front.start_sec,
        back.end_sec,
        sentences,
        front.start_index,
        back.end_index,
    )
}

/// Fold segments shorter than `min_secs` into a neighbour.
///
/// A short segment joins the last accepted segment. With nothing accepted yet
/// it is carried into the next segment instead, and the combination is checked
/// again. A short remainder with no neighbour at all is kept as is.
fn merge_short(segments: Vec<VideoSegment>, min_secs: f64) -> Vec<VideoSegment> {
    let mut accepted: Vec<VideoSegment> = Vec::with_capacity(segments.len());
    let mut carry: Option<VideoSegment> = None;

    for segment in segments {
        let current = match carry.take() {
            Some(front) => absorb(front, segment),
            None => segment,
        };

        if current.duration_sec >= min_secs {
            accepted.push(current);
        } else if let Some(previous) = accepted.pop() {
            accepted.push(absorb(previous, current));
        } else {
            carry = Some(current);
        }
    }

    if let Some(rest) = carry {
        accepted.push(rest);
    }
    accepted
}

/// Split segments longer than `max_secs` by sentence count.
///
/// Sub-segment times are proportional to their share of sentences, rounded to
/// whole seconds. The outer bounds of the parent are kept exactly.
fn split_long(segments: Vec<VideoSegment>, max_secs: f64) -> Vec<VideoSegment> {
    let mut out = Vec::with_capacity(segments.len());

    for segment in segments {
        let count = segment.sentences.len();
        if segment.duration_sec <= max_secs || count < 2 {
            out.push(segment);
            continue;
        }

        let parts = (segment.duration_sec / max_secs).ceil() as usize;
        let per = count.div_ceil(parts);
        // Only interior cut times are rounded; the outer bounds stay exact so
        // neighbouring segments remain contiguous.
        let time_at = |offset: usize| -> f64 {
            if offset == 0 {
                segment.start_sec
            } else if offset == count {
                segment.end_sec
            } else {
                (segment.start_sec + segment.duration_sec * offset as f64 / count as f64).round()
            }
        };

        let mut offset = 0;
        while offset < count {
            let end = (offset + per).min(count);
            out.push(VideoSegment::new(
                segment.id,
                time_at(offset),
                time_at(end),
                segment.sentences[offset..end].to_vec(),
                segment.start_index + offset,
                segment.start_index + end,
            ));
            offset = end;
        }
        debug!(duration = segment.duration_sec, parts, "split long segment");
    }

    out
}

//! Feed assembly: plans the interleaving and renders planned items.

use rand::Rng;
use tracing::{debug, info, instrument};

use feedforge_shared::{Concept, ErrorCode, FeedConfig, FeedForgeError, Result};

use crate::content::{ContentSource, ContentUnit};
use crate::item::{
    FactItem, FeedItem, ItemPrefix, SynthesisItem, SynthesisPhaseItem, TextItem, VideoItem,
    item_id,
};
use crate::plan::{PlanContext, PlannedItem, PlannedKind, plan_feed};
use crate::pretest::{PrerequisiteData, build_pretest};
use crate::quiz::build_quiz;
use crate::synthesis::{
    SynthesisConcept, SynthesisPhaseGenerator, clamp_performance, pad_concepts, synthesis_prompt,
};

/// Assembles the learning feed for one source.
#[derive(Debug, Clone)]
pub struct FeedAssembler {
    source_id: String,
    config: FeedConfig,
}

impl FeedAssembler {
    pub fn new(source_id: impl Into<String>, config: FeedConfig) -> Self {
        Self {
            source_id: source_id.into(),
            config,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Assemble a feed with static synthesis checkpoints.
    ///
    /// `concepts` supply quiz questions and synthesis topics. Empty `content`
    /// yields an empty feed.
    #[instrument(skip_all, fields(source_id = %self.source_id, units = content.len()))]
    pub fn assemble<R: Rng + ?Sized>(
        &self,
        content: &[ContentUnit],
        concepts: &[Concept],
        rng: &mut R,
    ) -> Result<Vec<FeedItem>> {
        let mut renderer = Renderer::new(self, content, concepts)?;
        let plan = plan_feed(&renderer.plan_context(), 0);

        let mut feed = Vec::with_capacity(plan.len());
        for planned in plan {
            feed.extend(renderer.render(planned, rng));
        }

        log_feed(&feed);
        Ok(feed)
    }

    /// Assemble a feed whose synthesis checkpoints are adaptive phases built by
    /// `generator` for the learner's `performance` (a 0-100 score, clamped).
    #[instrument(skip_all, fields(source_id = %self.source_id, units = content.len()))]
    pub async fn assemble_adaptive<R: Rng + Send + ?Sized>(
        &self,
        content: &[ContentUnit],
        concepts: &[Concept],
        performance: f64,
        generator: &dyn SynthesisPhaseGenerator,
        rng: &mut R,
    ) -> Result<Vec<FeedItem>> {
        let feed = self
            .adaptive_from(content, concepts, performance, generator, rng, 0)
            .await?;
        log_feed(&feed);
        Ok(feed)
    }

    /// Prefix the adaptive feed with a pretest over `prerequisites`.
    ///
    /// The adaptive feed continues the pretest's item numbering. Without
    /// prerequisites this is exactly [`assemble_adaptive`](Self::assemble_adaptive).
    #[instrument(skip_all, fields(source_id = %self.source_id, units = content.len()))]
    pub async fn assemble_with_pretest<R: Rng + Send + ?Sized>(
        &self,
        content: &[ContentUnit],
        concepts: &[Concept],
        performance: f64,
        prerequisites: &PrerequisiteData,
        generator: &dyn SynthesisPhaseGenerator,
        rng: &mut R,
    ) -> Result<Vec<FeedItem>> {
        let mut feed = build_pretest(&self.source_id, prerequisites, 0);
        if !feed.is_empty() {
            debug!(
                prerequisites = prerequisites.prerequisites.len(),
                questions = prerequisites.total_questions(),
                "pretest phase added"
            );
        }

        let start_index = feed.len();
        let rest = self
            .adaptive_from(content, concepts, performance, generator, rng, start_index)
            .await?;
        feed.extend(rest);

        log_feed(&feed);
        Ok(feed)
    }

    async fn adaptive_from<R: Rng + Send + ?Sized>(
        &self,
        content: &[ContentUnit],
        concepts: &[Concept],
        performance: f64,
        generator: &dyn SynthesisPhaseGenerator,
        rng: &mut R,
        start_index: usize,
    ) -> Result<Vec<FeedItem>> {
        let performance_pct = clamp_performance(performance);
        let mut renderer = Renderer::new(self, content, concepts)?;
        let plan = plan_feed(&renderer.plan_context(), start_index);

        let mut feed = Vec::with_capacity(plan.len());
        for PlannedItem { index, kind } in plan {
            let item = match kind {
                PlannedKind::Synthesis(units) => {
                    let concepts = pad_concepts(renderer.synthesis_concepts(&units));
                    let interactions = generator
                        .generate(&concepts, performance_pct)
                        .await
                        .map_err(FeedForgeError::build_failed)?;
                    debug!(
                        index,
                        interactions = interactions.len(),
                        "synthesis phase generated"
                    );
                    Some(FeedItem::SynthesisPhase(SynthesisPhaseItem {
                        id: item_id(ItemPrefix::SynthesisPhase, &self.source_id, index),
                        covered_item_ids: renderer.covered_ids(&units),
                        concept_ids: concepts.into_iter().map(|c| c.id).collect(),
                        performance_pct,
                        interaction_count: interactions.len(),
                        interactions,
                    }))
                }
                kind => renderer.render(PlannedItem { index, kind }, rng),
            };
            feed.extend(item);
        }
        Ok(feed)
    }
}

fn log_feed(feed: &[FeedItem]) {
    let content = feed.iter().filter(|i| i.is_content()).count();
    let checkpoints = feed
        .iter()
        .filter(|i| matches!(i, FeedItem::Synthesis(_) | FeedItem::SynthesisPhase(_)))
        .count();
    info!(items = feed.len(), content, checkpoints, "feed assembled");
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Turns planned items into feed items for one assembly call.
struct Renderer<'a> {
    source_id: &'a str,
    fact_max_chars: usize,
    synthesis_interval: usize,
    content: &'a [ContentUnit],
    /// Concept associated with each content unit.
    concepts: Vec<Option<&'a Concept>>,
    /// Item id of each content unit once emitted.
    content_ids: Vec<Option<String>>,
}

impl<'a> Renderer<'a> {
    fn new(
        assembler: &'a FeedAssembler,
        content: &'a [ContentUnit],
        concepts: &'a [Concept],
    ) -> Result<Self> {
        Ok(Self {
            source_id: &assembler.source_id,
            fact_max_chars: assembler.config.fact_max_chars,
            synthesis_interval: assembler.config.synthesis_interval,
            content,
            concepts: associate_concepts(content, concepts)?,
            content_ids: vec![None; content.len()],
        })
    }

    fn plan_context(&self) -> PlanContext {
        PlanContext {
            synthesis_interval: self.synthesis_interval,
            quizzable: self
                .concepts
                .iter()
                .map(|c| c.is_some_and(|c| !c.sample_questions().is_empty()))
                .collect(),
        }
    }

    fn id(&self, prefix: ItemPrefix, index: usize) -> String {
        item_id(prefix, self.source_id, index)
    }

    fn content_id(&self, unit: usize) -> String {
        self.content_ids[unit].clone().unwrap_or_default()
    }

    /// Render a content, quiz, or fact slot.
    fn render<R: Rng + ?Sized>(&mut self, planned: PlannedItem, rng: &mut R) -> Option<FeedItem> {
        let index = planned.index;
        match planned.kind {
            PlannedKind::Content(u) => Some(self.content_item(index, u)),
            PlannedKind::Quiz(u) => {
                let concept = self.concepts[u]?;
                build_quiz(self.id(ItemPrefix::Quiz, index), concept, &self.content_id(u), rng)
                    .map(FeedItem::Quiz)
            }
            PlannedKind::Fact(u) => Some(FeedItem::Fact(FactItem {
                id: self.id(ItemPrefix::Fact, index),
                source_item_id: self.content_id(u),
                text: self.content[u].fact_text(self.fact_max_chars),
                concept_id: self.concepts[u].map(|c| c.id.clone()),
            })),
            PlannedKind::Synthesis(units) => Some(self.synthesis(index, &units)),
        }
    }

    fn content_item(&mut self, index: usize, u: usize) -> FeedItem {
        let unit = &self.content[u];
        let concept_id = self.concepts[u].map(|c| c.id.clone());
        let item = match &unit.source {
            ContentSource::Video(segment) => FeedItem::Video(VideoItem {
                id: self.id(ItemPrefix::Video, index),
                segment: segment.clone(),
                concept_id,
                title: unit.title.clone(),
            }),
            ContentSource::Text(chunk) => FeedItem::Text(TextItem {
                id: self.id(ItemPrefix::Text, index),
                chunk: chunk.clone(),
                concept_id,
                title: unit.title.clone(),
            }),
        };
        self.content_ids[u] = Some(item.id().to_string());
        item
    }

    fn covered_ids(&self, units: &[usize]) -> Vec<String> {
        units.iter().map(|&u| self.content_id(u)).collect()
    }

    fn topic(&self, u: usize) -> String {
        match self.concepts[u] {
            Some(concept) => concept.name.clone(),
            None => self.content[u].label(),
        }
    }

    /// Static synthesis checkpoint over `units`.
    fn synthesis(&self, index: usize, units: &[usize]) -> FeedItem {
        let mut topics: Vec<String> = Vec::with_capacity(units.len());
        for topic in units.iter().map(|&u| self.topic(u)) {
            if !topics.contains(&topic) {
                topics.push(topic);
            }
        }
        FeedItem::Synthesis(SynthesisItem {
            id: self.id(ItemPrefix::Synthesis, index),
            covered_item_ids: self.covered_ids(units),
            prompt: synthesis_prompt(&topics),
            topics,
        })
    }

    /// Distinct concepts of `units`, in order. A unit without a concept stands
    /// in for one by its label.
    fn synthesis_concepts(&self, units: &[usize]) -> Vec<SynthesisConcept> {
        let mut out: Vec<SynthesisConcept> = Vec::with_capacity(units.len());
        for &u in units {
            let concept = match self.concepts[u] {
                Some(concept) => SynthesisConcept::from(concept),
                None => SynthesisConcept {
                    id: self.content_id(u),
                    name: self.content[u].label(),
                    concept_type: "topic".to_string(),
                    description: self.content[u].summary.clone(),
                },
            };
            if !out.iter().any(|c| c.id == concept.id) {
                out.push(concept);
            }
        }
        out
    }
}

/// Resolve the concept of each content unit: its explicit `concept_id`, else
/// the concept at the unit's position modulo the concept count.
fn associate_concepts<'a>(
    content: &[ContentUnit],
    concepts: &'a [Concept],
) -> Result<Vec<Option<&'a Concept>>> {
    content
        .iter()
        .enumerate()
        .map(|(i, unit)| match &unit.concept_id {
            Some(id) => concepts
                .iter()
                .find(|c| &c.id == id)
                .map(Some)
                .ok_or_else(|| {
                    FeedForgeError::feed_build(
                        ErrorCode::InvalidConcepts,
                        format!("content unit {i} references unknown concept '{id}'"),
                    )
                }),
            None if concepts.is_empty() => Ok(None),
            None => Ok(Some(&concepts[i % concepts.len()])),
        })
        .collect()
}

//! Feed item types.
//!
//! Every item carries an id of the form `{prefix}-{source_id}-{index}`, where
//! the index is monotonic within one assembly call.

use serde::{Deserialize, Serialize};

use feedforge_shared::{Chunk, QuestionType, VideoSegment};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Id prefix for each kind of feed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemPrefix {
    Video,
    Text,
    Quiz,
    Fact,
    Synthesis,
    SynthesisPhase,
    Pretest,
    PretestResults,
    MiniLesson,
    Sandbox,
}

impl ItemPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Text => "text",
            Self::Quiz => "quiz",
            Self::Fact => "fact",
            Self::Synthesis => "synthesis",
            Self::SynthesisPhase => "synthesis-phase",
            Self::Pretest => "pretest",
            Self::PretestResults => "pretest-results",
            Self::MiniLesson => "mini-lesson",
            Self::Sandbox => "sandbox",
        }
    }
}

/// Format a feed item id.
pub fn item_id(prefix: ItemPrefix, source_id: &str, index: usize) -> String {
    format!("{}-{}-{}", prefix.as_str(), source_id, index)
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// One entry of an assembled feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedItem {
    Video(VideoItem),
    Text(TextItem),
    Quiz(QuizItem),
    Fact(FactItem),
    Synthesis(SynthesisItem),
    SynthesisPhase(SynthesisPhaseItem),
    Pretest(PretestItem),
    PretestResults(PretestResultsItem),
    MiniLesson(MiniLessonItem),
    Sandbox(SandboxItem),
}

impl FeedItem {
    pub fn id(&self) -> &str {
        match self {
            Self::Video(i) => &i.id,
            Self::Text(i) => &i.id,
            Self::Quiz(i) => &i.id,
            Self::Fact(i) => &i.id,
            Self::Synthesis(i) => &i.id,
            Self::SynthesisPhase(i) => &i.id,
            Self::Pretest(i) => &i.id,
            Self::PretestResults(i) => &i.id,
            Self::MiniLesson(i) => &i.id,
            Self::Sandbox(i) => &i.id,
        }
    }

    /// Whether this item presents source content (a video segment or text chunk).
    pub fn is_content(&self) -> bool {
        matches!(self, Self::Video(_) | Self::Text(_))
    }

    pub fn prefix(&self) -> ItemPrefix {
        match self {
            Self::Video(_) => ItemPrefix::Video,
            Self::Text(_) => ItemPrefix::Text,
            Self::Quiz(_) => ItemPrefix::Quiz,
            Self::Fact(_) => ItemPrefix::Fact,
            Self::Synthesis(_) => ItemPrefix::Synthesis,
            Self::SynthesisPhase(_) => ItemPrefix::SynthesisPhase,
            Self::Pretest(_) => ItemPrefix::Pretest,
            Self::PretestResults(_) => ItemPrefix::PretestResults,
            Self::MiniLesson(_) => ItemPrefix::MiniLesson,
            Self::Sandbox(_) => ItemPrefix::Sandbox,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoItem {
    pub id: String,
    pub segment: VideoSegment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    pub id: String,
    pub chunk: Chunk,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A question drawn from a concept's sample questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizItem {
    pub id: String,
    pub concept_id: String,
    /// Id of the content item this quiz follows up on.
    pub source_item_id: String,
    pub question_type: QuestionType,
    pub question_text: String,
    pub correct_answer: String,
    /// Correct answer and distractors, shuffled.
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactItem {
    pub id: String,
    pub source_item_id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_id: Option<String>,
}

/// Static checkpoint asking the learner to connect recent topics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisItem {
    pub id: String,
    pub covered_item_ids: Vec<String>,
    pub topics: Vec<String>,
    pub prompt: String,
}

/// Performance-adaptive checkpoint; `interactions` is opaque to the assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisPhaseItem {
    pub id: String,
    pub covered_item_ids: Vec<String>,
    pub concept_ids: Vec<String>,
    pub performance_pct: u8,
    pub interaction_count: usize,
    pub interactions: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PretestItem {
    pub id: String,
    pub prerequisite_id: String,
    pub prerequisite_name: String,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: String,
    /// 1-based, numbered across all prerequisites.
    pub question_number: usize,
    pub total_questions: usize,
}

/// Outcome of a pretest after scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    ReviewRequired,
    Proceed,
}

/// Score placeholder emitted after the pretest questions; the caller fills in
/// the score as answers arrive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PretestResultsItem {
    pub id: String,
    pub total_prerequisites: usize,
    pub total_questions: usize,
    pub correct_count: usize,
    pub percentage: u8,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiniLessonItem {
    pub id: String,
    pub prerequisite_id: String,
    pub title: String,
    pub content_markdown: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    pub estimated_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxItem {
    pub id: String,
    pub title: String,
    pub instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starter_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

//! Core domain types shared by the segmentation and feed crates.
//!
//! All of these are value objects: created fresh by one pipeline run and never
//! mutated once handed to the next stage.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Segmentation outputs
// ---------------------------------------------------------------------------

/// A contiguous run of propositions between two topic boundaries.
///
/// `[start_index, end_index)` is the half-open slice of the proposition
/// sequence this chunk covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: usize,
    /// Space-joined propositions.
    pub text: String,
    pub propositions: Vec<String>,
    pub start_index: usize,
    pub end_index: usize,
}

/// One timed unit of a video transcript (usually a caption line or sentence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptUnit {
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
}

/// A time-coded, duration-optimized span of a video transcript.
///
/// `[start_index, end_index)` indexes into the transcript units the segment
/// was built from; `duration_sec` always equals `end_sec - start_sec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSegment {
    pub id: usize,
    pub start_sec: f64,
    pub end_sec: f64,
    pub duration_sec: f64,
    pub text: String,
    pub sentences: Vec<String>,
    pub start_index: usize,
    pub end_index: usize,
}

impl VideoSegment {
    /// Build a segment, deriving `duration_sec` and `text`.
    pub fn new(
        id: usize,
        start_sec: f64,
        end_sec: f64,
        sentences: Vec<String>,
        start_index: usize,
        end_index: usize,
    ) -> Self {
        Self {
            id,
            start_sec,
            end_sec,
            duration_sec: end_sec - start_sec,
            text: sentences.join(" "),
            sentences,
            start_index,
            end_index,
        }
    }
}

// ---------------------------------------------------------------------------
// Concepts and assessment
// ---------------------------------------------------------------------------

/// A concept extracted from a source, optionally with assessment material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub name: String,
    /// Free-form category (e.g. "definition", "process").
    #[serde(rename = "type", default)]
    pub concept_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<AssessmentSpec>,
}

impl Concept {
    /// Sample questions available for quizzing, if any.
    pub fn sample_questions(&self) -> &[SampleQuestion] {
        self.assessment
            .as_ref()
            .map(|a| a.sample_questions.as_slice())
            .unwrap_or_default()
    }
}

/// How a concept should be assessed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSpec {
    #[serde(default)]
    pub sample_questions: Vec<SampleQuestion>,
}

/// Question format of a sample question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    FillInBlank,
    ShortAnswer,
}

/// An authored question, consumed verbatim by the quiz builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleQuestion {
    pub question_type: QuestionType,
    pub question_text: String,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub distractors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_segment_derives_duration_and_text() {
        let seg = VideoSegment::new(
            0,
            12.0,
            72.5,
            vec!["First line.".into(), "Second line.".into()],
            0,
            2,
        );
        assert_eq!(seg.duration_sec, 60.5);
        assert_eq!(seg.text, "First line. Second line.");
    }

    #[test]
    fn concept_deserializes_with_type_field() {
        let json = r#"{
            "id": "c1",
            "name": "Photosynthesis",
            "type": "process",
            "assessment": {
                "sample_questions": [{
                    "question_type": "multiple_choice",
                    "question_text": "What do plants convert light into?",
                    "correct_answer": "Chemical energy",
                    "distractors": ["Heat", "Sound"]
                }]
            }
        }"#;
        let concept: Concept = serde_json::from_str(json).expect("deserialize");
        assert_eq!(concept.concept_type, "process");
        assert_eq!(concept.sample_questions().len(), 1);
        assert_eq!(
            concept.sample_questions()[0].question_type,
            QuestionType::MultipleChoice
        );
    }

    #[test]
    fn concept_without_assessment_has_no_questions() {
        let concept = Concept {
            id: "c2".into(),
            name: "Osmosis".into(),
            concept_type: "definition".into(),
            description: None,
            assessment: None,
        };
        assert!(concept.sample_questions().is_empty());
        let json = serde_json::to_string(&concept).expect("serialize");
        assert!(!json.contains("assessment"));
    }
}

//! Synthesis checkpoints: the static prompt and the adaptive-phase seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use feedforge_shared::{Concept, Result};

/// Fewest concepts handed to a synthesis phase generator.
pub const MIN_SYNTHESIS_CONCEPTS: usize = 3;

/// Concept summary handed to a [`SynthesisPhaseGenerator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisConcept {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub concept_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&Concept> for SynthesisConcept {
    fn from(concept: &Concept) -> Self {
        Self {
            id: concept.id.clone(),
            name: concept.name.clone(),
            concept_type: concept.concept_type.clone(),
            description: concept.description.clone(),
        }
    }
}

/// Builds the interactions of a performance-adaptive synthesis phase.
///
/// Implementations decide how many interactions to return for a given
/// performance; the assembler only forwards the payload.
#[async_trait]
pub trait SynthesisPhaseGenerator: Send + Sync {
    async fn generate(
        &self,
        concepts: &[SynthesisConcept],
        performance_pct: u8,
    ) -> Result<Vec<serde_json::Value>>;
}

/// Repeat `concepts` cyclically until there are at least
/// [`MIN_SYNTHESIS_CONCEPTS`]. An empty list stays empty.
pub fn pad_concepts(concepts: Vec<SynthesisConcept>) -> Vec<SynthesisConcept> {
    if concepts.is_empty() || concepts.len() >= MIN_SYNTHESIS_CONCEPTS {
        return concepts;
    }
    concepts
        .iter()
        .cycle()
        .take(MIN_SYNTHESIS_CONCEPTS)
        .cloned()
        .collect()
}

/// Clamp a performance score into `0..=100`. NaN counts as zero.
pub fn clamp_performance(performance: f64) -> u8 {
    if performance.is_nan() {
        return 0;
    }
    performance.clamp(0.0, 100.0).round() as u8
}

/// Prompt for a static synthesis checkpoint over `topics`.
pub fn synthesis_prompt(topics: &[String]) -> String {
    match topics {
        [] => "Take a moment to recap what you just learned.".to_string(),
        [only] => format!("Summarize the key idea of \"{only}\" in your own words."),
        [init @ .., last] => format!(
            "How do {} and {} connect? Explain the relationship in your own words.",
            init.join(", "),
            last
        ),
    }
}

//! Pretest phase: diagnostic questions over prerequisite concepts.

use serde::{Deserialize, Serialize};

use crate::item::{
    FeedItem, ItemPrefix, PretestItem, PretestResultsItem, Recommendation, item_id,
};

/// Authored prerequisite questions for one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrerequisiteData {
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prerequisite {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub questions: Vec<PretestQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PretestQuestion {
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: String,
}

impl PrerequisiteData {
    pub fn is_empty(&self) -> bool {
        self.prerequisites.is_empty()
    }

    pub fn total_questions(&self) -> usize {
        self.prerequisites.iter().map(|p| p.questions.len()).sum()
    }
}

/// Pretest items followed by one zeroed results item, numbered from
/// `start_index`. No prerequisites means no pretest at all.
pub fn build_pretest(source_id: &str, data: &PrerequisiteData, start_index: usize) -> Vec<FeedItem> {
    if data.is_empty() {
        return Vec::new();
    }

    let total_questions = data.total_questions();
    let mut items = Vec::with_capacity(total_questions + 1);
    let mut index = start_index;

    let questions = data
        .prerequisites
        .iter()
        .flat_map(|p| p.questions.iter().map(move |q| (p, q)));
    for (number, (prerequisite, question)) in questions.enumerate() {
        items.push(FeedItem::Pretest(PretestItem {
            id: item_id(ItemPrefix::Pretest, source_id, index),
            prerequisite_id: prerequisite.id.clone(),
            prerequisite_name: prerequisite.name.clone(),
            question_text: question.question_text.clone(),
            options: question.options.clone(),
            correct_index: question.correct_index,
            explanation: question.explanation.clone(),
            question_number: number + 1,
            total_questions,
        }));
        index += 1;
    }

    items.push(FeedItem::PretestResults(PretestResultsItem {
        id: item_id(ItemPrefix::PretestResults, source_id, index),
        total_prerequisites: data.prerequisites.len(),
        total_questions,
        correct_count: 0,
        percentage: 0,
        recommendation: Recommendation::ReviewRequired,
    }));

    items
}

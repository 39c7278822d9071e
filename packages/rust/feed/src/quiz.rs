//! Quiz card construction from concept sample questions.

use rand::Rng;
use rand::seq::SliceRandom;

use feedforge_shared::{Concept, QuestionType};

use crate::item::QuizItem;

/// Build a quiz from one of `concept`'s sample questions, chosen uniformly.
///
/// Returns `None` when the concept has no sample questions.
pub fn build_quiz<R: Rng + ?Sized>(
    id: String,
    concept: &Concept,
    source_item_id: &str,
    rng: &mut R,
) -> Option<QuizItem> {
    let question = concept.sample_questions().choose(rng)?;

    let mut options = Vec::with_capacity(question.distractors.len() + 1);
    options.push(question.correct_answer.clone());
    for distractor in &question.distractors {
        if !options.contains(distractor) {
            options.push(distractor.clone());
        }
    }
    if question.question_type == QuestionType::TrueFalse && options.len() == 1 {
        let other = if question.correct_answer.eq_ignore_ascii_case("true") {
            "False"
        } else {
            "True"
        };
        options.push(other.to_string());
    }
    options.shuffle(rng);

    Some(QuizItem {
        id,
        concept_id: concept.id.clone(),
        source_item_id: source_item_id.to_string(),
        question_type: question.question_type,
        question_text: question.question_text.clone(),
        correct_answer: question.correct_answer.clone(),
        options,
    })
}

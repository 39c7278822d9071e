//! Remediation splicing: mini-lessons and sandbox exercises inserted into an
//! already assembled feed.
//!
//! Inserted items are numbered from the feed's current length, which keeps
//! ids unique for feeds produced by the assembler.

use serde::{Deserialize, Serialize};

use crate::item::{FeedItem, ItemPrefix, MiniLessonItem, SandboxItem, item_id};

/// Authored remediation content for a prerequisite gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiniLesson {
    pub prerequisite_id: String,
    pub title: String,
    pub content_markdown: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    pub estimated_minutes: u32,
}

/// Authored hands-on exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxExercise {
    pub title: String,
    pub instructions: String,
    #[serde(default)]
    pub starter_code: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Insert `lessons` immediately after position `after` of `feed`.
///
/// An empty lesson list returns `feed` untouched. A position past the end
/// appends.
pub fn insert_mini_lessons(
    feed: Vec<FeedItem>,
    source_id: &str,
    lessons: &[MiniLesson],
    after: usize,
) -> Vec<FeedItem> {
    if lessons.is_empty() {
        return feed;
    }
    let first_index = feed.len();
    let items = lessons.iter().enumerate().map(|(i, lesson)| {
        FeedItem::MiniLesson(MiniLessonItem {
            id: item_id(ItemPrefix::MiniLesson, source_id, first_index + i),
            prerequisite_id: lesson.prerequisite_id.clone(),
            title: lesson.title.clone(),
            content_markdown: lesson.content_markdown.clone(),
            key_points: lesson.key_points.clone(),
            estimated_minutes: lesson.estimated_minutes,
        })
    });
    splice_after(feed, after, items.collect())
}

/// Insert `exercises` immediately after position `after` of `feed`, with the
/// same rules as [`insert_mini_lessons`].
pub fn insert_sandbox_exercises(
    feed: Vec<FeedItem>,
    source_id: &str,
    exercises: &[SandboxExercise],
    after: usize,
) -> Vec<FeedItem> {
    if exercises.is_empty() {
        return feed;
    }
    let first_index = feed.len();
    let items = exercises.iter().enumerate().map(|(i, exercise)| {
        FeedItem::Sandbox(SandboxItem {
            id: item_id(ItemPrefix::Sandbox, source_id, first_index + i),
            title: exercise.title.clone(),
            instructions: exercise.instructions.clone(),
            starter_code: exercise.starter_code.clone(),
            language: exercise.language.clone(),
        })
    });
    splice_after(feed, after, items.collect())
}

fn splice_after(mut feed: Vec<FeedItem>, after: usize, items: Vec<FeedItem>) -> Vec<FeedItem> {
    let at = after.saturating_add(1).min(feed.len());
    feed.splice(at..at, items);
    feed
}

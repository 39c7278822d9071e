//! Content units: the segmented material a feed is assembled from.

use serde::{Deserialize, Serialize};

use feedforge_shared::{Chunk, VideoSegment};

/// Segmented source material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentSource {
    Video(VideoSegment),
    Text(Chunk),
}

/// One unit of content plus the metadata the assembler uses for quizzes,
/// facts, and synthesis topics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentUnit {
    pub source: ContentSource,
    /// Explicit concept association; must name a supplied concept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Short summary, preferred as fact text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl ContentUnit {
    pub fn video(segment: VideoSegment) -> Self {
        Self::from_source(ContentSource::Video(segment))
    }

    pub fn text(chunk: Chunk) -> Self {
        Self::from_source(ContentSource::Text(chunk))
    }

    fn from_source(source: ContentSource) -> Self {
        Self {
            source,
            concept_id: None,
            title: None,
            summary: None,
        }
    }

    pub fn with_concept(mut self, concept_id: impl Into<String>) -> Self {
        self.concept_id = Some(concept_id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn is_video(&self) -> bool {
        matches!(self.source, ContentSource::Video(_))
    }

    pub fn raw_text(&self) -> &str {
        match &self.source {
            ContentSource::Video(s) => &s.text,
            ContentSource::Text(c) => &c.text,
        }
    }

    /// First non-blank proposition (text) or sentence (video).
    pub fn first_statement(&self) -> Option<&str> {
        let statements = match &self.source {
            ContentSource::Video(s) => &s.sentences,
            ContentSource::Text(c) => &c.propositions,
        };
        statements
            .iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }

    /// Text for a fact card: summary, else first statement, else the raw text
    /// cut to `max_chars`.
    pub fn fact_text(&self, max_chars: usize) -> String {
        if let Some(summary) = self.summary.as_deref().map(str::trim) {
            if !summary.is_empty() {
                return summary.to_string();
            }
        }
        match self.first_statement() {
            Some(statement) => statement.to_string(),
            None => truncate_chars(self.raw_text().trim(), max_chars),
        }
    }

    /// Human-readable label: the title, else a short excerpt of the text.
    pub fn label(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => truncate_chars(self.raw_text().trim(), 60),
        }
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `…`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

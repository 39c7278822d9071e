//! Proposition decomposition: prose in, atomic self-contained statements out.
//!
//! Oversized input is split at paragraph, then sentence, boundaries so each
//! LLM call stays under the configured character budget. Sub-chunks are
//! decomposed sequentially and their propositions concatenated in order.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info, instrument};

use feedforge_shared::{FeedForgeError, LlmSection, Result};

use crate::llm::{ChatCompletions, TextGenerator};

/// Turns raw prose into an ordered list of propositions.
#[async_trait]
pub trait Decomposer: Send + Sync {
    async fn decompose(&self, text: &str) -> Result<Vec<String>>;
}

/// Default per-call input budget, in characters.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 30_000;

const PROMPT_TEMPLATE: &str = "\
Decompose the following content into clear, simple propositions.

Rules:
1. Split compound sentences into simple sentences, keeping the original phrasing where possible.
2. Each proposition must be understandable on its own: replace pronouns with the full entity they refer to.
3. Keep descriptive information attached to the entity it describes.
4. Preserve the order in which ideas appear.

Respond with ONLY a JSON array of strings, for example [\"First proposition.\", \"Second proposition.\"].

Content:
";

/// [`Decomposer`] backed by any [`TextGenerator`].
pub struct LlmDecomposer {
    generator: Arc<dyn TextGenerator>,
    max_input_chars: usize,
}

impl LlmDecomposer {
    pub fn new(generator: Arc<dyn TextGenerator>, max_input_chars: usize) -> Self {
        Self {
            generator,
            max_input_chars: max_input_chars.max(1),
        }
    }

    /// Build a decomposer over the HTTP chat client described by `[llm]`.
    pub fn from_config(section: &LlmSection) -> Result<Self> {
        let client = ChatCompletions::from_config(section)?;
        Ok(Self::new(Arc::new(client), section.max_input_chars))
    }

    async fn decompose_chunk(&self, chunk: &str) -> Result<Vec<String>> {
        let prompt = format!("{PROMPT_TEMPLATE}{chunk}");
        let response = self.generator.generate(&prompt).await?;
        parse_propositions(&response)
    }
}

#[async_trait]
impl Decomposer for LlmDecomposer {
    #[instrument(skip_all, fields(chars = text.chars().count()))]
    async fn decompose(&self, text: &str) -> Result<Vec<String>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let chunks = split_for_decomposition(text, self.max_input_chars);
        debug!(sub_chunks = chunks.len(), "decomposing input");

        let mut propositions = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let mut batch = self
                .decompose_chunk(chunk)
                .await
                .map_err(FeedForgeError::decomposition_failed)?;
            debug!(sub_chunk = i, propositions = batch.len(), "sub-chunk decomposed");
            propositions.append(&mut batch);
        }

        info!(propositions = propositions.len(), "decomposition complete");
        Ok(propositions)
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parse an LLM response that should be a JSON array of strings.
///
/// Tolerates a surrounding Markdown code fence. Entries are trimmed and blank
/// entries dropped.
fn parse_propositions(response: &str) -> Result<Vec<String>> {
    static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$").expect("valid regex")
    });

    let trimmed = response.trim();
    let body = FENCE_RE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str());

    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        FeedForgeError::validation(format!("decomposition response is not JSON: {e}"))
    })?;

    let serde_json::Value::Array(items) = value else {
        return Err(FeedForgeError::validation(
            "decomposition response is not a JSON array",
        ));
    };

    items
        .into_iter()
        .filter_map(|item| match item {
            serde_json::Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| Ok(s.to_string()))
            }
            other => Some(Err(FeedForgeError::validation(format!(
                "decomposition entry is not a string: {other}"
            )))),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Input splitting
// ---------------------------------------------------------------------------

/// Split `text` into pieces of at most `max_chars` characters, preferring
/// paragraph boundaries, then sentence boundaries, then raw char positions.
pub fn split_for_decomposition(text: &str, max_chars: usize) -> Vec<String> {
    static PARAGRAPH_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

    let max_chars = max_chars.max(1);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if char_len(trimmed) <= max_chars {
        return vec![trimmed.to_string()];
    }

    let mut pieces: Vec<String> = Vec::new();
    for paragraph in PARAGRAPH_RE.split(trimmed) {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        if char_len(paragraph) <= max_chars {
            pieces.push(paragraph.to_string());
            continue;
        }
        for sentence in split_sentences(paragraph) {
            if char_len(&sentence) <= max_chars {
                pieces.push(sentence);
            } else {
                pieces.extend(hard_split(&sentence, max_chars));
            }
        }
    }

    pack(pieces, max_chars)
}

/// Greedily join adjacent pieces while they fit the budget.
fn pack(pieces: Vec<String>, max_chars: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for piece in pieces {
        let piece_len = char_len(&piece);
        let joined_len = if current.is_empty() {
            piece_len
        } else {
            current_len + 2 + piece_len
        };

        if joined_len <= max_chars {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(&piece);
            current_len = joined_len;
        } else {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            current = piece;
            current_len = piece_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_sentences(paragraph: &str) -> Vec<String> {
    static SENTENCE_END_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"[.!?]+["')\]]*\s+"#).expect("valid regex"));

    let mut sentences = Vec::new();
    let mut last = 0;
    for m in SENTENCE_END_RE.find_iter(paragraph) {
        let sentence = paragraph[last..m.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        last = m.end();
    }
    let rest = paragraph[last..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

fn hard_split(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|c| c.iter().collect::<String>())
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use feedforge_shared::ErrorCode;

    /// Replays canned responses and records the prompts it saw.
    struct ScriptedGenerator {
        responses: Mutex<Vec<Result<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().rev().collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok("[]".to_string()))
        }
    }

    #[test]
    fn parse_plain_array() {
        let props = parse_propositions(r#"["The sky is blue.", "  ", " Water is wet. "]"#).unwrap();
        assert_eq!(props, vec!["The sky is blue.", "Water is wet."]);
    }

    #[test]
    fn parse_fenced_array() {
        let response = "```json\n[\"Cells divide.\"]\n```";
        assert_eq!(parse_propositions(response).unwrap(), vec!["Cells divide."]);
    }

    #[test]
    fn parse_rejects_non_array() {
        let err = parse_propositions(r#"{"propositions": []}"#).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = parse_propositions("not json at all").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn split_short_text_is_single_chunk() {
        let chunks = split_for_decomposition("  One paragraph only.  ", 100);
        assert_eq!(chunks, vec!["One paragraph only."]);
        assert!(split_for_decomposition("   ", 100).is_empty());
    }

    #[test]
    fn split_packs_paragraphs_under_budget() {
        let text = "Alpha beta gamma.\n\nDelta epsilon.\n\nZeta eta theta iota.";
        let chunks = split_for_decomposition(text, 35);
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 35, "chunk too long: {chunk:?}");
        }
        assert!(chunks[0].starts_with("Alpha"));
        assert!(chunks.last().unwrap().ends_with("iota."));
    }

    #[test]
    fn split_long_paragraph_at_sentences() {
        let text = "First sentence here. Second sentence here! Third sentence here?";
        let chunks = split_for_decomposition(text, 25);
        assert_eq!(
            chunks,
            vec![
                "First sentence here.",
                "Second sentence here!",
                "Third sentence here?"
            ]
        );
    }

    #[test]
    fn split_hard_splits_giant_sentence() {
        let text = "x".repeat(25);
        let chunks = split_for_decomposition(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[tokio::test]
    async fn decompose_concatenates_sub_chunks_in_order() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok(r#"["A one.", "A two."]"#.to_string()),
            Ok(r#"["B one."]"#.to_string()),
        ]));
        let decomposer = LlmDecomposer::new(generator.clone(), 20);

        let props = decomposer
            .decompose("Paragraph A text.\n\nParagraph B text.")
            .await
            .unwrap();

        assert_eq!(props, vec!["A one.", "A two.", "B one."]);
        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].ends_with("Paragraph A text."));
    }

    #[tokio::test]
    async fn decompose_wraps_failures() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Err(FeedForgeError::Network(
            "connection reset".into(),
        ))]));
        let decomposer = LlmDecomposer::new(generator, DEFAULT_MAX_INPUT_CHARS);

        let err = decomposer.decompose("Some text.").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::DecompositionFailed);
        assert_eq!(err.original_code(), None);
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn decompose_non_array_keeps_validation_code() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok("\"just a string\"".into())]));
        let decomposer = LlmDecomposer::new(generator, DEFAULT_MAX_INPUT_CHARS);

        let err = decomposer.decompose("Some text.").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::DecompositionFailed);
        assert_eq!(err.original_code(), Some(ErrorCode::ValidationError));
    }

    #[tokio::test]
    async fn decompose_blank_input_makes_no_calls() {
        let generator = Arc::new(ScriptedGenerator::new(vec![]));
        let decomposer = LlmDecomposer::new(generator.clone(), 100);
        assert!(decomposer.decompose(" \n ").await.unwrap().is_empty());
        assert!(generator.prompts.lock().unwrap().is_empty());
    }
}

//! Outline generation: document text → markdown heading hierarchy.
//!
//! Long inputs are cut to a character limit before prompting. The cut is
//! lossy on purpose: the tail of a long document is dropped rather than the
//! request failing or being chunked, and callers are told it happened.

use crate::error::MindmapError;
use crate::output::OutlineDocument;
use crate::pipeline::llm::InferenceClient;
use crate::progress::{ProgressCallback, Stage};
use crate::prompts;
use std::borrow::Cow;
use tracing::{info, warn};

/// Appended to text cut at a character limit.
pub const TRUNCATION_MARKER: &str = "...";

/// Text prepared for a prompt, possibly cut to a limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedText<'a> {
    pub text: Cow<'a, str>,
    pub truncated: bool,
    /// Characters in the original, uncut text.
    pub original_chars: usize,
}

/// Cut `text` to `limit` characters plus [`TRUNCATION_MARKER`] when it is
/// longer than `limit`. `None` means no limit.
///
/// Lengths count Unicode scalar values, so a cut never splits a character.
pub fn truncate_chars(text: &str, limit: Option<usize>) -> PreparedText<'_> {
    let original_chars = text.chars().count();
    match limit {
        Some(limit) if original_chars > limit => {
            let cut = text
                .char_indices()
                .nth(limit)
                .map_or(text.len(), |(idx, _)| idx);
            let mut out = String::with_capacity(cut + TRUNCATION_MARKER.len());
            out.push_str(&text[..cut]);
            out.push_str(TRUNCATION_MARKER);
            PreparedText {
                text: Cow::Owned(out),
                truncated: true,
                original_chars,
            }
        }
        _ => PreparedText {
            text: Cow::Borrowed(text),
            truncated: false,
            original_chars,
        },
    }
}

/// Apply `limit` for `stage`, logging and reporting a cut if one happens.
pub(crate) fn prepare<'a>(
    text: &'a str,
    limit: Option<usize>,
    stage: Stage,
    progress: Option<&ProgressCallback>,
) -> PreparedText<'a> {
    let prepared = truncate_chars(text, limit);
    if prepared.truncated {
        let limit = limit.unwrap_or_default();
        warn!(
            "Text was truncated to {} characters due to length limitations ({} characters in document).",
            limit, prepared.original_chars
        );
        if let Some(cb) = progress {
            cb.on_truncated(stage, prepared.original_chars, limit);
        }
    }
    prepared
}

/// Ask the model for a markdown outline of `text`.
///
/// The trimmed reply is returned unchanged; a blank reply or a failed call
/// is [`MindmapError::GenerationFailed`].
pub async fn generate_outline(
    client: &dyn InferenceClient,
    text: &str,
    limit: Option<usize>,
    progress: Option<&ProgressCallback>,
) -> Result<OutlineDocument, MindmapError> {
    if let Some(cb) = progress {
        cb.on_stage_start(Stage::Outline);
    }

    let prepared = prepare(text, limit, Stage::Outline, progress);
    let input_chars = prepared.text.chars().count();
    info!("Generating outline with {} ({} chars)", client.model(), input_chars);

    let reply = client
        .generate(&prompts::outline_prompt(&prepared.text))
        .await
        .map_err(|e| MindmapError::GenerationFailed {
            stage: Stage::Outline,
            reason: e.to_string(),
        })?;

    let markdown = reply.trim();
    if markdown.is_empty() {
        return Err(MindmapError::GenerationFailed {
            stage: Stage::Outline,
            reason: "Received empty response from the model".into(),
        });
    }

    if let Some(cb) = progress {
        cb.on_stage_complete(Stage::Outline, markdown.chars().count());
    }

    Ok(OutlineDocument {
        markdown: markdown.to_string(),
        truncated: prepared.truncated,
        input_chars,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InferenceError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Canned {
        reply: Result<String, InferenceError>,
        prompts: Mutex<Vec<String>>,
    }

    impl Canned {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl InferenceClient for Canned {
        fn model(&self) -> &str {
            "canned"
        }
        async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone()
        }
    }

    #[test]
    fn short_text_is_borrowed_unchanged() {
        let p = truncate_chars("hello", Some(10));
        assert!(!p.truncated);
        assert!(matches!(p.text, Cow::Borrowed("hello")));
    }

    #[test]
    fn text_at_limit_is_not_truncated() {
        let text = "a".repeat(30_000);
        let p = truncate_chars(&text, Some(30_000));
        assert!(!p.truncated);
        assert_eq!(p.text.len(), 30_000);
    }

    #[test]
    fn long_text_is_cut_to_limit_plus_marker() {
        let text = "b".repeat(30_001);
        let p = truncate_chars(&text, Some(30_000));
        assert!(p.truncated);
        assert_eq!(p.original_chars, 30_001);
        assert_eq!(p.text.chars().count(), 30_000 + TRUNCATION_MARKER.len());
        assert!(p.text.ends_with("b..."));
    }

    #[test]
    fn cut_respects_multibyte_characters() {
        let text = "é".repeat(10);
        let p = truncate_chars(&text, Some(4));
        assert_eq!(p.text, "éééé...");
    }

    #[test]
    fn no_limit_never_truncates() {
        let text = "c".repeat(100_000);
        assert!(!truncate_chars(&text, None).truncated);
    }

    #[tokio::test]
    async fn reply_is_trimmed_not_validated() {
        let client = Canned::ok("\n\n  ### not top level\nfree text  \n");
        let outline = generate_outline(&client, "doc", Some(30_000), None).await.unwrap();
        assert_eq!(outline.markdown, "### not top level\nfree text");
        assert!(!outline.truncated);
        assert_eq!(outline.input_chars, 3);
    }

    #[tokio::test]
    async fn blank_reply_fails() {
        let client = Canned::ok(" \n\t ");
        let err = generate_outline(&client, "doc", None, None).await.unwrap_err();
        assert!(matches!(
            err,
            MindmapError::GenerationFailed {
                stage: Stage::Outline,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn call_error_fails_generation() {
        let client = Canned {
            reply: Err(InferenceError::Api {
                status: 500,
                body: "boom".into(),
            }),
            prompts: Mutex::new(Vec::new()),
        };
        let err = generate_outline(&client, "doc", None, None).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn truncated_text_is_what_the_model_sees() {
        let client = Canned::ok("# T");
        let text = format!("{}{}", "x".repeat(30_000), "TAIL");
        let outline = generate_outline(&client, &text, Some(30_000), None).await.unwrap();
        assert!(outline.truncated);
        assert_eq!(outline.input_chars, 30_003);

        let prompt = client.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains(&format!("{}...", "x".repeat(30_000))));
        assert!(!prompt.contains("TAIL"));
    }
}

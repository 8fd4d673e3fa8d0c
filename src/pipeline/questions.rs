//! Comprehension-question generation.
//!
//! The reply is trimmed and split into lines; every line becomes one entry.
//! Blank lines and list numbering are kept as the model wrote them.

use crate::error::MindmapError;
use crate::output::QuestionList;
use crate::pipeline::llm::InferenceClient;
use crate::pipeline::outline::prepare;
use crate::progress::{ProgressCallback, Stage};
use crate::prompts;
use tracing::info;

/// Split a model reply into question entries, one per line.
pub fn split_questions(reply: &str) -> QuestionList {
    QuestionList(reply.trim().lines().map(str::to_string).collect())
}

/// Ask the model for comprehension questions about `text`.
///
/// `limit` is the question character limit; `None` sends the whole text.
pub async fn generate_questions(
    client: &dyn InferenceClient,
    text: &str,
    limit: Option<usize>,
    progress: Option<&ProgressCallback>,
) -> Result<QuestionList, MindmapError> {
    if let Some(cb) = progress {
        cb.on_stage_start(Stage::Questions);
    }

    let prepared = prepare(text, limit, Stage::Questions, progress);
    info!(
        "Generating questions with {} ({} chars)",
        client.model(),
        prepared.text.chars().count()
    );

    let reply = client
        .generate(&prompts::questions_prompt(&prepared.text))
        .await
        .map_err(|e| MindmapError::GenerationFailed {
            stage: Stage::Questions,
            reason: e.to_string(),
        })?;

    if reply.trim().is_empty() {
        return Err(MindmapError::GenerationFailed {
            stage: Stage::Questions,
            reason: "Received empty response from the model".into(),
        });
    }

    let questions = split_questions(&reply);
    if let Some(cb) = progress {
        cb.on_stage_complete(Stage::Questions, questions.len());
    }
    Ok(questions)
}

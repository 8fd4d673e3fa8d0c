//! Top-level entry points.
//!
//! [`generate_mindmap`] runs the whole pipeline; the stage functions
//! ([`extract_text`], [`generate_outline`], [`render_mindmap`],
//! [`generate_questions`]) let hosts drive it step by step, e.g. to show the
//! mind-map first and generate questions only when asked.

use crate::config::PipelineConfig;
use crate::error::MindmapError;
use crate::output::{ExtractedText, OutlineDocument, PipelineOutput, QuestionList};
use crate::pipeline::mindmap::{render_mindmap_html, MarkmapOptions};
use crate::pipeline::{extract, input, llm, outline, questions};
use crate::progress::Stage;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// File name of the mind-map HTML artifact.
pub const MINDMAP_HTML_FILE: &str = "interactive_mindmap.html";
/// File name of the raw markdown artifact.
pub const MINDMAP_MARKDOWN_FILE: &str = "mindmap.md";
/// File name of the questions artifact.
pub const QUESTIONS_FILE: &str = "questions.md";

/// Extract text from a PDF file path or HTTP/HTTPS URL.
///
/// Does not require an API key.
pub async fn extract_text(
    input_str: impl AsRef<str>,
    config: &PipelineConfig,
) -> Result<ExtractedText, MindmapError> {
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    extract::extract_path(resolved.path(), config).await
}

/// Extract text from PDF bytes held in memory.
///
/// The bytes are written to a temporary file that is deleted when this
/// function returns, whether extraction succeeded or not.
pub async fn extract_text_from_bytes(
    bytes: &[u8],
    config: &PipelineConfig,
) -> Result<ExtractedText, MindmapError> {
    let resolved = input::persist_bytes(bytes)?;
    extract::extract_path(resolved.path(), config).await
}

/// Generate the markdown outline for already-extracted text.
pub async fn generate_outline(
    text: &ExtractedText,
    config: &PipelineConfig,
) -> Result<OutlineDocument, MindmapError> {
    let client = llm::resolve_client(config)?;
    outline::generate_outline(
        client.as_ref(),
        &text.text,
        config.outline_char_limit,
        config.progress_callback.as_ref(),
    )
    .await
}

/// Generate comprehension questions for already-extracted text.
pub async fn generate_questions(
    text: &ExtractedText,
    config: &PipelineConfig,
) -> Result<QuestionList, MindmapError> {
    let client = llm::resolve_client(config)?;
    questions::generate_questions(
        client.as_ref(),
        &text.text,
        config.question_char_limit,
        config.progress_callback.as_ref(),
    )
    .await
}

/// Render an outline into the mind-map HTML document.
pub fn render_mindmap(outline: &OutlineDocument, config: &PipelineConfig) -> String {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(Stage::Render);
    }
    let html = render_mindmap_html(&outline.markdown, &MarkmapOptions::default(), config.embed_mode);
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(Stage::Render, html.len());
    }
    html
}

/// Run the full pipeline on a PDF file path or HTTP/HTTPS URL.
///
/// The inference client is resolved before any extraction work, so a
/// missing credential fails immediately with
/// [`MindmapError::ConfigurationMissing`].
pub async fn generate_mindmap(
    input_str: impl AsRef<str>,
    config: &PipelineConfig,
) -> Result<PipelineOutput, MindmapError> {
    let input_str = input_str.as_ref();
    info!("Starting mindmap generation: {}", input_str);

    let client = llm::resolve_client(config)?;
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    run(resolved.path(), client.as_ref(), config).await
}

/// Run the full pipeline on PDF bytes held in memory.
pub async fn generate_mindmap_from_bytes(
    bytes: &[u8],
    config: &PipelineConfig,
) -> Result<PipelineOutput, MindmapError> {
    let client = llm::resolve_client(config)?;
    let resolved = input::persist_bytes(bytes)?;
    run(resolved.path(), client.as_ref(), config).await
}

/// Synchronous wrapper around [`generate_mindmap`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_mindmap_sync(
    input_str: impl AsRef<str>,
    config: &PipelineConfig,
) -> Result<PipelineOutput, MindmapError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| MindmapError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_mindmap(input_str, config))
}

async fn run(
    pdf_path: &Path,
    client: &dyn llm::InferenceClient,
    config: &PipelineConfig,
) -> Result<PipelineOutput, MindmapError> {
    let start = Instant::now();
    let progress = config.progress_callback.as_ref();

    let extracted = extract::extract_path(pdf_path, config).await?;
    let outline = outline::generate_outline(
        client,
        &extracted.text,
        config.outline_char_limit,
        progress,
    )
    .await?;
    let html = render_mindmap(&outline, config);

    let questions = if config.generate_questions {
        Some(
            questions::generate_questions(
                client,
                &extracted.text,
                config.question_char_limit,
                progress,
            )
            .await?,
        )
    } else {
        None
    };

    info!(
        "Pipeline complete: {} chars extracted via {:?}, {} headings, {}ms",
        extracted.char_count(),
        extracted.method,
        outline.headings().len(),
        start.elapsed().as_millis()
    );

    Ok(PipelineOutput {
        extracted,
        outline,
        html,
        questions,
    })
}

/// Paths of the artifacts written by [`write_artifacts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub html: PathBuf,
    pub markdown: PathBuf,
    pub questions: Option<PathBuf>,
}

/// Write the mind-map HTML, the markdown and (if present) the questions
/// into `dir`.
///
/// Each file is written to a temporary sibling and renamed into place, so a
/// failure never leaves a half-written artifact behind.
pub async fn write_artifacts(
    output: &PipelineOutput,
    dir: impl AsRef<Path>,
) -> Result<ArtifactPaths, MindmapError> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| MindmapError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let html = dir.join(MINDMAP_HTML_FILE);
    write_atomic(&html, output.html.as_bytes())?;

    let markdown = dir.join(MINDMAP_MARKDOWN_FILE);
    write_atomic(&markdown, output.outline.markdown.as_bytes())?;

    let questions = match output.questions {
        Some(ref qs) => {
            let path = dir.join(QUESTIONS_FILE);
            write_atomic(&path, qs.to_markdown().as_bytes())?;
            Some(path)
        }
        None => None,
    };

    Ok(ArtifactPaths {
        html,
        markdown,
        questions,
    })
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), MindmapError> {
    let write_failed = |source: std::io::Error| MindmapError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    // Deleted on drop unless persisted, so a failed write leaves nothing behind.
    let mut tmp = tempfile::Builder::new()
        .prefix(".pdf2mindmap-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_failed)?;
    tmp.write_all(contents)
        .and_then(|_| tmp.flush())
        .map_err(write_failed)?;
    tmp.persist(path).map_err(|e| write_failed(e.error))?;
    Ok(())
}

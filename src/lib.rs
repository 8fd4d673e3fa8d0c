//! # pdf2mindmap
//!
//! Turn a PDF into an interactive mind-map, and optionally a set of
//! comprehension questions.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file, download from URL, or spool bytes
//!  ├─ 2. Extract    embedded text layer via pdfium; OCR when it is empty
//!  ├─ 3. Outline    LLM turns the text into a markdown heading hierarchy
//!  ├─ 4. Render     markdown → self-contained markmap HTML page
//!  └─ 5. Questions  (on demand) LLM writes comprehension questions
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2mindmap::{generate_mindmap, write_artifacts, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder()
//!         .api_key(std::env::var("GOOGLE_API_KEY")?)
//!         .generate_questions(true)
//!         .build()?;
//!     let output = generate_mindmap("lecture.pdf", &config).await?;
//!     println!("{}", output.outline.markdown);
//!     write_artifacts(&output, "out").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2mindmap` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2mindmap = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime Requirements
//!
//! * A pdfium shared library (see [`PdfiumBackend`] for the search order).
//! * For OCR with the default engine, the `tesseract` executable on `PATH`.
//! * A Gemini API key, unless another provider or an [`InferenceClient`] is
//!   configured. Extraction alone needs no key.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OcrEngineKind, PipelineConfig, PipelineConfigBuilder, API_KEY_ENV, DEFAULT_MODEL};
pub use convert::{
    extract_text, extract_text_from_bytes, generate_mindmap, generate_mindmap_from_bytes,
    generate_mindmap_sync, generate_outline, generate_questions, render_mindmap, write_artifacts,
    ArtifactPaths,
};
pub use error::{InferenceError, MindmapError};
pub use output::{
    ExtractedText, ExtractionMethod, Heading, OutlineDocument, PipelineOutput, QuestionList,
};
pub use pipeline::extract::ExtractionStrategy;
pub use pipeline::llm::{GeminiClient, InferenceClient, ProviderClient};
pub use pipeline::mindmap::{escape_template_literal, EmbedMode, MarkmapOptions};
pub use pipeline::ocr::{OcrEngine, TesseractOcr, VisionOcr};
pub use pipeline::render::{PdfBackend, PdfiumBackend};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback, Stage};

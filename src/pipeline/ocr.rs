//! OCR engines: turn a rasterised page into text.
//!
//! Two engines ship with the crate:
//!
//! * [`TesseractOcr`] — runs the `tesseract` CLI on a temporary PNG. Free,
//!   offline, and the default.
//! * [`VisionOcr`] — sends the page PNG to a vision-capable model through
//!   `edgequake-llm`. Costs tokens but copes better with handwriting and
//!   noisy scans.
//!
//! Callers may also supply their own [`OcrEngine`] through
//! [`crate::config::PipelineConfig::ocr_engine`].

use crate::config::{OcrEngineKind, PipelineConfig};
use crate::error::MindmapError;
use crate::pipeline::encode;
use crate::prompts::VISION_OCR_PROMPT;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use image::DynamicImage;
use std::io::Write;
use std::sync::Arc;
use tokio::process::Command;
use tracing::debug;

/// Recognises the text on one page image.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Recognise the text on `image`. `page_num` is 1-indexed and only used
    /// for diagnostics. An empty string means "no text on this page".
    async fn recognize(&self, image: &DynamicImage, page_num: usize) -> Result<String, MindmapError>;
}

/// Build the OCR engine the config asks for.
pub fn resolve_engine(config: &PipelineConfig) -> Result<Arc<dyn OcrEngine>, MindmapError> {
    if let Some(ref engine) = config.ocr_engine {
        return Ok(Arc::clone(engine));
    }

    match config.ocr {
        OcrEngineKind::Tesseract { ref language } => Ok(Arc::new(TesseractOcr::new(language))),
        OcrEngineKind::Vision {
            ref provider,
            ref model,
        } => {
            let llm = ProviderFactory::create_llm_provider(provider, model).map_err(|e| {
                MindmapError::OcrUnavailable {
                    engine: format!("{} ({provider}/{model})", config.ocr.name()),
                    hint: format!("{e}"),
                }
            })?;
            Ok(Arc::new(VisionOcr::new(llm, config.max_tokens)))
        }
    }
}

// ── Tesseract ────────────────────────────────────────────────────────────

/// OCR through the `tesseract` command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    language: String,
    binary: String,
}

impl TesseractOcr {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            binary: "tesseract".to_string(),
        }
    }

    /// Use a specific tesseract executable instead of the one on `PATH`.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image: &DynamicImage, page_num: usize) -> Result<String, MindmapError> {
        let png = encode::encode_png(image).map_err(|e| MindmapError::RasterisationFailed {
            page: page_num,
            detail: format!("PNG encoding failed: {e}"),
        })?;

        // Removed when `tmp` drops at the end of this call.
        let mut tmp = tempfile::Builder::new()
            .prefix("pdf2mindmap-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| MindmapError::Internal(format!("tempfile: {e}")))?;
        tmp.write_all(&png)
            .and_then(|_| tmp.flush())
            .map_err(|e| MindmapError::Internal(format!("tempfile write: {e}")))?;

        let output = Command::new(&self.binary)
            .arg(tmp.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MindmapError::OcrUnavailable {
                        engine: format!("tesseract ({})", self.language()),
                        hint: format!(
                            "'{}' was not found on PATH. Install tesseract-ocr or use --ocr-engine vision.",
                            self.binary
                        ),
                    }
                } else {
                    MindmapError::ExtractionFailed {
                        reason: format!("failed to run tesseract on page {page_num}: {e}"),
                    }
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MindmapError::ExtractionFailed {
                reason: format!("tesseract failed on page {page_num}: {}", stderr.trim()),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("Page {}: tesseract recognised {} chars", page_num, text.chars().count());
        Ok(text)
    }
}

// ── Vision model ─────────────────────────────────────────────────────────

/// OCR through a vision-capable model.
pub struct VisionOcr {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl VisionOcr {
    pub fn new(provider: Arc<dyn LLMProvider>, max_tokens: usize) -> Self {
        Self {
            provider,
            options: CompletionOptions {
                temperature: Some(0.0),
                max_tokens: Some(max_tokens),
                ..Default::default()
            },
        }
    }
}

#[async_trait]
impl OcrEngine for VisionOcr {
    fn name(&self) -> &str {
        "vision"
    }

    async fn recognize(&self, image: &DynamicImage, page_num: usize) -> Result<String, MindmapError> {
        let image_data = encode::encode_page(image).map_err(|e| MindmapError::RasterisationFailed {
            page: page_num,
            detail: format!("Image encoding failed: {e}"),
        })?;

        let messages = vec![
            ChatMessage::system(VISION_OCR_PROMPT),
            ChatMessage::user_with_images("", vec![image_data]),
        ];

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| MindmapError::ExtractionFailed {
                reason: format!("vision OCR failed on page {page_num}: {e}"),
            })?;

        debug!(
            "Page {}: vision OCR {} input tokens, {} output tokens",
            page_num, response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

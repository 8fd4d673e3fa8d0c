//! Text extraction: an ordered list of strategies, first non-empty result wins.
//!
//! The default order is [`ExtractionStrategy::TextLayer`] then
//! [`ExtractionStrategy::Ocr`]. A strategy whose trimmed output is empty
//! hands over to the next one; if every strategy comes back empty the
//! document fails with [`MindmapError::ExtractionFailed`].
//!
//! Page texts are joined with `\n` in page order. The text layer skips pages
//! with no embedded text; OCR keeps every page.

use crate::config::PipelineConfig;
use crate::error::MindmapError;
use crate::output::{ExtractedText, ExtractionMethod};
use crate::pipeline::ocr;
use crate::pipeline::render::{PdfBackend, PdfiumBackend};
use crate::progress::Stage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One way of getting text out of a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Read the embedded text layer.
    TextLayer,
    /// Rasterise every page and run OCR.
    Ocr,
}

impl ExtractionStrategy {
    fn stage(self) -> Stage {
        match self {
            ExtractionStrategy::TextLayer => Stage::TextLayer,
            ExtractionStrategy::Ocr => Stage::Ocr,
        }
    }

    fn method(self) -> ExtractionMethod {
        match self {
            ExtractionStrategy::TextLayer => ExtractionMethod::TextLayer,
            ExtractionStrategy::Ocr => ExtractionMethod::Ocr,
        }
    }
}

/// Extract text from the PDF at `pdf_path` using the configured strategies.
pub async fn extract_path(
    pdf_path: &Path,
    config: &PipelineConfig,
) -> Result<ExtractedText, MindmapError> {
    let backend: Arc<dyn PdfBackend> = match config.pdf_backend {
        Some(ref b) => Arc::clone(b),
        None => Arc::new(PdfiumBackend::from_config(config)),
    };

    let mut page_count = 0;
    for (i, &strategy) in config.strategies.iter().enumerate() {
        let is_last = i + 1 == config.strategies.len();
        if let Some(ref cb) = config.progress_callback {
            cb.on_stage_start(strategy.stage());
        }

        let (text, pages) = match strategy {
            ExtractionStrategy::TextLayer => {
                info!("Extracting embedded text from {}", pdf_path.display());
                text_layer(&backend, pdf_path).await?
            }
            ExtractionStrategy::Ocr => {
                info!("Running OCR on {}", pdf_path.display());
                ocr_pages(&backend, pdf_path, config).await?
            }
        };
        page_count = page_count.max(pages);

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            let extracted = ExtractedText {
                text: trimmed.to_string(),
                method: strategy.method(),
                page_count,
            };
            info!(
                "Extracted {} characters via {}",
                extracted.char_count(),
                strategy.stage()
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_stage_complete(strategy.stage(), extracted.char_count());
            }
            return Ok(extracted);
        }

        match strategy {
            ExtractionStrategy::TextLayer => {
                if is_last {
                    warn!("No text could be extracted from the PDF text layer");
                } else {
                    warn!("No text could be extracted from the PDF text layer. Attempting OCR...");
                }
                if let Some(ref cb) = config.progress_callback {
                    cb.on_text_layer_empty(pages);
                }
            }
            ExtractionStrategy::Ocr => {
                warn!("OCR failed to extract text. Ensure the PDF contains readable text or images.");
                if let Some(ref cb) = config.progress_callback {
                    cb.on_ocr_empty();
                }
            }
        }
    }

    Err(MindmapError::ExtractionFailed {
        reason: format!(
            "no text recovered from {} page(s) after trying {}",
            page_count,
            config
                .strategies
                .iter()
                .map(|s| s.stage().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    })
}

/// Join non-empty embedded page texts with `\n`.
pub fn join_text_layer(pages: &[Option<String>]) -> String {
    pages
        .iter()
        .filter_map(|p| p.as_deref())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

async fn text_layer(
    backend: &Arc<dyn PdfBackend>,
    pdf_path: &Path,
) -> Result<(String, usize), MindmapError> {
    let backend = Arc::clone(backend);
    let path = pdf_path.to_path_buf();
    let pages = tokio::task::spawn_blocking(move || backend.page_texts(&path))
        .await
        .map_err(|e| MindmapError::Internal(format!("Text extraction task panicked: {}", e)))??;

    Ok((join_text_layer(&pages), pages.len()))
}

async fn ocr_pages(
    backend: &Arc<dyn PdfBackend>,
    pdf_path: &Path,
    config: &PipelineConfig,
) -> Result<(String, usize), MindmapError> {
    let engine = ocr::resolve_engine(config)?;

    let dpi = config.dpi;
    let rasterizer = Arc::clone(backend);
    let path = pdf_path.to_path_buf();
    let images = tokio::task::spawn_blocking(move || rasterizer.rasterize(&path, dpi))
        .await
        .map_err(|e| MindmapError::Internal(format!("Render task panicked: {}", e)))??;

    let total = images.len();
    info!("Rasterised {} pages at {} DPI; OCR engine: {}", total, dpi, engine.name());

    let mut parts = Vec::with_capacity(total);
    for (idx, image) in images.iter().enumerate() {
        let page_num = idx + 1;
        let text = engine.recognize(image, page_num).await?;
        let chars = text.chars().count();
        debug!("OCR page {}/{}: {} chars", page_num, total, chars);
        if let Some(ref cb) = config.progress_callback {
            cb.on_ocr_page_complete(page_num, total, chars);
        }
        parts.push(text);
    }

    Ok((parts.join("\n"), total))
}

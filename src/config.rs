//! Configuration types for the PDF-to-mindmap pipeline.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. The credential, the model choice and every
//! collaborator (PDF backend, OCR engine, inference client) are explicit
//! fields, so a pipeline can be run in isolation with fakes and no process
//! environment at all.
//!
//! # Design choice: builder over constructor
//! Most callers set two or three knobs and rely on documented defaults for
//! the rest; the builder keeps that readable as fields are added.

use crate::error::MindmapError;
use crate::pipeline::extract::ExtractionStrategy;
use crate::pipeline::llm::InferenceClient;
use crate::pipeline::mindmap::EmbedMode;
use crate::pipeline::ocr::OcrEngine;
use crate::pipeline::render::PdfBackend;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default model for the Gemini REST client.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Environment variable the CLI reads the credential from.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Default character cap applied before outline generation.
pub const DEFAULT_OUTLINE_CHAR_LIMIT: usize = 30_000;

/// Configuration for one pipeline run.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2mindmap::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .api_key("test-key")
///     .dpi(300)
///     .generate_questions(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.outline_char_limit, Some(30_000));
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Rasterisation DPI for OCR. Range: 72–600. Default: 200.
    ///
    /// 200 DPI keeps body text legible to tesseract while page images stay
    /// small enough to hold a whole document in memory.
    pub dpi: u32,

    /// Cap on either dimension of a rasterised page, in pixels. Default: 4000.
    pub max_rendered_pixels: u32,

    /// Extraction strategies, tried in order until one yields text.
    /// Default: text layer, then OCR.
    pub strategies: Vec<ExtractionStrategy>,

    /// Which OCR engine to build when [`Self::ocr_engine`] is not set.
    pub ocr: OcrEngineKind,

    /// Pre-constructed OCR engine. Takes precedence over `ocr`.
    pub ocr_engine: Option<Arc<dyn OcrEngine>>,

    /// Pre-constructed PDF backend. Default: pdfium.
    pub pdf_backend: Option<Arc<dyn PdfBackend>>,

    /// Explicit pdfium library location (file or directory).
    pub pdfium_library_path: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Credential for the Gemini API. Required for generation unless a
    /// provider or inference client is configured instead.
    pub api_key: Option<String>,

    /// Model identifier. If None, uses [`DEFAULT_MODEL`] for Gemini or the
    /// provider's default otherwise.
    pub model: Option<String>,

    /// `edgequake-llm` provider name (e.g. "openai", "anthropic", "ollama").
    /// None or "gemini" selects the built-in Gemini client.
    pub provider_name: Option<String>,

    /// Pre-constructed inference client. Takes precedence over everything else.
    pub inference: Option<Arc<dyn InferenceClient>>,

    /// Sampling temperature. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens the model may generate per call. Default: 8192.
    pub max_tokens: usize,

    /// Per-call inference timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Character cap applied before outline generation. Default: 30 000.
    ///
    /// Longer texts lose their tail rather than failing or being chunked.
    pub outline_char_limit: Option<usize>,

    /// Character cap applied before question generation. Default: None.
    ///
    /// Questions see the full document unless a limit is set here.
    pub question_char_limit: Option<usize>,

    /// Run question generation as part of [`crate::generate_mindmap`]. Default: false.
    pub generate_questions: bool,

    /// How the outline is embedded in the mind-map HTML. Default: JSON payload.
    pub embed_mode: EmbedMode,

    /// Optional observer for stage transitions.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            max_rendered_pixels: 4000,
            strategies: vec![ExtractionStrategy::TextLayer, ExtractionStrategy::Ocr],
            ocr: OcrEngineKind::default(),
            ocr_engine: None,
            pdf_backend: None,
            pdfium_library_path: None,
            password: None,
            api_key: None,
            model: None,
            provider_name: None,
            inference: None,
            temperature: 0.2,
            max_tokens: 8192,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            outline_char_limit: Some(DEFAULT_OUTLINE_CHAR_LIMIT),
            question_char_limit: None,
            generate_questions: false,
            embed_mode: EmbedMode::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("strategies", &self.strategies)
            .field("ocr", &self.ocr)
            .field("ocr_engine", &self.ocr_engine.as_ref().map(|_| "<dyn OcrEngine>"))
            .field("pdf_backend", &self.pdf_backend.as_ref().map(|_| "<dyn PdfBackend>"))
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("inference", &self.inference.as_ref().map(|_| "<dyn InferenceClient>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("outline_char_limit", &self.outline_char_limit)
            .field("question_char_limit", &self.question_char_limit)
            .field("generate_questions", &self.generate_questions)
            .field("embed_mode", &self.embed_mode)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model name to use with the built-in Gemini client.
    pub fn gemini_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn strategies(mut self, strategies: Vec<ExtractionStrategy>) -> Self {
        self.config.strategies = strategies;
        self
    }

    pub fn ocr(mut self, kind: OcrEngineKind) -> Self {
        self.config.ocr = kind;
        self
    }

    pub fn ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.ocr_engine = Some(engine);
        self
    }

    pub fn pdf_backend(mut self, backend: Arc<dyn PdfBackend>) -> Self {
        self.config.pdf_backend = Some(backend);
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn inference(mut self, client: Arc<dyn InferenceClient>) -> Self {
        self.config.inference = Some(client);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn outline_char_limit(mut self, limit: Option<usize>) -> Self {
        self.config.outline_char_limit = limit;
        self
    }

    pub fn question_char_limit(mut self, limit: Option<usize>) -> Self {
        self.config.question_char_limit = limit;
        self
    }

    pub fn generate_questions(mut self, v: bool) -> Self {
        self.config.generate_questions = v;
        self
    }

    pub fn embed_mode(mut self, mode: EmbedMode) -> Self {
        self.config.embed_mode = mode;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, MindmapError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(MindmapError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.strategies.is_empty() {
            return Err(MindmapError::InvalidConfig(
                "At least one extraction strategy is required".into(),
            ));
        }
        if c.outline_char_limit == Some(0) || c.question_char_limit == Some(0) {
            return Err(MindmapError::InvalidConfig(
                "Character limits must be ≥ 1 when set".into(),
            ));
        }
        if let OcrEngineKind::Tesseract { ref language } = c.ocr {
            if language.trim().is_empty() {
                return Err(MindmapError::InvalidConfig(
                    "Tesseract language must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// The OCR engine to construct for scanned documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrEngineKind {
    /// The `tesseract` command-line tool. (default)
    Tesseract {
        /// Tesseract language code(s), e.g. "eng" or "eng+deu".
        language: String,
    },
    /// A vision-capable model reached through `edgequake-llm`.
    Vision { provider: String, model: String },
}

impl Default for OcrEngineKind {
    fn default() -> Self {
        OcrEngineKind::Tesseract {
            language: "eng".to_string(),
        }
    }
}

impl OcrEngineKind {
    /// Short engine name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            OcrEngineKind::Tesseract { .. } => "tesseract",
            OcrEngineKind::Vision { .. } => "vision",
        }
    }
}

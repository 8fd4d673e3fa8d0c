//! Error types for the pdf2mindmap library.
//!
//! Two error types reflect two layers of failure:
//!
//! * [`MindmapError`] — **Fatal** for the current request: the pipeline stops
//!   at the stage that failed and no later stage runs. Returned from every
//!   public entry point.
//!
//! * [`InferenceError`] — a single model call failed (transport, HTTP status,
//!   undecodable body). Returned by [`crate::pipeline::llm::InferenceClient`]
//!   implementations and folded into [`MindmapError::GenerationFailed`] by the
//!   generator that made the call.
//!
//! Nothing is retried. A failed request leaves no state behind, so the caller
//! can simply run it again.

use crate::progress::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2mindmap library.
#[derive(Debug, Error)]
pub enum MindmapError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is neither a file path nor an HTTP/HTTPS URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The payload was read, but it does not start with the `%PDF` header.
    #[error("Input is not a valid PDF: '{origin}'\nFirst bytes: {magic:?}")]
    NotAPdf { origin: String, magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium could not rasterise a page for OCR.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (file or directory).\n\
  • Place libpdfium next to the working directory.\n\
  • Install pdfium as a system library.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Neither the text layer nor OCR produced any text.
    #[error("Text extraction failed: {reason}")]
    ExtractionFailed { reason: String },

    /// The configured OCR engine cannot run on this machine.
    #[error("OCR engine '{engine}' is not available.\n{hint}")]
    OcrUnavailable { engine: String, hint: String },

    // ── Generation errors ─────────────────────────────────────────────────
    /// A credential or provider required for generation is missing.
    #[error("Configuration missing: {what}\n{hint}")]
    ConfigurationMissing { what: String, hint: String },

    /// The model call failed or returned a blank reply.
    #[error("{stage} generation failed: {reason}")]
    GenerationFailed { stage: Stage, reason: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failed call to the inference service.
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    /// The request never produced an HTTP response.
    #[error("request failed: {0}")]
    Http(String),

    /// The service answered with a non-success status.
    #[error("API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The service refused the prompt (safety filters, quota policy).
    #[error("prompt was blocked: {reason}")]
    Blocked { reason: String },

    /// The response body could not be decoded.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// An `edgequake-llm` provider returned an error.
    #[error("provider error: {0}")]
    Provider(String),

    /// The call did not complete within the configured timeout.
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },
}

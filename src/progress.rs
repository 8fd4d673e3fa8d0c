//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive the
//! advisory signals the pipeline emits at each stage transition: text-layer
//! attempt, fallback to OCR, each OCR page, an empty OCR result, input
//! truncation, and generation start/finish.
//!
//! The same transitions are also logged through `tracing`; the callback is
//! for hosts that want to drive a spinner, a status line or a UI toast without
//! scraping logs. Signals are informational only and never change the result.
//!
//! # Example
//!
//! ```rust
//! use pdf2mindmap::{PipelineConfig, PipelineProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl PipelineProgressCallback for Printer {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("→ {stage}");
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A pipeline stage, in data-flow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Reading the embedded text layer page by page.
    TextLayer,
    /// Rasterising pages and running OCR.
    Ocr,
    /// Asking the model for the markdown outline.
    Outline,
    /// Wrapping the outline into the mind-map HTML document.
    Render,
    /// Asking the model for comprehension questions.
    Questions,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::TextLayer => "text-layer",
            Stage::Ocr => "ocr",
            Stage::Outline => "outline",
            Stage::Render => "render",
            Stage::Questions => "questions",
        };
        f.write_str(name)
    }
}

/// Receives advisory events as the pipeline runs.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The pipeline is sequential, so events arrive in
/// order from a single task, but the trait is `Send + Sync` so it can be
/// shared with the runtime.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when the text layer was read but contained no text, right
    /// before falling back to OCR.
    ///
    /// # Arguments
    /// * `total_pages` — number of pages in the document
    fn on_text_layer_empty(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after each page has been through OCR.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — pages being recognised
    /// * `chars`       — characters recognised on this page
    fn on_ocr_page_complete(&self, page_num: usize, total_pages: usize, chars: usize) {
        let _ = (page_num, total_pages, chars);
    }

    /// Called when OCR ran on every page and still found no text.
    fn on_ocr_empty(&self) {}

    /// Called when a generation input was cut to the character limit.
    fn on_truncated(&self, stage: Stage, original_chars: usize, limit: usize) {
        let _ = (stage, original_chars, limit);
    }

    /// Called when a stage finishes successfully.
    ///
    /// `output_len` is the character length of what the stage produced
    /// (extracted text, markdown, HTML) or the number of questions.
    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        let _ = (stage, output_len);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl PipelineProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start:{stage}"));
        }

        fn on_text_layer_empty(&self, total_pages: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("fallback:{total_pages}"));
        }

        fn on_ocr_empty(&self) {
            self.events.lock().unwrap().push("ocr-empty".into());
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::TextLayer);
        cb.on_text_layer_empty(3);
        cb.on_ocr_page_complete(1, 3, 120);
        cb.on_ocr_empty();
        cb.on_truncated(Stage::Outline, 40_000, 30_000);
        cb.on_stage_complete(Stage::Render, 2048);
    }

    #[test]
    fn overridden_methods_receive_events_in_order() {
        let rec = Recorder::default();
        rec.on_stage_start(Stage::TextLayer);
        rec.on_text_layer_empty(2);
        rec.on_stage_start(Stage::Ocr);
        rec.on_ocr_page_complete(1, 2, 0);
        rec.on_ocr_empty();

        let events = rec.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec!["start:text-layer", "fallback:2", "start:ocr", "ocr-empty"]
        );
    }

    #[test]
    fn stage_display_names() {
        assert_eq!(Stage::TextLayer.to_string(), "text-layer");
        assert_eq!(Stage::Questions.to_string(), "questions");
    }
}

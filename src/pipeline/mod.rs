//! Pipeline stages for PDF-to-mindmap conversion.
//!
//! Each submodule implements one step. Stages run strictly in sequence; a
//! failing stage stops the run before the next one starts.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ outline ──▶ mindmap
//! (path/    (text layer,  (LLM)      (HTML)
//!  URL/      then OCR)
//!  bytes)        └──────▶ questions (LLM, on demand)
//! ```
//!
//! 1. [`input`]     — resolve a path, URL or byte buffer to a scoped local file
//! 2. [`extract`]   — run extraction strategies in order over a [`render::PdfBackend`];
//!    OCR goes through an [`ocr::OcrEngine`], fed by [`encode`]
//! 3. [`outline`]   — truncate, prompt, trim; via an [`llm::InferenceClient`]
//! 4. [`mindmap`]   — embed the outline in a markmap HTML page
//! 5. [`questions`] — prompt and split the reply into lines

pub mod encode;
pub mod extract;
pub mod input;
pub mod llm;
pub mod mindmap;
pub mod ocr;
pub mod outline;
pub mod questions;
pub mod render;

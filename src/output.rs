//! Value types produced by the pipeline.
//!
//! Every type here is request-scoped: it is created by one pipeline run,
//! handed to the caller and never shared or persisted by the library.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// How the document text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Read from the PDF's embedded text layer.
    TextLayer,
    /// Recognised from rasterised page images.
    Ocr,
}

/// Plain text extracted from a PDF.
///
/// `text` is trimmed and never empty: an empty extraction is reported as
/// [`crate::MindmapError::ExtractionFailed`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    pub method: ExtractionMethod,
    pub page_count: usize,
}

impl ExtractedText {
    /// Length in Unicode scalar values (the unit the truncation limits use).
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// The markdown outline returned by the model.
///
/// The heading hierarchy is requested in the prompt but not enforced: the
/// trimmed reply is stored exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineDocument {
    pub markdown: String,
    /// `true` when the input text was cut to the outline character limit.
    pub truncated: bool,
    /// Characters of document text actually sent to the model.
    pub input_chars: usize,
}

/// One ATX heading found in an outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: usize,
    pub title: String,
}

static ATX_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ ]{0,3}(#{1,6})[ \t]+(.+?)[ \t]*#*[ \t]*$").unwrap());

impl OutlineDocument {
    /// List the headings in document order.
    ///
    /// Read-only inspection for summaries and statistics; malformed nesting
    /// is reported as-is, never corrected.
    pub fn headings(&self) -> Vec<Heading> {
        ATX_HEADING
            .captures_iter(&self.markdown)
            .map(|c| Heading {
                level: c[1].len(),
                title: c[2].trim().to_string(),
            })
            .collect()
    }

    /// Number of level-1 headings (main topics).
    pub fn topic_count(&self) -> usize {
        self.headings().iter().filter(|h| h.level == 1).count()
    }
}

/// Comprehension questions, one entry per line of the model reply.
///
/// Lines are not filtered: numbering and blank lines survive unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionList(pub Vec<String>);

impl QuestionList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// Render as a markdown bullet list, one `- {question}` line per entry.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        for q in &self.0 {
            md.push_str("- ");
            md.push_str(q);
            md.push('\n');
        }
        md
    }
}

impl<'a> IntoIterator for &'a QuestionList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub extracted: ExtractedText,
    pub outline: OutlineDocument,
    /// Self-contained mind-map HTML document.
    pub html: String,
    /// Present only when question generation was requested.
    pub questions: Option<QuestionList>,
}

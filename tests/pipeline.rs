//! Pipeline integration tests.
//!
//! Every collaborator is faked: the PDF backend returns canned page texts and
//! blank page images, the OCR engine reads canned text per page, and the
//! inference client records prompts and returns a canned reply. No pdfium,
//! tesseract or network access is needed.

use async_trait::async_trait;
use image::DynamicImage;
use pdf2mindmap::{
    extract_text_from_bytes, generate_mindmap_from_bytes, write_artifacts, ExtractionMethod,
    ExtractionStrategy, InferenceClient, InferenceError, MindmapError, OcrEngine, PdfBackend,
    PipelineConfig, PipelineConfigBuilder, PipelineProgressCallback, Stage,
};
use std::path::Path;
use std::sync::{Arc, Mutex};

const PDF: &[u8] = b"%PDF-1.4\n% fake body, never parsed by the fake backend\n";

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Backend with a fixed text layer and one blank image per page. Each image
/// is `page_num` pixels wide so the OCR fake can tell pages apart.
struct FakeBackend {
    texts: Vec<Option<String>>,
    rasterized: Mutex<usize>,
}

impl FakeBackend {
    fn new(texts: &[Option<&str>]) -> Arc<Self> {
        Arc::new(Self {
            texts: texts.iter().map(|t| t.map(str::to_string)).collect(),
            rasterized: Mutex::new(0),
        })
    }

    fn scanned(pages: usize) -> Arc<Self> {
        Self::new(&vec![None; pages])
    }
}

impl PdfBackend for FakeBackend {
    fn page_texts(&self, _pdf_path: &Path) -> Result<Vec<Option<String>>, MindmapError> {
        Ok(self.texts.clone())
    }

    fn rasterize(&self, pdf_path: &Path, _dpi: u32) -> Result<Vec<DynamicImage>, MindmapError> {
        assert!(pdf_path.exists(), "temp PDF must exist while rendering");
        *self.rasterized.lock().unwrap() += 1;
        Ok((1..=self.texts.len())
            .map(|n| DynamicImage::new_rgb8(n as u32, 1))
            .collect())
    }
}

/// OCR engine that returns `pages[width - 1]` and records the call order.
struct FakeOcr {
    pages: Vec<String>,
    calls: Mutex<Vec<usize>>,
}

impl FakeOcr {
    fn new(pages: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            pages: pages.iter().map(|p| p.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OcrEngine for FakeOcr {
    fn name(&self) -> &str {
        "fake"
    }

    async fn recognize(&self, image: &DynamicImage, page_num: usize) -> Result<String, MindmapError> {
        assert_eq!(image.width() as usize, page_num);
        self.calls.lock().unwrap().push(page_num);
        Ok(self.pages[page_num - 1].clone())
    }
}

/// Inference client that replies with `outline` to outline prompts and
/// `questions` to question prompts, recording every prompt.
struct StubModel {
    outline: String,
    questions: String,
    prompts: Mutex<Vec<String>>,
}

impl StubModel {
    fn new(outline: &str, questions: &str) -> Arc<Self> {
        Arc::new(Self {
            outline: outline.to_string(),
            questions: questions.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceClient for StubModel {
    fn model(&self) -> &str {
        "stub"
    }

    async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.contains("mindmap") {
            Ok(self.outline.clone())
        } else {
            Ok(self.questions.clone())
        }
    }
}

#[derive(Default)]
struct Events(Mutex<Vec<String>>);

impl PipelineProgressCallback for Events {
    fn on_stage_start(&self, stage: Stage) {
        self.0.lock().unwrap().push(format!("start {stage}"));
    }
    fn on_text_layer_empty(&self, total_pages: usize) {
        self.0.lock().unwrap().push(format!("empty text layer {total_pages}"));
    }
    fn on_ocr_page_complete(&self, page_num: usize, total_pages: usize, _chars: usize) {
        self.0.lock().unwrap().push(format!("ocr {page_num}/{total_pages}"));
    }
    fn on_ocr_empty(&self) {
        self.0.lock().unwrap().push("ocr empty".into());
    }
    fn on_truncated(&self, stage: Stage, _original_chars: usize, limit: usize) {
        self.0.lock().unwrap().push(format!("truncated {stage} {limit}"));
    }
    fn on_stage_complete(&self, stage: Stage, _output_len: usize) {
        self.0.lock().unwrap().push(format!("done {stage}"));
    }
}

fn base(backend: Arc<FakeBackend>, ocr: Arc<FakeOcr>) -> PipelineConfigBuilder {
    PipelineConfig::builder().pdf_backend(backend).ocr_engine(ocr)
}

// ── Extraction ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn text_layer_wins_and_ocr_never_runs() {
    let backend = FakeBackend::new(&[Some("Intro"), None, Some("Body text")]);
    let ocr = FakeOcr::new(&["x", "y", "z"]);
    let config = base(backend.clone(), ocr.clone()).build().unwrap();

    let extracted = extract_text_from_bytes(PDF, &config).await.unwrap();

    assert_eq!(extracted.text, "Intro\nBody text");
    assert_eq!(extracted.method, ExtractionMethod::TextLayer);
    assert_eq!(extracted.page_count, 3);
    assert!(ocr.calls().is_empty());
    assert_eq!(*backend.rasterized.lock().unwrap(), 0);
}

#[tokio::test]
async fn scanned_pages_are_recognised_in_order() {
    let backend = FakeBackend::new(&[None, Some("   "), None]);
    let ocr = FakeOcr::new(&["one", "two", "three"]);
    let events = Arc::new(Events::default());
    let config = base(backend, ocr.clone())
        .progress_callback(events.clone())
        .build()
        .unwrap();

    let extracted = extract_text_from_bytes(PDF, &config).await.unwrap();

    assert_eq!(extracted.text, "one\ntwo\nthree");
    assert_eq!(extracted.method, ExtractionMethod::Ocr);
    assert_eq!(ocr.calls(), vec![1, 2, 3]);
    assert_eq!(
        *events.0.lock().unwrap(),
        vec![
            "start text-layer",
            "empty text layer 3",
            "start ocr",
            "ocr 1/3",
            "ocr 2/3",
            "ocr 3/3",
            "done ocr",
        ]
    );
}

#[tokio::test]
async fn ocr_keeps_empty_pages_in_the_join() {
    let backend = FakeBackend::scanned(3);
    let ocr = FakeOcr::new(&["a", "", "c"]);
    let config = base(backend, ocr).build().unwrap();

    let extracted = extract_text_from_bytes(PDF, &config).await.unwrap();
    assert_eq!(extracted.text, "a\n\nc");
}

#[tokio::test]
async fn nothing_extracted_is_an_error_and_nothing_is_generated() {
    let backend = FakeBackend::scanned(2);
    let ocr = FakeOcr::new(&[" \n", ""]);
    let model = StubModel::new("# never", "never");
    let events = Arc::new(Events::default());
    let config = base(backend, ocr)
        .inference(model.clone())
        .progress_callback(events.clone())
        .build()
        .unwrap();

    let err = generate_mindmap_from_bytes(PDF, &config).await.unwrap_err();

    assert!(matches!(err, MindmapError::ExtractionFailed { .. }));
    assert!(model.prompts().is_empty());
    assert!(events.0.lock().unwrap().contains(&"ocr empty".to_string()));
}

#[tokio::test]
async fn text_layer_only_does_not_fall_back() {
    let backend = FakeBackend::scanned(2);
    let ocr = FakeOcr::new(&["a", "b"]);
    let config = base(backend, ocr.clone())
        .strategies(vec![ExtractionStrategy::TextLayer])
        .build()
        .unwrap();

    let err = extract_text_from_bytes(PDF, &config).await.unwrap_err();
    assert!(matches!(err, MindmapError::ExtractionFailed { .. }));
    assert!(ocr.calls().is_empty());
}

#[tokio::test]
async fn bytes_without_pdf_header_are_rejected() {
    let backend = FakeBackend::new(&[Some("text")]);
    let config = base(backend, FakeOcr::new(&[])).build().unwrap();

    let err = extract_text_from_bytes(b"<html>not a pdf</html>", &config)
        .await
        .unwrap_err();
    assert!(matches!(err, MindmapError::NotAPdf { .. }));
}

#[tokio::test]
async fn extraction_needs_no_credential() {
    let backend = FakeBackend::new(&[Some("plain text")]);
    let config = base(backend, FakeOcr::new(&[])).build().unwrap();
    assert!(config.api_key.is_none());

    let extracted = extract_text_from_bytes(PDF, &config).await.unwrap();
    assert_eq!(extracted.text, "plain text");
}

// ── Full pipeline ────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_credential_fails_before_extraction() {
    let backend = FakeBackend::new(&[Some("text")]);
    let ocr = FakeOcr::new(&["x"]);
    let config = base(backend, ocr).build().unwrap();

    let err = generate_mindmap_from_bytes(PDF, &config).await.unwrap_err();
    match err {
        MindmapError::ConfigurationMissing { what, .. } => assert_eq!(what, "GOOGLE_API_KEY"),
        other => panic!("expected ConfigurationMissing, got {other:?}"),
    }
}

#[tokio::test]
async fn scanned_two_page_document_end_to_end() {
    let backend = FakeBackend::scanned(2);
    let ocr = FakeOcr::new(&["Chapter 1 Cells", "Chapter 2 Tissues"]);
    let outline = "# Biology\n## Cells\n### Structure\n## Tissues";
    let model = StubModel::new(outline, "1. What is a cell?\n2. What is a tissue?");
    let config = base(backend, ocr.clone())
        .inference(model.clone())
        .generate_questions(true)
        .build()
        .unwrap();

    let output = generate_mindmap_from_bytes(PDF, &config).await.unwrap();

    assert_eq!(ocr.calls(), vec![1, 2]);
    assert_eq!(output.extracted.method, ExtractionMethod::Ocr);
    assert_eq!(output.extracted.text, "Chapter 1 Cells\nChapter 2 Tissues");

    let first = output.outline.markdown.lines().next().unwrap();
    assert!(first.starts_with("# ") && !first.starts_with("##"));
    assert_eq!(output.outline.markdown.lines().filter(|l| l.starts_with("# ")).count(), 1);
    assert!(!output.outline.truncated);
    assert_eq!(output.outline.topic_count(), 1);
    assert_eq!(output.outline.headings().len(), 4);

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Chapter 1 Cells\nChapter 2 Tissues"));
    assert!(prompts[1].contains("Chapter 1 Cells\nChapter 2 Tissues"));

    assert!(output.html.contains("mindmap-data"));
    assert!(output.html.contains("# Biology"));

    let questions = output.questions.unwrap();
    assert_eq!(questions.0, vec!["1. What is a cell?", "2. What is a tissue?"]);
}

#[tokio::test]
async fn questions_only_when_requested() {
    let backend = FakeBackend::new(&[Some("Some text")]);
    let model = StubModel::new("# Root", "1. Q?");
    let config = base(backend, FakeOcr::new(&[]))
        .inference(model.clone())
        .build()
        .unwrap();

    let output = generate_mindmap_from_bytes(PDF, &config).await.unwrap();
    assert!(output.questions.is_none());
    assert_eq!(model.prompts().len(), 1);
}

#[tokio::test]
async fn long_documents_are_truncated_for_the_outline_only() {
    let long = format!("{}END", "w".repeat(30_000));
    let backend = FakeBackend::new(&[Some(long.as_str())]);
    let model = StubModel::new("# Long", "1. Q?");
    let events = Arc::new(Events::default());
    let config = base(backend, FakeOcr::new(&[]))
        .inference(model.clone())
        .generate_questions(true)
        .progress_callback(events.clone())
        .build()
        .unwrap();

    let output = generate_mindmap_from_bytes(PDF, &config).await.unwrap();
    assert!(output.outline.truncated);

    let prompts = model.prompts();
    assert!(prompts[0].contains(&format!("{}...", "w".repeat(30_000))));
    assert!(!prompts[0].contains("END"));
    assert!(prompts[1].contains(&long));

    let events = events.0.lock().unwrap();
    assert!(events.contains(&"truncated outline 30000".to_string()));
    assert!(!events.iter().any(|e| e.starts_with("truncated questions")));
}

#[tokio::test]
async fn blank_outline_reply_stops_the_pipeline() {
    let backend = FakeBackend::new(&[Some("text")]);
    let model = StubModel::new("  \n ", "1. Q?");
    let config = base(backend, FakeOcr::new(&[]))
        .inference(model.clone())
        .generate_questions(true)
        .build()
        .unwrap();

    let err = generate_mindmap_from_bytes(PDF, &config).await.unwrap_err();
    assert!(matches!(
        err,
        MindmapError::GenerationFailed {
            stage: Stage::Outline,
            ..
        }
    ));
    assert_eq!(model.prompts().len(), 1, "questions must not be attempted");
}

#[tokio::test]
async fn artifacts_are_written_to_disk() {
    let backend = FakeBackend::new(&[Some("text")]);
    let model = StubModel::new("# Root\n## Child", "1. A?\n2. B?");
    let config = base(backend, FakeOcr::new(&[]))
        .inference(model)
        .generate_questions(true)
        .build()
        .unwrap();
    let output = generate_mindmap_from_bytes(PDF, &config).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let paths = write_artifacts(&output, dir.path()).await.unwrap();

    let html = std::fs::read_to_string(&paths.html).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert_eq!(std::fs::read_to_string(&paths.markdown).unwrap(), "# Root\n## Child");
    assert_eq!(
        std::fs::read_to_string(paths.questions.unwrap()).unwrap(),
        "- 1. A?\n- 2. B?\n"
    );
}

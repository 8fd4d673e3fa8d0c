//! CLI binary for pdf2mindmap.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `PipelineConfig`, runs the pipeline and writes the artifacts.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2mindmap::{
    extract_text, generate_mindmap, write_artifacts, EmbedMode, ExtractionMethod,
    ExtractionStrategy, OcrEngineKind, PipelineConfig, PipelineProgressCallback, ProgressCallback,
    Stage,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one spinner whose message follows the current
/// stage, plus a log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
    stage_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            stage_started: Mutex::new(None),
        })
    }

    fn elapsed(&self) -> String {
        let secs = self
            .stage_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        format!("{secs:.1}s")
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        if let Ok(mut t) = self.stage_started.lock() {
            *t = Some(Instant::now());
        }
        let msg = match stage {
            Stage::TextLayer => "Extracting text from PDF…",
            Stage::Ocr => "Running OCR on page images…",
            Stage::Outline => "Generating mindmap structure…",
            Stage::Render => "Rendering mindmap…",
            Stage::Questions => "Generating questions…",
        };
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message(msg);
    }

    fn on_text_layer_empty(&self, total_pages: usize) {
        self.bar.println(format!(
            "  {} No text layer in {total_pages} pages; falling back to OCR",
            yellow("⚠")
        ));
    }

    fn on_ocr_page_complete(&self, page_num: usize, total_pages: usize, chars: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total_pages,
            dim(&format!("{chars:>5} chars")),
        ));
        self.bar.set_message(format!("OCR page {page_num}/{total_pages}"));
    }

    fn on_ocr_empty(&self) {
        self.bar
            .println(format!("  {} OCR found no text either", yellow("⚠")));
    }

    fn on_truncated(&self, stage: Stage, original_chars: usize, limit: usize) {
        self.bar.println(format!(
            "  {} {stage}: text truncated to {limit} of {original_chars} characters",
            yellow("⚠")
        ));
    }

    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        let unit = if stage == Stage::Questions {
            "lines"
        } else {
            "chars"
        };
        self.bar.println(format!(
            "{} {:<10}  {}  {}",
            green("✔"),
            stage.to_string(),
            dim(&format!("{output_len:>6} {unit}")),
            dim(&self.elapsed()),
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Mindmap into the current directory
  pdf2mindmap lecture.pdf

  # Mindmap and questions into ./out
  pdf2mindmap --questions -o out lecture.pdf

  # From a URL
  pdf2mindmap https://arxiv.org/pdf/1706.03762 -o attention

  # Only extract the text (no API key needed)
  pdf2mindmap --extract-only scanned.pdf

  # Scanned German document, OCR at 300 DPI
  pdf2mindmap --ocr-lang deu --dpi 300 scan.pdf

  # Use OpenAI instead of Gemini
  pdf2mindmap --provider openai --model gpt-4.1-mini lecture.pdf

  # Everything as JSON on stdout
  pdf2mindmap --json --questions lecture.pdf > result.json

OUTPUT FILES:
  interactive_mindmap.html   Self-contained mind-map page (open in a browser)
  mindmap.md                 The markdown outline behind the mind-map
  questions.md               Comprehension questions (with --questions)

ENVIRONMENT VARIABLES:
  GOOGLE_API_KEY          Gemini API key (required for generation)
  OPENAI_API_KEY, ...     Credentials for --provider other than gemini
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Override the log filter

SETUP:
  1. Install pdfium and (for scanned PDFs) tesseract.
  2. Set API key:     export GOOGLE_API_KEY=...
  3. Run:             pdf2mindmap document.pdf
"#;

/// Turn PDF files and URLs into interactive mind-maps using LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2mindmap",
    version,
    about = "Turn PDF files and URLs into interactive mind-maps using LLMs",
    long_about = "Extract the text of a PDF (local file or URL), falling back to OCR for \
scanned documents, ask a language model for a hierarchical outline and render it as an \
interactive markmap HTML page. Optionally generate comprehension questions.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Directory to write interactive_mindmap.html, mindmap.md and questions.md into.
    #[arg(short, long, env = "PDF2MINDMAP_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Also generate comprehension questions.
    #[arg(long, env = "PDF2MINDMAP_QUESTIONS")]
    questions: bool,

    /// Only extract and print the document text.
    #[arg(long)]
    extract_only: bool,

    /// Print the result as JSON instead of writing files.
    #[arg(long, env = "PDF2MINDMAP_JSON")]
    json: bool,

    /// Gemini API key.
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model ID (default: gemini-2.0-flash).
    #[arg(long, env = "PDF2MINDMAP_MODEL")]
    model: Option<String>,

    /// Provider: gemini (default), or any edgequake-llm provider (openai, anthropic, ollama, …).
    #[arg(long, env = "PDF2MINDMAP_PROVIDER")]
    provider: Option<String>,

    /// OCR engine for scanned documents.
    #[arg(long, env = "PDF2MINDMAP_OCR_ENGINE", value_enum, default_value = "tesseract")]
    ocr_engine: OcrEngineArg,

    /// Tesseract language code(s), e.g. eng or eng+deu.
    #[arg(long, env = "PDF2MINDMAP_OCR_LANG", default_value = "eng")]
    ocr_lang: String,

    /// Provider for --ocr-engine vision.
    #[arg(long, env = "PDF2MINDMAP_OCR_PROVIDER", default_value = "openai")]
    ocr_provider: String,

    /// Model for --ocr-engine vision.
    #[arg(long, env = "PDF2MINDMAP_OCR_MODEL", default_value = "gpt-4.1-nano")]
    ocr_model: String,

    /// Never fall back to OCR.
    #[arg(long)]
    no_ocr: bool,

    /// Rasterisation DPI for OCR (72–600).
    #[arg(long, env = "PDF2MINDMAP_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2MINDMAP_PASSWORD")]
    password: Option<String>,

    /// Path to libpdfium (file or directory).
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// How the outline is embedded in the HTML page.
    #[arg(long, env = "PDF2MINDMAP_EMBED", value_enum, default_value = "json")]
    embed: EmbedArg,

    /// Character cap before outline generation (0 disables it).
    #[arg(long, env = "PDF2MINDMAP_OUTLINE_LIMIT", default_value_t = 30_000)]
    outline_limit: usize,

    /// Character cap before question generation (default: none; 0 disables it).
    #[arg(long, env = "PDF2MINDMAP_QUESTION_LIMIT")]
    question_limit: Option<usize>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF2MINDMAP_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens per call.
    #[arg(long, env = "PDF2MINDMAP_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// LLM call timeout in seconds.
    #[arg(long, env = "PDF2MINDMAP_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2MINDMAP_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable the progress spinner.
    #[arg(long, env = "PDF2MINDMAP_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2MINDMAP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2MINDMAP_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OcrEngineArg {
    Tesseract,
    Vision,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum EmbedArg {
    Json,
    Template,
}

impl From<EmbedArg> for EmbedMode {
    fn from(v: EmbedArg) -> Self {
        match v {
            EmbedArg::Json => EmbedMode::JsonPayload,
            EmbedArg::Template => EmbedMode::TemplateLiteral,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; library INFO logs
    // would only interleave with it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let spinner = if show_progress {
        Some(CliProgressCallback::new())
    } else {
        None
    };
    let progress_cb: Option<ProgressCallback> = spinner
        .clone()
        .map(|cb| cb as Arc<dyn PipelineProgressCallback>);

    let config = build_config(&cli, progress_cb)?;

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        let result = extract_text(&cli.input, &config).await;
        if let Some(ref s) = spinner {
            s.finish();
        }
        let extracted = result.context("Text extraction failed")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&extracted).context("Failed to serialise output")?
            );
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(extracted.text.as_bytes())
                .context("Failed to write to stdout")?;
            handle.write_all(b"\n").ok();
        }
        if !cli.quiet && !cli.json {
            eprintln!(
                "{}  {} chars from {} pages via {}",
                green("✔"),
                extracted.char_count(),
                extracted.page_count,
                method_label(extracted.method),
            );
        }
        return Ok(());
    }

    // ── Full pipeline ────────────────────────────────────────────────────
    let result = generate_mindmap(&cli.input, &config).await;
    if let Some(ref s) = spinner {
        s.finish();
    }
    let output = result.context("Mindmap generation failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    let paths = write_artifacts(&output, &cli.out_dir)
        .await
        .context("Failed to write output files")?;

    if let Some(ref questions) = output.questions {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        for q in questions {
            writeln!(handle, "- {q}").context("Failed to write to stdout")?;
        }
    }

    if !cli.quiet {
        eprintln!(
            "{}  {} topics  {} chars via {}{}",
            green("✔"),
            output.outline.topic_count(),
            output.extracted.char_count(),
            method_label(output.extracted.method),
            if output.outline.truncated {
                yellow("  (truncated)")
            } else {
                String::new()
            },
        );
        eprintln!("   {} {}", cyan("→"), bold(&paths.html.display().to_string()));
        eprintln!("   {} {}", cyan("→"), paths.markdown.display());
        if let Some(ref q) = paths.questions {
            eprintln!("   {} {}", cyan("→"), q.display());
        }
    }

    Ok(())
}

fn method_label(method: ExtractionMethod) -> &'static str {
    match method {
        ExtractionMethod::TextLayer => "text layer",
        ExtractionMethod::Ocr => "OCR",
    }
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let ocr = match cli.ocr_engine {
        OcrEngineArg::Tesseract => OcrEngineKind::Tesseract {
            language: cli.ocr_lang.clone(),
        },
        OcrEngineArg::Vision => OcrEngineKind::Vision {
            provider: cli.ocr_provider.clone(),
            model: cli.ocr_model.clone(),
        },
    };

    let strategies = if cli.no_ocr {
        vec![ExtractionStrategy::TextLayer]
    } else {
        vec![ExtractionStrategy::TextLayer, ExtractionStrategy::Ocr]
    };

    // 0 disables a cap.
    let outline_limit = (cli.outline_limit > 0).then_some(cli.outline_limit);
    let question_limit = cli.question_limit.filter(|&n| n > 0);

    let mut builder = PipelineConfig::builder()
        .dpi(cli.dpi)
        .strategies(strategies)
        .ocr(ocr)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout)
        .outline_char_limit(outline_limit)
        .question_char_limit(question_limit)
        .generate_questions(cli.questions)
        .embed_mode(cli.embed.into());

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

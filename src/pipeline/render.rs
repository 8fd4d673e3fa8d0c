//! PDF access: embedded text per page and page rasterisation.
//!
//! The pipeline talks to PDFs through the [`PdfBackend`] trait so that
//! extraction logic can be exercised with fake documents. The production
//! implementation, [`PdfiumBackend`], wraps `pdfium-render`.
//!
//! ## Blocking
//!
//! pdfium is a C++ library with thread-local state; backend methods are
//! plain blocking functions and callers run them inside
//! `tokio::task::spawn_blocking`.
//!
//! ## Pixel cap
//!
//! DPI alone does not bound memory: an A0 poster at 200 DPI is ~6 600 ×
//! 9 300 px. `max_rendered_pixels` caps the longest edge regardless of the
//! physical page size.

use crate::config::PipelineConfig;
use crate::error::MindmapError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Read-only access to the pages of a PDF.
pub trait PdfBackend: Send + Sync {
    /// Embedded text of every page, in page order. `None` for pages with no
    /// text layer (or one that could not be read).
    fn page_texts(&self, pdf_path: &Path) -> Result<Vec<Option<String>>, MindmapError>;

    /// Rasterise every page, in page order, at `dpi`.
    fn rasterize(&self, pdf_path: &Path, dpi: u32) -> Result<Vec<DynamicImage>, MindmapError>;
}

/// [`PdfBackend`] backed by the pdfium library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumBackend {
    library_path: Option<PathBuf>,
    password: Option<String>,
    max_rendered_pixels: Option<u32>,
}

impl PdfiumBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a backend from the pdfium-related fields of the config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            library_path: config.pdfium_library_path.clone(),
            password: config.password.clone(),
            max_rendered_pixels: Some(config.max_rendered_pixels),
        }
    }

    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Bind to pdfium: explicit path first, then the working directory,
    /// then the system library.
    fn bind(&self) -> Result<Pdfium, MindmapError> {
        let explicit = self.library_path.as_ref().map(|p| {
            if p.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(p)
            } else {
                p.clone()
            }
        });

        let bindings = match explicit {
            Some(lib) => Pdfium::bind_to_library(&lib)
                .map_err(|e| MindmapError::PdfiumBindingFailed(format!("{}: {:?}", lib.display(), e)))?,
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())
                .map_err(|e| MindmapError::PdfiumBindingFailed(format!("{:?}", e)))?,
        };

        Ok(Pdfium::new(bindings))
    }

    fn load<'a>(&'a self, pdfium: &'a Pdfium, pdf_path: &Path) -> Result<PdfDocument<'a>, MindmapError> {
        let password = self.password.as_deref();
        pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    MindmapError::WrongPassword {
                        path: pdf_path.to_path_buf(),
                    }
                } else {
                    MindmapError::PasswordRequired {
                        path: pdf_path.to_path_buf(),
                    }
                }
            } else {
                MindmapError::CorruptPdf {
                    path: pdf_path.to_path_buf(),
                    detail: err_str,
                }
            }
        })
    }
}

impl PdfBackend for PdfiumBackend {
    fn page_texts(&self, pdf_path: &Path) -> Result<Vec<Option<String>>, MindmapError> {
        let pdfium = self.bind()?;
        let document = self.load(&pdfium, pdf_path)?;
        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let mut texts = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let text = match page.text() {
                Ok(t) => Some(t.all()).filter(|s| !s.is_empty()),
                Err(e) => {
                    debug!("Page {}: no readable text layer ({:?})", idx + 1, e);
                    None
                }
            };
            debug!(
                "Page {}: {} chars of embedded text",
                idx + 1,
                text.as_ref().map_or(0, |s| s.chars().count())
            );
            texts.push(text);
        }

        Ok(texts)
    }

    fn rasterize(&self, pdf_path: &Path, dpi: u32) -> Result<Vec<DynamicImage>, MindmapError> {
        let pdfium = self.bind()?;
        let document = self.load(&pdfium, pdf_path)?;
        let pages = document.pages();

        // PDF user space is 72 units per inch.
        let mut render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);
        if let Some(max) = self.max_rendered_pixels {
            render_config = render_config
                .set_maximum_width(max as i32)
                .set_maximum_height(max as i32);
        }

        let mut images = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                MindmapError::RasterisationFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );
            images.push(image);
        }

        Ok(images)
    }
}

//! Input resolution: normalise a path, URL or byte buffer to a local PDF file.
//!
//! pdfium opens documents by path, so URL downloads and in-memory uploads are
//! written to scoped temporary files first. [`ResolvedInput`] owns those
//! files: dropping it deletes them, whether extraction succeeded, failed or
//! panicked. Every input is checked for the `%PDF` magic header before it is
//! handed to pdfium.

use crate::error::MindmapError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A PDF ready to be opened by path.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; the PDF lives in a temp directory kept alive here.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
    /// Input was a byte buffer persisted to a temp file.
    Buffered(NamedTempFile),
}

impl ResolvedInput {
    /// Get the path to the PDF file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
            ResolvedInput::Buffered(file) => file.path(),
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local PDF file path.
///
/// URLs are downloaded to a temporary directory; local paths are validated
/// for existence, readability and the PDF header.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, MindmapError> {
    if input.trim().is_empty() {
        return Err(MindmapError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Persist an in-memory PDF to a scoped temporary file.
///
/// The file is removed when the returned [`ResolvedInput`] is dropped.
pub fn persist_bytes(bytes: &[u8]) -> Result<ResolvedInput, MindmapError> {
    check_magic(bytes, "<memory>")?;

    let mut tmp = tempfile::Builder::new()
        .prefix("pdf2mindmap-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| MindmapError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| MindmapError::Internal(format!("tempfile write: {e}")))?;

    debug!("Persisted {} bytes to {}", bytes.len(), tmp.path().display());
    Ok(ResolvedInput::Buffered(tmp))
}

fn check_magic(bytes: &[u8], origin: &str) -> Result<(), MindmapError> {
    if bytes.len() < PDF_MAGIC.len() || &bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        return Err(MindmapError::NotAPdf {
            origin: origin.to_string(),
            magic: bytes.iter().take(PDF_MAGIC.len()).copied().collect(),
        });
    }
    Ok(())
}

/// Resolve a local file path, validating existence and PDF magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, MindmapError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(MindmapError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            let read = f.read(&mut magic).unwrap_or(0);
            check_magic(&magic[..read], path_str)?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(MindmapError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(MindmapError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, MindmapError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| MindmapError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            MindmapError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            MindmapError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(MindmapError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| MindmapError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    check_magic(&bytes, url)?;

    let temp_dir = TempDir::new().map_err(|e| MindmapError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(filename_from_url(url));

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| MindmapError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Pick a file name from the last URL path segment, else a fixed fallback.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_from_url_uses_last_segment() {
        assert_eq!(filename_from_url("https://x.org/papers/a.pdf"), "a.pdf");
        assert_eq!(filename_from_url("https://arxiv.org/pdf/1706"), "downloaded.pdf");
        assert_eq!(filename_from_url("https://x.org/"), "downloaded.pdf");
    }

    #[test]
    fn persisted_bytes_are_deleted_on_drop() {
        let resolved = persist_bytes(b"%PDF-1.7\n%%EOF").expect("valid header");
        let path = resolved.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
        drop(resolved);
        assert!(!path.exists(), "temp file must be removed on drop");
    }

    #[test]
    fn non_pdf_bytes_are_rejected() {
        let err = persist_bytes(b"PK\x03\x04zip").err().expect("must fail");
        match err {
            MindmapError::NotAPdf { origin, magic } => {
                assert_eq!(origin, "<memory>");
                assert_eq!(magic, b"PK\x03\x04".to_vec());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn short_buffer_is_rejected() {
        assert!(matches!(
            persist_bytes(b"%P"),
            Err(MindmapError::NotAPdf { .. })
        ));
    }

    #[tokio::test]
    async fn missing_local_file() {
        let err = resolve_input("/definitely/not/here.pdf", 5).await.err().unwrap();
        assert!(matches!(err, MindmapError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn local_file_with_wrong_header() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"hello world").unwrap();
        let err = resolve_input(tmp.path().to_str().unwrap(), 5)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, MindmapError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn local_pdf_resolves_in_place() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.4 rest").unwrap();
        let resolved = resolve_input(tmp.path().to_str().unwrap(), 5).await.unwrap();
        assert_eq!(resolved.path(), tmp.path());
    }

    #[tokio::test]
    async fn blank_input_is_invalid() {
        assert!(matches!(
            resolve_input("  ", 5).await,
            Err(MindmapError::InvalidInput { .. })
        ));
    }
}

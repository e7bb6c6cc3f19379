//! Input resolution: turn a user-supplied path or URL into PDF bytes and a
//! document name.
//!
//! The whole document is held in memory: both the native pass and the OCR
//! rasteriser read from the same buffer. The `%PDF` magic is checked here so
//! callers get a meaningful error rather than an opaque pdfium failure.

use crate::error::ExtractError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A PDF held in memory, ready for extraction.
#[derive(Debug, Clone)]
pub struct PdfInput {
    pub bytes: Vec<u8>,
    /// Document name used as the result title (file name or URL basename).
    pub name: String,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to PDF bytes.
///
/// URLs are downloaded with `timeout_secs`; anything else is read as a local
/// file.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<PdfInput, ExtractError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

/// Reject buffers that don't start with `%PDF`.
pub fn check_magic(name: &str, bytes: &[u8]) -> Result<(), ExtractError> {
    if bytes.starts_with(b"%PDF") {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    Err(ExtractError::NotAPdf {
        name: name.to_string(),
        magic,
    })
}

async fn read_local(path: &Path) -> Result<PdfInput, ExtractError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ExtractError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ExtractError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let name = file_name(path);
    check_magic(&name, &bytes)?;
    debug!("Read local PDF {} ({} bytes)", path.display(), bytes.len());
    Ok(PdfInput { bytes, name })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<PdfInput, ExtractError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            ExtractError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ExtractError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(url).send().await.map_err(classify)?;
    if !response.status().is_success() {
        return Err(ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(classify)?.to_vec();
    let name = url_file_name(url);
    check_magic(&name, &bytes)?;

    info!("Downloaded {} ({} bytes)", name, bytes.len());
    Ok(PdfInput { bytes, name })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| PathBuf::from(path).display().to_string())
}

/// Last path segment of the URL when it looks like a file name.
fn url_file_name(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}

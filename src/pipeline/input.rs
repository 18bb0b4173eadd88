//! Input resolution: turn a user-supplied path or URL into a [`Document`].
//!
//! The OCR service takes the document bytes in a multipart body, so inputs are
//! read fully into memory. The PDF magic bytes (`%PDF`) are checked before a
//! document is returned, so a wrong file fails here with a clear error instead
//! of coming back from the OCR service as a diagnostic.

use crate::error::DocPairError;
use std::path::Path;
use tracing::{debug, info};

/// A submitted document. Immutable once created.
///
/// A document without its own media type is uploaded with
/// [`PipelineConfig::media_type`](crate::PipelineConfig::media_type).
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    name: String,
    content: Vec<u8>,
    media_type: Option<String>,
}

impl Document {
    /// Create a document from raw bytes, declared with the pipeline's media type.
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            media_type: None,
        }
    }

    /// Create a document that declares its own media type.
    pub fn with_media_type(
        name: impl Into<String>,
        content: impl Into<Vec<u8>>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            media_type: Some(media_type.into()),
            ..Self::new(name, content)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("bytes", &self.content.len())
            .field("media_type", &self.media_type)
            .finish()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to an in-memory PDF document.
///
/// If the input is a URL, download it. If it is a local file, read it.
pub async fn load_document(input: &str, timeout_secs: u64) -> Result<Document, DocPairError> {
    if input.trim().is_empty() {
        return Err(DocPairError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

/// Read a local file, validating existence and PDF magic bytes.
async fn read_local(path: &Path) -> Result<Document, DocPairError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => DocPairError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => DocPairError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    check_magic(&name, &bytes)?;

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(Document::new(name, bytes))
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<Document, DocPairError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocPairError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DocPairError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DocPairError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(DocPairError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let name = extract_filename(url);
    let bytes = response
        .bytes()
        .await
        .map_err(|e| DocPairError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    check_magic(&name, &bytes)?;

    info!("Downloaded {} ({} bytes)", name, bytes.len());
    Ok(Document::new(name, bytes.to_vec()))
}

fn check_magic(name: &str, bytes: &[u8]) -> Result<(), DocPairError> {
    if bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(DocPairError::NotAPdf {
            name: name.to_string(),
            magic,
        });
    }
    Ok(())
}

/// Extract a reasonable filename from the URL path.
fn extract_filename(url: &str) -> String {
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
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_extract_filename() {
        assert_eq!(extract_filename("https://x.com/files/PO.pdf"), "PO.pdf");
        assert_eq!(extract_filename("https://x.com/files/"), "downloaded.pdf");
        assert_eq!(extract_filename("https://x.com/download"), "downloaded.pdf");
    }

    #[tokio::test]
    async fn local_pdf_is_loaded_with_its_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PO.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"%PDF-1.7\n%%EOF")
            .unwrap();

        let doc = load_document(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(doc.name(), "PO.pdf");
        assert_eq!(doc.media_type(), None);
        assert!(doc.content().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn non_pdf_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"hello world").unwrap();

        let err = load_document(path.to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, DocPairError::NotAPdf { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = load_document("/definitely/not/here.pdf", 5).await.unwrap_err();
        assert!(matches!(err, DocPairError::FileNotFound { .. }), "got: {err}");
    }
}

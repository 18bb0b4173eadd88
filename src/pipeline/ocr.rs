//! OCR collaborator: upload one document, get its text back.
//!
//! [`OcrClient::extract`] always returns an [`OcrResult`]. A failed upload
//! becomes a diagnostic placeholder in the result's `text` so the sibling
//! document and the analysis step still run.

use crate::config::PipelineConfig;
use crate::error::{DocPairError, StageError};
use crate::output::OcrResult;
use crate::pipeline::input::Document;
use crate::pipeline::normalize::{normalize_for, Capability};
use reqwest::multipart::{Form, Part};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Multipart field carrying the document.
pub const FILE_FIELD: &str = "file";

/// HTTP client bound to the OCR endpoint.
#[derive(Debug, Clone)]
pub struct OcrClient {
    http: reqwest::Client,
    url: String,
    media_type: String,
    timeout_secs: u64,
}

impl OcrClient {
    pub fn new(config: &PipelineConfig) -> Result<Self, DocPairError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.ocr_timeout_secs))
            .build()
            .map_err(|e| DocPairError::HttpClient {
                collaborator: "OCR".into(),
                detail: e.to_string(),
            })?;
        Ok(Self {
            http,
            url: config.ocr_url.clone(),
            media_type: config.media_type.clone(),
            timeout_secs: config.ocr_timeout_secs,
        })
    }

    /// Extract text from `doc`, recording `index` as its submission position.
    pub async fn extract(&self, doc: &Document, index: usize) -> OcrResult {
        let start = Instant::now();
        match self.try_extract(doc).await {
            Ok(text) => {
                debug!(
                    "OCR {}: {} chars in {:?}",
                    doc.name(),
                    text.len(),
                    start.elapsed()
                );
                OcrResult::extracted(index, doc.name(), text)
            }
            Err(e) => {
                warn!("OCR {} failed after {:?}: {}", doc.name(), start.elapsed(), e);
                OcrResult::failed(index, doc.name(), e)
            }
        }
    }

    async fn try_extract(&self, doc: &Document) -> Result<String, StageError> {
        let media_type = doc.media_type().unwrap_or(self.media_type.as_str());
        let part = Part::bytes(doc.content().to_vec())
            .file_name(doc.name().to_string())
            .mime_str(media_type)
            .map_err(|e| self.failure(doc, e))?;
        let form = Form::new().part(FILE_FIELD, part);

        let response = self
            .http
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.failure(doc, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StageError::Extraction {
                filename: doc.name().to_string(),
                detail: format!("HTTP {status}"),
            });
        }

        let body = response.bytes().await.map_err(|e| self.failure(doc, e))?;
        Ok(normalize_for(&body, Capability::DocumentText))
    }

    fn failure(&self, doc: &Document, e: reqwest::Error) -> StageError {
        if e.is_timeout() {
            StageError::ExtractionTimeout {
                filename: doc.name().to_string(),
                secs: self.timeout_secs,
            }
        } else {
            StageError::Extraction {
                filename: doc.name().to_string(),
                detail: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn builder_for(server: &MockServer) -> crate::config::PipelineConfigBuilder {
        PipelineConfig::builder()
            .ocr_url(format!("{}/upload-pdf/", server.uri()))
            .analysis_url(format!("{}/webhook", server.uri()))
    }

    fn client_for(server: &MockServer) -> OcrClient {
        OcrClient::new(&builder_for(server).build().unwrap()).unwrap()
    }

    async fn uploaded_body(server: &MockServer) -> String {
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        String::from_utf8_lossy(&requests[0].body).into_owned()
    }

    #[tokio::test]
    async fn plain_text_reply_is_used_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload-pdf/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Invoice 42\nTotal 10.00"))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .extract(&Document::new("PO.pdf", b"%PDF-1.4".to_vec()), 0)
            .await;
        assert!(result.is_success());
        assert_eq!(result.text, "Invoice 42\nTotal 10.00");
        assert_eq!(result.index, 0);
    }

    #[tokio::test]
    async fn server_error_becomes_diagnostic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .extract(&Document::new("Conf.pdf", b"%PDF-1.4".to_vec()), 1)
            .await;
        assert_eq!(result.filename, "Conf.pdf");
        assert!(result.text.starts_with("⚠️ OCR error for Conf.pdf"), "got: {}", result.text);
        assert!(result.text.contains("500"));
        assert!(matches!(result.error, Some(StageError::Extraction { .. })));
    }

    #[tokio::test]
    async fn unreachable_service_becomes_diagnostic() {
        let config = PipelineConfig::builder()
            .ocr_url("http://127.0.0.1:1/upload-pdf/")
            .analysis_url("http://127.0.0.1:1/webhook")
            .build()
            .unwrap();
        let result = OcrClient::new(&config)
            .unwrap()
            .extract(&Document::new("PO.pdf", b"%PDF".to_vec()), 0)
            .await;
        assert!(!result.is_success());
        assert!(result.text.contains("PO.pdf"));
    }

    #[tokio::test]
    async fn invalid_media_type_becomes_diagnostic() {
        let server = MockServer::start().await;
        let doc = Document::with_media_type("PO.pdf", b"%PDF".to_vec(), "not a mime");
        let result = client_for(&server).extract(&doc, 0).await;
        assert!(!result.is_success());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn configured_media_type_is_declared_on_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let config = builder_for(&server)
            .media_type("application/x-scanned-pdf")
            .build()
            .unwrap();
        let result = OcrClient::new(&config)
            .unwrap()
            .extract(&Document::new("PO.pdf", b"%PDF-1.4".to_vec()), 0)
            .await;
        assert!(result.is_success());

        let body = uploaded_body(&server).await;
        assert!(body.contains("Content-Type: application/x-scanned-pdf"), "body: {body}");
        assert!(!body.contains("Content-Type: application/pdf"), "body: {body}");
    }

    #[tokio::test]
    async fn document_media_type_overrides_configured_one() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let doc = Document::with_media_type("scan.pdf", b"%PDF-1.4".to_vec(), "application/x-pdf");
        client_for(&server).extract(&doc, 0).await;

        let body = uploaded_body(&server).await;
        assert!(body.contains("Content-Type: application/x-pdf"), "body: {body}");
    }

    #[tokio::test]
    async fn slow_upload_times_out_into_diagnostic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = builder_for(&server).ocr_timeout_secs(1).build().unwrap();
        let result = OcrClient::new(&config)
            .unwrap()
            .extract(&Document::new("PO.pdf", b"%PDF-1.4".to_vec()), 0)
            .await;

        assert_eq!(
            result.error,
            Some(StageError::ExtractionTimeout {
                filename: "PO.pdf".into(),
                secs: 1,
            })
        );
        assert!(result.text.starts_with("⚠️ OCR error for PO.pdf"), "got: {}", result.text);
    }
}

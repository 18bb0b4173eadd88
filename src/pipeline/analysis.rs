//! Analysis collaborator: send both OCR texts, get the comparison narrative.
//!
//! The request body is
//!
//! ```json
//! {"documents": [{"filename": "PO.pdf", "ocr_text": "..."}, {"filename": "Conf.pdf", "ocr_text": "..."}]}
//! ```
//!
//! in submission order. Diagnostic OCR texts are sent as-is; the analysis
//! service sees exactly what the user sees.

use crate::config::PipelineConfig;
use crate::error::{DocPairError, StageError};
use crate::output::{AnalysisOutcome, OcrResult};
use crate::pipeline::normalize::{normalize_for, Capability};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Body posted to the analysis service.
#[derive(Debug, Serialize)]
pub struct AnalysisRequest<'a> {
    pub documents: Vec<DocumentEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct DocumentEntry<'a> {
    pub filename: &'a str,
    pub ocr_text: &'a str,
}

impl<'a> AnalysisRequest<'a> {
    /// Build the aggregate from OCR results, keeping their order.
    pub fn from_results(results: &'a [OcrResult]) -> Self {
        Self {
            documents: results
                .iter()
                .map(|r| DocumentEntry {
                    filename: &r.filename,
                    ocr_text: &r.text,
                })
                .collect(),
        }
    }
}

/// HTTP client bound to the analysis endpoint.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    url: String,
    timeout_secs: u64,
}

impl AnalysisClient {
    pub fn new(config: &PipelineConfig) -> Result<Self, DocPairError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.analysis_timeout_secs))
            .build()
            .map_err(|e| DocPairError::HttpClient {
                collaborator: "analysis".into(),
                detail: e.to_string(),
            })?;
        Ok(Self {
            http,
            url: config.analysis_url.clone(),
            timeout_secs: config.analysis_timeout_secs,
        })
    }

    /// Ask the analysis service to compare the OCR results.
    pub async fn compare(&self, results: &[OcrResult]) -> AnalysisOutcome {
        self.send(&AnalysisRequest::from_results(results)).await
    }

    /// Post an already-built aggregate.
    pub async fn send(&self, request: &AnalysisRequest<'_>) -> AnalysisOutcome {
        let start = Instant::now();
        match self.try_send(request).await {
            Ok(narrative) => {
                debug!("Analysis: {} chars in {:?}", narrative.len(), start.elapsed());
                AnalysisOutcome::replied(narrative)
            }
            Err(e) => {
                warn!("Analysis failed after {:?}: {}", start.elapsed(), e);
                AnalysisOutcome::failed(e)
            }
        }
    }

    async fn try_send(&self, request: &AnalysisRequest<'_>) -> Result<String, StageError> {
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.failure(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StageError::Analysis {
                detail: format!("HTTP {status}"),
            });
        }

        let body = response.bytes().await.map_err(|e| self.failure(e))?;
        Ok(normalize_for(&body, Capability::AnalysisReply))
    }

    fn failure(&self, e: reqwest::Error) -> StageError {
        if e.is_timeout() {
            StageError::AnalysisTimeout {
                secs: self.timeout_secs,
            }
        } else {
            StageError::Analysis {
                detail: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn results() -> Vec<OcrResult> {
        vec![
            OcrResult::extracted(0, "PO.pdf", "A".into()),
            OcrResult::extracted(1, "Conf.pdf", "B".into()),
        ]
    }

    fn client_for(server: &MockServer) -> AnalysisClient {
        let config = PipelineConfig::builder()
            .ocr_url(format!("{}/ocr", server.uri()))
            .analysis_url(format!("{}/webhook/compare", server.uri()))
            .build()
            .unwrap();
        AnalysisClient::new(&config).unwrap()
    }

    #[test]
    fn request_serialises_in_submission_order() {
        let results = results();
        let body = serde_json::to_value(AnalysisRequest::from_results(&results)).unwrap();
        assert_eq!(
            body,
            json!({"documents": [
                {"filename": "PO.pdf", "ocr_text": "A"},
                {"filename": "Conf.pdf", "ocr_text": "B"}
            ]})
        );
    }

    #[tokio::test]
    async fn output_field_is_used_when_reply_missing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/compare"))
            .and(body_json(json!({"documents": [
                {"filename": "PO.pdf", "ocr_text": "A"},
                {"filename": "Conf.pdf", "ocr_text": "B"}
            ]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"output": "**Totals differ**"})))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client_for(&server).compare(&results()).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.narrative, "**Totals differ**");
    }

    #[tokio::test]
    async fn not_found_becomes_diagnostic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let outcome = client_for(&server).compare(&results()).await;
        assert!(!outcome.is_success());
        assert!(outcome.narrative.starts_with("⚠️ Analysis error"), "got: {}", outcome.narrative);
        assert!(outcome.narrative.contains("404"));
    }
}

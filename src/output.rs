//! Result types produced by a document-pair run.

use crate::error::StageError;
use serde::{Deserialize, Serialize};

/// OCR output for one submitted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrResult {
    /// 0-based submission position.
    pub index: usize,
    pub filename: String,
    /// Extracted text, or a diagnostic placeholder when `error` is set.
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StageError>,
}

impl OcrResult {
    pub(crate) fn extracted(index: usize, filename: impl Into<String>, text: String) -> Self {
        Self {
            index,
            filename: filename.into(),
            text,
            error: None,
        }
    }

    pub(crate) fn failed(index: usize, filename: impl Into<String>, error: StageError) -> Self {
        Self {
            index,
            filename: filename.into(),
            text: error.diagnostic(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// The comparison narrative returned by the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    /// Markdown narrative, or a diagnostic placeholder when `error` is set.
    pub narrative: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StageError>,
}

impl AnalysisOutcome {
    pub(crate) fn replied(narrative: String) -> Self {
        Self {
            narrative,
            error: None,
        }
    }

    pub(crate) fn failed(error: StageError) -> Self {
        Self {
            narrative: error.diagnostic(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One line of the run's conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: Role,
    pub content: String,
}

/// Timing for a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub failed_extractions: usize,
    pub extraction_duration_ms: u64,
    pub analysis_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// The complete output of one run.
///
/// Only ever handed out once the run is complete: both OCR results exist (in
/// submission order) and the analysis outcome is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub ocr_results: Vec<OcrResult>,
    pub analysis: AnalysisOutcome,
    pub transcript: Vec<TranscriptMessage>,
    pub stats: RunStats,
}

impl RunRecord {
    /// Filenames in submission order.
    pub fn filenames(&self) -> Vec<&str> {
        self.ocr_results.iter().map(|r| r.filename.as_str()).collect()
    }

    /// Assistant messages only, as shown in the result view.
    pub fn assistant_messages(&self) -> impl Iterator<Item = &str> {
        self.transcript
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }

    /// Markdown result view: each document's raw text, then the narrative.
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        for result in &self.ocr_results {
            out.push_str(&format!(
                "## OCR Text #{} — {}\n\n{}\n\n",
                result.index + 1,
                result.filename,
                result.text.trim_end()
            ));
        }
        out.push_str("## Comparison Analysis\n\n");
        for content in self.assistant_messages() {
            out.push_str(content.trim_end());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunRecord {
        RunRecord {
            ocr_results: vec![
                OcrResult::extracted(0, "PO.pdf", "A".into()),
                OcrResult::failed(
                    1,
                    "Conf.pdf",
                    StageError::Extraction {
                        filename: "Conf.pdf".into(),
                        detail: "HTTP 502 Bad Gateway".into(),
                    },
                ),
            ],
            analysis: AnalysisOutcome::replied("Match".into()),
            transcript: vec![
                TranscriptMessage {
                    role: Role::User,
                    content: "Uploaded **PO.pdf** & **Conf.pdf** for OCR & analysis.".into(),
                },
                TranscriptMessage {
                    role: Role::Assistant,
                    content: "Match".into(),
                },
            ],
            stats: RunStats::default(),
        }
    }

    #[test]
    fn failed_result_carries_diagnostic_text() {
        let record = sample();
        let second = &record.ocr_results[1];
        assert!(!second.is_success());
        assert!(second.text.starts_with("⚠️ OCR error for Conf.pdf"));
    }

    #[test]
    fn render_shows_documents_in_order_then_narrative() {
        let md = sample().render_markdown();
        let first = md.find("OCR Text #1 — PO.pdf").unwrap();
        let second = md.find("OCR Text #2 — Conf.pdf").unwrap();
        let analysis = md.find("## Comparison Analysis").unwrap();
        assert!(first < second && second < analysis);
        assert!(md.ends_with("Match\n"));
        assert!(!md.contains("Uploaded **PO.pdf**"));
    }

    #[test]
    fn success_result_omits_error_in_json() {
        let json = serde_json::to_value(OcrResult::extracted(0, "a.pdf", "x".into())).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["filename"], "a.pdf");
    }
}

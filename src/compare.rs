//! Run orchestration: two documents in, one [`RunRecord`] out.
//!
//! [`Pipeline`] holds the two collaborator clients and drives a run through
//! its states:
//!
//! ```text
//! Idle → Validating → ExtractingDoc1 → ExtractingDoc2 → Aggregating → Analyzing → Complete
//!             └──────→ Rejected
//! ```
//!
//! Collaborator failures never leave this module as errors. They arrive as
//! diagnostic text inside [`OcrResult`] / [`AnalysisOutcome`], so once a run
//! passes validation it always completes.

use crate::config::PipelineConfig;
use crate::error::DocPairError;
use crate::output::{OcrResult, Role, RunRecord, RunStats, TranscriptMessage};
use crate::pipeline::analysis::{AnalysisClient, AnalysisRequest};
use crate::pipeline::input::{self, Document};
use crate::pipeline::ocr::OcrClient;
use crate::progress::PipelineProgressCallback;
use crate::session::{RunState, Session};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Exactly two documents, in submission order.
#[derive(Debug, Clone)]
pub struct DocumentPair {
    first: Document,
    second: Document,
}

impl DocumentPair {
    /// Check that `supplied` inputs can form a pair.
    ///
    /// Callers that must resolve inputs (downloads, file reads) run this first
    /// so a rejected request does no I/O.
    pub fn check_count(supplied: usize) -> Result<(), DocPairError> {
        match supplied {
            2 => Ok(()),
            n if n > 2 => Err(DocPairError::TooManyDocuments { supplied }),
            _ => Err(DocPairError::MissingDocuments { supplied }),
        }
    }

    pub fn documents(&self) -> [&Document; 2] {
        [&self.first, &self.second]
    }
}

impl TryFrom<Vec<Document>> for DocumentPair {
    type Error = DocPairError;

    fn try_from(documents: Vec<Document>) -> Result<Self, Self::Error> {
        Self::check_count(documents.len())?;
        let [first, second] = <[Document; 2]>::try_from(documents)
            .map_err(|rest| DocPairError::MissingDocuments { supplied: rest.len() })?;
        Ok(Self { first, second })
    }
}

/// The OCR and analysis clients plus the settings that drive a run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    ocr: OcrClient,
    analysis: AnalysisClient,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig) -> Result<Self, DocPairError> {
        Ok(Self {
            config: config.clone(),
            ocr: OcrClient::new(config)?,
            analysis: AnalysisClient::new(config)?,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run once in a fresh [`Session`] and return the record.
    pub async fn run(&self, documents: Vec<Document>) -> Result<RunRecord, DocPairError> {
        let mut session = Session::new();
        session.run(self, documents).await?;
        session
            .take_record()
            .ok_or_else(|| DocPairError::Internal("run finished without a record".into()))
    }

    /// Drive a validated pair from `ExtractingDoc1` to `Complete`.
    pub(crate) async fn execute(&self, pair: &DocumentPair, state: &mut RunState) -> RunRecord {
        let total_start = Instant::now();
        let [first, second] = pair.documents();
        info!("Starting comparison: {} vs {}", first.name(), second.name());
        self.notify(|cb| cb.on_run_start([first.name(), second.name()]));

        let mut transcript = vec![TranscriptMessage {
            role: Role::User,
            content: format!(
                "Uploaded **{}** & **{}** for OCR & analysis.",
                first.name(),
                second.name()
            ),
        }];

        // ── Extraction ───────────────────────────────────────────────────
        let extraction_start = Instant::now();
        let ocr_results = if self.config.concurrent_extraction {
            self.extract_concurrent(pair, state).await
        } else {
            self.extract_sequential(pair, state).await
        };
        let extraction_duration_ms = extraction_start.elapsed().as_millis() as u64;

        // ── Aggregation ──────────────────────────────────────────────────
        self.enter(state, RunState::Aggregating);
        let request = AnalysisRequest::from_results(&ocr_results);
        debug!("Aggregated {} documents for analysis", request.documents.len());

        // ── Analysis ─────────────────────────────────────────────────────
        self.enter(state, RunState::Analyzing);
        let analysis_start = Instant::now();
        let analysis = self.analysis.send(&request).await;
        let analysis_duration_ms = analysis_start.elapsed().as_millis() as u64;
        match &analysis.error {
            None => self.notify(|cb| cb.on_analysis_complete(analysis.narrative.len())),
            Some(e) => self.notify(|cb| cb.on_analysis_error(&e.to_string())),
        }
        transcript.push(TranscriptMessage {
            role: Role::Assistant,
            content: analysis.narrative.clone(),
        });

        let failed_extractions = ocr_results.iter().filter(|r| !r.is_success()).count();
        let stats = RunStats {
            failed_extractions,
            extraction_duration_ms,
            analysis_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        self.enter(state, RunState::Complete);
        info!(
            "Comparison complete: {}/2 documents extracted, analysis {}, {}ms total",
            2 - failed_extractions,
            if analysis.is_success() { "ok" } else { "failed" },
            stats.total_duration_ms
        );
        self.notify(|cb| cb.on_run_complete(failed_extractions, analysis.is_success()));

        RunRecord {
            ocr_results,
            analysis,
            transcript,
            stats,
        }
    }

    /// Extract document 1, then document 2.
    async fn extract_sequential(&self, pair: &DocumentPair, state: &mut RunState) -> Vec<OcrResult> {
        let mut results = Vec::with_capacity(2);

        self.enter(state, RunState::ExtractingDoc1);
        results.push(self.extract_one(&pair.first, 0).await);

        self.enter(state, RunState::ExtractingDoc2);
        results.push(self.extract_one(&pair.second, 1).await);

        results
    }

    /// Issue both OCR calls together; results are re-ordered by index.
    async fn extract_concurrent(&self, pair: &DocumentPair, state: &mut RunState) -> Vec<OcrResult> {
        self.enter(state, RunState::ExtractingDoc1);
        self.enter(state, RunState::ExtractingDoc2);
        let (a, b) = futures::future::join(
            self.extract_one(&pair.first, 0),
            self.extract_one(&pair.second, 1),
        )
        .await;

        let mut results = vec![a, b];
        results.sort_by_key(|r| r.index);
        results
    }

    async fn extract_one(&self, doc: &Document, index: usize) -> OcrResult {
        self.notify(|cb| cb.on_extraction_start(index, doc.name()));
        let result = self.ocr.extract(doc, index).await;
        match &result.error {
            None => self.notify(|cb| cb.on_extraction_complete(index, &result.filename, result.text.len())),
            Some(e) => self.notify(|cb| cb.on_extraction_error(index, &result.filename, &e.to_string())),
        }
        result
    }

    pub(crate) fn enter(&self, state: &mut RunState, next: RunState) {
        debug!("Run state: {} → {}", state, next);
        *state = next;
        self.notify(|cb| cb.on_state_change(next));
    }

    fn notify(&self, f: impl FnOnce(&dyn PipelineProgressCallback)) {
        if let Some(ref cb) = self.config.progress_callback {
            f(cb.as_ref());
        }
    }
}

/// Load two inputs (local paths or URLs) and compare them.
///
/// # Errors
/// Returns `Err(DocPairError)` only for fatal errors: invalid configuration,
/// an input that cannot be read or is not a PDF. Collaborator failures are
/// reported inside the returned record.
pub async fn compare(
    first: impl AsRef<str>,
    second: impl AsRef<str>,
    config: &PipelineConfig,
) -> Result<RunRecord, DocPairError> {
    let pipeline = Pipeline::new(config)?;
    let first = input::load_document(first.as_ref(), config.download_timeout_secs).await?;
    let second = input::load_document(second.as_ref(), config.download_timeout_secs).await?;
    pipeline.run(vec![first, second]).await
}

/// Synchronous wrapper around [`compare`].
///
/// Creates a temporary tokio runtime internally.
pub fn compare_sync(
    first: impl AsRef<str>,
    second: impl AsRef<str>,
    config: &PipelineConfig,
) -> Result<RunRecord, DocPairError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocPairError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(compare(first, second, config))
}

/// Compare two inputs and write the record as pretty JSON.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn compare_to_file(
    first: impl AsRef<str>,
    second: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<RunRecord, DocPairError> {
    let record = compare(first, second, config).await?;
    write_record(&record, output_path.as_ref()).await?;
    Ok(record)
}

/// Write `record` to `path` as pretty JSON, atomically.
pub async fn write_record(record: &RunRecord, path: &Path) -> Result<(), DocPairError> {
    let json = serde_json::to_string_pretty(record)
        .map_err(|e| DocPairError::Internal(format!("Failed to serialise record: {e}")))?;
    write_atomic(path, json.as_bytes()).await
}

/// Write `contents` to a sibling temp file, then rename over `path`.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), DocPairError> {
    let write_err = |e| DocPairError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);
    tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

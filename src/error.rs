//! Error types for the edgequake-docpair library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`DocPairError`] — **Fatal**: a run cannot start (wrong number of
//!   documents, unreadable input, bad configuration) or its output cannot be
//!   written. Returned as `Err(DocPairError)`.
//!
//! * [`StageError`] — **Non-fatal**: one collaborator call failed (OCR for a
//!   single document, or the analysis webhook). Stored inside
//!   [`crate::output::OcrResult`] / [`crate::output::AnalysisOutcome`] next to
//!   the diagnostic text, so the run still reaches completion.
//!
//! * [`NotificationError`] — the optional mail stage failed. Returned only by
//!   [`crate::notify::Notifier::dispatch`]; a finished
//!   [`crate::output::RunRecord`] is never affected by it.

use std::path::PathBuf;
use thiserror::Error;

/// Prefix put in front of every diagnostic placeholder.
pub const DIAGNOSTIC_PREFIX: &str = "⚠️";

/// All fatal errors returned by the edgequake-docpair library.
///
/// Collaborator failures inside a run use [`StageError`] and are stored in the
/// run's results rather than propagated here.
#[derive(Debug, Error)]
pub enum DocPairError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// Fewer than two documents were supplied.
    #[error("Please supply both documents (got {supplied} of 2).")]
    MissingDocuments { supplied: usize },

    /// More than two documents were supplied.
    #[error("Exactly two documents can be compared (got {supplied}).")]
    TooManyDocuments { supplied: usize },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{name}'\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: [u8; 4] },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client for a collaborator could not be constructed.
    #[error("Failed to build HTTP client for {collaborator}: {detail}")]
    HttpClient { collaborator: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for one collaborator call.
///
/// Stored alongside the diagnostic text in the run's results. The pipeline
/// continues to completion whatever these contain.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum StageError {
    /// The OCR request failed (transport, non-2xx status, unreadable body).
    #[error("OCR error for {filename}: {detail}")]
    Extraction { filename: String, detail: String },

    /// The OCR request exceeded its timeout.
    #[error("OCR error for {filename}: request timed out after {secs}s")]
    ExtractionTimeout { filename: String, secs: u64 },

    /// The analysis request failed.
    #[error("Analysis error: {detail}")]
    Analysis { detail: String },

    /// The analysis request exceeded its timeout.
    #[error("Analysis error: request timed out after {secs}s")]
    AnalysisTimeout { secs: u64 },
}

impl StageError {
    /// Render the placeholder shown in place of real output.
    pub fn diagnostic(&self) -> String {
        format!("{DIAGNOSTIC_PREFIX} {self}")
    }
}

/// Errors from the optional notification stage.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// No destination address was given.
    #[error("No recipient address given for the summary email")]
    MissingDestination,

    /// A sender or destination address could not be parsed.
    #[error("Invalid email address '{address}': {detail}")]
    InvalidAddress { address: String, detail: String },

    /// The run record does not hold a complete pair of results.
    #[error("Run is not complete: expected 2 OCR results, found {found}")]
    IncompleteRun { found: usize },

    /// The message could not be assembled.
    #[error("Failed to build summary email: {0}")]
    Build(String),

    /// The mail transport rejected or failed to deliver the message.
    #[error("Failed to send summary email via {relay}: {detail}")]
    Transport { relay: String, detail: String },
}

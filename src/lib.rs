//! # edgequake-docpair
//!
//! Compare two PDF documents through a remote OCR service and a remote
//! analysis service.
//!
//! Each document is uploaded to the OCR service, the two extracted texts are
//! sent together to an analysis webhook, and the returned narrative is kept
//! next to the raw OCR text in a [`RunRecord`]. A summary can then be mailed
//! with [`Notifier`].
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF #1 ─┐
//!         ├─ 1. Input     read local file or download from URL
//! PDF #2 ─┘
//!            2. OCR       multipart upload, one document after the other
//!            3. Normalize JSON object / array / scalar / plain text → text
//!            4. Analysis  {"documents": [...]} → narrative
//!            5. Record    OCR texts + narrative (+ optional summary mail)
//! ```
//!
//! A failing collaborator call never aborts a run: its output slot holds a
//! `⚠️`-prefixed diagnostic instead, and the run still completes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docpair::{compare, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder()
//!         .ocr_url("https://ocr.example.com/upload-pdf/")
//!         .analysis_url("https://n8n.example.com/webhook/compare")
//!         .build()?;
//!     let record = compare("client.pdf", "policy.pdf", &config).await?;
//!     println!("{}", record.analysis.narrative);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docpair` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod compare;
pub mod config;
pub mod error;
pub mod notify;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use compare::{compare, compare_sync, compare_to_file, write_record, DocumentPair, Pipeline};
pub use config::{MailConfig, MailSecurity, PipelineConfig, PipelineConfigBuilder};
pub use error::{DocPairError, NotificationError, StageError, DIAGNOSTIC_PREFIX};
pub use notify::{format_summary, MailTransport, Notifier, OutgoingMail, SmtpMailTransport};
pub use output::{AnalysisOutcome, OcrResult, Role, RunRecord, RunStats, TranscriptMessage};
pub use pipeline::input::{load_document, Document};
pub use pipeline::normalize::{normalize, normalize_bytes, Capability, Payload};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
pub use session::{RunState, Session};

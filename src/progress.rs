//! Progress-callback trait for pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the run moves through its states and collaborator calls.
//!
//! # Example
//!
//! ```rust
//! use edgequake_docpair::{PipelineConfig, PipelineProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     extracted: Arc<AtomicUsize>,
//! }
//!
//! impl PipelineProgressCallback for CountingCallback {
//!     fn on_extraction_complete(&self, index: usize, filename: &str, text_len: usize) {
//!         self.extracted.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Document {} ({}) done: {} chars", index + 1, filename, text_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     extracted: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = PipelineConfig::builder()
//!     .ocr_url("http://localhost:8000/upload-pdf/")
//!     .analysis_url("http://localhost:5678/webhook/compare")
//!     .progress_callback(counter as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::session::RunState;
use std::sync::Arc;

/// Called by the pipeline as a run progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
///
/// # Thread safety
///
/// With concurrent extraction enabled, `on_extraction_*` may be called from
/// two in-flight futures. Implementations must protect shared mutable state
/// (e.g. `Mutex`, `AtomicUsize`).
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once a run has passed validation.
    ///
    /// # Arguments
    /// * `filenames` — the two document names, in submission order
    fn on_run_start(&self, filenames: [&str; 2]) {
        let _ = filenames;
    }

    /// Called on every state transition, including `Rejected`.
    fn on_state_change(&self, state: RunState) {
        let _ = state;
    }

    /// Called just before a document is sent to the OCR service.
    ///
    /// # Arguments
    /// * `index`    — 0-based submission position
    /// * `filename` — document name
    fn on_extraction_start(&self, index: usize, filename: &str) {
        let _ = (index, filename);
    }

    /// Called when OCR text was extracted for a document.
    fn on_extraction_complete(&self, index: usize, filename: &str, text_len: usize) {
        let _ = (index, filename, text_len);
    }

    /// Called when the OCR call for a document failed. The run continues.
    fn on_extraction_error(&self, index: usize, filename: &str, error: &str) {
        let _ = (index, filename, error);
    }

    /// Called when the analysis service returned a narrative.
    fn on_analysis_complete(&self, narrative_len: usize) {
        let _ = narrative_len;
    }

    /// Called when the analysis call failed. The run still completes.
    fn on_analysis_error(&self, error: &str) {
        let _ = error;
    }

    /// Called once after the run reached `Complete`.
    ///
    /// # Arguments
    /// * `failed_extractions` — documents whose OCR result is a diagnostic
    /// * `analysis_ok`        — whether the narrative is real output
    fn on_run_complete(&self, failed_extractions: usize, analysis_ok: bool) {
        let _ = (failed_extractions, analysis_ok);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct TrackingCallback {
        states: Mutex<Vec<RunState>>,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl PipelineProgressCallback for TrackingCallback {
        fn on_state_change(&self, state: RunState) {
            self.states.lock().unwrap().push(state);
        }

        fn on_extraction_complete(&self, _index: usize, _filename: &str, _text_len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_extraction_error(&self, _index: usize, _filename: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(["a.pdf", "b.pdf"]);
        cb.on_state_change(RunState::Analyzing);
        cb.on_extraction_start(0, "a.pdf");
        cb.on_extraction_complete(0, "a.pdf", 42);
        cb.on_extraction_error(1, "b.pdf", "HTTP 502");
        cb.on_analysis_error("timeout");
        cb.on_run_complete(1, false);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            states: Mutex::new(Vec::new()),
            completes: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        };

        tracker.on_state_change(RunState::ExtractingDoc1);
        tracker.on_extraction_complete(0, "a.pdf", 100);
        tracker.on_state_change(RunState::ExtractingDoc2);
        tracker.on_extraction_error(1, "b.pdf", "connection refused");

        assert_eq!(
            *tracker.states.lock().unwrap(),
            vec![RunState::ExtractingDoc1, RunState::ExtractingDoc2]
        );
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn PipelineProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_run_start(["x.pdf", "y.pdf"]);
        cb.on_analysis_complete(512);
    }
}

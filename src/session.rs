//! Session-scoped run state.
//!
//! A [`Session`] owns the current [`RunRecord`] and the state of the run that
//! produced it. Separate sessions never share anything, so concurrent runs
//! only need one session each.

use crate::compare::{DocumentPair, Pipeline};
use crate::error::DocPairError;
use crate::output::RunRecord;
use crate::pipeline::input::Document;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Where a run currently is.
///
/// `Rejected` is reachable only from `Validating`; every other run ends in
/// `Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    Idle,
    Validating,
    Rejected,
    ExtractingDoc1,
    ExtractingDoc2,
    Aggregating,
    Analyzing,
    Complete,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::Validating => "validating",
            RunState::Rejected => "rejected",
            RunState::ExtractingDoc1 => "extracting document 1",
            RunState::ExtractingDoc2 => "extracting document 2",
            RunState::Aggregating => "aggregating",
            RunState::Analyzing => "analyzing",
            RunState::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// The current record and run state for one user.
#[derive(Debug, Default)]
pub struct Session {
    record: Option<RunRecord>,
    state: RunState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// The record of the last completed run, if any.
    pub fn record(&self) -> Option<&RunRecord> {
        self.record.as_ref()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Take the record out, leaving the session empty.
    pub fn take_record(&mut self) -> Option<RunRecord> {
        self.record.take()
    }

    /// Run the pipeline on `documents`.
    ///
    /// A rejected request leaves the previous record in place. An accepted
    /// one drops the previous record before the first OCR call.
    pub async fn run(
        &mut self,
        pipeline: &Pipeline,
        documents: Vec<Document>,
    ) -> Result<&RunRecord, DocPairError> {
        pipeline.enter(&mut self.state, RunState::Validating);
        let pair = match DocumentPair::try_from(documents) {
            Ok(pair) => pair,
            Err(e) => {
                pipeline.enter(&mut self.state, RunState::Rejected);
                info!("Run rejected: {}", e);
                return Err(e);
            }
        };

        self.record = None;
        let record = pipeline.execute(&pair, &mut self.state).await;
        Ok(&*self.record.insert(record))
    }
}

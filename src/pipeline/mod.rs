//! Pipeline stages for a document-pair comparison.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own against a mock HTTP server.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ ocr (×2) ──▶ analysis
//! (path/URL)  (multipart)   (JSON aggregate)
//!               │              │
//!               └── normalize ─┘
//! ```
//!
//! 1. [`input`]     — load a local path or URL into a [`input::Document`]
//! 2. [`ocr`]       — upload one document; failures become diagnostic text
//! 3. [`analysis`]  — post both OCR texts; failures become diagnostic text
//! 4. [`normalize`] — reduce any collaborator reply to a single string

pub mod analysis;
pub mod input;
pub mod normalize;
pub mod ocr;

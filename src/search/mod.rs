//! Retrieval pipeline.
//!
//! `SearchService` orchestrates one query end to end:
//! embed -> reconcile -> nearest-neighbor -> synthesize. Each stage
//! degrades gracefully; the service always produces a response for a
//! non-empty query.

mod embedder;
mod service;
mod synthesizer;

pub use embedder::EmbeddingService;
pub use service::{QueryResponse, SearchService};
pub use synthesizer::{AnswerSynthesizer, EMPTY_ANSWER, FALLBACK_ANSWER};

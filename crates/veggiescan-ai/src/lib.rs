//! Vision model access and result normalization.
//!
//! [`ScanAnalyzer`] is the seam to the remote inference endpoint; the
//! [`normalizer`] turns whatever text comes back (clean JSON, JSON inside a
//! markdown fence, or loose `Label: value` lines) into a canonical
//! [`veggiescan_common::types::ScanResult`], and the [`mock`] generator
//! supplies a deterministic answer when no content is available at all.

pub mod analyzer;
pub mod fingerprint;
pub mod mock;
pub mod models;
pub mod normalizer;
pub mod prompt;
pub mod providers;

pub use analyzer::ScanAnalyzer;
pub use fingerprint::content_fingerprint;
pub use normalizer::{normalize, CACHED_CONFIDENCE, FRESH_CONFIDENCE};
pub use providers::openai_compat::OpenAiCompatProvider;

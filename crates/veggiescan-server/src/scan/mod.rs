//! Image scan flow: content hash, cache lookup, vision model, normalization,
//! persistence and the admin dataset archive.

pub mod api;
pub mod archive;
pub mod pipeline;
pub mod strategy;

pub use pipeline::ScanPipeline;
pub use strategy::{ResultSource, ScanOutcome, ScanStrategy};

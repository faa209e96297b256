//! The export pipeline: extraction and the engine that sequences a run

pub mod engine;
pub mod extractor;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{IngestEngine, IngestJob, Outcome};
pub use extractor::ExtractTarget;

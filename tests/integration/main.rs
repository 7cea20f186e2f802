//! End-to-end tests: slate JSON through normalizer, resolver and the full
//! candidate pipeline.

mod fixtures;
mod pipeline;

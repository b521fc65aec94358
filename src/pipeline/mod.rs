// End-to-end workflows built from the corpus, scoring and output layers.

pub mod analyze;
pub mod artifacts;

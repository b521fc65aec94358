// Model building blocks used by the engines.
//
// Linear classifiers for the attribution engine, plus the dimensionality
// reduction and density clustering behind the clustering fallback. Every RNG
// is seeded: the same corpus always produces the same word scores.

pub mod dbscan;
pub mod kpca;
pub mod linear;
pub mod logistic;
pub mod metrics;
pub mod svm;

// textcatvis: which words make a text category what it is
//
// This is the library root. Each module corresponds to a major subsystem
// of the word-relevance pipeline.

pub mod cluster;
pub mod config;
pub mod corpus;
pub mod features;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod query;
pub mod scoring;

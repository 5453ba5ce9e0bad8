// Matching core: keyword extraction, normalization, scoring and ranking.
// Everything except `handlers` and `scorer` is synchronous and free of I/O.

pub mod config;
pub mod engine;
pub mod handlers;
pub mod keywords;
pub mod normalize;
pub mod prompts;
pub mod report;
pub mod scorer;
pub mod scoring;

pub use config::MatchConfig;
pub use engine::MatchEngine;
pub use scorer::{HeuristicScorer, LlmMatchScorer, MatchScorer};

// Ember: multi-signal content moderation for social feeds.
//
// This is the library root. Data flows one way through the modules:
// signals (raw readings) -> scoring (normalize, aggregate, classify)
// -> report (batch summary) -> output (terminal, files).

pub mod config;
pub mod error;
pub mod feed;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod signals;

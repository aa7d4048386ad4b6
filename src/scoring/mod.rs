// Scoring core — normalization, weighted aggregation, and classification.
//
// Pure functions over immutable inputs. Nothing in here does I/O, so the
// batch pipeline can fan posts out across tasks freely.

pub mod aggregate;
pub mod classify;
pub mod engine;
pub mod normalize;

// Pipelines — orchestration over the scoring core.

pub mod batch;

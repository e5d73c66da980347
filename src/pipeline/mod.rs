pub mod coordinator;
pub mod fetcher;
pub mod forecaster;
pub mod loader;
pub mod trainer;

pub use coordinator::{run_pipeline, run_refresh, PipelineStage, RunReport};

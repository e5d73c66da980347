pub mod pipeline_job;

pub use pipeline_job::PipelineJob;

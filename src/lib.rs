pub mod analyzers;
pub mod cli;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod processors;
pub mod readers;
pub mod settings;
pub mod utils;
pub mod writers;

pub use error::{ProcessingError, Result};
pub use processors::{Pipeline, RunReport};
pub use settings::PipelineConfig;

use connectors::error::SourceError;
use engine_config::error::ConfigError;
use engine_core::error::PipelineError;
use planner::error::TemplateError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid env file: {0}")]
    Env(String),

    #[error("Failed to set up the SPARQL client: {0}")]
    Client(#[from] SourceError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Failed to read dump file {path}: {source}")]
    DumpRead {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Invalid query template: {0}")]
    Template(#[from] TemplateError),

    #[error("Dataset '{0}' has a fixed total and no count query")]
    NoCountQuery(String),

    #[error("Shutdown requested")]
    ShutdownRequested,
}

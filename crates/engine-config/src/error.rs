use planner::error::TemplateError;
use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid dataset '{name}': {reason}")]
    InvalidDataset { name: String, reason: String },

    #[error("Unknown dataset '{0}'")]
    UnknownDataset(String),

    #[error("Invalid query template for dataset '{name}': {source}")]
    Template {
        name: String,
        #[source]
        source: TemplateError,
    },
}

impl ConfigError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidDataset {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

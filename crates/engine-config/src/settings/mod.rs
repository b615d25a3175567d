use crate::error::ConfigError;
use connectors::sparql::settings::EndpointSettings;
use dataset::DatasetConfig;
use engine_core::pipeline::DatasetJob;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeSet, HashMap},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

pub mod dataset;

pub const ENDPOINT_ENV: &str = "SPARQL_ENDPOINT";
pub const OUTPUT_DIR_ENV: &str = "DUMP_OUTPUT_DIR";
pub const DEFAULT_ENDPOINT: &str = "https://data-issa.cirad.fr/sparql";
pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// Top-level configuration: one endpoint, one output directory, many datasets.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DumpConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: EndpointSettings,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub datasets: Vec<DatasetConfig>,

    /// Directory `query_file` paths are resolved against.
    #[serde(skip)]
    base_dir: PathBuf,
}

fn default_endpoint() -> EndpointSettings {
    EndpointSettings::new(DEFAULT_ENDPOINT)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

impl DumpConfig {
    pub fn new(endpoint: EndpointSettings, datasets: Vec<DatasetConfig>) -> Self {
        DumpConfig {
            endpoint,
            output_dir: default_output_dir(),
            datasets,
            base_dir: PathBuf::from("."),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_toml(&content)?;
        config.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        info!(
            path = %path.display(),
            datasets = config.datasets.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: DumpConfig = toml::from_str(content)?;
        config.base_dir = PathBuf::from(".");
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = BTreeSet::new();
        for dataset in &self.datasets {
            dataset.validate()?;
            if !names.insert(dataset.name.as_str()) {
                return Err(ConfigError::invalid(&dataset.name, "duplicate dataset name"));
            }
        }
        Ok(())
    }

    /// `SPARQL_ENDPOINT` replaces the endpoint URL, `DUMP_OUTPUT_DIR` the output directory.
    pub fn apply_env(&mut self, vars: &HashMap<String, String>) {
        if let Some(url) = vars.get(ENDPOINT_ENV).filter(|v| !v.is_empty()) {
            debug!(url = %url, "Endpoint overridden from {ENDPOINT_ENV}");
            self.endpoint.url = url.clone();
        }
        if let Some(dir) = vars.get(OUTPUT_DIR_ENV).filter(|v| !v.is_empty()) {
            debug!(dir = %dir, "Output directory overridden from {OUTPUT_DIR_ENV}");
            self.output_dir = PathBuf::from(dir);
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn dataset_names(&self) -> impl Iterator<Item = &str> {
        self.datasets.iter().map(|d| d.name.as_str())
    }

    pub fn dataset(&self, name: &str) -> Result<&DatasetConfig, ConfigError> {
        self.datasets
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| ConfigError::UnknownDataset(name.to_string()))
    }

    pub fn job(&self, name: &str) -> Result<DatasetJob, ConfigError> {
        self.dataset(name)?.to_job(&self.base_dir)
    }

    /// Jobs for every dataset, in declaration order.
    pub fn jobs(&self) -> Result<Vec<DatasetJob>, ConfigError> {
        self.datasets
            .iter()
            .map(|d| d.to_job(&self.base_dir))
            .collect()
    }
}

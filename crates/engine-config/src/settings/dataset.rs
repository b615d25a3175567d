use crate::error::ConfigError;
use engine_core::pipeline::{DatasetJob, TotalResults};
use model::schema::field::RecordSchema;
use planner::query::{page::PagePlan, template::QueryTemplate};
use serde::{Deserialize, Serialize};
use std::{
    num::NonZeroU64,
    path::{Path, PathBuf},
};

pub const DEFAULT_PAGE_SIZE: NonZeroU64 = NonZeroU64::new(10_000).unwrap();
pub const DEFAULT_COUNT_VAR: &str = "count";

const MISSING_QUERY: &str = "one of `query` or `query_file` is required";
const MISSING_TOTAL: &str = "exactly one of `total`, `count_query` or `count_query_file` is required";

/// One `[[datasets]]` entry.
///
/// The paged query comes from exactly one of `query` / `query_file`, and the
/// expected number of results from exactly one of `total`, `count_query` or
/// `count_query_file`. Files are resolved relative to the configuration file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    pub name: String,
    pub output: String,
    #[serde(default = "default_page_size")]
    pub page_size: NonZeroU64,
    pub fields: RecordSchema,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_query_file: Option<PathBuf>,
    #[serde(default = "default_count_var")]
    pub count_var: String,
}

fn default_page_size() -> NonZeroU64 {
    DEFAULT_PAGE_SIZE
}

fn default_count_var() -> String {
    DEFAULT_COUNT_VAR.to_string()
}

impl DatasetConfig {
    /// Checks that every source is specified exactly once. Files are not read here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::invalid(&self.name, "name must not be empty"));
        }
        if self.output.trim().is_empty() {
            return Err(ConfigError::invalid(&self.name, "output must not be empty"));
        }

        match (&self.query, &self.query_file) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::invalid(
                    &self.name,
                    "`query` and `query_file` are mutually exclusive",
                ));
            }
            (None, None) => {
                return Err(ConfigError::invalid(&self.name, MISSING_QUERY));
            }
            _ => {}
        }

        let totals = [
            self.total.is_some(),
            self.count_query.is_some(),
            self.count_query_file.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();
        if totals != 1 {
            return Err(ConfigError::invalid(&self.name, MISSING_TOTAL));
        }

        if let Some(total) = self.total {
            PagePlan::new(total, self.page_size)
                .map_err(|e| ConfigError::invalid(&self.name, e.to_string()))?;
        }

        if self.count_var.trim().is_empty() {
            return Err(ConfigError::invalid(&self.name, "count_var must not be empty"));
        }

        Ok(())
    }

    /// Loads query files and checks the template, producing a runnable job.
    pub fn to_job(&self, base_dir: &Path) -> Result<DatasetJob, ConfigError> {
        self.validate()?;

        let template = match (&self.query, &self.query_file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => read_query(base_dir, path)?,
            (None, None) => return Err(ConfigError::invalid(&self.name, MISSING_QUERY)),
        };
        QueryTemplate::parse(&template).map_err(|source| ConfigError::Template {
            name: self.name.clone(),
            source,
        })?;

        let total = match (self.total, &self.count_query, &self.count_query_file) {
            (Some(n), _, _) => TotalResults::Fixed(n),
            (None, Some(query), _) => TotalResults::CountQuery {
                query: query.clone(),
                var: self.count_var.clone(),
            },
            (None, None, Some(path)) => TotalResults::CountQuery {
                query: read_query(base_dir, path)?,
                var: self.count_var.clone(),
            },
            (None, None, None) => return Err(ConfigError::invalid(&self.name, MISSING_TOTAL)),
        };

        Ok(DatasetJob {
            name: self.name.clone(),
            template,
            total,
            page_size: self.page_size,
            schema: self.fields.clone(),
            output: self.output.clone(),
        })
    }
}

fn read_query(base_dir: &Path, path: &Path) -> Result<String, ConfigError> {
    let path = base_dir.join(path);
    std::fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "SELECT * WHERE { ?s ?p ?o } OFFSET %(offset)s LIMIT %(limit)s";

    fn dataset() -> DatasetConfig {
        toml::from_str(&format!(
            r#"
            name = "agrovoc-entities"
            output = "dumpAgrovocEntities.json"
            total = 18000
            fields = ["entityUri", "entityLabel", "entityPrefLabel?", "count"]
            query = "{TEMPLATE}"
            "#
        ))
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let ds = dataset();
        assert_eq!(ds.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(ds.count_var, "count");
        assert!(ds.fields.optional_keys().contains("entityPrefLabel"));
        ds.validate().unwrap();
    }

    #[test]
    fn test_to_job_with_fixed_total() {
        let job = dataset().to_job(Path::new(".")).unwrap();
        assert_eq!(job.total, TotalResults::Fixed(18000));
        assert_eq!(job.template, TEMPLATE);
        assert_eq!(job.output, "dumpAgrovocEntities.json");
    }

    #[test]
    fn test_conflicting_sources_rejected() {
        let mut ds = dataset();
        ds.count_query = Some("SELECT (count(*) as ?count) {}".into());
        assert!(matches!(
            ds.validate(),
            Err(ConfigError::InvalidDataset { .. })
        ));

        let mut ds = dataset();
        ds.query_file = Some("q.rq".into());
        assert!(ds.validate().is_err());

        let mut ds = dataset();
        ds.query = None;
        assert!(ds.validate().is_err());

        let mut ds = dataset();
        ds.total = None;
        assert!(ds.validate().is_err());
    }

    #[test]
    fn test_uncountable_total_rejected() {
        let mut ds = dataset();
        ds.total = Some(u64::MAX);
        ds.page_size = NonZeroU64::MIN;
        assert!(matches!(
            ds.validate(),
            Err(ConfigError::InvalidDataset { .. })
        ));
    }

    #[test]
    fn test_zero_page_size_rejected_at_parse() {
        let result: Result<DatasetConfig, _> = toml::from_str(
            r#"
            name = "x"
            output = "x.json"
            page_size = 0
            total = 1
            fields = ["entityUri"]
            query = "OFFSET %(offset)s LIMIT %(limit)s"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_template_rejected() {
        let mut ds = dataset();
        ds.query = Some("SELECT * WHERE { ?s ?p ?o } LIMIT %(limit)s".into());
        assert!(matches!(
            ds.to_job(Path::new(".")),
            Err(ConfigError::Template { .. })
        ));
    }

    #[test]
    fn test_query_files_resolved_from_base_dir() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("queries")).unwrap();
        std::fs::write(tmp.path().join("queries/page.rq"), TEMPLATE).unwrap();
        std::fs::write(
            tmp.path().join("queries/count.rq"),
            "SELECT (count(?s) as ?n) WHERE { ?s ?p ?o }",
        )
        .unwrap();

        let mut ds = dataset();
        ds.query = None;
        ds.query_file = Some("queries/page.rq".into());
        ds.total = None;
        ds.count_query_file = Some("queries/count.rq".into());
        ds.count_var = "n".into();

        let job = ds.to_job(tmp.path()).unwrap();
        assert_eq!(job.template, TEMPLATE);
        assert_eq!(
            job.total,
            TotalResults::CountQuery {
                query: "SELECT (count(?s) as ?n) WHERE { ?s ?p ?o }".into(),
                var: "n".into()
            }
        );
    }

    #[test]
    fn test_missing_query_file() {
        let mut ds = dataset();
        ds.query = None;
        ds.query_file = Some("nowhere.rq".into());
        assert!(matches!(
            ds.to_job(Path::new("/nonexistent")),
            Err(ConfigError::Read { .. })
        ));
    }
}

use crate::error::SourceError;
use model::records::raw::RawRow;
use serde::Deserialize;

pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
struct Head {
    #[serde(default)]
    vars: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
struct Bindings {
    bindings: Vec<RawRow>,
}

/// A SELECT result in the SPARQL 1.1 JSON results format.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct QueryResults {
    #[serde(default)]
    head: Head,
    results: Bindings,
}

impl QueryResults {
    pub fn new(vars: Vec<String>, rows: Vec<RawRow>) -> Self {
        QueryResults {
            head: Head { vars },
            results: Bindings { bindings: rows },
        }
    }

    pub fn from_rows(rows: Vec<RawRow>) -> Self {
        Self::new(Vec::new(), rows)
    }

    pub fn parse(body: &[u8]) -> Result<Self, SourceError> {
        serde_json::from_slice(body).map_err(|e| SourceError::MalformedResponse(e.to_string()))
    }

    pub fn vars(&self) -> &[String] {
        &self.head.vars
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.results.bindings
    }

    pub fn into_rows(self) -> Vec<RawRow> {
        self.results.bindings
    }

    pub fn len(&self) -> usize {
        self.results.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.bindings.is_empty()
    }

    /// Value of `var` in the first row, as returned by aggregate queries.
    pub fn scalar(&self, var: &str) -> Result<&str, SourceError> {
        let row = self.rows().first().ok_or_else(|| {
            SourceError::MalformedResponse(format!("expected one row with '{var}', got none"))
        })?;

        row.value(var).ok_or_else(|| {
            SourceError::MalformedResponse(format!("variable '{var}' is not bound in first row"))
        })
    }
}

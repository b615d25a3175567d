use connectors::error::SourceError;
use planner::{
    error::{PlanError, TemplateError},
    query::page::PageRequest,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// The query and the record schema disagree on which variables are always bound.
    #[error("Row {row} has no binding for required variable '{field}'")]
    MissingRequiredField { row: usize, field: String },
}

/// What went wrong while fetching a page.
#[derive(Error, Debug)]
pub enum FetchErrorKind {
    #[error("transport error: {0}")]
    Transport(#[source] SourceError),

    #[error("malformed response: {0}")]
    MalformedResponse(#[source] SourceError),

    #[error("{0}")]
    MissingRequiredField(#[from] NormalizeError),

    #[error("cannot render query template: {0}")]
    TemplateRender(#[from] TemplateError),

    #[error("cannot plan pages: {0}")]
    Plan(#[from] PlanError),

    #[error("cancelled before the page was requested")]
    Cancelled,
}

impl From<SourceError> for FetchErrorKind {
    fn from(err: SourceError) -> Self {
        if err.is_transport() || matches!(err, SourceError::InvalidSettings(_)) {
            FetchErrorKind::Transport(err)
        } else {
            FetchErrorKind::MalformedResponse(err)
        }
    }
}

/// Failure report of a paginated fetch. Identifies the page that failed and
/// the last page that completed, so an operator can tell how far the run got.
#[derive(Error, Debug)]
#[error(
    "Fetch failed on page {page} (offset {offset}, limit {limit}; last completed page: {}): {kind}",
    display_page(.last_completed_page)
)]
pub struct FetchError {
    pub page: u64,
    pub offset: u64,
    pub limit: u64,
    pub last_completed_page: Option<u64>,
    #[source]
    pub kind: FetchErrorKind,
}

fn display_page(page: &Option<u64>) -> String {
    page.map_or_else(|| "none".to_string(), |p| p.to_string())
}

impl FetchError {
    pub fn at(page: &PageRequest, last_completed_page: Option<u64>, kind: FetchErrorKind) -> Self {
        FetchError {
            page: page.index,
            offset: page.offset,
            limit: page.limit,
            last_completed_page,
            kind,
        }
    }
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Invalid output name '{0}': must be a relative path without '..'")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to resolve the total result count: {0}")]
    Count(#[source] SourceError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to serialize result set: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to persist '{name}': {source}")]
    Persist {
        name: String,
        #[source]
        source: SinkError,
    },
}

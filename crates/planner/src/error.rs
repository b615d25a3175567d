use thiserror::Error;

/// Failure to turn a query template into executable query text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template is missing the %({0})s placeholder")]
    MissingPlaceholder(&'static str),

    #[error("Unknown placeholder %({name})s at byte {position}")]
    UnknownPlaceholder { name: String, position: usize },

    #[error("Malformed template at byte {position}: {reason}")]
    Malformed { position: usize, reason: String },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlanError {
    #[error("{total} results in pages of {page_size} need more pages than can be counted")]
    TooManyPages { total: u64, page_size: u64 },
}

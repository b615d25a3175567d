use crate::{error::SourceError, sparql::results::QueryResults};
use async_trait::async_trait;

/// Runs one query against a remote query service and returns its rows.
///
/// Endpoint address, protocol details and timeouts are the implementor's
/// business; callers only see rows or an error.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &str) -> Result<QueryResults, SourceError>;

    /// Address of the service, for diagnostics.
    fn endpoint(&self) -> &str;
}

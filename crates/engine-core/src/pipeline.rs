use crate::{
    connectors::sink::Sink,
    error::PipelineError,
    fetcher::PageFetcher,
    normalizer::RowNormalizer,
};
use connectors::{error::SourceError, source::QueryExecutor};
use model::schema::field::RecordSchema;
use serde::Serialize;
use std::{num::NonZeroU64, sync::Arc, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// How many results a dataset is expected to have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TotalResults {
    /// Known up front.
    Fixed(u64),
    /// Asked from the endpoint before paging: `var` in the first row of `query`.
    CountQuery { query: String, var: String },
}

/// Everything needed to produce one dump.
#[derive(Debug, Clone)]
pub struct DatasetJob {
    pub name: String,
    pub template: String,
    pub total: TotalResults,
    pub page_size: NonZeroU64,
    pub schema: RecordSchema,
    pub output: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DumpSummary {
    pub dataset: String,
    pub total: u64,
    pub records: usize,
    pub pages: usize,
    pub output: String,
    pub elapsed_ms: u128,
}

/// Fetch, serialize, persist. Nothing is persisted unless every page succeeded.
pub struct DumpPipeline {
    executor: Arc<dyn QueryExecutor>,
    sink: Arc<dyn Sink>,
    cancel: Option<CancellationToken>,
}

impl DumpPipeline {
    pub fn new(executor: Arc<dyn QueryExecutor>, sink: Arc<dyn Sink>) -> Self {
        DumpPipeline {
            executor,
            sink,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub async fn run(&self, job: &DatasetJob) -> Result<DumpSummary, PipelineError> {
        let start = Instant::now();
        info!(dataset = %job.name, "Starting dump");

        let total = self.resolve_total(&job.total).await?;

        let mut fetcher = PageFetcher::new(self.executor.clone());
        if let Some(token) = &self.cancel {
            fetcher = fetcher.with_cancellation(token.clone());
        }
        let normalizer = RowNormalizer::new(job.schema.clone());

        let result = fetcher
            .fetch_all(&job.template, total, job.page_size, &normalizer)
            .await
            .inspect_err(|e| error!(dataset = %job.name, error = %e, "Dump aborted"))?;

        info!(records = result.len(), "Formatting the JSON output...");
        let content = result.to_pretty_json()?;

        info!(output = %job.output, "Writing the output...");
        self.sink
            .persist(&job.output, &content)
            .await
            .map_err(|source| PipelineError::Persist {
                name: job.output.clone(),
                source,
            })?;

        let summary = DumpSummary {
            dataset: job.name.clone(),
            total,
            records: result.len(),
            pages: result.pages_fetched(),
            output: self.sink.location(&job.output),
            elapsed_ms: start.elapsed().as_millis(),
        };
        info!(
            dataset = %summary.dataset,
            records = summary.records,
            pages = summary.pages,
            output = %summary.output,
            "Dump complete"
        );
        Ok(summary)
    }

    async fn resolve_total(&self, total: &TotalResults) -> Result<u64, PipelineError> {
        match total {
            TotalResults::Fixed(n) => Ok(*n),
            TotalResults::CountQuery { query, var } => {
                info!("Counting the number of results to process...");
                let results = self
                    .executor
                    .execute(query)
                    .await
                    .map_err(PipelineError::Count)?;
                let raw = results.scalar(var).map_err(PipelineError::Count)?;
                let count = parse_count(raw).map_err(PipelineError::Count)?;
                info!(count, "Number of results to process: {count}");
                Ok(count)
            }
        }
    }
}

/// Accepts plain integer literals, optionally followed by a fractional part of
/// zeros (`"18000.0"`), which some endpoints emit for aggregates.
fn parse_count(raw: &str) -> Result<u64, SourceError> {
    let raw = raw.trim();
    let digits = match raw.split_once('.') {
        Some((int, frac)) if !frac.is_empty() && frac.bytes().all(|b| b == b'0') => int,
        Some(_) => "",
        None => raw,
    };

    digits
        .bytes()
        .all(|b| b.is_ascii_digit())
        .then(|| digits.parse::<u64>().ok())
        .flatten()
        .ok_or_else(|| {
            SourceError::MalformedResponse(format!("count '{raw}' is not a non-negative integer"))
        })
}

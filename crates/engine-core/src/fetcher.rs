use crate::{
    error::{FetchError, FetchErrorKind},
    normalizer::RowNormalizer,
};
use connectors::source::QueryExecutor;
use model::records::result_set::ResultSet;
use planner::query::{
    page::{PagePlan, PageRequest},
    template::QueryTemplate,
};
use std::{num::NonZeroU64, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs one logical query as a sequence of offset/limit pages.
///
/// Pages are requested strictly one after the other: page `i + 1` is only
/// sent once page `i` has been received and normalized. The first failing
/// page aborts the whole fetch and no partial result is returned.
pub struct PageFetcher {
    executor: Arc<dyn QueryExecutor>,
    cancel: Option<CancellationToken>,
}

impl PageFetcher {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        PageFetcher {
            executor,
            cancel: None,
        }
    }

    /// Stops the fetch between pages once `token` is cancelled.
    /// A request already in flight always runs to completion.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Parses `template` and fetches every page needed to cover `total` results.
    pub async fn fetch_all(
        &self,
        template: &str,
        total: u64,
        page_size: NonZeroU64,
        normalizer: &RowNormalizer,
    ) -> Result<ResultSet, FetchError> {
        let first = PageRequest::new(0, page_size.get());
        let plan =
            PagePlan::new(total, page_size).map_err(|e| FetchError::at(&first, None, e.into()))?;
        let template =
            QueryTemplate::parse(template).map_err(|e| FetchError::at(&first, None, e.into()))?;

        self.fetch_plan(&template, plan, normalizer).await
    }

    pub async fn fetch_plan(
        &self,
        template: &QueryTemplate,
        plan: PagePlan,
        normalizer: &RowNormalizer,
    ) -> Result<ResultSet, FetchError> {
        let mut result = ResultSet::new();
        let mut last_completed = None;
        let page_count = plan.page_count();

        info!(
            endpoint = self.executor.endpoint(),
            total = plan.total(),
            page_size = plan.page_size(),
            pages = page_count,
            "Starting paginated fetch"
        );

        for page in plan.pages() {
            if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
                warn!(page = page.index, "Fetch cancelled");
                return Err(FetchError::at(
                    &page,
                    last_completed,
                    FetchErrorKind::Cancelled,
                ));
            }

            info!(
                "Querying SPARQL endpoint [limit: {}, offset: {}]...",
                page.limit, page.offset
            );
            let query = template.render(&page);
            debug!(page = page.index, %query, "Rendered query");

            let rows = self
                .executor
                .execute(&query)
                .await
                .map_err(|e| FetchError::at(&page, last_completed, e.into()))?
                .into_rows();

            let records = normalizer
                .normalize(&rows)
                .map_err(|e| FetchError::at(&page, last_completed, e.into()))?;

            debug!(page = page.index, rows = records.len(), "Page normalized");

            if page.index + 1 == page_count && records.len() as u64 >= page.limit {
                warn!(
                    offset = page.offset,
                    rows = records.len(),
                    "Last page came back full; the expected total may be too low and results truncated"
                );
            }

            result.push_page(records);
            last_completed = Some(page.index);
        }

        info!(
            records = result.len(),
            pages = result.pages_fetched(),
            "Fetch complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use connectors::{error::SourceError, sparql::results::QueryResults};
    use model::{
        records::raw::{BoundValue, RawRow},
        schema::field::RecordSchema,
    };
    use std::sync::Mutex;

    /// Serves rows from an in-memory table, honoring `LIMIT n OFFSET m` in the query.
    struct MockExecutor {
        rows: Vec<RawRow>,
        queries: Mutex<Vec<String>>,
        fail_on_call: Option<(usize, fn() -> SourceError)>,
    }

    impl MockExecutor {
        fn with_rows(n: usize) -> Self {
            let rows = (0..n)
                .map(|i| {
                    RawRow::new()
                        .bind("uri", BoundValue::uri(&format!("http://example.org/{i}")))
                        .bind("label", BoundValue::literal(&format!("label {i}")))
                })
                .collect();
            MockExecutor {
                rows,
                queries: Mutex::new(Vec::new()),
                fail_on_call: None,
            }
        }

        fn failing_on(mut self, call: usize, err: fn() -> SourceError) -> Self {
            self.fail_on_call = Some((call, err));
            self
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }

        fn offsets(&self) -> Vec<u64> {
            self.queries()
                .iter()
                .map(|q| parse_number(q, "OFFSET "))
                .collect()
        }
    }

    fn parse_number(query: &str, keyword: &str) -> u64 {
        let start = query.find(keyword).unwrap() + keyword.len();
        query[start..]
            .split_whitespace()
            .next()
            .unwrap()
            .parse()
            .unwrap()
    }

    #[async_trait]
    impl QueryExecutor for MockExecutor {
        async fn execute(&self, query: &str) -> Result<QueryResults, SourceError> {
            let call = {
                let mut queries = self.queries.lock().unwrap();
                queries.push(query.to_string());
                queries.len() - 1
            };

            if let Some((fail_call, err)) = self.fail_on_call
                && fail_call == call
            {
                return Err(err());
            }

            let offset = parse_number(query, "OFFSET ") as usize;
            let limit = parse_number(query, "LIMIT ") as usize;
            let page = self.rows.iter().skip(offset).take(limit).cloned().collect();
            Ok(QueryResults::from_rows(page))
        }

        fn endpoint(&self) -> &str {
            "mock://sparql"
        }
    }

    const TEMPLATE: &str = "SELECT ?uri ?label WHERE { ?uri rdfs:label ?label } OFFSET %(offset)s LIMIT %(limit)s";

    fn normalizer() -> RowNormalizer {
        RowNormalizer::new(RecordSchema::from_keys(&["uri", "label"], &["prefLabel"]).unwrap())
    }

    fn size(n: u64) -> NonZeroU64 {
        NonZeroU64::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_request_count_matches_formula() {
        for (total, page_size) in [(0u64, 3u64), (1, 3), (2, 3), (3, 3), (7, 3), (9, 3), (10, 1)] {
            let executor = Arc::new(MockExecutor::with_rows(total as usize));
            let fetcher = PageFetcher::new(executor.clone());

            let result = fetcher
                .fetch_all(TEMPLATE, total, size(page_size), &normalizer())
                .await
                .unwrap();

            assert_eq!(
                executor.queries().len() as u64,
                total / page_size + 1,
                "total={total} page_size={page_size}"
            );
            assert_eq!(result.len() as u64, total);
            assert_eq!(result.pages_fetched() as u64, total / page_size + 1);
        }
    }

    #[tokio::test]
    async fn test_zero_total_issues_single_request_at_offset_zero() {
        let executor = Arc::new(MockExecutor::with_rows(0));
        let fetcher = PageFetcher::new(executor.clone());

        let result = fetcher
            .fetch_all(TEMPLATE, 0, size(10_000), &normalizer())
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(executor.offsets(), vec![0]);
    }

    #[tokio::test]
    async fn test_offsets_for_partial_last_page() {
        let executor = Arc::new(MockExecutor::with_rows(25_000));
        let fetcher = PageFetcher::new(executor.clone());

        let result = fetcher
            .fetch_all(TEMPLATE, 25_000, size(10_000), &normalizer())
            .await
            .unwrap();

        assert_eq!(executor.offsets(), vec![0, 10_000, 20_000]);
        assert!(executor.queries().iter().all(|q| q.contains("LIMIT 10000")));
        assert_eq!(result.len(), 25_000);
    }

    #[tokio::test]
    async fn test_records_in_page_then_row_order() {
        let executor = Arc::new(MockExecutor::with_rows(7));
        let fetcher = PageFetcher::new(executor);

        let result = fetcher
            .fetch_all(TEMPLATE, 7, size(3), &normalizer())
            .await
            .unwrap();

        let uris: Vec<_> = result
            .records()
            .iter()
            .filter_map(|r| r.get("uri"))
            .map(str::to_string)
            .collect();
        let expected: Vec<_> = (0..7).map(|i| format!("http://example.org/{i}")).collect();
        assert_eq!(uris, expected);
    }

    #[tokio::test]
    async fn test_identical_pages_serialize_identically() {
        let first = PageFetcher::new(Arc::new(MockExecutor::with_rows(5)))
            .fetch_all(TEMPLATE, 5, size(2), &normalizer())
            .await
            .unwrap();
        let second = PageFetcher::new(Arc::new(MockExecutor::with_rows(5)))
            .fetch_all(TEMPLATE, 5, size(2), &normalizer())
            .await
            .unwrap();

        assert_eq!(
            first.to_pretty_json().unwrap(),
            second.to_pretty_json().unwrap()
        );
    }

    #[tokio::test]
    async fn test_transport_failure_reports_page() {
        let executor = Arc::new(MockExecutor::with_rows(25).failing_on(2, || {
            SourceError::transport(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ))
        }));
        let fetcher = PageFetcher::new(executor.clone());

        let err = fetcher
            .fetch_all(TEMPLATE, 25, size(10), &normalizer())
            .await
            .unwrap_err();

        assert_eq!(err.page, 2);
        assert_eq!(err.offset, 20);
        assert_eq!(err.limit, 10);
        assert_eq!(err.last_completed_page, Some(1));
        assert!(matches!(err.kind, FetchErrorKind::Transport(_)));
        assert_eq!(executor.queries().len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_response_aborts_remaining_pages() {
        let executor = Arc::new(MockExecutor::with_rows(30).failing_on(0, || {
            SourceError::MalformedResponse("expected value at line 1".into())
        }));
        let fetcher = PageFetcher::new(executor.clone());

        let err = fetcher
            .fetch_all(TEMPLATE, 30, size(10), &normalizer())
            .await
            .unwrap_err();

        assert_eq!(err.page, 0);
        assert_eq!(err.last_completed_page, None);
        assert!(matches!(err.kind, FetchErrorKind::MalformedResponse(_)));
        assert_eq!(executor.queries().len(), 1);
        assert!(err.to_string().contains("last completed page: none"));
    }

    #[tokio::test]
    async fn test_missing_required_field_reports_page() {
        let executor = Arc::new(MockExecutor::with_rows(4));
        let fetcher = PageFetcher::new(executor);
        let strict = RowNormalizer::new(RecordSchema::from_keys(&["uri", "count"], &[]).unwrap());

        let err = fetcher
            .fetch_all(TEMPLATE, 4, size(2), &strict)
            .await
            .unwrap_err();

        assert_eq!(err.page, 0);
        match err.kind {
            FetchErrorKind::MissingRequiredField(e) => {
                assert!(e.to_string().contains("'count'"));
            }
            other => panic!("unexpected error kind: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bad_template_sends_no_request() {
        let executor = Arc::new(MockExecutor::with_rows(4));
        let fetcher = PageFetcher::new(executor.clone());

        let err = fetcher
            .fetch_all("SELECT * WHERE {} LIMIT %(limit)s", 4, size(2), &normalizer())
            .await
            .unwrap_err();

        assert!(matches!(err.kind, FetchErrorKind::TemplateRender(_)));
        assert!(executor.queries().is_empty());
    }

    #[tokio::test]
    async fn test_uncountable_total_sends_no_request() {
        let executor = Arc::new(MockExecutor::with_rows(0));
        let fetcher = PageFetcher::new(executor.clone());

        let err = fetcher
            .fetch_all(TEMPLATE, u64::MAX, size(1), &normalizer())
            .await
            .unwrap_err();

        assert!(matches!(err.kind, FetchErrorKind::Plan(_)));
        assert_eq!(err.page, 0);
        assert_eq!(err.last_completed_page, None);
        assert!(executor.queries().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_between_pages() {
        let executor = Arc::new(MockExecutor::with_rows(10));
        let token = CancellationToken::new();
        token.cancel();
        let fetcher = PageFetcher::new(executor.clone()).with_cancellation(token);

        let err = fetcher
            .fetch_all(TEMPLATE, 10, size(5), &normalizer())
            .await
            .unwrap_err();

        assert!(matches!(err.kind, FetchErrorKind::Cancelled));
        assert!(executor.queries().is_empty());
    }
}

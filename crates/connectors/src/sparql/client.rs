use crate::{
    error::SourceError,
    source::QueryExecutor,
    sparql::{
        results::{QueryResults, SPARQL_RESULTS_JSON},
        settings::{EndpointSettings, HttpMethod},
    },
};
use async_trait::async_trait;
use reqwest::{Client, Url, header::ACCEPT};
use std::time::Duration;
use tracing::{debug, warn};

/// Longest error body kept in a [`SourceError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// SPARQL protocol client for SELECT queries with JSON results.
#[derive(Debug, Clone)]
pub struct SparqlClient {
    http: Client,
    settings: EndpointSettings,
}

impl SparqlClient {
    pub fn new(settings: EndpointSettings) -> Result<Self, SourceError> {
        Url::parse(&settings.url).map_err(|e| {
            SourceError::InvalidSettings(format!("invalid endpoint URL '{}': {e}", settings.url))
        })?;

        let mut builder = Client::builder().user_agent(settings.user_agent.clone());
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if !settings.system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder
            .build()
            .map_err(|e| SourceError::InvalidSettings(e.to_string()))?;

        Ok(SparqlClient { http, settings })
    }

    pub fn settings(&self) -> &EndpointSettings {
        &self.settings
    }
}

#[async_trait]
impl QueryExecutor for SparqlClient {
    async fn execute(&self, query: &str) -> Result<QueryResults, SourceError> {
        let params = [("query", query)];
        let request = match self.settings.method {
            HttpMethod::Get => self.http.get(&self.settings.url).query(&params),
            HttpMethod::Post => self.http.post(&self.settings.url).form(&params),
        };

        let response = request.header(ACCEPT, SPARQL_RESULTS_JSON).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = error_body(response).await;
            warn!(status = status.as_u16(), endpoint = %self.settings.url, "query rejected");
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        debug!(bytes = body.len(), "response received");

        QueryResults::parse(&body)
    }

    fn endpoint(&self) -> &str {
        &self.settings.url
    }
}

/// Body of a rejected query, cut to [`MAX_ERROR_BODY`] bytes.
async fn error_body(response: reqwest::Response) -> String {
    let mut body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "failed to read error response body");
            return format!("<unreadable body: {e}>");
        }
    };

    if body.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        body.truncate(cut);
    }
    body
}

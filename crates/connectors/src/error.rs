use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The request never produced a response (connection, TLS, timeout, ...).
    #[error("Transport error: {source}")]
    Transport {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The endpoint answered with a non-success HTTP status.
    #[error("Endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body is not a SPARQL JSON result set.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid endpoint settings: {0}")]
    InvalidSettings(String),
}

impl SourceError {
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SourceError::Transport {
            source: Box::new(err),
        }
    }

    /// True for failures of the request itself, as opposed to its payload.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SourceError::Transport { .. } | SourceError::Status { .. }
        )
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::transport(err)
    }
}

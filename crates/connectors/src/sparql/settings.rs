use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub const DEFAULT_USER_AGENT: &str = concat!("entity-dump/", env!("CARGO_PKG_VERSION"));

/// How the query text is carried to the endpoint (SPARQL 1.1 protocol).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// `query` parameter in the URL. Long queries may exceed URL limits.
    Get,
    /// URL-encoded form body.
    #[default]
    Post,
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EndpointSettings {
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    /// Per-request timeout. No timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Honor `HTTP_PROXY`/`HTTPS_PROXY` from the environment.
    #[serde(default = "default_system_proxy")]
    pub system_proxy: bool,
}

fn default_system_proxy() -> bool {
    true
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl EndpointSettings {
    pub fn new(url: &str) -> Self {
        EndpointSettings {
            url: url.to_string(),
            method: HttpMethod::default(),
            timeout_secs: None,
            user_agent: default_user_agent(),
            system_proxy: default_system_proxy(),
        }
    }
}

use crate::error::SinkError;
use async_trait::async_trait;

pub mod file;
pub mod memory;
pub mod stdout;

/// Destination for a finished dump.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Stores `content` under `name`, replacing anything previously stored there.
    async fn persist(&self, name: &str, content: &[u8]) -> Result<(), SinkError>;

    /// Human-readable location of `name`, for reports.
    fn location(&self, name: &str) -> String;
}

use crate::{connectors::sink::Sink, error::SinkError};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

/// Writes dumps to standard output, one after the other.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

#[async_trait]
impl Sink for StdoutSink {
    async fn persist(&self, _name: &str, content: &[u8]) -> Result<(), SinkError> {
        let mut out = tokio::io::stdout();
        out.write_all(content).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
        Ok(())
    }

    fn location(&self, _name: &str) -> String {
        "<stdout>".to_string()
    }
}

use crate::{connectors::sink::Sink, error::SinkError};
use async_trait::async_trait;
use std::sync::Mutex;

/// Keeps persisted dumps in memory. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.entries
            .lock()
            .ok()?
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, content)| content.clone())
    }

    pub fn names(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.iter().map(|(n, _)| n.clone()).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn persist(&self, name: &str, content: &[u8]) -> Result<(), SinkError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| SinkError::Io(std::io::Error::other("memory sink lock poisoned")))?;
        entries.push((name.to_string(), content.to_vec()));
        Ok(())
    }

    fn location(&self, name: &str) -> String {
        format!("memory:{name}")
    }
}

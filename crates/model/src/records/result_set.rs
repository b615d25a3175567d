use crate::records::record::Record;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

/// Ordered output of a paginated fetch: page order, then row order within a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    records: Vec<Record>,
    pages_fetched: usize,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the records of the next page.
    pub fn push_page(&mut self, records: Vec<Record>) {
        self.records.extend(records);
        self.pages_fetched += 1;
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Serializes the records as a UTF-8 JSON array indented with four spaces.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut out = Vec::with_capacity(self.records.len() * 160);
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.records.serialize(&mut ser)?;
        Ok(out)
    }
}

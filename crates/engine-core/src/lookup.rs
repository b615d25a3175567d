use model::records::record::Record;
use std::{cmp::Ordering, collections::HashSet};

/// Label-based suggestions over a loaded dump, as served to the search form.
///
/// Matching is case-insensitive. Entries whose label starts with the input
/// come first, then entries whose label merely contains it. Each group is
/// sorted by label and the combined list is capped at `max` entries.
pub struct AutoCompleteIndex {
    entries: Vec<Entry>,
}

struct Entry {
    label_lower: String,
    uri: String,
    record: Record,
}

impl AutoCompleteIndex {
    pub const DEFAULT_LABEL_KEY: &'static str = "entityLabel";
    pub const DEFAULT_URI_KEY: &'static str = "entityUri";

    /// Records lacking `label_key` are ignored.
    pub fn from_records(records: Vec<Record>, label_key: &str, uri_key: &str) -> Self {
        let entries = records
            .into_iter()
            .filter_map(|record| {
                let label_lower = record.get(label_key)?.to_lowercase();
                let uri = record.get(uri_key).unwrap_or_default().to_string();
                Some(Entry {
                    label_lower,
                    uri,
                    record,
                })
            })
            .collect();
        AutoCompleteIndex { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn suggest(&self, input: &str, max: usize) -> Vec<&Record> {
        let input = input.to_lowercase();

        let mut starts_with: Vec<&Entry> = self
            .entries
            .iter()
            .filter(|e| e.label_lower.starts_with(&input))
            .take(max)
            .collect();

        let selected: HashSet<(&str, &str)> = starts_with
            .iter()
            .map(|e| (e.label_lower.as_str(), e.uri.as_str()))
            .collect();

        let mut includes: Vec<&Entry> = self
            .entries
            .iter()
            .filter(|e| {
                e.label_lower.contains(&input)
                    && !selected.contains(&(e.label_lower.as_str(), e.uri.as_str()))
            })
            .take(max - starts_with.len())
            .collect();

        starts_with.sort_by(|a, b| by_label(a, b));
        includes.sort_by(|a, b| by_label(a, b));

        starts_with
            .into_iter()
            .chain(includes)
            .map(|e| &e.record)
            .collect()
    }
}

fn by_label(a: &Entry, b: &Entry) -> Ordering {
    a.label_lower.cmp(&b.label_lower)
}

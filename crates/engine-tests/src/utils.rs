#![allow(dead_code)]

use crate::{CapturedRequest, Reply};
use connectors::sparql::{
    client::SparqlClient,
    settings::{EndpointSettings, HttpMethod},
};
use engine_core::pipeline::{DatasetJob, TotalResults};
use model::schema::field::RecordSchema;
use serde_json::{Value, json};
use std::{num::NonZeroU64, path::Path};

/// Paged query in the shape the dump datasets use.
pub const ENTITIES_TEMPLATE: &str = r#"PREFIX skos: <http://www.w3.org/2004/02/skos/core#>
SELECT ?entityUri ?entityLabel ?entityPrefLabel (count(?doc) as ?count) ?entityType
WHERE {
  ?entityUri skos:prefLabel ?entityLabel.
  BIND("Agrovoc" as ?entityType)
} OFFSET %(offset)s LIMIT %(limit)s"#;

pub const COUNT_QUERY: &str =
    "SELECT (count(distinct ?entityUri) as ?count) WHERE { ?entityUri a ?t }";

pub const ENTITY_FIELDS: &[&str] = &[
    "entityUri",
    "entityLabel",
    "entityPrefLabel?",
    "count",
    "entityType",
];

const VARS: &[&str] = &[
    "entityUri",
    "entityLabel",
    "entityPrefLabel",
    "count",
    "entityType",
];

pub fn job(name: &str, total: TotalResults, page_size: u64) -> DatasetJob {
    DatasetJob {
        name: name.to_string(),
        template: ENTITIES_TEMPLATE.to_string(),
        total,
        page_size: NonZeroU64::new(page_size).expect("non-zero page size"),
        schema: RecordSchema::parse(ENTITY_FIELDS).expect("entity schema"),
        output: format!("{name}.json"),
    }
}

pub fn client(url: &str, method: HttpMethod) -> SparqlClient {
    let mut settings = EndpointSettings::new(url);
    settings.method = method;
    settings.timeout_secs = Some(10);
    settings.system_proxy = false;
    SparqlClient::new(settings).expect("sparql client")
}

/// Binding for entity `i`. Every third entity has an alternative label.
pub fn entity(i: usize) -> Value {
    let mut binding = json!({
        "entityUri": { "type": "uri", "value": format!("http://aims.fao.org/aos/agrovoc/c_{i}") },
        "entityLabel": { "type": "literal", "xml:lang": "en", "value": format!("label {i}") },
        "count": {
            "type": "typed-literal",
            "datatype": "http://www.w3.org/2001/XMLSchema#integer",
            "value": (i % 7 + 1).to_string()
        },
        "entityType": { "type": "literal", "value": "Agrovoc" }
    });
    if i % 3 == 0 {
        binding["entityPrefLabel"] = json!({ "type": "literal", "xml:lang": "en", "value": format!("pref {i}") });
    }
    binding
}

pub fn results(vars: &[&str], bindings: Vec<Value>) -> Value {
    json!({
        "head": { "vars": vars },
        "results": { "bindings": bindings }
    })
}

pub fn count_results(count: u64) -> Value {
    results(
        &["count"],
        vec![json!({
            "count": {
                "type": "typed-literal",
                "datatype": "http://www.w3.org/2001/XMLSchema#integer",
                "value": count.to_string()
            }
        })],
    )
}

/// Offset and limit of a rendered page query.
pub fn window(query: &str) -> Option<(u64, u64)> {
    let tokens: Vec<&str> = query.split_whitespace().collect();
    let after = |keyword: &str| {
        tokens
            .windows(2)
            .find(|w| w[0].eq_ignore_ascii_case(keyword))
            .and_then(|w| w[1].parse::<u64>().ok())
    };
    Some((after("offset")?, after("limit")?))
}

/// Serves `total` generated entities, sliced by each query's offset and limit.
pub fn paged_entities(total: usize) -> impl Fn(&CapturedRequest) -> Reply + Send + Sync + 'static {
    move |request: &CapturedRequest| match window(&request.query) {
        Some((offset, limit)) => Reply::Json(page(total, offset, limit)),
        None => Reply::Status(400, "query has no OFFSET/LIMIT".to_string()),
    }
}

pub fn page(total: usize, offset: u64, limit: u64) -> Value {
    let start = (offset as usize).min(total);
    let end = (offset.saturating_add(limit) as usize).min(total);
    results(VARS, (start..end).map(entity).collect())
}

pub fn read_dump(path: &Path) -> Vec<Value> {
    let content = std::fs::read_to_string(path).expect("read dump");
    serde_json::from_str(&content).expect("dump is a JSON array")
}

pub fn leftover_temp_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|name| name.ends_with(".tmp"))
                .collect()
        })
        .unwrap_or_default()
}

use crate::{
    error::ConfigError,
    settings::{
        DEFAULT_ENDPOINT, DumpConfig,
        dataset::{DEFAULT_COUNT_VAR, DEFAULT_PAGE_SIZE, DatasetConfig},
    },
};
use connectors::sparql::settings::EndpointSettings;
use model::schema::field::RecordSchema;

const AGROVOC_DESCRIPTORS: &str = include_str!("../../queries/agrovoc-descriptors.rq");
const AGROVOC_ENTITIES: &str = include_str!("../../queries/agrovoc-entities.rq");
const WIKIDATA_NAMED_ENTITIES: &str = include_str!("../../queries/wikidata-named-entities.rq");
const WIKIDATA_NAMED_ENTITIES_COUNT: &str =
    include_str!("../../queries/wikidata-named-entities-count.rq");
const WIKIDATA_NAMED_ENTITIES_USED: &str =
    include_str!("../../queries/wikidata-named-entities-used.rq");

const ENTITY_FIELDS: &[&str] = &["entityUri", "entityLabel", "entityPrefLabel?", "count"];
const TYPED_ENTITY_FIELDS: &[&str] = &[
    "entityUri",
    "entityLabel",
    "entityPrefLabel?",
    "count",
    "entityType",
];

/// How a preset learns its result count.
enum Total {
    Fixed(u64),
    Counted(&'static str),
}

/// The dumps served by the autocomplete form, against the ISSA knowledge graph.
pub fn builtin() -> Result<DumpConfig, ConfigError> {
    let datasets = vec![
        preset(
            "agrovoc-descriptors",
            "dumpAgrovocDescriptors.json",
            AGROVOC_DESCRIPTORS,
            Total::Fixed(25_000),
            TYPED_ENTITY_FIELDS,
        )?,
        preset(
            "agrovoc-entities",
            "dumpAgrovocEntities.json",
            AGROVOC_ENTITIES,
            Total::Fixed(18_000),
            ENTITY_FIELDS,
        )?,
        preset(
            "wikidata-named-entities",
            "dumpWikidataNamedEntities.json",
            WIKIDATA_NAMED_ENTITIES,
            Total::Counted(WIKIDATA_NAMED_ENTITIES_COUNT),
            TYPED_ENTITY_FIELDS,
        )?,
        preset(
            "wikidata-named-entities-used",
            "dumpWikidataNamedEntitiesUsed.json",
            WIKIDATA_NAMED_ENTITIES_USED,
            Total::Fixed(90_000),
            TYPED_ENTITY_FIELDS,
        )?,
    ];
    Ok(DumpConfig::new(
        EndpointSettings::new(DEFAULT_ENDPOINT),
        datasets,
    ))
}

fn preset(
    name: &str,
    output: &str,
    query: &str,
    total: Total,
    fields: &[&str],
) -> Result<DatasetConfig, ConfigError> {
    let fields =
        RecordSchema::parse(fields).map_err(|e| ConfigError::invalid(name, e.to_string()))?;
    let (total, count_query) = match total {
        Total::Fixed(n) => (Some(n), None),
        Total::Counted(query) => (None, Some(query.to_string())),
    };

    Ok(DatasetConfig {
        name: name.to_string(),
        output: output.to_string(),
        page_size: DEFAULT_PAGE_SIZE,
        fields,
        query: Some(query.to_string()),
        query_file: None,
        total,
        count_query,
        count_query_file: None,
        count_var: DEFAULT_COUNT_VAR.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::pipeline::TotalResults;
    use planner::query::{page::PageRequest, template::QueryTemplate};
    use std::path::Path;

    #[test]
    fn test_builtin_datasets_are_valid() {
        let config = builtin().unwrap();
        config.validate().unwrap();
        assert_eq!(config.endpoint.url, "https://data-issa.cirad.fr/sparql");

        let jobs = config.jobs().unwrap();
        assert_eq!(jobs.len(), 4);
        for job in &jobs {
            assert_eq!(job.page_size.get(), 10_000);
            assert!(job.output.ends_with(".json"));
            QueryTemplate::parse(&job.template).unwrap();
        }
    }

    #[test]
    fn test_builtin_totals() {
        let config = builtin().unwrap();
        let total = |name: &str| config.job(name).unwrap().total;
        assert_eq!(total("agrovoc-descriptors"), TotalResults::Fixed(25_000));
        assert_eq!(total("agrovoc-entities"), TotalResults::Fixed(18_000));
        assert_eq!(
            total("wikidata-named-entities-used"),
            TotalResults::Fixed(90_000)
        );
        match total("wikidata-named-entities") {
            TotalResults::CountQuery { query, var } => {
                assert_eq!(var, "count");
                assert!(query.contains("?count"));
                assert!(!query.contains("%("));
            }
            other => panic!("expected a count query, got {other:?}"),
        }
    }

    #[test]
    fn test_agrovoc_entities_have_no_type() {
        let job = builtin().unwrap().job("agrovoc-entities").unwrap();
        assert!(!job.schema.required_keys().contains(&"entityType"));
        assert!(job.schema.optional_keys().contains("entityPrefLabel"));
    }

    #[test]
    fn test_rendered_preset_query() {
        let job = builtin().unwrap().job("agrovoc-descriptors").unwrap();
        let template = QueryTemplate::parse(&job.template).unwrap();
        let query = template.render(&PageRequest::new(2, 10_000));
        assert!(query.contains("OFFSET 20000  LIMIT 10000"));
        assert!(!query.contains("%("));
    }

    #[test]
    fn test_output_names_are_distinct() {
        let config = builtin().unwrap();
        let mut outputs: Vec<_> = config.datasets.iter().map(|d| d.output.as_str()).collect();
        outputs.sort();
        outputs.dedup();
        assert_eq!(outputs.len(), config.datasets.len());
        assert_eq!(config.base_dir(), Path::new("."));
    }
}

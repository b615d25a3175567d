use crate::error::CliError;
use engine_config::settings::{DumpConfig, dataset::DatasetConfig};
use engine_core::pipeline::DumpSummary;
use model::records::record::Record;
use std::path::Path;

fn report_json(summaries: &[DumpSummary]) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(summaries)?)
}

pub async fn write_report(summaries: &[DumpSummary], path: &Path) -> Result<(), CliError> {
    tokio::fs::write(path, report_json(summaries)?).await?;
    Ok(())
}

pub fn print_suggestions(records: &[&Record]) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}

pub fn print_datasets(config: &DumpConfig, as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(&config.datasets)?);
        return Ok(());
    }

    println!("Endpoint: {} ({})", config.endpoint.url, config.endpoint.method);
    println!("Output:   {}", config.output_dir.display());
    println!();
    println!("{:<32} {:<40} {:>10} {:>8}", "Dataset", "Output", "Total", "Page");
    for dataset in &config.datasets {
        println!(
            "{:<32} {:<40} {:>10} {:>8}",
            dataset.name,
            dataset.output,
            total_label(dataset),
            dataset.page_size
        );
    }
    Ok(())
}

fn total_label(dataset: &DatasetConfig) -> String {
    match dataset.total {
        Some(total) => total.to_string(),
        None => "counted".to_string(),
    }
}

use crate::{
    env::EnvManager,
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use commands::Commands;
use connectors::{source::QueryExecutor, sparql::client::SparqlClient};
use engine_config::{presets, settings::DumpConfig};
use engine_core::{
    connectors::sink::{Sink, file::FileSink, stdout::StdoutSink},
    lookup::AutoCompleteIndex,
    pipeline::{DumpPipeline, TotalResults},
};
use model::records::record::Record;
use planner::query::{page::PageRequest, template::QueryTemplate};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod env;
mod error;
mod output;
mod shutdown;

const MAX_SUGGESTIONS_ENV: &str = "SEARCH_MAX_AUTOCOMPLETE";
const DEFAULT_MAX_SUGGESTIONS: usize = 15;

#[derive(Parser)]
#[command(
    name = "entity-dump",
    version,
    about = "Dump SPARQL query results page by page into JSON files for autocompletion"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "TOML configuration file. Built-in datasets are used when omitted"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Env file to load. Defaults to ./.env when present"
    )]
    env_file: Option<PathBuf>,

    #[arg(long, global = true, help = "SPARQL endpoint URL, overrides the configuration")]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let code = match run(cli, &shutdown).await {
        Ok(()) => ExitCode::Success,
        Err(err) if shutdown.is_shutdown_requested() => {
            error!("Interrupted: {err}");
            ExitCode::ShutdownRequested
        }
        Err(err) => {
            error!("{err}");
            ExitCode::GeneralError
        }
    };

    std::process::exit(code.as_i32());
}

async fn run(cli: Cli, shutdown: &ShutdownCoordinator) -> Result<(), CliError> {
    let env = load_env(cli.env_file.as_deref())?;
    let mut config = load_config(cli.config.as_deref(), &env)?;
    if let Some(url) = cli.endpoint {
        config.endpoint.url = url;
    }

    match cli.command {
        Commands::Dump {
            datasets,
            output_dir,
            stdout,
            report,
        } => {
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            dump(&config, &datasets, stdout, report.as_deref(), shutdown).await
        }
        Commands::List { json } => output::print_datasets(&config, json),
        Commands::Render {
            dataset,
            page,
            count,
        } => render(&config, &dataset, page, count),
        Commands::Complete {
            file,
            input,
            max,
            label_key,
            uri_key,
        } => {
            let max = max
                .or_else(|| env.get(MAX_SUGGESTIONS_ENV)?.parse().ok())
                .unwrap_or(DEFAULT_MAX_SUGGESTIONS);
            complete(&file, &input, max, &label_key, &uri_key).await
        }
    }
}

fn load_env(env_file: Option<&Path>) -> Result<EnvManager, CliError> {
    let mut env = EnvManager::from_system();
    match env_file {
        Some(path) => env.load_from_file(path)?,
        None if Path::new(".env").is_file() => env.load_from_file(".env")?,
        None => {}
    }
    Ok(env)
}

fn load_config(path: Option<&Path>, env: &EnvManager) -> Result<DumpConfig, CliError> {
    let mut config = match path {
        Some(path) => DumpConfig::load(path)?,
        None => presets::builtin()?,
    };
    config.apply_env(env.all());
    Ok(config)
}

async fn dump(
    config: &DumpConfig,
    names: &[String],
    to_stdout: bool,
    report: Option<&Path>,
    shutdown: &ShutdownCoordinator,
) -> Result<(), CliError> {
    // Resolve every job up front so a bad definition fails before any request.
    let jobs = if names.is_empty() {
        config.jobs()?
    } else {
        names
            .iter()
            .map(|name| config.job(name))
            .collect::<Result<Vec<_>, _>>()?
    };

    let client = SparqlClient::new(config.endpoint.clone())?;
    info!(
        endpoint = client.endpoint(),
        method = %config.endpoint.method,
        datasets = jobs.len(),
        "Dumping from SPARQL endpoint"
    );

    let sink: Arc<dyn Sink> = if to_stdout {
        Arc::new(StdoutSink)
    } else {
        Arc::new(FileSink::new(&config.output_dir))
    };
    let pipeline = DumpPipeline::new(Arc::new(client), sink)
        .with_cancellation(shutdown.cancel_token());

    let mut summaries = Vec::with_capacity(jobs.len());
    for job in &jobs {
        if shutdown.is_shutdown_requested() {
            return Err(CliError::ShutdownRequested);
        }
        summaries.push(pipeline.run(job).await?);
    }

    if let Some(path) = report {
        output::write_report(&summaries, path).await?;
        info!(path = %path.display(), "Run summary written");
    }
    Ok(())
}

fn render(config: &DumpConfig, dataset: &str, page: u64, count: bool) -> Result<(), CliError> {
    let job = config.job(dataset)?;

    if count {
        return match job.total {
            TotalResults::CountQuery { query, .. } => {
                println!("{query}");
                Ok(())
            }
            TotalResults::Fixed(_) => Err(CliError::NoCountQuery(job.name)),
        };
    }

    let template = QueryTemplate::parse(&job.template)?;
    let request = PageRequest::new(page, job.page_size.get());
    info!("Rendering {request}");
    println!("{}", template.render(&request));
    Ok(())
}

async fn complete(
    file: &Path,
    input: &str,
    max: usize,
    label_key: &str,
    uri_key: &str,
) -> Result<(), CliError> {
    let content = tokio::fs::read(file).await?;
    let records: Vec<Record> =
        serde_json::from_slice(&content).map_err(|source| CliError::DumpRead {
            path: file.to_path_buf(),
            source,
        })?;

    let index = AutoCompleteIndex::from_records(records, label_key, uri_key);
    info!(entries = index.len(), input, max, "Searching labels");

    output::print_suggestions(&index.suggest(input, max))
}

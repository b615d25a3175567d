use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch datasets page by page and write one JSON dump per dataset
    Dump {
        /// Datasets to dump, in order. All configured datasets when omitted.
        datasets: Vec<String>,

        #[arg(long, help = "Directory the dumps are written to")]
        output_dir: Option<PathBuf>,

        #[arg(
            long,
            conflicts_with = "output_dir",
            help = "Write the dumps to stdout instead of files"
        )]
        stdout: bool,

        #[arg(
            long,
            help = "If specified, writes the JSON run summary to this file"
        )]
        report: Option<PathBuf>,
    },
    /// List the configured datasets
    List {
        #[arg(long, help = "Print the dataset definitions as JSON")]
        json: bool,
    },
    /// Print the query sent for one page of a dataset
    Render {
        dataset: String,

        #[arg(long, default_value_t = 0, help = "Zero-based page index")]
        page: u64,

        #[arg(long, conflicts_with = "page", help = "Print the count query instead")]
        count: bool,
    },
    /// Suggest entries from a dump file, matching labels against the input
    Complete {
        /// Dump file produced by `dump`
        #[arg(long)]
        file: PathBuf,

        /// First characters typed by the user
        input: String,

        #[arg(
            long,
            help = "Maximum number of suggestions [default: $SEARCH_MAX_AUTOCOMPLETE or 15]"
        )]
        max: Option<usize>,

        #[arg(long, default_value = "entityLabel")]
        label_key: String,

        #[arg(long, default_value = "entityUri")]
        uri_key: String,
    },
}

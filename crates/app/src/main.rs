use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

/// Categorise bank statement exports into bookkeeping columns.
#[derive(Debug, Parser)]
#[command(name = "moneyout", version, about)]
pub struct Cli {
    /// Directory of statement exports, named like `Transactions_Export_Aug_2022_<id>.csv`.
    #[arg(long, default_value = "data")]
    pub input_dir: PathBuf,

    /// Directory that receives one `<Month><Year>` file per statement.
    #[arg(long, default_value = "out")]
    pub output_dir: PathBuf,

    /// Processing profile (TOML). Defaults to the built-in profile.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the run summary as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    pub verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    tracing::info!("Starting");
    let summary = commands::run(&cli)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let totals = &summary.totals;
        tracing::info!(
            files = summary.files.len(),
            skipped = summary.skipped.len(),
            parsed = totals.rows_parsed,
            classified = totals.classified,
            unclassified = totals.unclassified,
            excluded = totals.excluded,
            written = totals.written,
            "Finished"
        );
    }
    Ok(())
}

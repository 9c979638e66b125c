//! Streamflow ETL - command-line entry point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use streamflow_common::logging::{init_logging, LogConfig};
use streamflow_etl::convert::{csv_to_json_lines, json_lines_to_csv, write_flat_catalog};
use streamflow_etl::extract::read_catalog;
use streamflow_etl::{
    ContentPipeline, EtlConfig, LogAlerter, PgStore, PipelineRunner, SessionRecord, UserRecord,
};
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "streamflow-etl")]
#[command(author, version, about = "Streamflow content ETL")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline against the configured data directory and database
    Run {
        /// Dispatch the run as a background task and wait for it
        #[arg(long)]
        background: bool,
    },

    /// Convert a flat CSV table to JSON lines
    ToJsonLines {
        #[arg(short, long, value_enum)]
        table: FlatTable,

        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Convert a JSON-lines table back to CSV
    ToCsv {
        #[arg(short, long, value_enum)]
        table: FlatTable,

        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Flatten the nested catalog into one CSV listing
    FlattenCatalog {
        #[arg(short, long, default_value = "data/content.json")]
        input: PathBuf,

        #[arg(short, long, default_value = "data/processed/content_flat.csv")]
        output: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FlatTable {
    Users,
    Sessions,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_config = log_config(cli.verbose)?;

    // Keeps the file writer flushing until exit
    let _guard = init_logging(&log_config)?;

    match cli.command {
        Command::Run { background } => run_pipeline(background).await?,
        Command::ToJsonLines {
            table,
            input,
            output,
        } => {
            let records = match table {
                FlatTable::Users => csv_to_json_lines::<UserRecord>(&input, &output)?,
                FlatTable::Sessions => csv_to_json_lines::<SessionRecord>(&input, &output)?,
            };
            println!("Wrote {} records to {}", records, output.display());
        },
        Command::ToCsv {
            table,
            input,
            output,
        } => {
            let records = match table {
                FlatTable::Users => json_lines_to_csv::<UserRecord>(&input, &output)?,
                FlatTable::Sessions => json_lines_to_csv::<SessionRecord>(&input, &output)?,
            };
            println!("Wrote {} records to {}", records, output.display());
        },
        Command::FlattenCatalog { input, output } => {
            let catalog = read_catalog(&input)?;
            let rows = write_flat_catalog(&catalog, &output)?;
            println!("Wrote {} rows to {}", rows, output.display());
        },
    }

    Ok(())
}

/// `LOG_*` variables over the defaults, then an explicit `--verbose` on top
fn log_config(verbose: bool) -> Result<LogConfig> {
    let mut config = LogConfig::builder()
        .level(Level::INFO)
        .log_file_prefix("streamflow-etl")
        .build()
        .merge_env()?;
    if verbose {
        config.level = Level::DEBUG;
    }
    Ok(config)
}

async fn run_pipeline(background: bool) -> Result<()> {
    let config = EtlConfig::from_env().context("Failed to load ETL configuration")?;
    let store = PgStore::connect(&config.database, config.batch_size)
        .await
        .context("Failed to connect to database")?;

    let pipeline = ContentPipeline::new(
        config.paths.clone(),
        Arc::new(store),
        Arc::new(LogAlerter::new(config.alert_recipient.clone())),
    );
    let runner = PipelineRunner::new("content-etl", pipeline);

    let output = if background {
        let handle = runner.spawn()?;
        info!(pipeline = runner.name(), "Waiting for background run");
        handle.await.context("Background pipeline task panicked")??
    } else {
        runner.run_now().await?
    };

    println!(
        "Loaded {} rows in {} ({:.2} rows/sec)",
        output.summary.rows_loaded,
        streamflow_etl::format_duration(output.summary.total),
        output.summary.throughput()
    );
    Ok(())
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use common::JobConfig;
use distributed::{init_logger, run_pipeline};
use tracing::{error, info};

/// Letter frequency report, most frequent letter first.
#[derive(Parser, Debug)]
#[command(name = "lettercount")]
struct Cli {
    /// Text corpus: a file or a directory of files
    input: PathBuf,
    /// Where the per-letter counts are written
    count_output: PathBuf,
    /// Where the counts sorted by descending frequency are written
    sort_output: PathBuf,
    #[arg(long, env = "LETTERCOUNT_MAP_WORKERS")]
    map_workers: Option<usize>,
    #[arg(long, env = "LETTERCOUNT_REDUCE_WORKERS")]
    reduce_workers: Option<usize>,
    /// Output partitions per stage
    #[arg(long, env = "LETTERCOUNT_REDUCE_TASKS")]
    reduce_tasks: Option<usize>,
    /// Maximum bytes per input split
    #[arg(long, env = "LETTERCOUNT_SPLIT_SIZE")]
    split_size: Option<u64>,
    /// Attempts per task before the stage fails
    #[arg(long, env = "LETTERCOUNT_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,
    /// Maximum records held by the shuffle
    #[arg(long, env = "LETTERCOUNT_SHUFFLE_CAPACITY")]
    shuffle_capacity: Option<usize>,
    /// Replace existing output directories
    #[arg(long, env = "LETTERCOUNT_OVERWRITE")]
    overwrite: bool,
}

impl Cli {
    fn job_config(&self) -> JobConfig {
        let defaults = JobConfig::default();
        JobConfig {
            map_workers: self.map_workers.unwrap_or(defaults.map_workers),
            reduce_workers: self.reduce_workers.unwrap_or(defaults.reduce_workers),
            reduce_tasks: self.reduce_tasks.unwrap_or(defaults.reduce_tasks),
            split_size: self.split_size.unwrap_or(defaults.split_size),
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            shuffle_capacity: self.shuffle_capacity.or(defaults.shuffle_capacity),
            overwrite: self.overwrite,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();

    let cli = Cli::parse();
    let config = cli.job_config();
    config.validate()?;
    info!("config: {:?}", config);

    let summary = run_pipeline(&config, &cli.input, &cli.count_output, &cli.sort_output)
        .await
        .map_err(|e| {
            error!("pipeline aborted: {e}");
            e
        })
        .with_context(|| format!("letter count over {} failed", cli.input.display()))?;

    info!(
        "wrote {} letter(s) to {}",
        summary.sort.output_records,
        cli.sort_output.display()
    );
    Ok(())
}

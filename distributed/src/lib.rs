use time::macros::format_description;
use tracing_subscriber::{fmt::time::UtcTime, EnvFilter};

pub mod pipeline;
pub mod pool;
pub mod shuffle;
pub mod stage;
pub mod storage;

pub use pipeline::{count_stage, run_pipeline, sort_stage, PipelineSummary};
pub use stage::{Stage, StageSummary};

/// Installs the stderr log subscriber; `RUST_LOG` overrides the `info` default.
pub fn init_logger() {
    let timer = UtcTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_writer(std::io::stderr)
        .try_init();
}

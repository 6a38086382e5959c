use std::path::Path;

use app_lettercount::{
    count_order, sort_order, CountMapper, CountReducer, SortMapper, SortReducer,
};
use common::{Error, JobConfig, Result};
use tracing::info;

use crate::{
    stage::{Stage, StageSummary},
    storage::is_complete,
};

pub fn count_stage() -> Stage<CountMapper, CountReducer> {
    Stage::new("count", CountMapper, CountReducer, count_order())
}

pub fn sort_stage() -> Stage<SortMapper, SortReducer> {
    Stage::new("sort", SortMapper, SortReducer, sort_order())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSummary {
    pub count: StageSummary,
    pub sort: StageSummary,
}

/// COUNT over `input` into `count_output`, then SORT over that into
/// `sort_output`. SORT never starts on an incomplete COUNT output.
pub async fn run_pipeline(
    config: &JobConfig,
    input: &Path,
    count_output: &Path,
    sort_output: &Path,
) -> Result<PipelineSummary> {
    config.validate()?;

    let count = count_stage().run(config, input, count_output).await?;
    if !is_complete(count_output) {
        return Err(Error::IncompleteStageOutput(count_output.to_path_buf()));
    }
    info!("{} distinct letter(s) counted", count.output_records);

    let sort = sort_stage().run(config, count_output, sort_output).await?;
    Ok(PipelineSummary { count, sort })
}

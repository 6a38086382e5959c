use std::{
    fmt,
    path::Path,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use common::{JobConfig, KeyOrder, Mapper, Reducer, Result};
use tracing::info;

use crate::{
    pool::run_tasks,
    shuffle::{range_partition, Group, ShuffleBuffer},
    storage::{plan_splits, read_split, InputSplit, OutputCommitter},
};

struct Partition<K, V> {
    index: usize,
    groups: Vec<Group<K, V>>,
}

impl<K, V> fmt::Display for Partition<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "partition {} ({} keys)", self.index, self.groups.len())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StageSummary {
    pub input_splits: usize,
    pub input_records: u64,
    pub map_output_records: u64,
    pub reduce_groups: usize,
    pub output_records: u64,
}

/// One map -> shuffle -> reduce pass.
pub struct Stage<M: Mapper, R> {
    name: String,
    mapper: Arc<M>,
    reducer: Arc<R>,
    order: KeyOrder<M::Key>,
}

impl<M, R> Stage<M, R>
where
    M: Mapper,
    R: Reducer<Key = M::Key, Value = M::Value>,
{
    pub fn new(
        name: impl Into<String>,
        mapper: M,
        reducer: R,
        order: KeyOrder<M::Key>,
    ) -> Self {
        Self {
            name: name.into(),
            mapper: Arc::new(mapper),
            reducer: Arc::new(reducer),
            order,
        }
    }

    pub async fn run(
        &self,
        config: &JobConfig,
        input: &Path,
        output: &Path,
    ) -> Result<StageSummary> {
        self.execute(config, input, output)
            .await
            .map_err(|e| e.in_stage(&self.name))
    }

    async fn execute(
        &self,
        config: &JobConfig,
        input: &Path,
        output: &Path,
    ) -> Result<StageSummary> {
        config.validate()?;
        let splits = plan_splits(input, config.split_size)?;
        let committer = Arc::new(OutputCommitter::create(output, config.overwrite)?);
        info!(
            "{}: {} input split(s) from {}, output {}",
            self.name,
            splits.len(),
            input.display(),
            output.display()
        );

        let mut summary = StageSummary {
            input_splits: splits.len(),
            ..Default::default()
        };

        let buffer = Arc::new(ShuffleBuffer::new(config.shuffle_capacity));
        let input_records = Arc::new(AtomicU64::new(0));
        {
            let mapper = Arc::clone(&self.mapper);
            let buffer = Arc::clone(&buffer);
            let input_records = Arc::clone(&input_records);
            run_tasks(
                &format!("{} map", self.name),
                splits,
                config.map_workers,
                config.max_attempts,
                move |split: &InputSplit, _| {
                    let mut emitter = buffer.emitter(split.index);
                    let records = read_split(split, |line| mapper.map(line, &mut emitter))?;
                    buffer.commit(emitter);
                    input_records.fetch_add(records, Ordering::Relaxed);
                    Ok(())
                },
            )
            .await?;
        }
        summary.input_records = input_records.load(Ordering::Relaxed);

        // every map worker has returned, so no emitter can still reach the buffer
        let buffer = Arc::into_inner(buffer).expect("map workers still hold the shuffle buffer");
        summary.map_output_records = buffer.len() as u64;
        let groups = buffer.into_groups(&self.order);
        summary.reduce_groups = groups.len();
        info!(
            "{}: map done, {} record(s) in {} group(s)",
            self.name, summary.map_output_records, summary.reduce_groups
        );

        let partitions: Vec<_> = range_partition(groups, config.reduce_tasks)
            .into_iter()
            .enumerate()
            .map(|(index, groups)| Partition { index, groups })
            .collect();
        let output_records = Arc::new(AtomicU64::new(0));
        {
            let reducer = Arc::clone(&self.reducer);
            let committer = Arc::clone(&committer);
            let output_records = Arc::clone(&output_records);
            run_tasks(
                &format!("{} reduce", self.name),
                partitions,
                config.reduce_workers,
                config.max_attempts,
                move |partition: &Partition<M::Key, M::Value>, _| {
                    let mut writer = committer.attempt_writer(partition.index)?;
                    for group in &partition.groups {
                        reducer.reduce(&group.key, group.values(), &mut writer)?;
                    }
                    output_records.fetch_add(writer.commit()?, Ordering::Relaxed);
                    Ok(())
                },
            )
            .await?;
        }
        summary.output_records = output_records.load(Ordering::Relaxed);

        committer.finish()?;
        info!("{}: done, {:?}", self.name, summary);
        Ok(summary)
    }
}

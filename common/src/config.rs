use std::thread;

use crate::{Error, Result};

pub const DEFAULT_SPLIT_SIZE: u64 = 64 * 1024 * 1024;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Job-wide settings handed to every stage run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    pub map_workers: usize,
    pub reduce_workers: usize,
    /// Number of output partitions (`part-r-*` files) per stage.
    pub reduce_tasks: usize,
    /// Upper bound in bytes of one input split.
    ///
    /// A map attempt keeps every pair of its split in memory until it
    /// commits, so `map_workers` attempts may hold about `split_size` pairs
    /// each on top of the buffer. Lower it, or set `shuffle_capacity`, when
    /// memory is tight.
    pub split_size: u64,
    /// Total attempts per task, first run included.
    pub max_attempts: u32,
    /// Maximum number of pairs buffered by the shuffle, unbounded when `None`.
    ///
    /// This is the memory guard of a stage. Pairs still held by running map
    /// attempts count against it too, and an emit past the limit fails the
    /// attempt with an `OutOfMemory` I/O error instead of growing the heap.
    pub shuffle_capacity: Option<usize>,
    /// Replace existing output locations instead of failing.
    pub overwrite: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        let workers = thread::available_parallelism().map_or(1, |n| n.get());
        Self {
            map_workers: workers,
            reduce_workers: workers,
            reduce_tasks: 1,
            split_size: DEFAULT_SPLIT_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            shuffle_capacity: None,
            overwrite: false,
        }
    }
}

impl JobConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("map_workers", self.map_workers as u64),
            ("reduce_workers", self.reduce_workers as u64),
            ("reduce_tasks", self.reduce_tasks as u64),
            ("split_size", self.split_size),
            ("max_attempts", self.max_attempts as u64),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{name} must be at least 1")));
            }
        }
        if self.shuffle_capacity == Some(0) {
            return Err(Error::InvalidConfig(
                "shuffle_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

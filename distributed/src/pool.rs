use std::{
    any::Any,
    fmt::Display,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use common::{Error, Result};
use crossbeam_queue::SegQueue;
use tokio::task::JoinError;
use tracing::{debug, error, warn};
use uuid::Uuid;

#[derive(Debug)]
struct Attempt<T> {
    id: Uuid,
    task: Arc<T>,
    number: u32,
}

/// Runs every task on a pool of `workers` workers and returns once all of
/// them finished, which makes the call a barrier for the phase.
///
/// Each attempt runs on a fresh blocking thread. Panics and retryable errors
/// put the task back in the queue until `max_attempts` is reached; any other
/// error stops the pool and is returned.
pub async fn run_tasks<T, F>(
    phase: &str,
    tasks: Vec<T>,
    workers: usize,
    max_attempts: u32,
    work: F,
) -> Result<()>
where
    T: Display + Send + Sync + 'static,
    F: Fn(&T, u32) -> Result<()> + Send + Sync + 'static,
{
    let queue = Arc::new(SegQueue::new());
    let n_tasks = tasks.len();
    for task in tasks {
        queue.push(Attempt {
            id: Uuid::new_v4(),
            task: Arc::new(task),
            number: 1,
        });
    }

    let failed = Arc::new(AtomicBool::new(false));
    let work = Arc::new(work);
    let handles: Vec<_> = (0..workers.clamp(1, n_tasks.max(1)))
        .map(|worker| {
            tokio::spawn(worker_loop(
                format!("{phase} worker {worker}"),
                Arc::clone(&queue),
                Arc::clone(&failed),
                Arc::clone(&work),
                max_attempts,
            ))
        })
        .collect();

    let mut first_err = None;
    for joined in futures::future::join_all(handles).await {
        let result = joined.unwrap_or_else(|join| {
            Err(Error::WorkerCrashed {
                task: format!("{phase} worker"),
                attempts: 1,
                reason: crash_reason(join),
            })
        });
        if let Err(err) = result {
            first_err.get_or_insert(err);
        }
    }
    first_err.map_or(Ok(()), Err)
}

async fn worker_loop<T, F>(
    name: String,
    queue: Arc<SegQueue<Attempt<T>>>,
    failed: Arc<AtomicBool>,
    work: Arc<F>,
    max_attempts: u32,
) -> Result<()>
where
    T: Display + Send + Sync + 'static,
    F: Fn(&T, u32) -> Result<()> + Send + Sync + 'static,
{
    while !failed.load(Ordering::Acquire) {
        let Some(mut attempt) = queue.pop() else {
            break;
        };
        debug!("{name} runs {} attempt {}", attempt.task, attempt.id);

        let task = Arc::clone(&attempt.task);
        let job = Arc::clone(&work);
        let number = attempt.number;
        let err = match tokio::task::spawn_blocking(move || job(&task, number)).await {
            Ok(Ok(())) => continue,
            Ok(Err(err)) => err,
            Err(join) => Error::WorkerCrashed {
                task: attempt.task.to_string(),
                attempts: number,
                reason: crash_reason(join),
            },
        };

        let retry = err.is_retryable() && number < max_attempts;
        if retry && !failed.load(Ordering::Acquire) {
            warn!(
                "{name}: {} attempt {number}/{max_attempts} failed, retrying: {err}",
                attempt.task
            );
            attempt.number += 1;
            attempt.id = Uuid::new_v4();
            queue.push(attempt);
            continue;
        }

        error!("{name}: {} failed after {number} attempt(s): {err}", attempt.task);
        failed.store(true, Ordering::Release);
        return Err(err);
    }
    Ok(())
}

fn crash_reason(join: JoinError) -> String {
    if !join.is_panic() {
        return join.to_string();
    }
    let payload: Box<dyn Any + Send> = join.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

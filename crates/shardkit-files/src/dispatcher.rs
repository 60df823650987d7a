//! Order-preserving parallel task dispatch.
//!
//! A fixed pool of scoped worker threads pulls `(index, task)` pairs from a
//! shared queue and sends `(index, result)` pairs back to the calling thread,
//! which places each result in its submission slot. Completion order never
//! leaks into the returned results.

use crate::error::{Error, Result};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use tracing::{debug, error, warn};

/// Resolve the worker count for a host with `available` execution units
///
/// An explicit request is clamped to `1..=available`; without one, half the
/// available units are used (at least one).
///
/// # Example
///
/// ```
/// use shardkit_files::dispatcher::resolve_workers;
///
/// assert_eq!(resolve_workers(None, 8), 4);
/// assert_eq!(resolve_workers(Some(32), 8), 8);
/// assert_eq!(resolve_workers(None, 1), 1);
/// ```
#[must_use]
pub fn resolve_workers(requested: Option<usize>, available: usize) -> usize {
    let available = available.max(1);
    match requested {
        Some(n) => n.clamp(1, available),
        None => (available / 2).max(1),
    }
}

/// Bounded worker pool for independent tasks
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    workers: usize,
}

impl Dispatcher {
    /// Dispatcher with exactly `workers` threads (at least one)
    #[must_use]
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Dispatcher sized for this host, see [`resolve_workers`]
    #[must_use]
    pub fn for_host(requested: Option<usize>) -> Self {
        Self::new(resolve_workers(requested, num_cpus::get()))
    }

    /// Number of worker threads
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every task, returning one result per task in submission order
    ///
    /// A failing or panicking task only affects its own slot.
    pub fn run_all<T, R, F>(&self, tasks: Vec<T>, f: F) -> Vec<Result<R>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> Result<R> + Sync,
    {
        self.run_observed(tasks, f, |_, _| {})
    }

    /// Like [`Dispatcher::run_all`], calling `observer` on the calling thread
    /// as each task completes, in completion order
    pub fn run_observed<T, R, F, O>(&self, tasks: Vec<T>, f: F, mut observer: O) -> Vec<Result<R>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> Result<R> + Sync,
        O: FnMut(usize, &Result<R>),
    {
        let total = tasks.len();
        if total == 0 {
            return Vec::new();
        }

        let workers = self.workers.min(total);
        debug!("Dispatching {} tasks across {} workers", total, workers);

        let (task_tx, task_rx) = unbounded();
        for entry in tasks.into_iter().enumerate() {
            // task_rx is alive, so the queue accepts every send
            let _ = task_tx.send(entry);
        }
        drop(task_tx);

        let (result_tx, result_rx) = unbounded();
        let mut slots: Vec<Option<Result<R>>> = std::iter::repeat_with(|| None).take(total).collect();

        thread::scope(|scope| {
            let mut spawned = 0;
            for id in 0..workers {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                let f = &f;
                let spawn = thread::Builder::new()
                    .name(format!("shardkit-worker-{id}"))
                    .spawn_scoped(scope, move || work(id, &task_rx, &result_tx, f));
                match spawn {
                    Ok(_) => spawned += 1,
                    Err(e) => warn!("Failed to spawn worker {}: {}", id, e),
                }
            }

            if spawned == 0 {
                warn!("No worker threads available, running tasks inline");
                work(0, &task_rx, &result_tx, &f);
            }
            drop(result_tx);

            for (index, result) in result_rx.iter() {
                observer(index, &result);
                slots[index] = Some(result);
            }
        });

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.unwrap_or(Err(Error::TaskPanicked(index))))
            .collect()
    }
}

/// Worker loop: drain the queue until it is empty
fn work<T, R, F>(id: usize, tasks: &Receiver<(usize, T)>, results: &Sender<(usize, Result<R>)>, f: &F)
where
    F: Fn(T) -> Result<R>,
{
    debug!("Worker {} starting", id);
    let mut processed = 0usize;

    for (index, task) in tasks.iter() {
        let result = panic::catch_unwind(AssertUnwindSafe(|| f(task))).unwrap_or_else(|_| {
            error!("Task {} panicked on worker {}", index, id);
            Err(Error::TaskPanicked(index))
        });
        processed += 1;

        if results.send((index, result)).is_err() {
            warn!("Worker {} result channel disconnected", id);
            break;
        }
    }

    debug!("Worker {} finished ({} tasks)", id, processed);
}

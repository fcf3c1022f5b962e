//! # Bounded Concurrency Scheduler
//!
//! Runs a batch of independent jobs on a dedicated rayon thread pool sized to
//! the requested concurrency level. The pool is the admission gate: a job
//! occupies one worker from the moment it starts until it returns, so no more
//! than `concurrency` jobs are ever in flight. [`run_bounded`] returns only
//! after every job has finished, which makes it the join barrier as well.
//!
//! A concurrency of 1 goes through the same pool with a single worker; there
//! is no separate sequential path. Jobs run exactly once, in no particular
//! order, and their results come back in input order.

use log::debug;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::error::{Error, Result};

/// Runs `job` once for each item with at most `concurrency` jobs executing at
/// the same time, and collects the results in input order.
///
/// Job failures are part of `R`; the scheduler itself only fails when the
/// concurrency level is zero or the pool cannot be built.
pub fn run_bounded<T, R, F>(items: &[T], concurrency: usize, job: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    if concurrency == 0 {
        return Err(Error::InvalidConcurrency(concurrency));
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(concurrency)
        .thread_name(|index| format!("git-get-worker-{}", index))
        .build()
        .map_err(|e| Error::Scheduler {
            message: e.to_string(),
        })?;

    debug!(
        "Dispatching {} jobs with concurrency level {}",
        items.len(),
        concurrency
    );

    // One item per task, so idle workers always pick up the next job
    let results = pool.install(|| items.par_iter().with_max_len(1).map(&job).collect());

    debug!("All {} jobs finished", items.len());
    Ok(results)
}

//! Thread pool setup for batch rewriting.
//! One rayon worker handles one file at a time.

use anyhow::{Context, Result};

/// Worker count: the requested number, or one per core.
pub fn worker_count(jobs: Option<usize>) -> usize {
    jobs.filter(|&n| n > 0).unwrap_or_else(num_cpus::get).max(1)
}

/// Initialize the global rayon thread pool.
pub fn init_thread_pool(jobs: Option<usize>) -> Result<usize> {
    let workers = worker_count(jobs);

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()
        .context("Failed to initialize thread pool")?;

    tracing::debug!(
        "initialized thread pool: {} workers (system has {} cores)",
        workers,
        num_cpus::get()
    );

    Ok(workers)
}

use rayon::ThreadPoolBuilder;
use log::{debug, info};

use crate::config::ThreadingSettings;

/// A unit of work handed to an [`Executor`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run generation jobs off the simulation thread.
///
/// The streamer only ever submits fire-and-forget jobs; results come back
/// through a [`CompletionQueue`](super::CompletionQueue), never through the executor.
pub trait Executor: Send + Sync {
    fn execute(&self, job: Job);
}

// A wrapper around Rayon's ThreadPool that provides a clean interface for tile generation
pub struct ThreadPool {
    pool: rayon::ThreadPool,
    num_threads: usize,
}

impl ThreadPool {
    // Create a new ThreadPool with the specified number of threads.
    // If size is 0, num_cpus::get() decides.
    pub fn new(size: usize) -> Result<ThreadPool, rayon::ThreadPoolBuildError> {
        let num_threads = if size > 0 { size } else { num_cpus::get() };

        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|index| format!("terrain-worker-{index}"))
            .build()?;

        info!("Created thread pool with {} threads", num_threads);

        Ok(ThreadPool { pool, num_threads })
    }

    // Pool sized from the `[threading]` config section
    pub fn from_settings(settings: &ThreadingSettings) -> Result<ThreadPool, rayon::ThreadPoolBuildError> {
        Self::new(settings.resolved_worker_threads())
    }

    // Get the number of threads in the pool
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }
}

impl Executor for ThreadPool {
    fn execute(&self, job: Job) {
        self.pool.spawn(job);
    }
}

/// Runs every job immediately on the calling thread.
///
/// Completion order equals submission order, which makes streamer behaviour
/// reproducible in tests and single-threaded hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, job: Job) {
        debug!("InlineExecutor: running job on caller thread");
        job();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::time::Duration;

    #[test]
    fn zero_size_uses_cpu_count() {
        let pool = ThreadPool::new(0).unwrap();
        assert_eq!(pool.num_threads(), num_cpus::get());

        let configured = ThreadPool::from_settings(&ThreadingSettings { worker_threads: 2 }).unwrap();
        assert_eq!(configured.num_threads(), 2);
    }

    #[test]
    fn executes_jobs_through_trait_object() {
        let pool = ThreadPool::new(2).unwrap();
        let executor: &dyn Executor = &pool;
        let (tx, rx) = mpsc::channel();

        for i in 0..8 {
            let tx = tx.clone();
            executor.execute(Box::new(move || {
                tx.send(i).unwrap();
            }));
        }
        drop(tx);

        let mut received: Vec<i32> = (0..8)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        received.sort();
        assert_eq!(received, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn jobs_run_on_named_worker_threads() {
        let pool = ThreadPool::new(1).unwrap();
        let (tx, rx) = mpsc::channel();
        Executor::execute(&pool, Box::new(move || {
            let name = std::thread::current().name().map(str::to_owned);
            tx.send(name).unwrap();
        }));

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("terrain-worker-0"));
    }

    #[test]
    fn inline_executor_runs_before_returning() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        InlineExecutor.execute(Box::new(move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}

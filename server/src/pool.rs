//! Generic FIFO worker pool: a fixed set of OS threads pulling boxed
//! closures from a mutex-guarded deque, signalled by a condvar. This is the
//! Worker Pool half of the dual-pool scheduler; [`crate::clientpool`]
//! implements the other half with its own, separate queue and condvar.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

use crate::error::ServerError;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Shared {
    queue: Mutex<VecDeque<Job>>,
    condvar: Condvar,
    shutdown: AtomicBool,
}

/// A fixed-size pool of threads draining a single FIFO job queue.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

/// A handle to a submitted job's eventual result.
pub struct JobHandle<R> {
    rx: mpsc::Receiver<R>,
}

impl<R> JobHandle<R> {
    /// Block until the job completes. Returns `PoolShutdown` only if the
    /// worker thread ran the job but the result channel was dropped, which
    /// cannot happen in normal operation — kept for symmetry with `submit`.
    pub fn join(self) -> Result<R, ServerError> {
        self.rx.recv().map_err(|_| ServerError::PoolShutdown)
    }
}

impl WorkerPool {
    /// Spawn `size` worker threads, each looping: wait for a job, run it
    /// outside the lock, repeat. Mirrors the consumer side of the original
    /// thread pool's wait/pop/execute loop.
    pub fn new(size: usize, name: &str) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            shutdown: AtomicBool::new(false),
        });

        let workers = (0..size)
            .map(|i| {
                let shared = Arc::clone(&shared);
                std::thread::Builder::new()
                    .name(format!("{name}-{i}"))
                    .spawn(move || worker_loop(shared))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self { shared, workers }
    }

    /// Enqueue a job and return a handle to its result. Jobs run in FIFO
    /// order relative to other jobs already queued.
    pub fn submit<F, R>(&self, job: F) -> Result<JobHandle<R>, ServerError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.shared.shutdown.load(Ordering::Acquire) {
            return Err(ServerError::PoolShutdown);
        }

        let (tx, rx) = mpsc::channel();
        let boxed: Job = Box::new(move || {
            let result = job();
            // The receiver may already be gone if the caller dropped the
            // handle; that is not an error for the pool.
            let _ = tx.send(result);
        });

        self.shared.queue.lock().push_back(boxed);
        self.shared.condvar.notify_one();
        Ok(JobHandle { rx })
    }

    /// Number of jobs currently queued, not counting one a worker may be
    /// actively running.
    pub fn queue_len(&self) -> usize {
        self.shared.queue.lock().len()
    }

    /// Signal every worker to exit once its current job (if any) finishes,
    /// wake them all, and join their threads.
    pub fn shutdown(mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        let _guard = self.shared.queue.lock();
        self.shared.condvar.notify_all();
        drop(_guard);
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let mut queue = shared.queue.lock();
        loop {
            if let Some(job) = queue.pop_front() {
                drop(queue);
                job();
                break;
            }
            if shared.shutdown.load(Ordering::Acquire) {
                return;
            }
            shared.condvar.wait(&mut queue);
        }
    }
}

//! Client Pool: the I/O-bound half of the dual-pool scheduler. A fixed
//! number of "holder" threads each loop pulling an accepted [`TcpStream`]
//! off a FIFO queue and handing it to the session handler, guarded by its
//! own mutex and condvar so it never contends with [`crate::pool::WorkerPool`].

use std::collections::VecDeque;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

struct Shared {
    queue: Mutex<VecDeque<TcpStream>>,
    condvar: Condvar,
    shutdown: AtomicBool,
}

/// A fixed-size pool of holder threads draining a FIFO queue of accepted
/// connections.
pub struct ClientPool {
    shared: Arc<Shared>,
    holders: Vec<JoinHandle<()>>,
}

impl ClientPool {
    /// Spawn `size` holder threads, each running `handler` on every
    /// connection it pulls off the queue.
    pub fn new<F>(size: usize, handler: F) -> Self
    where
        F: Fn(TcpStream) + Send + Sync + 'static,
    {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            shutdown: AtomicBool::new(false),
        });
        let handler = Arc::new(handler);

        let holders = (0..size)
            .map(|i| {
                let shared = Arc::clone(&shared);
                let handler = Arc::clone(&handler);
                std::thread::Builder::new()
                    .name(format!("client-holder-{i}"))
                    .spawn(move || holder_loop(shared, handler))
                    .expect("failed to spawn client holder thread")
            })
            .collect();

        Self { shared, holders }
    }

    /// Push a freshly accepted connection onto the queue and wake one
    /// holder thread.
    pub fn dispatch(&self, stream: TcpStream) {
        self.shared.queue.lock().push_back(stream);
        self.shared.condvar.notify_one();
    }

    /// Snapshot of the queue depth, used by the queue notifier to tell each
    /// still-waiting connection its position.
    pub fn queue_len(&self) -> usize {
        self.shared.queue.lock().len()
    }

    /// Notify every connection currently sitting in the queue — not one a
    /// holder has already popped and is actively serving — of its 1-based
    /// position, via `notify`. The connection at the front of the deque
    /// (the next one a free holder will pop) is position 1. Iterating the
    /// queue's own backing deque guarantees active connections are excluded
    /// by construction.
    pub fn notify_waiting<F>(&self, mut notify: F)
    where
        F: FnMut(&mut TcpStream, usize),
    {
        let mut queue = self.shared.queue.lock();
        for (index, stream) in queue.iter_mut().enumerate() {
            notify(stream, index + 1);
        }
    }

    pub fn shutdown(mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        let _guard = self.shared.queue.lock();
        self.shared.condvar.notify_all();
        drop(_guard);
        for holder in self.holders.drain(..) {
            let _ = holder.join();
        }
    }
}

fn holder_loop<F>(shared: Arc<Shared>, handler: Arc<F>)
where
    F: Fn(TcpStream) + Send + Sync + 'static,
{
    loop {
        let mut queue = shared.queue.lock();
        loop {
            if let Some(stream) = queue.pop_front() {
                drop(queue);
                handler(stream);
                break;
            }
            if shared.shutdown.load(Ordering::Acquire) {
                return;
            }
            shared.condvar.wait(&mut queue);
        }
    }
}

//! Queue Notifier: a single background thread that periodically tells every
//! client still waiting in the [`crate::clientpool::ClientPool`] queue how
//! many connections are ahead of it. Connections a holder thread has already
//! popped are not in the queue's backing deque, so they are never notified —
//! resolving the only-notify-waiting-clients requirement by construction
//! rather than by tracking state explicitly.

use std::io::Write;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::clientpool::ClientPool;

pub struct QueueNotifier {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl QueueNotifier {
    /// Start a thread that wakes every `interval`, writing a
    /// `[INFO] You are #N in queue, wait a little bit!\n` line to each
    /// queued connection.
    pub fn start(pool: Arc<ClientPool>, interval: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);

        let handle = std::thread::Builder::new()
            .name("queue-notifier".into())
            .spawn(move || {
                while running_clone.load(Ordering::Acquire) {
                    std::thread::sleep(interval);
                    if !running_clone.load(Ordering::Acquire) {
                        break;
                    }
                    pool.notify_waiting(notify_position);
                }
            })
            .expect("failed to spawn queue notifier thread");

        Self { running, handle: Some(handle) }
    }

    pub fn stop(mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn notify_position(stream: &mut TcpStream, position: usize) {
    let _ = writeln!(stream, "[INFO] You are #{position} in queue, wait a little bit!");
}

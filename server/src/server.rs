//! Ties every collaborator together: bootstrap scan, worker pool, indexer,
//! file watcher, client pool, queue notifier, and the accept loop.

use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use phrasedex_core::PostingStore;

use crate::clientpool::ClientPool;
use crate::config::Config;
use crate::document::{self, DocIdAllocator};
use crate::error::ServerError;
use crate::indexer::Indexer;
use crate::notifier::QueueNotifier;
use crate::pool::WorkerPool;
use crate::watcher::FileWatcher;

pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Bootstrap order: scan and index the existing tree synchronously so
    /// the first connections never race an empty index, then bring up the
    /// watcher, client pool, and notifier, then accept connections until
    /// `shutdown` is requested.
    pub fn run(self, shutdown: Arc<AtomicBool>) -> Result<(), ServerError> {
        self.run_with(shutdown, |_addr| {})
    }

    /// Same as [`Server::run`], but invokes `on_listening` with the actual
    /// bound address once the listener is up — the port config specifies
    /// may be `0`, in which case the OS picks one, and tests need to learn
    /// which.
    pub fn run_with(
        self,
        shutdown: Arc<AtomicBool>,
        on_listening: impl FnOnce(SocketAddr),
    ) -> Result<(), ServerError> {
        let ids = Arc::new(DocIdAllocator::new());
        let store = Arc::new(PostingStore::new());
        let worker_pool = Arc::new(WorkerPool::new(self.config.worker_threads, "worker"));
        let indexer = Indexer::new(Arc::clone(&store), Arc::clone(&ids), Arc::clone(&worker_pool));

        let initial_paths = document::scan(&self.config.data_dir)?;
        tracing::info!(count = initial_paths.len(), "bootstrap scan complete");
        indexer.enqueue(initial_paths.clone());

        let watcher = FileWatcher::new(
            self.config.data_dir.clone(),
            Duration::from_secs(self.config.refresh_interval_s),
        );
        watcher.prime(&initial_paths);

        let watcher_indexer = Arc::clone(&indexer);
        watcher.start(move |new_paths| {
            tracing::info!(count = new_paths.len(), "file watcher found new documents");
            watcher_indexer.enqueue(new_paths);
        });

        let diagnostic_hook = spawn_diagnostic_hook(Arc::clone(&indexer));

        let client_indexer = Arc::clone(&indexer);
        let client_pool = Arc::new(ClientPool::new(self.config.client_threads, move |stream| {
            crate::session::handle(stream, Arc::clone(&client_indexer));
        }));

        let notifier =
            QueueNotifier::start(Arc::clone(&client_pool), Duration::from_secs(self.config.notify_interval_s));

        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port))
            .map_err(|e| ServerError::StartupFatal(format!("could not bind {}:{}: {e}", self.config.host, self.config.port)))?;
        listener
            .set_nonblocking(true)
            .map_err(|e| ServerError::StartupFatal(format!("could not set listener non-blocking: {e}")))?;
        let bound_addr = listener
            .local_addr()
            .map_err(|e| ServerError::StartupFatal(format!("could not read bound address: {e}")))?;
        tracing::info!(addr = %bound_addr, "listening");
        on_listening(bound_addr);

        self.accept_loop(&listener, &client_pool, &shutdown);

        tracing::info!("shutdown requested, draining pools");
        notifier.stop();
        watcher.stop();
        diagnostic_hook.stop();
        Arc::try_unwrap(client_pool)
            .unwrap_or_else(|_| panic!("client pool still has outstanding references at shutdown"))
            .shutdown();

        // Every other `Arc<Indexer>` clone (the watcher's and the client
        // pool's handler closure) is gone by now; dropping this last one
        // releases the indexer's own worker-pool handle so `shutdown` below
        // can reclaim sole ownership.
        drop(indexer);
        Arc::try_unwrap(worker_pool)
            .unwrap_or_else(|_| panic!("worker pool still has outstanding references at shutdown"))
            .shutdown();
        Ok(())
    }

    fn accept_loop(&self, listener: &TcpListener, client_pool: &Arc<ClientPool>, shutdown: &Arc<AtomicBool>) {
        while !shutdown.load(Ordering::Acquire) {
            match listener.accept() {
                Ok((stream, addr)) => {
                    tracing::debug!(%addr, "accepted connection");
                    client_pool.dispatch(stream);
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "transient accept error");
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
        }
    }
}

/// Handle to the `SIGUSR1` diagnostic hook, stoppable so shutdown can join
/// its thread and release its `Arc<Indexer>` clone rather than leaking it
/// for the life of the process.
struct DiagnosticHook {
    handle: Option<std::thread::JoinHandle<()>>,
    #[cfg(unix)]
    signals_handle: Option<signal_hook::iterator::Handle>,
}

impl DiagnosticHook {
    fn stop(mut self) {
        #[cfg(unix)]
        if let Some(signals_handle) = self.signals_handle.take() {
            signals_handle.close();
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Install the indexer's `show()` diagnostic behind `SIGUSR1` — an operator
/// sends the signal (`kill -USR1 <pid>`) to dump the current posting store
/// through the logging facade; it is never invoked on its own.
#[cfg(unix)]
fn spawn_diagnostic_hook(indexer: Arc<Indexer>) -> DiagnosticHook {
    use signal_hook::consts::SIGUSR1;
    use signal_hook::iterator::Signals;

    let mut signals = match Signals::new([SIGUSR1]) {
        Ok(signals) => signals,
        Err(err) => {
            tracing::warn!(error = %err, "could not install SIGUSR1 diagnostic hook");
            return DiagnosticHook { handle: None, signals_handle: None };
        }
    };
    let signals_handle = signals.handle();

    let handle = std::thread::Builder::new()
        .name("diagnostic-hook".into())
        .spawn(move || {
            for _ in signals.forever() {
                tracing::info!("SIGUSR1 received, dumping index state");
                indexer.show();
            }
        })
        .ok();

    DiagnosticHook { handle, signals_handle: Some(signals_handle) }
}

#[cfg(not(unix))]
fn spawn_diagnostic_hook(_indexer: Arc<Indexer>) -> DiagnosticHook {
    DiagnosticHook { handle: None }
}

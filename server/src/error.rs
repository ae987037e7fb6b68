//! Error taxonomy for the server binary.

/// Typed errors for the collaborators the core library does not own:
/// startup, per-file loading, per-connection I/O, and pool lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Missing data dir, bind/listen failure, invalid config — aborts the process.
    #[error("fatal startup error: {0}")]
    StartupFatal(String),

    /// A single file could not be read or decoded; the surrounding scan or
    /// pass continues without it.
    #[error("could not read {path}: {source}")]
    IoTransient { path: std::path::PathBuf, #[source] source: std::io::Error },

    /// A socket read/write failed; only that connection is affected.
    #[error("client I/O error: {0}")]
    ClientIo(#[from] std::io::Error),

    /// `submit` was called after `shutdown`.
    #[error("pool has been shut down")]
    PoolShutdown,
}

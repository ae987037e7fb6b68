//! phrasedex-server: wires the core indexing/query library to a TCP
//! listener, a polling file watcher, and a dual-pool thread scheduler.

pub mod clientpool;
pub mod config;
pub mod document;
pub mod error;
pub mod indexer;
pub mod notifier;
pub mod pool;
pub mod server;
pub mod session;
pub mod watcher;

pub use config::{Cli, Config};
pub use error::ServerError;
pub use server::Server;
